//! Strongly-typed ID newtypes for backend entities.
//!
//! The backend uses integer primary keys. Wrapping each one in its own type
//! prevents accidental misuse (e.g., passing a `TeacherId` where a
//! `StudentId` is expected).
//!
//! # Example
//!
//! ```ignore
//! use tutorlink_models::ids::{StudentId, TeacherId};
//!
//! fn assign(student: StudentId, teacher: TeacherId) { /* ... */ }
//!
//! assign(StudentId(12), TeacherId(3));    // OK
//! // assign(TeacherId(3), StudentId(12)); // Compile error! Type mismatch.
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to define a strongly-typed ID newtype.
///
/// Generated types serialize transparently as the bare integer.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Get the inner integer value.
            #[inline]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            #[inline]
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            #[inline]
            fn from(id: $name) -> i64 {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

define_id!(
    /// Strongly-typed ID for User accounts.
    UserId
);

define_id!(
    /// Strongly-typed ID for Student profiles.
    StudentId
);

define_id!(
    /// Strongly-typed ID for Teacher profiles.
    TeacherId
);

define_id!(
    /// Strongly-typed ID for Parent accounts.
    ParentId
);

define_id!(
    /// Strongly-typed ID for Teacher invitations.
    InvitationId
);

define_id!(
    /// Strongly-typed ID for Tasks.
    TaskId
);

define_id!(
    /// Strongly-typed ID for payment Transactions.
    TransactionId
);

define_id!(
    /// Strongly-typed ID for purchase approval requests.
    PurchaseApprovalId
);

define_id!(
    /// Strongly-typed ID for scheduled class sessions.
    ClassId
);

define_id!(
    /// Strongly-typed ID for Notifications.
    NotificationId
);

define_id!(
    /// Strongly-typed ID for Receipts.
    ReceiptId
);

define_id!(
    /// Strongly-typed ID for payment disputes.
    DisputeId
);
