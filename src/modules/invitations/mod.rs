//! Teacher invitations.
//!
//! Admins create and manage invitations through [`InvitationService`]; an
//! invitee accepts one through the step-by-step [`InvitationWizard`].

pub mod service;
pub mod wizard;

pub use service::InvitationService;
pub use wizard::{InvitationStep, InvitationWizard, ProfileFields};
