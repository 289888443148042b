//! Class scheduling models.
//!
//! Conflict resolution happens server-side; the client only checks that a
//! requested slot is well-formed before sending it.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::ids::{ClassId, StudentId, TeacherId};

/// Longest single class the scheduler accepts, in minutes.
pub const MAX_CLASS_MINUTES: i64 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    Rescheduled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSession {
    pub id: ClassId,
    pub title: String,
    pub teacher_id: TeacherId,
    #[serde(default)]
    pub teacher_name: String,
    #[serde(default)]
    pub student_ids: Vec<StudentId>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ClassStatus,
    #[serde(default)]
    pub meeting_url: Option<String>,
}

impl ClassSession {
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    pub fn is_upcoming_at(&self, now: DateTime<Utc>) -> bool {
        self.status == ClassStatus::Scheduled && self.start_time > now
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ClassFilterParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<TeacherId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ClassStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateClassDto {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub teacher_id: TeacherId,
    #[validate(length(min = 1, max = 30))]
    pub student_ids: Vec<StudentId>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl CreateClassDto {
    /// Field-level rules plus the time-window check.
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        if let Err(e) = validate_time_window(self.start_time, self.end_time) {
            errors.add("end_time", e);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleClassDto {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RescheduleClassDto {
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_time_window(self.start_time, self.end_time) {
            errors.add("end_time", e);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CancelClassDto {
    #[validate(length(min = 3, max = 500))]
    pub reason: String,
}

/// A weekly recurring availability window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub weekday: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl AvailabilitySlot {
    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }

    /// Two slots on the same weekday that share any time.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.weekday == other.weekday && self.start < other.end && other.start < self.end
    }
}

/// Checks that a class ends after it starts and is not unreasonably long.
pub fn validate_time_window(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(), ValidationError> {
    if end <= start {
        return Err(ValidationError::new("end_before_start"));
    }
    if (end - start).num_minutes() > MAX_CLASS_MINUTES {
        return Err(ValidationError::new("too_long"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn dto(minutes: i64) -> CreateClassDto {
        let start = Utc::now() + Duration::days(1);
        CreateClassDto {
            title: "Algebra II".to_string(),
            teacher_id: TeacherId(1),
            student_ids: vec![StudentId(5)],
            start_time: start,
            end_time: start + Duration::minutes(minutes),
        }
    }

    #[test]
    fn test_valid_class() {
        assert!(dto(60).validate_all().is_ok());
    }

    #[test]
    fn test_end_before_start_rejected() {
        let errors = dto(-30).validate_all().unwrap_err();
        assert!(errors.field_errors().contains_key("end_time"));
    }

    #[test]
    fn test_overlong_class_rejected() {
        assert!(dto(MAX_CLASS_MINUTES + 1).validate_all().is_err());
    }

    #[test]
    fn test_missing_students_and_bad_window_both_reported() {
        let mut bad = dto(0);
        bad.student_ids.clear();
        let errors = bad.validate_all().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("student_ids"));
        assert!(fields.contains_key("end_time"));
    }

    #[test]
    fn test_slot_overlap() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let ten = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        let eleven = NaiveTime::from_hms_opt(11, 0, 0).unwrap();

        let a = AvailabilitySlot { weekday: Weekday::Mon, start: nine, end: eleven };
        let b = AvailabilitySlot { weekday: Weekday::Mon, start: ten, end: eleven };
        let c = AvailabilitySlot { weekday: Weekday::Tue, start: ten, end: eleven };
        let touching = AvailabilitySlot { weekday: Weekday::Mon, start: eleven, end: NaiveTime::from_hms_opt(12, 0, 0).unwrap() };

        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(!a.overlaps(&touching));
        assert!(a.is_valid());
    }
}
