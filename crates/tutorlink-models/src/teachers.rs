//! Teacher profile models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tutorlink_core::serde::{deserialize_null_default, deserialize_optional_decimal_string};
use validator::{Validate, ValidationError};

use crate::ids::{TeacherId, UserId};
use crate::scheduler::AvailabilitySlot;

pub const MIN_HOURLY_RATE: f64 = 5.0;
pub const MAX_HOURLY_RATE: f64 = 500.0;
pub const MAX_SUBJECTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub subjects: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal_string")]
    pub hourly_rate: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub availability: Vec<AvailabilitySlot>,
    #[serde(default)]
    pub rating: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Teacher {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn teaches(&self, subject: &str) -> bool {
        self.subjects.iter().any(|s| s.eq_ignore_ascii_case(subject))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct TeacherFilterParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

/// Partial profile update, built up by the profile wizard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct UpdateTeacherProfileDto {
    #[validate(length(min = 1, max = 100))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[validate(length(min = 7, max = 20))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[validate(length(max = 2000))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[validate(length(min = 1, max = 10), custom(function = "validate_subjects"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subjects: Option<Vec<String>>,
    #[validate(range(min = 5.0, max = 500.0))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,
    #[validate(custom(function = "validate_availability"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Vec<AvailabilitySlot>>,
}

/// Subjects must be non-blank and unique (case-insensitive).
pub fn validate_subjects(subjects: &[String]) -> Result<(), ValidationError> {
    let mut seen: Vec<String> = Vec::with_capacity(subjects.len());
    for subject in subjects {
        let normalized = subject.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(ValidationError::new("blank_subject"));
        }
        if seen.contains(&normalized) {
            return Err(ValidationError::new("duplicate_subject"));
        }
        seen.push(normalized);
    }
    Ok(())
}

/// Every slot has start < end and no two slots overlap.
pub fn validate_availability(slots: &[AvailabilitySlot]) -> Result<(), ValidationError> {
    if slots.iter().any(|s| !s.is_valid()) {
        return Err(ValidationError::new("end_before_start"));
    }
    for (i, a) in slots.iter().enumerate() {
        if slots[i + 1..].iter().any(|b| a.overlaps(b)) {
            return Err(ValidationError::new("overlapping_slots"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Weekday};

    fn slot(day: Weekday, start: u32, end: u32) -> AvailabilitySlot {
        AvailabilitySlot {
            weekday: day,
            start: NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_subjects_rules() {
        assert!(validate_subjects(&["Math".into(), "Physics".into()]).is_ok());
        assert!(validate_subjects(&["Math".into(), "math ".into()]).is_err());
        assert!(validate_subjects(&["  ".into()]).is_err());
    }

    #[test]
    fn test_availability_rules() {
        assert!(validate_availability(&[slot(Weekday::Mon, 9, 12), slot(Weekday::Mon, 13, 15)]).is_ok());
        assert!(validate_availability(&[slot(Weekday::Mon, 9, 12), slot(Weekday::Mon, 11, 15)]).is_err());
        assert!(validate_availability(&[slot(Weekday::Fri, 15, 9)]).is_err());
    }

    #[test]
    fn test_profile_dto_validation() {
        let dto = UpdateTeacherProfileDto {
            subjects: Some(vec![]),
            hourly_rate: Some(1000.0),
            ..Default::default()
        };
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("subjects"));
        assert!(fields.contains_key("hourly_rate"));
    }

    #[test]
    fn test_teacher_deserialize_with_numeric_rate() {
        let json = r#"{"id":8,"first_name":"Ada","last_name":"L","email":"a@example.com",
            "subjects":["Math"],"hourly_rate":45.5,"availability":null,
            "created_at":"2024-01-01T00:00:00Z"}"#;
        let teacher: Teacher = serde_json::from_str(json).unwrap();
        assert_eq!(teacher.hourly_rate.as_deref(), Some("45.5"));
        assert!(teacher.availability.is_empty());
        assert!(teacher.teaches("math"));
    }
}
