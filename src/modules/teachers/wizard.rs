//! Teacher profile wizard.
//!
//! Builds an [`UpdateTeacherProfileDto`] one step at a time:
//!
//! ```text
//! Basics -> Subjects -> Availability -> Review -> submit()
//! ```
//!
//! Names are required and at least one subject must be listed; the hourly
//! rate is collected with the subjects. Availability slots must each end
//! after they start and must not overlap.

use std::fmt;

use tracing::{debug, instrument};
use validator::{Validate, ValidationErrors};

use tutorlink_models::scheduler::AvailabilitySlot;
use tutorlink_models::teachers::{MAX_SUBJECTS, Teacher, UpdateTeacherProfileDto};

use super::service::TeacherService;
use crate::api::ApiClient;
use crate::utils::wizard::{WizardError, WizardStep, check_step};
use crate::validator::{errors_for, required};

const BASICS_FIELDS: &[&str] = &["first_name", "last_name", "phone_number", "bio"];
const SUBJECTS_FIELDS: &[&str] = &["subjects", "hourly_rate"];
const AVAILABILITY_FIELDS: &[&str] = &["availability"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProfileStep {
    #[default]
    Basics,
    Subjects,
    Availability,
    Review,
}

impl WizardStep for ProfileStep {
    const ORDER: &'static [Self] = &[
        Self::Basics,
        Self::Subjects,
        Self::Availability,
        Self::Review,
    ];

    fn title(self) -> &'static str {
        match self {
            Self::Basics => "Basics",
            Self::Subjects => "Subjects",
            Self::Availability => "Availability",
            Self::Review => "Review",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasicsFields {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
}

fn trimmed(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[derive(Default)]
pub struct TeacherProfileWizard {
    step: ProfileStep,
    draft: UpdateTeacherProfileDto,
    submitted: bool,
}

impl fmt::Debug for TeacherProfileWizard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeacherProfileWizard")
            .field("step", &self.step)
            .field("submitted", &self.submitted)
            .finish_non_exhaustive()
    }
}

impl TeacherProfileWizard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the wizard on the signed-in teacher's current profile.
    #[instrument(skip(api))]
    pub async fn load(api: &ApiClient) -> Result<Self, WizardError> {
        let teacher = TeacherService::my_profile(api).await?;
        Ok(Self::from_teacher(&teacher))
    }

    pub fn from_teacher(teacher: &Teacher) -> Self {
        let draft = UpdateTeacherProfileDto {
            first_name: trimmed(&teacher.first_name),
            last_name: trimmed(&teacher.last_name),
            phone_number: teacher.phone_number.as_deref().and_then(trimmed),
            bio: teacher.bio.as_deref().and_then(trimmed),
            subjects: Some(teacher.subjects.clone()),
            hourly_rate: teacher
                .hourly_rate
                .as_deref()
                .and_then(|rate| rate.parse().ok()),
            availability: Some(teacher.availability.clone()),
        };
        Self {
            draft,
            ..Self::default()
        }
    }

    pub fn step(&self) -> ProfileStep {
        self.step
    }

    pub fn draft(&self) -> &UpdateTeacherProfileDto {
        &self.draft
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn basics(&self) -> BasicsFields {
        BasicsFields {
            first_name: self.draft.first_name.clone().unwrap_or_default(),
            last_name: self.draft.last_name.clone().unwrap_or_default(),
            phone_number: self.draft.phone_number.clone(),
            bio: self.draft.bio.clone(),
        }
    }

    pub fn set_basics(&mut self, fields: BasicsFields) {
        self.draft.first_name = trimmed(&fields.first_name);
        self.draft.last_name = trimmed(&fields.last_name);
        self.draft.phone_number = fields.phone_number.as_deref().and_then(trimmed);
        self.draft.bio = fields.bio.as_deref().and_then(trimmed);
    }

    pub fn subjects(&self) -> &[String] {
        self.draft.subjects.as_deref().unwrap_or_default()
    }

    /// Adds a subject. Blank, duplicate (ignoring case) or surplus subjects
    /// are refused.
    pub fn add_subject(&mut self, subject: &str) -> bool {
        let Some(subject) = trimmed(subject) else {
            return false;
        };
        let subjects = self.draft.subjects.get_or_insert_with(Vec::new);
        if subjects.len() >= MAX_SUBJECTS
            || subjects.iter().any(|s| s.eq_ignore_ascii_case(&subject))
        {
            return false;
        }
        subjects.push(subject);
        true
    }

    pub fn remove_subject(&mut self, subject: &str) -> bool {
        let Some(subjects) = self.draft.subjects.as_mut() else {
            return false;
        };
        let before = subjects.len();
        subjects.retain(|s| !s.eq_ignore_ascii_case(subject.trim()));
        subjects.len() != before
    }

    pub fn set_hourly_rate(&mut self, rate: Option<f64>) {
        self.draft.hourly_rate = rate;
    }

    pub fn slots(&self) -> &[AvailabilitySlot] {
        self.draft.availability.as_deref().unwrap_or_default()
    }

    /// Adds a weekly slot. Invalid or overlapping slots are accepted here and
    /// reported when leaving the `Availability` step.
    pub fn add_slot(&mut self, slot: AvailabilitySlot) {
        self.draft
            .availability
            .get_or_insert_with(Vec::new)
            .push(slot);
    }

    pub fn remove_slot(&mut self, index: usize) -> Option<AvailabilitySlot> {
        let slots = self.draft.availability.as_mut()?;
        (index < slots.len()).then(|| slots.remove(index))
    }

    /// Validates the current step and advances. On `Review` this only
    /// validates the whole profile.
    pub fn next(&mut self) -> Result<ProfileStep, WizardError> {
        if self.submitted {
            return Err(WizardError::AlreadySubmitted);
        }
        self.validate_step(self.step)?;
        if let Some(next) = self.step.next() {
            debug!(from = ?self.step, to = ?next, "Profile wizard advanced");
            self.step = next;
        }
        Ok(self.step)
    }

    pub fn back(&mut self) -> Result<ProfileStep, WizardError> {
        let previous = self.step.previous().ok_or(WizardError::AtFirstStep)?;
        self.step = previous;
        Ok(previous)
    }

    #[instrument(skip(self, api))]
    pub async fn submit(&mut self, api: &ApiClient) -> Result<Teacher, WizardError> {
        if self.submitted {
            return Err(WizardError::AlreadySubmitted);
        }
        if self.step != ProfileStep::Review {
            return Err(WizardError::NotReady {
                step: self.step.title(),
            });
        }
        self.validate_step(ProfileStep::Review)?;

        let teacher = TeacherService::update_profile(api, &self.draft).await?;
        self.submitted = true;
        Ok(teacher)
    }

    fn validate_step(&self, step: ProfileStep) -> Result<(), WizardError> {
        let mut errors = self
            .draft
            .validate()
            .err()
            .unwrap_or_else(ValidationErrors::new);

        if self.draft.first_name.is_none() {
            errors.add("first_name", required("First name"));
        }
        if self.draft.last_name.is_none() {
            errors.add("last_name", required("Last name"));
        }
        if self.subjects().is_empty() && !errors.field_errors().contains_key("subjects") {
            errors.add("subjects", required("At least one subject"));
        }

        let errors = match step {
            ProfileStep::Basics => errors_for(&errors, BASICS_FIELDS),
            ProfileStep::Subjects => errors_for(&errors, SUBJECTS_FIELDS),
            ProfileStep::Availability => errors_for(&errors, AVAILABILITY_FIELDS),
            ProfileStep::Review => errors,
        };
        check_step(step, errors)
    }
}
