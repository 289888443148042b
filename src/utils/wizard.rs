//! Shared plumbing for multi-step forms.

use std::fmt;

use thiserror::Error;
use validator::ValidationErrors;

use tutorlink_core::ApiError;

use crate::validator::format_errors;

/// A step of a linear wizard.
pub trait WizardStep: Copy + Eq + fmt::Debug + 'static {
    /// Every step, in order.
    const ORDER: &'static [Self];

    fn title(self) -> &'static str;

    fn index(self) -> usize {
        Self::ORDER
            .iter()
            .position(|step| *step == self)
            .unwrap_or_default()
    }

    fn next(self) -> Option<Self> {
        Self::ORDER.get(self.index() + 1).copied()
    }

    fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ORDER[i])
    }

    fn is_last(self) -> bool {
        self.next().is_none()
    }
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("{step} step is incomplete: {}", format_errors(.errors))]
    Incomplete {
        step: &'static str,
        errors: ValidationErrors,
    },

    /// The wizard cannot continue at all (e.g. an expired invitation).
    #[error("{0}")]
    Blocked(String),

    #[error("Already on the first step")]
    AtFirstStep,

    #[error("Finish the {step} step before submitting")]
    NotReady { step: &'static str },

    #[error("This form has already been submitted")]
    AlreadySubmitted,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl WizardError {
    pub(crate) fn incomplete(step: impl WizardStep, errors: ValidationErrors) -> Self {
        Self::Incomplete {
            step: step.title(),
            errors,
        }
    }

    /// Field errors to highlight, if this is a validation failure.
    pub fn field_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Incomplete { errors, .. } => Some(errors),
            Self::Api(ApiError::Validation(errors)) => Some(errors),
            _ => None,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Turns a step's filtered errors into a result.
pub(crate) fn check_step(step: impl WizardStep, errors: ValidationErrors) -> Result<(), WizardError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(WizardError::incomplete(step, errors))
    }
}
