use std::collections::BTreeMap;

use validator::{Validate, ValidationError, ValidationErrors};

use tutorlink_core::ApiError;

/// Joins every field error into one sentence, fields in alphabetical order.
pub fn format_errors(errors: &ValidationErrors) -> String {
    let sorted: BTreeMap<_, _> = errors.field_errors().into_iter().collect();
    sorted
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().filter_map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .or_else(|| Some(format!("{} is invalid", field)))
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validates a DTO before it is sent, so invalid input never reaches the
/// backend.
pub fn validated<T: Validate>(dto: &T) -> Result<(), ApiError> {
    dto.validate().map_err(ApiError::from)
}

/// Keeps only the errors reported for `fields`.
pub fn errors_for(errors: &ValidationErrors, fields: &[&'static str]) -> ValidationErrors {
    let all = errors.field_errors();
    let mut kept = ValidationErrors::new();
    for field in fields {
        if let Some(list) = all.get(*field) {
            for error in list.iter() {
                kept.add(*field, error.clone());
            }
        }
    }
    kept
}

/// A `required` error with a readable message.
pub fn required(field: &str) -> ValidationError {
    ValidationError::new("required").with_message(format!("{field} is required").into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Form {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn test_format_errors_uses_messages_and_fallbacks() {
        let form = Form {
            name: String::new(),
            email: "nope".to_string(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(format_errors(&errors), "email is invalid, Name is required");
    }

    #[test]
    fn test_errors_for_filters_fields() {
        let form = Form {
            name: String::new(),
            email: "nope".to_string(),
        };
        let errors = form.validate().unwrap_err();
        let kept = errors_for(&errors, &["name"]);
        assert!(kept.field_errors().contains_key("name"));
        assert!(!kept.field_errors().contains_key("email"));
        assert!(errors_for(&errors, &["missing"]).is_empty());
    }

    #[test]
    fn test_validated_maps_to_api_error() {
        let form = Form {
            name: "Ada".to_string(),
            email: "bad".to_string(),
        };
        let error = validated(&form).unwrap_err();
        assert_eq!(
            error.user_message(),
            "Please check the following fields: email"
        );
    }
}
