use validator::{Validate, ValidationErrors};

use crate::services::errors::ClientError;

pub(crate) fn validate_payload<T: Validate>(payload: &T) -> Result<(), ClientError> {
    payload.validate().map_err(|errors| ClientError::InvalidInput(describe(&errors)))
}

pub(crate) fn require_text(value: &str, message: &'static str) -> Result<(), ClientError> {
    if value.trim().is_empty() {
        Err(ClientError::MissingInput(message))
    } else {
        Ok(())
    }
}

fn describe(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid"))
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::{GradingRequest, StudentFileIds};

    #[test]
    fn validate_payload_uses_field_messages() {
        let err = validate_payload(&StudentFileIds { student_file_ids: Vec::new() }).unwrap_err();
        assert_eq!(err.to_string(), "Please select at least one student file");

        let err = validate_payload(&GradingRequest { student_id: String::new() }).unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(ref message) if message == "student_id must not be empty"));
    }

    #[test]
    fn require_text_rejects_blank() {
        assert!(require_text("a1", "Please choose an assignment").is_ok());
        let err = require_text("  ", "Please choose an assignment").unwrap_err();
        assert_eq!(err.to_string(), "Please choose an assignment");
    }
}
