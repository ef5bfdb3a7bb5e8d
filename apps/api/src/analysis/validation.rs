use serde::Serialize;
use thiserror::Error;

/// Why an analysis request was refused before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationError {
    #[error("Please paste the job description.")]
    MissingJobDescription,

    #[error("Please paste your profile text.")]
    MissingProfile,

    #[error("No API key found. Add OPENAI_API_KEY to your .env file and restart the service.")]
    MissingCredential,
}

impl ValidationError {
    /// Stable machine-readable reason, used in API responses.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingJobDescription => "missing_job_description",
            ValidationError::MissingProfile => "missing_profile",
            ValidationError::MissingCredential => "missing_credential",
        }
    }
}

/// Checks the inputs in order: job text, profile text, credential.
/// The first failing condition is reported.
pub fn validate_inputs(
    job_text: &str,
    profile_text: &str,
    credential_present: bool,
) -> Result<(), ValidationError> {
    if job_text.trim().is_empty() {
        return Err(ValidationError::MissingJobDescription);
    }
    if profile_text.trim().is_empty() {
        return Err(ValidationError::MissingProfile);
    }
    if !credential_present {
        return Err(ValidationError::MissingCredential);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLANKS: &[&str] = &["", " ", "\n\t  ", "\u{3000}"];

    #[test]
    fn test_valid_inputs_pass() {
        assert_eq!(
            validate_inputs(
                "Senior backend engineer, 5+ years Go, distributed systems",
                "3 years Python, built a REST API",
                true
            ),
            Ok(())
        );
    }

    #[test]
    fn test_blank_job_text_fails() {
        for blank in BLANKS {
            assert_eq!(
                validate_inputs(blank, "profile", true),
                Err(ValidationError::MissingJobDescription)
            );
        }
    }

    #[test]
    fn test_blank_profile_fails() {
        for blank in BLANKS {
            assert_eq!(
                validate_inputs("job", blank, true),
                Err(ValidationError::MissingProfile)
            );
        }
    }

    #[test]
    fn test_missing_credential_fails_after_texts_pass() {
        assert_eq!(
            validate_inputs("job", "profile", false),
            Err(ValidationError::MissingCredential)
        );
    }

    #[test]
    fn test_job_text_is_checked_first() {
        assert_eq!(
            validate_inputs("", "", false),
            Err(ValidationError::MissingJobDescription)
        );
        assert_eq!(
            validate_inputs("job", "  ", false),
            Err(ValidationError::MissingProfile)
        );
    }

    #[test]
    fn test_codes_are_snake_case() {
        assert_eq!(
            ValidationError::MissingJobDescription.code(),
            "missing_job_description"
        );
        assert_eq!(ValidationError::MissingProfile.code(), "missing_profile");
        assert_eq!(ValidationError::MissingCredential.code(), "missing_credential");
        assert_eq!(
            serde_json::to_value(ValidationError::MissingCredential).unwrap(),
            "missing_credential"
        );
    }
}
