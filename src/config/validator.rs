use thiserror::Error;

use crate::config::Settings;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if settings.server.host.is_empty() {
            errors.push(ValidationError::MissingField("server.host".to_string()));
        }
        if settings.server.port == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        if settings.rate_limit.limit == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "rate_limit.limit".to_string(),
                reason: "Limit must be greater than 0".to_string(),
            });
        }
        if settings.rate_limit.window_seconds == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "rate_limit.window_seconds".to_string(),
                reason: "Window must be greater than 0".to_string(),
            });
        }

        if settings.llm.model.is_empty() {
            errors.push(ValidationError::MissingField("llm.model".to_string()));
        }
        if settings.llm.max_tool_iterations == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "llm.max_tool_iterations".to_string(),
                reason: "At least one tool iteration is required".to_string(),
            });
        }

        if settings.chat.report_slots == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "chat.report_slots".to_string(),
                reason: "At least one report slot is required".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        assert!(ConfigValidator::validate(&Settings::default()).is_ok());
    }

    #[test]
    fn zero_port_is_rejected() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        let errors = ConfigValidator::validate(&settings).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("server.port")));
    }

    #[test]
    fn zero_rate_limit_is_rejected() {
        let mut settings = Settings::default();
        settings.rate_limit.limit = 0;
        settings.rate_limit.window_seconds = 0;
        let errors = ConfigValidator::validate(&settings).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn zero_report_slots_is_rejected() {
        let mut settings = Settings::default();
        settings.chat.report_slots = 0;
        assert!(ConfigValidator::validate(&settings).is_err());
    }
}
