//! Unified error handling
//!
//! Every core failure is one of four categories, each with a stable code the
//! embedding API layer can pass through unchanged:
//!
//! | Code | Category |
//! |------|----------|
//! | `VALIDATION_ERROR` | caller-supplied input malformed or missing |
//! | `IMAGE_PROCESSING_ERROR` | rendering failed inside the layout engine |
//! | `PRINTER_ERROR` | device unreachable or rejected the job |
//! | `CONFIGURATION_ERROR` | settings validation or I/O failed (disk untouched) |

use ql_printer::PrintError;
use serde::Serialize;
use serde_json::{Value, json};

/// Application error enum
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Caller-supplied input is malformed or missing; never retried
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Rendering or encoding failed inside the layout engine
    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    /// Device unreachable or rejected the instructions
    #[error("Printer error: {0}")]
    Printer(String),

    /// Settings validation or I/O failure; the stored document is unchanged
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Serializable error body: the (code, message, details) triple
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

impl ServiceError {
    /// Validation error with the offending field recorded
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Configuration error with the offending field recorded
    pub fn configuration(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Stable error code for this category
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation { .. } => "VALIDATION_ERROR",
            ServiceError::ImageProcessing(_) => "IMAGE_PROCESSING_ERROR",
            ServiceError::Printer(_) => "PRINTER_ERROR",
            ServiceError::Configuration { .. } => "CONFIGURATION_ERROR",
        }
    }

    /// Build the serializable (code, message, details) body
    pub fn to_body(&self) -> ErrorBody {
        let details = match self {
            ServiceError::Validation { field, .. }
            | ServiceError::Configuration { field, .. } => match field {
                Some(f) => json!({ "field": f }),
                None => json!({}),
            },
            _ => json!({}),
        };

        ErrorBody {
            code: self.code(),
            message: self.to_string(),
            details,
        }
    }
}

impl From<PrintError> for ServiceError {
    fn from(e: PrintError) -> Self {
        ServiceError::Printer(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let e = ServiceError::validation("text is required", "text");
        assert_eq!(e.code(), "VALIDATION_ERROR");

        let e = ServiceError::ImageProcessing("font failed".into());
        assert_eq!(e.code(), "IMAGE_PROCESSING_ERROR");
    }

    #[test]
    fn test_body_carries_field() {
        let e = ServiceError::configuration("threshold out of range", "threshold");
        let body = e.to_body();
        assert_eq!(body.code, "CONFIGURATION_ERROR");
        assert_eq!(body.details["field"], "threshold");
    }

    #[test]
    fn test_print_error_maps_to_printer() {
        let e: ServiceError = PrintError::Offline("192.168.1.100".into()).into();
        assert_eq!(e.code(), "PRINTER_ERROR");
    }
}
