use serde::Serialize;
use thiserror::Error;

/// Structured error body handed to UI surfaces.
/// Every failure carries a machine code plus enough text to show inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g. "validation_failed", "request_failed")
    pub error: String,
    /// Human-readable description of what went wrong
    pub message: String,
    /// Which input caused the error (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Hint about what a valid input looks like
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_hint: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            field: None,
            docs_hint: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_docs_hint(mut self, hint: impl Into<String>) -> Self {
        self.docs_hint = Some(hint.into());
        self
    }
}

/// Error codes shared by every layer
pub mod codes {
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const REQUEST_FAILED: &str = "request_failed";
    pub const AGENT_REJECTED: &str = "agent_rejected";
    pub const UNKNOWN_USER: &str = "unknown_user";
    pub const SESSION_CLOSED: &str = "session_closed";
}

/// Input rejected locally, before anything is dispatched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    EmptyInput { field: &'static str },

    #[error("'{raw}' is not a valid number")]
    NotNumeric { raw: String },

    #[error("reading {reading} mg/dL is outside the accepted range {min}-{max} mg/dL")]
    OutOfRange { reading: f64, min: f64, max: f64 },

    #[error("'{raw}' is not a valid user id; it must be a positive number")]
    InvalidUserId { raw: String },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyInput { field } => field,
            Self::NotNumeric { .. } | Self::OutOfRange { .. } => "reading",
            Self::InvalidUserId { .. } => "user_id",
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        let body = ErrorBody::new(codes::VALIDATION_FAILED, self.to_string()).with_field(self.field());
        match self {
            Self::NotNumeric { .. } | Self::OutOfRange { .. } => {
                body.with_docs_hint("Enter a glucose reading between 80 and 300 mg/dL")
            }
            Self::InvalidUserId { .. } => body.with_docs_hint("Pick an id listed by `nova users`"),
            Self::EmptyInput { .. } => body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_body_names_reading_field() {
        let body = ValidationError::OutOfRange {
            reading: 42.0,
            min: 80.0,
            max: 300.0,
        }
        .to_body();
        assert_eq!(body.error, codes::VALIDATION_FAILED);
        assert_eq!(body.field.as_deref(), Some("reading"));
        assert!(body.message.contains("42"));
        assert!(body.docs_hint.is_some());
    }

    #[test]
    fn empty_body_omits_optional_fields_in_json() {
        let json = serde_json::to_value(ErrorBody::new("x", "y")).unwrap();
        assert_eq!(json, serde_json::json!({"error": "x", "message": "y"}));
    }
}
