use std::collections::BTreeMap;

use thiserror::Error;

/// Field name to human-readable error messages, in the shape the mutating
/// endpoints return under `"error"` on a 400.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub const RATE_LIMIT_MESSAGE: &str =
    "Too many requests to this endpoint, please try again after 15 minutes.";

/// Request-level failure taxonomy. Every variant is recovered at the handler
/// boundary and converted to a structured JSON response; nothing here is
/// fatal to the process.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("bad request: {message}")]
    BadRequest { message: String },
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(FieldErrors),
    #[error("{resource} not found")]
    NotFound { resource: &'static str },
    /// Deliberately generic: the response must not reveal which credential
    /// field was wrong.
    #[error("unauthorized")]
    Unauthorized,
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}

impl ApiError {
    pub fn missing_query(parameter: &str) -> Self {
        Self::BadRequest { message: format!("Search query \"{parameter}\" is required.") }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest { .. } | Self::Validation(_) => 400,
            Self::Unauthorized => 401,
            Self::NotFound { .. } => 404,
            Self::RateLimited { .. } => 429,
        }
    }

    /// The JSON body sent to the caller, always under a top-level `"error"`.
    pub fn body(&self) -> serde_json::Value {
        let error = match self {
            Self::BadRequest { message } => serde_json::Value::String(message.clone()),
            Self::Validation(fields) => {
                serde_json::to_value(fields).unwrap_or(serde_json::Value::Null)
            }
            Self::NotFound { resource } => {
                serde_json::Value::String(format!("{resource} not found."))
            }
            Self::Unauthorized => {
                serde_json::Value::String("Unauthorized. Invalid credentials.".to_owned())
            }
            Self::RateLimited { .. } => serde_json::Value::String(RATE_LIMIT_MESSAGE.to_owned()),
        };
        serde_json::json!({ "error": error })
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiError, FieldErrors};

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(ApiError::missing_query("q").status_code(), 400);
        assert_eq!(ApiError::Validation(FieldErrors::new()).status_code(), 400);
        assert_eq!(ApiError::Unauthorized.status_code(), 401);
        assert_eq!(ApiError::NotFound { resource: "Product" }.status_code(), 404);
        assert_eq!(ApiError::RateLimited { retry_after_secs: 900 }.status_code(), 429);
    }

    #[test]
    fn not_found_names_the_resource_class() {
        let body = ApiError::NotFound { resource: "Order" }.body();
        assert_eq!(body["error"], "Order not found.");
    }

    #[test]
    fn unauthorized_message_does_not_name_a_field() {
        let body = ApiError::Unauthorized.body();
        let message = body["error"].as_str().expect("string error");
        assert!(!message.to_lowercase().contains("email"));
        assert!(message.contains("Unauthorized"));
    }

    #[test]
    fn validation_body_carries_the_field_map() {
        let mut fields = FieldErrors::new();
        fields.insert("qty".to_owned(), vec!["Quantity must be at least 1.".to_owned()]);

        let body = ApiError::Validation(fields).body();
        assert_eq!(body["error"]["qty"][0], "Quantity must be at least 1.");
    }
}
