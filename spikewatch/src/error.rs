use thiserror::Error;

use crate::schema::ThresholdField;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("user \"{0}\" is protected and cannot be deleted")]
    ProtectedUser(String),

    #[error("a save for user \"{0}\" is already in flight")]
    SaveInFlight(String),

    #[error("unknown pair: {0}")]
    UnknownPair(String),

    #[error("pair {0} is malformed and cannot be edited field by field")]
    MalformedPair(String),

    #[error("invalid {field} threshold: \"{value}\"")]
    InvalidThreshold { field: ThresholdField, value: String },

    #[error("invalid key: {0}")]
    InvalidKey(String),
}

impl DashboardError {
    /// Whether retrying the same call later may succeed.
    ///
    /// Local rejections (protected user, invalid input) are never transient.
    pub fn is_transient(&self) -> bool {
        match self {
            DashboardError::Http { status, .. } => *status >= 500 || *status == 429,
            DashboardError::Request(_) | DashboardError::SaveInFlight(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_are_transient() {
        let err = DashboardError::Http {
            status: 503,
            message: "unavailable".into(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn test_client_errors_are_not_transient() {
        let err = DashboardError::Http {
            status: 404,
            message: "no such user".into(),
        };
        assert!(!err.is_transient());
        assert!(!DashboardError::ProtectedUser("Stats".into()).is_transient());
    }

    #[test]
    fn test_threshold_error_message_names_field() {
        let err = DashboardError::InvalidThreshold {
            field: ThresholdField::Delta,
            value: "-1".into(),
        };
        assert_eq!(err.to_string(), "invalid delta threshold: \"-1\"");
    }
}
