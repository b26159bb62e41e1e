use serde::Serialize;
use thiserror::Error;

use crate::models::EntityKind;

pub type Result<T> = std::result::Result<T, ProxyError>;

#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum ProxyError {
    #[error("{kind} not found : {query}")]
    NotFound { kind: EntityKind, query: String },

    /// The track exists but cannot yield a playable URL. Navigation skips it.
    #[error("Could not resolve stream: {0}")]
    Resolution(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Operation timed out: {0}")]
    TimedOut(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Playback queue is empty")]
    EmptyQueue,
}

impl ProxyError {
    pub fn not_found(kind: EntityKind, query: &str) -> Self {
        ProxyError::NotFound {
            kind,
            query: query.to_string(),
        }
    }

    /// Whether navigation may skip past the track that produced this error.
    pub fn is_skippable(&self) -> bool {
        matches!(self, ProxyError::Resolution(_))
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(e: reqwest::Error) -> Self {
        ProxyError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for ProxyError {
    fn from(e: serde_json::Error) -> Self {
        ProxyError::InvalidResponse(format!("Serialization error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_kind_and_query() {
        let err = ProxyError::not_found(EntityKind::Album, "Discovery");
        assert_eq!(err.to_string(), "Album not found : Discovery");
    }

    #[test]
    fn test_only_resolution_errors_are_skippable() {
        assert!(ProxyError::Resolution("no id".into()).is_skippable());
        assert!(!ProxyError::Transport("reset".into()).is_skippable());
        assert!(!ProxyError::Cancelled("next".into()).is_skippable());
        assert!(!ProxyError::EmptyQueue.is_skippable());
    }

    #[test]
    fn test_serializes_with_type_tag() {
        let json = serde_json::to_value(ProxyError::Transport("reset".into())).unwrap();
        assert_eq!(json["type"], "Transport");
        assert_eq!(json["message"], "reset");
    }
}
