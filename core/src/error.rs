//! Error types for the Traceix client.
//!
//! # Design
//! The service reports application-level problems inside response bodies, so
//! HTTP status codes never appear here. `ApiError` only covers the cases
//! where no body can be handed back: bad inputs caught before dispatch,
//! transport breakdown, and local failures such as serialization or client
//! construction.

use thiserror::Error;

/// Errors returned by [`crate::TraceixClient`] operations and by
/// [`crate::ClientConfig`] construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No API key was provided and `TRACEIX_API_KEY` did not supply one.
    #[error("no API key provided (pass one explicitly or set TRACEIX_API_KEY)")]
    MissingApiKey,

    /// A search kind outside `capa` / `exif` was requested.
    #[error("unknown search kind `{kind}`, expected \"capa\" or \"exif\"")]
    InvalidSearchKind { kind: String },

    /// `check_status` was called with an empty job uuid.
    #[error("no job uuid provided")]
    MissingUuid,

    /// The request could not be delivered or its response could not be read:
    /// connect/TLS/read failures, an aborted response sink, an unreadable
    /// upload file, or a body that is not valid UTF-8.
    #[error("transport failure: {message}")]
    Transport { message: String },

    /// A local failure unrelated to the network, such as request
    /// serialization or HTTP client construction.
    #[error("internal failure: {message}")]
    Internal { message: String },
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ApiError::Internal {
                message: err.to_string(),
            }
        } else {
            ApiError::Transport {
                message: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_env_fallback() {
        let msg = ApiError::MissingApiKey.to_string();
        assert!(msg.contains("TRACEIX_API_KEY"), "{msg}");
    }

    #[test]
    fn display_includes_the_rejected_kind() {
        let err = ApiError::InvalidSearchKind {
            kind: "pdf".to_string(),
        };
        assert!(err.to_string().contains("`pdf`"));
    }

    #[test]
    fn display_includes_transport_detail() {
        let err = ApiError::Transport {
            message: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "transport failure: connection refused");
    }

    #[test]
    fn variants_compare_structurally() {
        assert_eq!(ApiError::MissingUuid, ApiError::MissingUuid);
        assert_ne!(
            ApiError::Transport {
                message: "a".to_string()
            },
            ApiError::Internal {
                message: "a".to_string()
            }
        );
    }
}
