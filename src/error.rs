//! Client-side error taxonomy

use thiserror::Error;

/// Every way a backend call or its preconditions can fail.
///
/// Messages are kept as strings so the error can travel across the actor
/// channels and be cloned into render state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// No response at all (refused, reset, DNS, timeout)
    #[error("{0}")]
    Transport(String),

    /// The server answered with a non-2xx status
    #[error("server returned {status}{}", .detail.as_ref().map(|d| format!(": {}", d)).unwrap_or_default())]
    Server { status: u16, detail: Option<String> },

    /// A precondition checked before any request was made
    #[error("{0}")]
    Validation(String),

    /// The body was not the JSON we expected
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Text to show a person: server detail when present, else `fallback`
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Server {
                detail: Some(detail),
                ..
            } => detail.clone(),
            ApiError::Validation(msg) => msg.clone(),
            _ => fallback.to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else if e.is_timeout() {
            ApiError::Transport(String::from("Request timed out"))
        } else if e.is_connect() {
            ApiError::Transport(format!("Connection failed: {}", e))
        } else {
            ApiError::Transport(format!("Request failed: {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_detail() {
        let err = ApiError::Server {
            status: 404,
            detail: Some("Queue item not found".into()),
        };
        assert_eq!(err.user_message("Failed to cancel"), "Queue item not found");
        assert_eq!(err.to_string(), "server returned 404: Queue item not found");

        let bare = ApiError::Server {
            status: 500,
            detail: None,
        };
        assert_eq!(bare.user_message("Failed to cancel"), "Failed to cancel");
        assert_eq!(
            ApiError::Transport("boom".into()).user_message("Network issue"),
            "Network issue"
        );
    }
}
