//! Router failure taxonomy.

/// Body text for every upstream failure. Callers never see the cause.
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Failed to process chat request";
pub const INVALID_REQUEST_MESSAGE: &str = "Invalid chat request";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("knowledge base unavailable: {0}")]
    LookupUnavailable(String),
    #[error("generation unavailable: {0}")]
    GenerationUnavailable(String),
    #[error("generation returned no usable text")]
    GenerationEmpty,
}

impl RouterError {
    /// Only a malformed request is the caller's fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, RouterError::InvalidRequest(_))
    }

    pub fn public_message(&self) -> &'static str {
        if self.is_client_error() {
            INVALID_REQUEST_MESSAGE
        } else {
            UPSTREAM_FAILURE_MESSAGE
        }
    }

    /// Stable label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            RouterError::InvalidRequest(_) => "invalid_request",
            RouterError::LookupUnavailable(_) => "lookup_unavailable",
            RouterError::GenerationUnavailable(_) => "generation_unavailable",
            RouterError::GenerationEmpty => "generation_empty",
        }
    }
}
