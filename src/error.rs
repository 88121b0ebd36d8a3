use thiserror::Error;

/// Typed error kinds surfaced by the core, per the error handling design.
///
/// The HTTP boundary maps these onto status codes; the engine maps them
/// onto fallback behavior (snapshot reuse vs. hard failure).
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("upstream response invalid: {0}")]
    UpstreamInvalid(String),

    /// Upstream parsed with no `BEGIN:VEVENT`. §7 resolves this via
    /// fallback-to-snapshot or proceed-with-empty-parse, never a hard
    /// failure, so `engine::process` never returns this variant — it
    /// exists so callers matching on `CoreError` can name the condition.
    #[error("upstream feed parsed to zero events: {0}")]
    UpstreamEmpty(String),

    #[error("state store unavailable: {0}")]
    StateStoreUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn internal(msg: impl Into<String>) -> Self {
        CoreError::Internal(msg.into())
    }
}
