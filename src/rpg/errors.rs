use thiserror::Error;

/// Errors that can arise while running RPG and economy commands.
#[derive(Debug, Error)]
pub enum RpgError {
    /// Unknown user, item, quest or shop id.
    #[error("not found: {0}")]
    NotFound(String),

    /// Non-positive amounts, unrecognized class or item, malformed options.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A debit would drive a balance negative.
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    /// Player level is below a requirement.
    #[error("level {required} required (current level {current})")]
    InsufficientLevel { required: u32, current: u32 },

    /// A quest is already active for this user.
    #[error("already in progress: {0}")]
    AlreadyInProgress(String),

    /// A command is still cooling down.
    #[error("cooldown active: {seconds}s remaining")]
    Cooldown { seconds: u64 },

    /// Audio source or persistence I/O failure.
    #[error("external failure: {0}")]
    ExternalFailure(String),

    /// Wrapper around IO errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper around JSON (de)serialization errors.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unexpected condition that the static tables should make impossible.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RpgError {
    /// Precondition failures are shown to the caller verbatim; everything else
    /// becomes a generic failure reply at the router boundary.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            RpgError::NotFound(_)
                | RpgError::InvalidInput(_)
                | RpgError::InsufficientFunds { .. }
                | RpgError::InsufficientLevel { .. }
                | RpgError::AlreadyInProgress(_)
                | RpgError::Cooldown { .. }
        )
    }
}
