use thiserror::Error;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Backend request failed: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {message}")]
    Store { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid number: {token} (valid tokens are 0, 00 and 1..36)")]
    InvalidNumber { token: String },

    #[error("Number {token} is already used in this ticket")]
    DuplicateNumber { token: String },

    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl PoolError {
    /// Configuration failures kill the session; everything else is
    /// recoverable at the call site.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PoolError::Config { .. })
    }

    /// Validation failures are recovered locally: the offending input is
    /// rejected and the previous value stays in place.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PoolError::InvalidNumber { .. }
                | PoolError::DuplicateNumber { .. }
                | PoolError::Validation { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PoolError>;
