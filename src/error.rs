use crate::billing::BillingError;

/// The main error type for plangate
#[derive(Debug, thiserror::Error)]
pub enum PlangateError {
    #[error(transparent)]
    Billing(#[from] BillingError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PlangateError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The billing error behind this error, if any.
    pub fn as_billing(&self) -> Option<&BillingError> {
        match self {
            Self::Billing(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type alias for plangate operations
pub type Result<T> = std::result::Result<T, PlangateError>;
