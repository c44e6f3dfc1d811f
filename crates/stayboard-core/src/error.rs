use thiserror::Error;

/// Failures the calendar and urgency core can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Malformed month, year, date or time input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A booking carries no usable date for its kind.
    #[error("booking has no usable date")]
    MissingDate,
}

impl CoreError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
