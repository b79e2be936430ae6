use thiserror::Error;

/// Core domain errors - no I/O dependencies
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FlavorError {
    #[error("Invalid sort key: '{0}'")]
    InvalidSortKey(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, FlavorError>;
