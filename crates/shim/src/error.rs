use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Processor error: {message}")]
    Process { message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// True when the error came from cancellation of the call context.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
