use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("No quotes available to calculate average")]
    NoQuotes,

    #[error("No valid quotes available to calculate average")]
    NoValidQuotes,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("{0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, QuoteError>;
