//! Error types for Expense Guardian

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Out-of-contract input: negative amount, out-of-range score,
    /// unscored record handed to the aggregator.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
