//! Error types for Penny

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Sign violation: {0}")]
    SignViolation(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Unknown classification: {0}")]
    UnknownClassification(String),

    #[error("Malformed ledger file: {0}")]
    MalformedData(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Statement import error: {0}")]
    Import(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Oracle unavailable: {0}")]
    Oracle(String),

    #[error("Malformed oracle response: {0}")]
    OracleResponse(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
