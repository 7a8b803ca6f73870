//! Error types for the puckcast analytics core.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PuckError>;

#[derive(Error, Debug)]
pub enum PuckError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parsing failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("invalid stat: {stat}")]
    InvalidStat { stat: String },

    #[error("invalid date: {value}")]
    InvalidDate { value: String },

    #[error("unknown team: {team}")]
    UnknownTeam { team: String },

    #[error("player not found: {name}")]
    PlayerNotFound { name: String },

    #[error("an update job is already running")]
    UpdateInProgress,

    #[error("text generation failed: {message}")]
    Generator { message: String },
}

impl From<chrono::ParseError> for PuckError {
    fn from(err: chrono::ParseError) -> Self {
        PuckError::InvalidDate {
            value: err.to_string(),
        }
    }
}
