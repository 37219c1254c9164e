//! Error types for Godwa

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GodwaError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

impl GodwaError {
    /// Classify a failed HTTP response by status code.
    pub fn from_status(status: u16, detail: String) -> Self {
        match status {
            401 | 403 => GodwaError::Unauthenticated(detail),
            404 => GodwaError::NotFound(detail),
            _ => GodwaError::Api { status, detail },
        }
    }
}

impl From<reqwest::Error> for GodwaError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GodwaError::Decode(e.to_string())
        } else {
            GodwaError::Network(e.to_string())
        }
    }
}

impl From<rusqlite::Error> for GodwaError {
    fn from(e: rusqlite::Error) -> Self {
        GodwaError::Database(e.to_string())
    }
}

impl serde::Serialize for GodwaError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
