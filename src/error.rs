//! Error types for campus-docs.

use std::io;
use thiserror::Error;

/// Result type alias for document operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while composing, rendering, protecting or storing documents.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed request or config JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The composer ran out of its page budget.
    #[error("Page limit of {0} reached")]
    PageLimit(usize),

    /// PDF serialisation failed.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Bitmap encoding or decoding failed.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// A snapshot view could not be captured.
    #[error("Rasterization error: {0}")]
    Raster(String),

    /// The encryption routine rejected the document.
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Object storage refused or lost the upload.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Font bytes could not be parsed.
    #[error("Font error: {0}")]
    Font(String),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<lopdf::Error> for Error {
    fn from(e: lopdf::Error) -> Self {
        Error::Encryption(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Storage(e.to_string())
    }
}
