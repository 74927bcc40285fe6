//! Error types for specter-core

use thiserror::Error;

/// Main error type for the specter-core library.
///
/// Every value of this type is fatal to the session it belongs to.
/// Record-local problems (undecodable bytes, malformed payloads,
/// unrecognized shapes) never surface as an `Error`; the decoder and
/// classifier drop them with a tracing warning instead.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport error (connection failure, stream read error)
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success response from the analysis service
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response-stream framing error (an unterminated record exceeding
    /// the decoder's buffer cap)
    #[error("stream error: {0}")]
    Stream(String),
}

/// Result type alias for specter-core
pub type Result<T> = std::result::Result<T, Error>;
