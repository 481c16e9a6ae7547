//! Error types for marginalia operations.

use thiserror::Error;

/// Errors that can occur while loading a book or resolving a lookup.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The container descriptor or package document is absent or unreadable.
    /// Fatal for the load.
    #[error("Invalid EPUB: {0}")]
    MalformedArchive(String),

    /// An archive entry referenced by the book does not exist.
    #[error("Missing resource: {0}")]
    MissingResource(String),

    /// A network call was needed but the reader is offline and nothing is cached.
    #[error("{0}")]
    Unavailable(String),

    /// The generation endpoint could not be reached or answered with an error status.
    #[error("Generation request failed: {0}")]
    GenerationFailure(String),

    /// The generation endpoint answered successfully but the body was not understood.
    #[error("Unexpected generation response: {0}")]
    MalformedResponse(String),

    #[error("Not enough text to summarize ({len} of {min} characters)")]
    InsufficientText { len: usize, min: usize },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// True for failures isolated to a single lookup; false for failures that
    /// abort a whole load.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Unavailable(_)
                | Error::GenerationFailure(_)
                | Error::MalformedResponse(_)
                | Error::InsufficientText { .. }
        )
    }
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        Error::MalformedArchive(format!("XML parsing error: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
