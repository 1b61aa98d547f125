//! Error type shared by the codecs, samples and the
//! dataset managers.
//!
//! Completeness and label problems are not errors: they are
//! reported through the [`RunLog`](crate::log::RunLog) and
//! the offending prefix is dropped.
use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing keys, conflicting stage flags or invalid
    /// values in a JSON config.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A stage was invoked before `config()`.
    #[error("not configured: call `config()` first")]
    NotConfigured,

    /// An upstream stage did not complete, or a referenced
    /// input is missing.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Mutation attempted on a sample backed by input files.
    #[error("sample is read-only ({0}); build a data-backed sample with `Sample::from_data` to modify it")]
    ReadOnly(&'static str),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("unsupported recording extension: `{0}`")]
    UnsupportedFormat(String),

    #[error("could not decode {path:?}: {message}")]
    Codec { path: PathBuf, message: String },

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),
}

impl Error {
    pub(crate) fn codec(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Codec {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        Error::Precondition(message.into())
    }

    pub(crate) fn shape(message: impl Into<String>) -> Self {
        Error::ShapeMismatch(message.into())
    }
}
