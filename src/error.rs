//! Error taxonomy for the bundler integration.
//!
//! Failures from the compiler or from caller-supplied hooks are carried
//! through unchanged so the host can report them with their original text.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by resolve/load handlers and the compiler session.
#[derive(Debug, Error)]
pub enum Error {
    /// Compiler session used after the build disposed it.
    #[error("compiler session is closed")]
    SessionClosed,

    /// CSS requested for a file the compiler never processed.
    ///
    /// The message is the compiler's own text, passed through verbatim.
    #[error("{message}")]
    UnknownCssTarget { path: String, message: String },

    /// Compiler failed while evaluating or rewriting a source file.
    #[error("{message}")]
    TransformFailure { path: PathBuf, message: String },

    /// Caller-supplied CSS transform rejected.
    ///
    /// Holds the transform's own error, source chain included.
    #[error(transparent)]
    PostProcessFailure(anyhow::Error),

    /// Virtual CSS path does not follow `<path>.vanilla.css[?query]`.
    #[error("invalid virtual CSS path `{0}`")]
    InvalidVirtualPath(String),

    /// No handler or default behavior could load the module.
    #[error("no loader for `{path}` in namespace `{namespace}`")]
    NoLoader { path: String, namespace: String },

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}

impl Error {
    /// Build the compiler's "unknown file" failure.
    pub fn unknown_css_target(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::UnknownCssTarget {
            message: format!("No CSS for file: {path}"),
            path,
        }
    }

    /// A post-processing failure described by `message` alone.
    pub fn post_process(message: impl Into<String>) -> Self {
        Self::PostProcessFailure(anyhow::Error::msg(message.into()))
    }

    pub fn transform(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::TransformFailure {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
