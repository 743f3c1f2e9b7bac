//! Error types shared by the documentation extensions.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocsError {
    /// Rendering a page as a template failed. Never swallowed: a page with
    /// unresolved template syntax must not reach the renderer.
    #[error("template error in '{docname}': {source}")]
    Template {
        docname: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("{file}:{line}: {directive} directive: {message}")]
    Directive {
        directive: String,
        file: String,
        line: usize,
        message: String,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no lexer registered for language '{0}'")]
    UnknownLexer(String),

    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl DocsError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DocsError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<::config::ConfigError> for DocsError {
    fn from(err: ::config::ConfigError) -> Self {
        DocsError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DocsError>;
