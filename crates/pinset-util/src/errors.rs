use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for pinset front-end operations.
///
/// Resolution failures keep their own structured error from `pinset-resolver`
/// and are reported through miette directly.
#[derive(Debug, Error, Diagnostic)]
pub enum PinsetError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed configuration (e.g. pinset.toml).
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check the [resolver] table in your pinset.toml"))]
    Config { message: String },

    /// The package index could not be loaded.
    #[error("Index error: {message}")]
    Index { message: String },

    /// A requirement given on the command line could not be parsed.
    #[error("Invalid requirement: {message}")]
    Requirement { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}
