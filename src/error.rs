//! Error types for fallible setup paths
//!
//! Geometry and navigation never fail: they clamp. Only construction of
//! tokenizers and background workers can go wrong.

use thiserror::Error;

/// Errors raised while configuring document collaborators
#[derive(Debug, Error)]
pub enum EditorError {
    /// The highlight query did not compile against the language
    #[cfg(feature = "tree-sitter")]
    #[error("invalid tree-sitter query: {0}")]
    InvalidQuery(#[from] tree_sitter::QueryError),

    /// The parser rejected the language (ABI mismatch)
    #[cfg(feature = "tree-sitter")]
    #[error("incompatible tree-sitter language: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    /// The token index worker thread could not be started
    #[error("failed to spawn token worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}
