//! Error types for the carousel renderer
//!
//! Decode failures are recoverable and never leave the decode worker;
//! GPU pipeline failures are fatal at construction time.

use thiserror::Error;

/// Failure reported by a [`DataProvider`](crate::provider::DataProvider)
/// when it cannot produce artwork for an index.
#[derive(Debug, Error)]
pub enum ArtworkError {
    /// The item has no artwork.
    #[error("No artwork available")]
    Missing,

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// The returned pixel buffer does not match its declared dimensions.
    #[error("Invalid pixel buffer: {0}")]
    InvalidBuffer(String),
}

/// GPU-side failures.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("No compatible GPU adapter found")]
    NoAdapter,

    #[error("Failed to acquire GPU device: {0}")]
    Device(String),

    /// Shader compilation or pipeline linking failed. Fatal: no frame can be
    /// produced without a working program.
    #[error("Shader or pipeline creation failed: {0}")]
    Shader(String),

    #[error("Texture creation failed: {0}")]
    Texture(String),
}

/// Unrecoverable renderer construction errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),

    #[error("Failed to start decode workers")]
    Scheduler(#[source] std::io::Error),
}

/// Result type for renderer construction.
pub type Result<T> = std::result::Result<T, RendererError>;
