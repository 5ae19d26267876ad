use std::io;

/// All error types for model import and flattening.
#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("Import error: {0}")]
    Import(String),
    #[error("Nothing to render: flattening produced no geometry")]
    EmptyResult,
    #[error("Unknown stream: \"{0}\"")]
    UnknownStream(String),
    #[error("Unknown texture type: \"{0}\" (expected UV, linear or spheremap)")]
    UnknownTextureType(String),
    #[error("No scene loaded")]
    NoScene,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ModelError>;
