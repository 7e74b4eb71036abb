//! Export pipeline for celldb projects.
//!
//! Reads a stored project back into the renderer's JSON contract
//! ([`celldb_model::ExportDocument`]) and hands it to the external renderer
//! executable. The builder tolerates partially damaged entities: one bad
//! chart or style never blocks the export of the rest.

use std::path::PathBuf;

use celldb_storage::StorageError;
use thiserror::Error;

pub mod contract;
pub mod renderer;

pub use contract::{build_export_document, dense_matrix};
pub use renderer::{RendererBridge, RendererConfig};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("renderer executable not found: {0}")]
    RendererNotFound(PathBuf),
    #[error("renderer exited with {status}: {stderr}")]
    RendererFailed {
        status: std::process::ExitStatus,
        stderr: String,
    },
}

pub type Result<T> = std::result::Result<T, ExportError>;
