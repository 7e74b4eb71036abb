//! External renderer bridge.
//!
//! The renderer is a standalone executable that consumes the export contract
//! JSON (`-input`) and writes the rendered output file (`-output`). The
//! bridge is synchronous: it serializes the contract to a temporary file,
//! runs the renderer to completion, and maps a non-zero exit status to an
//! error carrying the captured stderr.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use celldb_model::ExportDocument;
use tempfile::NamedTempFile;

use crate::{ExportError, Result};

/// Configuration for the renderer bridge.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Path to the renderer executable. A bare name searches PATH.
    pub renderer_path: PathBuf,
    /// Extra arguments appended after `-input`/`-output`.
    pub extra_args: Vec<String>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            renderer_path: PathBuf::from("celldb-renderer"),
            extra_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RendererBridge {
    config: RendererConfig,
}

impl RendererBridge {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn with_path(renderer_path: impl Into<PathBuf>) -> Self {
        Self {
            config: RendererConfig {
                renderer_path: renderer_path.into(),
                ..RendererConfig::default()
            },
        }
    }

    /// Render `document` to `output_path` by invoking the external renderer.
    pub fn export_to_file(&self, document: &ExportDocument, output_path: &Path) -> Result<()> {
        let mut input = NamedTempFile::new()?;
        serde_json::to_writer(&mut input, document)?;
        input.flush()?;

        let mut cmd = Command::new(&self.config.renderer_path);
        cmd.arg("-input")
            .arg(input.path())
            .arg("-output")
            .arg(output_path);
        for arg in &self.config.extra_args {
            cmd.arg(arg);
        }

        log::debug!("invoking renderer: {cmd:?}");
        let output = cmd.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ExportError::RendererNotFound(self.config.renderer_path.clone())
            } else {
                ExportError::Io(e)
            }
        })?;

        if !output.status.success() {
            return Err(ExportError::RendererFailed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }
}
