use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::error::{PipelineError, Result};

/// A raw image handed to the pipeline. Owned by the caller; nothing is
/// persisted beyond the blob-store relay step.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageAsset {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| PipelineError::Io(e.to_string()))?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| PipelineError::Validation(format!("not a file path: {:?}", path)))?;
        let content_type = path
            .extension()
            .map(|ext| content_type_for_extension(&ext.to_string_lossy()))
            .unwrap_or("application/octet-stream");

        Ok(Self::new(filename, content_type, bytes))
    }

    /// Transportable `data:<mime>;base64,...` encoding for inline transfer.
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            BASE64.encode(&self.bytes)
        )
    }
}

fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

/// One successful image analysis, keyed to its source by logical index so
/// association survives out-of-order completion.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub index: usize,
    pub filename: String,
    pub analysis: String,
}
