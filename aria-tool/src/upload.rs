use std::path::Path;

use tracing::debug;

use crate::error::AriaError;

const UNKNOWN_MIME: &str = "application/octet-stream";

/// A file picked for upload, typed by its content rather than its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub media_type: String,
    pub data: Vec<u8>,
}

impl Upload {
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let media_type = infer::get(&data)
            .map(|kind| kind.mime_type())
            .unwrap_or(UNKNOWN_MIME)
            .to_string();
        Self { media_type, data }
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

pub fn read_upload(path: &Path) -> Result<Upload, AriaError> {
    let data = std::fs::read(path)?;
    let upload = Upload::from_bytes(data);
    debug!(path = %path.display(), media_type = %upload.media_type, bytes = upload.data.len(), "Read upload");
    Ok(upload)
}

/// Accepts paths pasted with surrounding quotes or a leading `~/`.
pub fn expand_path(raw: &str) -> std::path::PathBuf {
    let trimmed = raw.trim().trim_matches(|c| c == '"' || c == '\'');
    match trimmed.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| trimmed.into()),
        None => trimmed.into(),
    }
}
