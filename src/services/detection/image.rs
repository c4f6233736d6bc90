//! Frame payload decoding

use super::DetectionError;
use base64::{engine::general_purpose::STANDARD, Engine as _};

const DATA_URL_KINDS: [&str; 3] = ["png", "jpeg", "jpg"];

/// Encoded image bytes of a single frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameImage {
    pub bytes: Vec<u8>,
    /// e.g. `image/png` when the payload was a data URL
    pub mime: Option<String>,
}

impl FrameImage {
    /// Accepts raw base64 or a `data:image/(png|jpeg|jpg);base64,` URL
    pub fn from_data_url(data: &str) -> Result<Self, DetectionError> {
        let data = data.trim();
        let (mime, encoded) = match strip_data_url(data) {
            Some((kind, rest)) => (Some(format!("image/{}", kind)), rest),
            None => (None, data),
        };

        if encoded.is_empty() {
            return Err(DetectionError::InvalidImage("empty image payload".to_string()));
        }

        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| DetectionError::InvalidImage(e.to_string()))?;

        Ok(Self { bytes, mime })
    }

    pub fn content_type(&self) -> &str {
        self.mime.as_deref().unwrap_or("application/octet-stream")
    }
}

fn strip_data_url(data: &str) -> Option<(&'static str, &str)> {
    let rest = data.strip_prefix("data:image/")?;
    DATA_URL_KINDS.iter().find_map(|kind| {
        rest.strip_prefix(kind)
            .and_then(|r| r.strip_prefix(";base64,"))
            .map(|encoded| (*kind, encoded))
    })
}
