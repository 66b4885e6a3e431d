use std::path::Path;

use tracing::{debug, warn};

use crate::utils::data_uri::DataUri;

pub const UNREADABLE_FILE_MESSAGE: &str = "We could not read that file. Please try again.";
pub const NOT_AN_IMAGE_MESSAGE: &str = "Please choose an image file.";

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("{}", UNREADABLE_FILE_MESSAGE)]
    Unreadable(#[source] std::io::Error),
    #[error("{}", NOT_AN_IMAGE_MESSAGE)]
    NotAnImage { detected: Option<String> },
}

pub fn detect_mime_type(data: &[u8]) -> Option<String> {
    if data.len() > 12 {
        let ftyp = &data[4..12];
        if ftyp.starts_with(b"ftyp") {
            let brand = &ftyp[4..8];
            if brand == b"heic" || brand == b"heix" || brand == b"hevc" {
                return Some("image/heic".to_string());
            }
            if brand == b"heif" || brand == b"mif1" {
                return Some("image/heif".to_string());
            }
        }
    }

    infer::get(data).map(|kind| kind.mime_type().to_string())
}

pub fn normalize_image_mime_type(mime_type: &str) -> String {
    let lowered = mime_type.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        "image/x-png" => "image/png".to_string(),
        _ => lowered,
    }
}

/// Image types Gemini accepts as inline data.
pub fn gemini_supports_image_mime(mime_type: &str) -> bool {
    matches!(
        mime_type,
        "image/png" | "image/jpeg" | "image/webp" | "image/heic" | "image/heif"
    )
}

pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/heic" => "heic",
        "image/heif" => "heif",
        "image/gif" => "gif",
        _ => "png",
    }
}

/// Reads a room photo from disk into a data URI, rejecting anything that does
/// not sniff as an image.
pub async fn load_image_file(path: &Path) -> Result<DataUri, CaptureError> {
    let bytes = tokio::fs::read(path).await.map_err(|err| {
        warn!("Failed to read image file {}: {}", path.display(), err);
        CaptureError::Unreadable(err)
    })?;

    let detected = detect_mime_type(&bytes);
    let Some(mime_type) = detected
        .as_deref()
        .map(normalize_image_mime_type)
        .filter(|mime| mime.starts_with("image/"))
    else {
        warn!(
            "Rejected non-image file {} (detected={:?})",
            path.display(),
            detected
        );
        return Err(CaptureError::NotAnImage { detected });
    };

    debug!(
        "Loaded image file {} ({} bytes, {})",
        path.display(),
        bytes.len(),
        mime_type
    );
    Ok(DataUri::from_bytes(&mime_type, &bytes))
}

#[cfg(test)]
pub(crate) const PNG_HEADER: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D',
    b'R', 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01,
];
