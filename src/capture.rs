//! Still-image acquisition.
//!
//! The command line has no camera, so a photo is "captured" by reading an
//! image file. The bytes are checked against the size limit and encoded as
//! a data URI, the form records carry photos in.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::export::image::encode_data_uri;
use crate::validate::MAX_IMAGE_BYTES;

/// Failures while acquiring an image.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("permission denied reading {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("cannot read {}: {source}", .path.display())]
    Device {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is {size} bytes, the maximum is {max}", .path.display(), max = MAX_IMAGE_BYTES)]
    TooLarge { path: PathBuf, size: u64 },

    #[error("{} is not a supported image (png, jpg, jpeg, webp, gif)", .0.display())]
    UnsupportedFormat(PathBuf),
}

/// MIME type for a photo file, by extension.
#[must_use]
pub fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Read an image file into a `data:<mime>;base64,...` URI.
///
/// # Errors
///
/// Returns [`CaptureError::PermissionDenied`] when the file may not be read,
/// [`CaptureError::TooLarge`] above the photo size limit, and
/// [`CaptureError::Device`] for any other read failure.
pub fn load_image(path: &Path) -> Result<String, CaptureError> {
    let mime = mime_for(path).ok_or_else(|| CaptureError::UnsupportedFormat(path.to_path_buf()))?;

    let io_error = |source: std::io::Error| match source.kind() {
        ErrorKind::PermissionDenied => CaptureError::PermissionDenied(path.to_path_buf()),
        _ => CaptureError::Device {
            path: path.to_path_buf(),
            source,
        },
    };

    let size = fs::metadata(path).map_err(io_error)?.len();
    if size > MAX_IMAGE_BYTES as u64 {
        return Err(CaptureError::TooLarge {
            path: path.to_path_buf(),
            size,
        });
    }

    let bytes = fs::read(path).map_err(io_error)?;
    debug!(path = %path.display(), size = bytes.len(), mime, "Loaded image");

    Ok(encode_data_uri(mime, &bytes))
}
