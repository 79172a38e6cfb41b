use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

/// An image attached to a user turn, held as base64 so it can be inlined as a data URL.
///
/// The size of the image is never checked locally; the server decides whether it is
/// acceptable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageReference {
    /// The base64-encoded data of the image.
    pub data: String,

    /// The media type of the image.
    pub media_type: ImageMediaType,
}

/// Supported image media types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ImageMediaType {
    #[serde(rename = "image/jpeg")]
    Jpeg,

    #[serde(rename = "image/png")]
    Png,

    #[serde(rename = "image/gif")]
    Gif,

    #[serde(rename = "image/webp")]
    Webp,
}

impl ImageMediaType {
    /// Guess the media type from a file extension, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageMediaType::Jpeg),
            "png" => Some(ImageMediaType::Png),
            "gif" => Some(ImageMediaType::Gif),
            "webp" => Some(ImageMediaType::Webp),
            _ => None,
        }
    }

    /// The MIME string for this media type.
    pub fn as_mime(&self) -> &'static str {
        match self {
            ImageMediaType::Jpeg => "image/jpeg",
            ImageMediaType::Png => "image/png",
            ImageMediaType::Gif => "image/gif",
            ImageMediaType::Webp => "image/webp",
        }
    }
}

impl fmt::Display for ImageMediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_mime())
    }
}

impl ImageReference {
    /// Create a new ImageReference from already-encoded base64 data.
    pub fn new(data: String, media_type: ImageMediaType) -> Self {
        Self { data, media_type }
    }

    /// Encode raw image bytes.
    pub fn from_bytes(bytes: &[u8], media_type: ImageMediaType) -> Self {
        let data = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self { data, media_type }
    }

    /// Read and encode an image file.
    ///
    /// The media type is determined from the file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let media_type = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ImageMediaType::from_extension)
            .ok_or_else(|| {
                Error::validation(
                    format!(
                        "unsupported image type for {}; must be jpeg, png, gif, or webp",
                        path.display()
                    ),
                    Some("image".to_string()),
                )
            })?;

        let mut file = File::open(path)
            .map_err(|err| Error::io(format!("failed to open {}", path.display()), err))?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)
            .map_err(|err| Error::io(format!("failed to read {}", path.display()), err))?;

        Ok(Self::from_bytes(&buffer, media_type))
    }

    /// Render as a `data:` URL suitable for an `image_url` content part.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type.as_mime(), self.data)
    }

    /// Number of base64 characters carried.
    pub fn encoded_len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn data_url() {
        let image = ImageReference::from_bytes(b"Hello World", ImageMediaType::Png);
        assert_eq!(image.data, "SGVsbG8gV29ybGQ=");
        assert_eq!(image.to_data_url(), "data:image/png;base64,SGVsbG8gV29ybGQ=");
    }

    #[test]
    fn extension_is_case_insensitive() {
        assert_eq!(
            ImageMediaType::from_extension("JPG"),
            Some(ImageMediaType::Jpeg)
        );
        assert_eq!(
            ImageMediaType::from_extension("webp"),
            Some(ImageMediaType::Webp)
        );
        assert_eq!(ImageMediaType::from_extension("bmp"), None);
    }

    #[test]
    fn from_path_reads_file() {
        let mut file = tempfile::Builder::new().suffix(".jpeg").tempfile().unwrap();
        file.write_all(b"Hello World").unwrap();
        let image = ImageReference::from_path(file.path()).unwrap();
        assert_eq!(image.media_type, ImageMediaType::Jpeg);
        assert_eq!(image.data, "SGVsbG8gV29ybGQ=");
    }

    #[test]
    fn from_path_rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let err = ImageReference::from_path(file.path()).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn from_path_missing_file() {
        let err = ImageReference::from_path("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
