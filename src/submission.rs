use base64::{engine::general_purpose, Engine as _};
use image::ImageFormat;

use crate::error::ValidationError;

/// One selected photo: raw bytes plus the media type the browser declared for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageSubmission {
    bytes: Vec<u8>,
    media_type: String,
    file_name: Option<String>,
}

impl ImageSubmission {
    pub fn new(bytes: impl Into<Vec<u8>>, media_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: media_type.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Builds a submission from an uploaded form field.
    ///
    /// A declared `image/*` type is kept verbatim. A missing or generic type is
    /// sniffed from the bytes; if that fails the upload is rejected. Empty
    /// payloads pass through untouched so the controller can report them.
    pub fn from_upload(
        bytes: Vec<u8>,
        declared: Option<&str>,
        file_name: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let declared = declared.map(str::trim).filter(|t| !t.is_empty());

        let media_type = if bytes.is_empty() {
            declared.unwrap_or("application/octet-stream").to_string()
        } else {
            match declared {
                Some(t) if t.to_ascii_lowercase().starts_with("image/") => t.to_string(),
                other => sniff_media_type(&bytes)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        ValidationError::UnsupportedMedia(
                            other.unwrap_or("unknown").to_string(),
                        )
                    })?,
            }
        };

        Ok(Self {
            bytes,
            media_type,
            file_name: file_name.filter(|n| !n.is_empty()).map(str::to_string),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }

    /// Local preview reference for the selected image.
    pub fn preview_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.to_base64())
    }
}

fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
    let mime = match image::guess_format(bytes).ok()? {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        ImageFormat::Avif => "image/avif",
        ImageFormat::Ico => "image/x-icon",
        _ => return None,
    };
    Some(mime)
}
