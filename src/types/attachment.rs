use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// An image selected for upload but not yet submitted.
///
/// The payload is held as bare base64 so it can go straight into a request
/// body; [`Attachment::data_uri`] produces the form shown in the message list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// The base64-encoded image bytes.
    pub data: String,

    /// The media type of the image.
    pub mime_type: String,

    /// The name of the file the image came from.
    pub file_name: String,
}

impl Attachment {
    /// Create a new attachment from already-encoded data.
    pub fn new(
        data: impl Into<String>,
        mime_type: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
            file_name: file_name.into(),
        }
    }

    /// Create an attachment from raw bytes, sniffing the media type.
    pub fn from_bytes(bytes: &[u8], file_name: impl Into<String>) -> Self {
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            mime_type: sniff_mime_type(bytes).to_string(),
            file_name: file_name.into(),
        }
    }

    /// Create an attachment from a file path.
    ///
    /// The media type is determined from the file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let path = path.as_ref();

        let mime_type = match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            _ => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "Unsupported file extension. Must be jpeg, png, gif, or webp",
                ));
            }
        };

        let mut file = File::open(path)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("image")
            .to_string();

        Ok(Self {
            data: base64::engine::general_purpose::STANDARD.encode(&buffer),
            mime_type: mime_type.to_string(),
            file_name,
        })
    }

    /// The attachment as a `data:` URI.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// The base64 payload of `image`, which may be bare or a `data:` URI.
pub fn strip_data_uri(image: &str) -> &str {
    let image = image.trim();
    match image.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => image,
    }
}

/// Guess the MIME type of encoded image bytes, defaulting to JPEG.
pub fn sniff_mime_type(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(image::ImageFormat::Png) => "image/png",
        Ok(image::ImageFormat::Gif) => "image/gif",
        Ok(image::ImageFormat::WebP) => "image/webp",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0];

    #[test]
    fn data_uri() {
        let attachment = Attachment::new("AAAA", "image/png", "cat.png");
        assert_eq!(attachment.data_uri(), "data:image/png;base64,AAAA");
    }

    #[test]
    fn from_bytes_sniffs_png() {
        let attachment = Attachment::from_bytes(PNG_MAGIC, "x.png");
        assert_eq!(attachment.mime_type, "image/png");
        assert_eq!(attachment.file_name, "x.png");
    }

    #[test]
    fn strips_data_uri() {
        assert_eq!(strip_data_uri("data:image/png;base64,AAAA"), "AAAA");
        assert_eq!(strip_data_uri("  AAAA\n"), "AAAA");
        assert_eq!(strip_data_uri("notdata:x;base64,AAAA"), "notdata:x;base64,AAAA");
    }

    #[test]
    fn unknown_bytes_default_to_jpeg() {
        assert_eq!(sniff_mime_type(b"not an image"), "image/jpeg");
    }

    #[test]
    fn from_path_rejects_unknown_extension() {
        let err = Attachment::from_path("notes.txt").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }

    #[test]
    fn from_path_reads_file() {
        let path = std::env::temp_dir().join(format!("geminichat-{}.PNG", std::process::id()));
        std::fs::write(&path, PNG_MAGIC).unwrap();
        let attachment = Attachment::from_path(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(attachment.mime_type, "image/png");
        assert_eq!(
            attachment.data,
            base64::engine::general_purpose::STANDARD.encode(PNG_MAGIC)
        );
    }
}
