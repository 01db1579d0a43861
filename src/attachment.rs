//! Image attachments staged for the next send.
//!
//! A selected file is read and encoded entirely on the client; nothing is
//! uploaded until the next send carries it.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use base64::Engine;

use crate::error::{Error, Result};

/// Media type used when the extension is not a known image format.
pub const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// An image encoded as a base64 data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    path: PathBuf,
    media_type: String,
    byte_len: usize,
    data_uri: String,
}

impl ImageAttachment {
    /// Encode raw bytes as an attachment.
    pub fn from_bytes(path: impl Into<PathBuf>, media_type: impl Into<String>, bytes: &[u8]) -> Self {
        let media_type = media_type.into();
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self {
            path: path.into(),
            data_uri: format!("data:{media_type};base64,{payload}"),
            media_type,
            byte_len: bytes.len(),
        }
    }

    /// Read a file from disk and encode it.
    ///
    /// The media type is guessed from the extension. When `max_bytes` is set,
    /// larger files are rejected with a validation error.
    pub fn from_path<P: AsRef<Path>>(path: P, max_bytes: Option<u64>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .map_err(|err| Error::io(format!("failed to open {}", path.display()), err))?;
        if let Some(limit) = max_bytes {
            let len = file
                .metadata()
                .map_err(|err| Error::io(format!("failed to stat {}", path.display()), err))?
                .len();
            if len > limit {
                return Err(Error::validation(
                    format!("image is {len} bytes; the limit is {limit}"),
                    Some("image".to_string()),
                ));
            }
        }
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)
            .map_err(|err| Error::io(format!("failed to read {}", path.display()), err))?;
        Ok(Self::from_bytes(path, media_type_for(path), &buffer))
    }

    /// The file this attachment was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The media type embedded in the data URI.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Size of the image before encoding.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// The `data:<media-type>;base64,<payload>` form sent to the service.
    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }
}

/// Guess an image media type from a file extension.
pub fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        _ => FALLBACK_MEDIA_TYPE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn from_bytes_builds_data_uri() {
        let attachment = ImageAttachment::from_bytes("cat.png", "image/png", b"Hello World");
        assert_eq!(attachment.data_uri(), "data:image/png;base64,SGVsbG8gV29ybGQ=");
        assert_eq!(attachment.byte_len(), 11);
        assert_eq!(attachment.media_type(), "image/png");
        assert_eq!(attachment.path(), Path::new("cat.png"));
    }

    #[test]
    fn media_types_from_extension() {
        assert_eq!(media_type_for(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("a.webp")), "image/webp");
        assert_eq!(media_type_for(Path::new("a.svg")), "image/svg+xml");
        assert_eq!(media_type_for(Path::new("a.txt")), FALLBACK_MEDIA_TYPE);
        assert_eq!(media_type_for(Path::new("noext")), FALLBACK_MEDIA_TYPE);
    }

    #[test]
    fn from_path_reads_file() {
        let mut file = tempfile::Builder::new().suffix(".gif").tempfile().unwrap();
        file.write_all(b"GIF89a").unwrap();
        let attachment = ImageAttachment::from_path(file.path(), None).unwrap();
        assert_eq!(attachment.data_uri(), "data:image/gif;base64,R0lGODlh");
    }

    #[test]
    fn from_path_enforces_limit() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(&[0u8; 32]).unwrap();
        let err = ImageAttachment::from_path(file.path(), Some(16)).unwrap_err();
        assert!(err.is_validation());
        assert!(ImageAttachment::from_path(file.path(), Some(32)).is_ok());
    }

    #[test]
    fn from_path_missing_file() {
        let err = ImageAttachment::from_path("/definitely/not/here.png", None).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
