use std::path::Path;
use std::sync::Arc;

const OCTET_STREAM: &str = "application/octet-stream";

/// A file handed to the pipeline. Bytes are shared, so clones are cheap.
#[derive(Clone, PartialEq)]
pub struct MediaFile {
    pub name: String,
    pub mime: String,
    pub bytes: Arc<[u8]>,
}

impl MediaFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// Build from bytes, guessing the mime type from the file name
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let name = name.into();
        let mime = guess_mime(&name);
        Self::new(name, mime, bytes)
    }

    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());

        Ok(Self::from_bytes(name, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Name with the extension swapped, used after re-encoding
    pub fn renamed_with_extension(&self, extension: &str) -> String {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => format!("{}.{}", stem, extension),
            _ => format!("{}.{}", self.name, extension),
        }
    }
}

impl std::fmt::Debug for MediaFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaFile")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("size", &self.bytes.len())
            .finish()
    }
}

fn guess_mime(name: &str) -> String {
    image::ImageFormat::from_path(name)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| OCTET_STREAM.to_string())
}
