use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where the bytes of a selected file live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContents {
    Disk(PathBuf),
    Memory(Arc<[u8]>),
}

impl FileContents {
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        match self {
            FileContents::Disk(path) => tokio::fs::read(path).await,
            FileContents::Memory(bytes) => Ok(bytes.to_vec()),
        }
    }
}

/// A file picked by the user, described the way the backend will see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub contents: FileContents,
}

impl SelectedFile {
    /// Describes a file on disk. The MIME type is guessed from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self {
            name,
            mime_type,
            size_bytes: metadata.len(),
            contents: FileContents::Disk(path.to_path_buf()),
        })
    }

    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size_bytes: bytes.len() as u64,
            contents: FileContents::Memory(bytes.into()),
        }
    }
}

/// Identifier the backend assigns to an uploaded document. The wire format
/// allows either a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawId")]
pub struct DocumentId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl From<RawId> for DocumentId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => DocumentId(n.to_string()),
            RawId::Text(s) => DocumentId(s),
        }
    }
}

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        DocumentId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for DocumentId {
    fn from(id: i64) -> Self {
        DocumentId(id.to_string())
    }
}

/// Processing state as reported by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ProcessingStatus {
    Processing,
    Done,
    Failed,
    /// Any other in-progress value the backend reports (e.g. "queued").
    Other(String),
}

impl From<String> for ProcessingStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "processing" => ProcessingStatus::Processing,
            "done" => ProcessingStatus::Done,
            "failed" => ProcessingStatus::Failed,
            _ => ProcessingStatus::Other(raw),
        }
    }
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Done => "done",
            ProcessingStatus::Failed => "failed",
            ProcessingStatus::Other(raw) => raw,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingStatus::Done | ProcessingStatus::Failed)
    }

    pub fn phase(&self) -> Phase {
        match self {
            ProcessingStatus::Done => Phase::Done,
            ProcessingStatus::Failed => Phase::Failed,
            _ => Phase::Processing,
        }
    }
}

/// Body of `GET {base}/status/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusReport {
    pub status: ProcessingStatus,
    #[serde(default)]
    pub summary: Option<serde_json::Value>,
}

/// Body of a successful `POST {base}/upload`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadReceipt {
    pub id: DocumentId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Uploading,
    Processing,
    Done,
    Failed,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Uploading => "uploading",
            Phase::Processing => "processing",
            Phase::Done => "done",
            Phase::Failed => "failed",
        }
    }
}
