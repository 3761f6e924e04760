use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{FOLDER_TYPE_NORMAL, KIND_FILE};
use crate::types::{Provider, TaskPhase, UploadType};

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// What the client intends to upload. Built once per upload and sent once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadIntent {
    /// GCID of the file content.
    pub digest: String,
    pub name: String,
    pub size: u64,
    /// Destination folder; `None` means the drive root.
    pub parent_id: Option<String>,
    pub upload_type: UploadType,
    pub provider: Provider,
}

impl UploadIntent {
    /// Creates a resumable upload intent backed by Aliyun OSS.
    pub fn resumable(
        digest: impl Into<String>,
        name: impl Into<String>,
        size: u64,
        parent_id: Option<String>,
    ) -> Self {
        Self {
            digest: digest.into(),
            name: name.into(),
            size,
            parent_id,
            upload_type: UploadType::Resumable,
            provider: Provider::AliyunOss,
        }
    }
}

/// Body of `POST /drive/v1/files`.
///
/// `size` travels as a decimal string; the root folder is an empty `parent_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateFileRequest {
    pub kind: String,
    pub id: String,
    pub parent_id: String,
    pub name: String,
    #[serde(with = "size_string")]
    pub size: u64,
    pub hash: String,
    pub upload_type: UploadType,
    pub folder_type: String,
    pub resumable: ResumableRequest,
}

/// Provider selection nested in the create-file request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumableRequest {
    pub provider: Provider,
}

impl From<&UploadIntent> for CreateFileRequest {
    fn from(intent: &UploadIntent) -> Self {
        Self {
            kind: KIND_FILE.into(),
            id: String::new(),
            parent_id: intent.parent_id.clone().unwrap_or_default(),
            name: intent.name.clone(),
            size: intent.size,
            hash: intent.digest.clone(),
            upload_type: intent.upload_type,
            folder_type: FOLDER_TYPE_NORMAL.into(),
            resumable: ResumableRequest {
                provider: intent.provider,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Response to create-file.
///
/// Either `task.phase` is complete (the content was deduplicated) or
/// `resumable.params` carries the delegated object-storage credentials.
/// Fields without a typed counterpart land in `extra`, so serializing a
/// parsed response reproduces the body the service sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateFileResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<Task>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resumable: Option<Resumable>,
    /// File metadata as returned by the service, kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CreateFileResponse {
    /// Returns `true` when the service reports the upload as already done.
    pub fn is_complete(&self) -> bool {
        self.task
            .as_ref()
            .is_some_and(|t| t.phase == Some(TaskPhase::Complete))
    }

    /// Resumable parameters, if the service issued any.
    pub fn resumable_params(&self) -> Option<&ResumableParams> {
        self.resumable.as_ref().and_then(|r| r.params.as_ref())
    }

    /// Identifier of the created file, from `file.id` or `task.file_id`.
    pub fn file_id(&self) -> Option<&str> {
        self.file
            .as_ref()
            .and_then(|f| f.get("id"))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.task
                    .as_ref()
                    .and_then(|t| t.file_id.as_deref())
                    .filter(|s| !s.is_empty())
            })
    }
}

/// Server-side task tracking the upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<TaskPhase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Resumable upload descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resumable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<ResumableParams>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Raw resumable parameters. Every field is optional on the wire; the
/// uploader decides which ones are mandatory.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumableParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl fmt::Debug for ResumableParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResumableParams")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .field("security_token", &"<redacted>")
            .field("key", &self.key)
            .field("expiration", &self.expiration)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

mod size_string {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Text(String),
        Number(u64),
    }

    pub fn serialize<S: Serializer>(size: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&size.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Size::deserialize(deserializer)? {
            Size::Text(s) => s.parse().map_err(serde::de::Error::custom),
            Size::Number(n) => Ok(n),
        }
    }
}
