use serde::{Deserialize, Serialize};

/// How the file bytes will reach the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadType {
    /// Multipart upload to object storage with delegated credentials.
    #[default]
    #[serde(rename = "UPLOAD_TYPE_RESUMABLE")]
    Resumable,
}

/// Object-storage provider requested for resumable uploads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provider {
    #[default]
    #[serde(rename = "PROVIDER_ALIYUN")]
    AliyunOss,
}

/// Lifecycle phase of the task returned by create-file.
///
/// Phases this client does not know are kept as their wire string so the
/// response can be handed back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskPhase {
    Pending,
    Running,
    Error,
    /// The service already holds the content; nothing needs transferring.
    Complete,
    Other(String),
}

impl TaskPhase {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PHASE_TYPE_PENDING",
            Self::Running => "PHASE_TYPE_RUNNING",
            Self::Error => "PHASE_TYPE_ERROR",
            Self::Complete => "PHASE_TYPE_COMPLETE",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for TaskPhase {
    fn from(s: String) -> Self {
        match s.as_str() {
            "PHASE_TYPE_PENDING" => Self::Pending,
            "PHASE_TYPE_RUNNING" => Self::Running,
            "PHASE_TYPE_ERROR" => Self::Error,
            "PHASE_TYPE_COMPLETE" => Self::Complete,
            _ => Self::Other(s),
        }
    }
}

impl From<TaskPhase> for String {
    fn from(phase: TaskPhase) -> Self {
        match phase {
            TaskPhase::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}
