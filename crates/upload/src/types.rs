//! Data types for the upload flow.

use pikup_oss::PartRecord;
use pikup_protocol::CreateFileResponse;
use pikup_transfer::DEFAULT_PART_SIZE;

/// Knobs for one [`UploadSession`](crate::UploadSession).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Bytes per multipart part; 0 selects the 5 MiB default.
    pub part_size: usize,
    /// Abort the multipart upload when a part, the completion or the
    /// session itself fails after initialization.
    pub abort_on_failure: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_PART_SIZE,
            abort_on_failure: true,
        }
    }
}

/// How an upload ended.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// The service already had the content; no bytes were transferred.
    AlreadyComplete(CreateFileResponse),
    /// Every part was uploaded and the multipart upload completed.
    ///
    /// `response` is the create-file response, unchanged.
    Completed {
        response: CreateFileResponse,
        parts: Vec<PartRecord>,
    },
}

impl UploadOutcome {
    /// The create-file response the outcome carries.
    pub fn response(&self) -> &CreateFileResponse {
        match self {
            Self::AlreadyComplete(response) | Self::Completed { response, .. } => response,
        }
    }

    pub fn is_deduplicated(&self) -> bool {
        matches!(self, Self::AlreadyComplete(_))
    }

    /// Identifier of the uploaded file, if the service reported one.
    pub fn file_id(&self) -> Option<&str> {
        self.response().file_id()
    }

    /// Number of parts transferred (0 when deduplicated).
    pub fn part_count(&self) -> usize {
        match self {
            Self::AlreadyComplete(_) => 0,
            Self::Completed { parts, .. } => parts.len(),
        }
    }
}

/// Progress event emitted during an upload.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// Progress update, non-decreasing from 0.0 to 1.0.
    Progress { progress: f64, status: String },
    /// The service already had the content.
    Deduplicated { name: String },
    /// All parts were transferred and the upload completed.
    Completed { name: String, parts: usize },
    /// The upload failed.
    Failed { name: String, error: String },
}
