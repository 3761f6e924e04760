//! Wire types for the drive metadata API.
//!
//! Only the surface needed to begin an upload lives here: the create-file
//! request built from an [`UploadIntent`] and the response that either
//! reports a completed (deduplicated) task or hands out resumable
//! object-storage parameters.

pub mod constants;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use messages::{
    CreateFileRequest, CreateFileResponse, Resumable, ResumableParams, ResumableRequest, Task,
    UploadIntent,
};
pub use types::{Provider, TaskPhase, UploadType};
