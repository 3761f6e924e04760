//! Sequential multipart transfer of one file.
//!
//! Parts are read, uploaded and recorded strictly in order; completion is
//! only attempted once every part has been confirmed.

use std::path::Path;

use pikup_oss::{ObjectStorage, PartRecord};
use pikup_transfer::PartReader;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::UploadError;
use crate::types::UploadEvent;

/// Uploads a file as numbered parts and completes the multipart upload.
pub struct PartUploader<'a> {
    storage: &'a dyn ObjectStorage,
    cancel: CancellationToken,
    abort_on_failure: bool,
    events: Option<mpsc::Sender<UploadEvent>>,
    progress_range: (f64, f64),
}

impl<'a> PartUploader<'a> {
    pub fn new(storage: &'a dyn ObjectStorage, cancel: CancellationToken) -> Self {
        Self {
            storage,
            cancel,
            abort_on_failure: true,
            events: None,
            progress_range: (0.0, 1.0),
        }
    }

    pub fn with_abort_on_failure(mut self, abort: bool) -> Self {
        self.abort_on_failure = abort;
        self
    }

    /// Reports per-part progress on `events`, scaled into `range`.
    pub fn with_events(mut self, events: mpsc::Sender<UploadEvent>, range: (f64, f64)) -> Self {
        self.events = Some(events);
        self.progress_range = range;
        self
    }

    /// Uploads `path` under `key` in parts of `part_size` bytes and completes
    /// the upload. Returns the part records in ascending order.
    ///
    /// A 0-byte file yields no parts; completion is still called.
    pub async fn upload_and_complete(
        &self,
        key: &str,
        path: &Path,
        part_size: usize,
    ) -> Result<Vec<PartRecord>, UploadError> {
        self.check_cancelled()?;

        let reader = tokio::task::spawn_blocking({
            let path = path.to_path_buf();
            move || PartReader::open(&path, part_size)
        })
        .await??;

        let upload_id = self.storage.init_multipart_upload(key).await?;
        info!(
            key,
            upload_id = %upload_id,
            file_size = reader.file_size(),
            part_size = reader.part_size(),
            "multipart upload started"
        );

        match self.transfer(key, &upload_id, reader).await {
            Ok(parts) => {
                info!(key, parts = parts.len(), "multipart upload completed");
                Ok(parts)
            }
            Err(e) => {
                self.abort(key, &upload_id, &e).await;
                Err(e)
            }
        }
    }

    async fn transfer(
        &self,
        key: &str,
        upload_id: &str,
        mut reader: PartReader,
    ) -> Result<Vec<PartRecord>, UploadError> {
        let total = reader.file_size();
        let mut parts: Vec<PartRecord> = Vec::new();

        loop {
            self.check_cancelled()?;

            let (returned, next) = tokio::task::spawn_blocking(move || {
                let next = reader.next_part();
                (reader, next)
            })
            .await?;
            reader = returned;

            let Some(part) = next? else {
                break;
            };

            let number = part.number;
            let len = part.data.len();
            let etag = self
                .storage
                .upload_part(key, upload_id, number, part.data)
                .await?;
            debug!(key, part = number, offset = part.offset, bytes = len, "part confirmed");
            parts.push(PartRecord {
                part_number: number,
                etag,
            });

            if total > 0 {
                let fraction = reader.offset() as f64 / total as f64;
                let status = format!("Uploaded part {number}");
                self.emit_progress(fraction.min(1.0), &status).await;
            }
        }

        self.check_cancelled()?;
        self.storage
            .complete_multipart_upload(key, upload_id, &parts)
            .await?;
        Ok(parts)
    }

    /// Best-effort cleanup after a failure; never masks `cause`.
    async fn abort(&self, key: &str, upload_id: &str, cause: &UploadError) {
        if !self.abort_on_failure {
            warn!(key, upload_id, error = %cause, "multipart upload left incomplete");
            return;
        }

        match self.storage.abort_multipart_upload(key, upload_id).await {
            Ok(()) => info!(key, upload_id, error = %cause, "multipart upload aborted"),
            Err(e) => warn!(key, upload_id, error = %e, "failed to abort multipart upload"),
        }
    }

    fn check_cancelled(&self) -> Result<(), UploadError> {
        if self.cancel.is_cancelled() {
            Err(UploadError::Cancelled)
        } else {
            Ok(())
        }
    }

    async fn emit_progress(&self, fraction: f64, status: &str) {
        let Some(events) = &self.events else {
            return;
        };
        let (start, end) = self.progress_range;
        let _ = events
            .send(UploadEvent::Progress {
                progress: start + fraction * (end - start),
                status: status.to_string(),
            })
            .await;
    }
}
