//! End-to-end upload of one local file.

use std::path::Path;
use std::sync::Arc;

use pikup_drive::DriveApi;
use pikup_oss::{ResumableCredential, StorageConnector};
use pikup_protocol::{CreateFileRequest, UploadIntent};
use pikup_transfer::{FileDescriptor, TransferError, gcid_hash_reader_until};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::UploadError;
use crate::parts::PartUploader;
use crate::types::{UploadEvent, UploadOptions, UploadOutcome};

/// Drives uploads: hash, register, transfer, complete.
///
/// One session can run any number of uploads one after another; each call
/// gets fresh credentials from the drive service.
pub struct UploadSession {
    drive: Arc<dyn DriveApi>,
    connector: Arc<dyn StorageConnector>,
    options: UploadOptions,
    events: Option<mpsc::Sender<UploadEvent>>,
    cancel: CancellationToken,
}

impl UploadSession {
    pub fn new(
        drive: Arc<dyn DriveApi>,
        connector: Arc<dyn StorageConnector>,
        options: UploadOptions,
    ) -> Self {
        Self {
            drive,
            connector,
            options,
            events: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Sends progress and outcome events to `events`.
    pub fn with_events(mut self, events: mpsc::Sender<UploadEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns a cancellation token for this session.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn options(&self) -> &UploadOptions {
        &self.options
    }

    /// Uploads `path` into folder `parent_id` (`None` = drive root), stored
    /// as `name` or the file's base name.
    pub async fn upload(
        &self,
        path: &Path,
        parent_id: Option<&str>,
        name: Option<&str>,
    ) -> Result<UploadOutcome, UploadError> {
        let label = match name {
            Some(name) => name.to_string(),
            None => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        };

        match self.run(path, parent_id, name).await {
            Ok(outcome) => {
                let event = match &outcome {
                    UploadOutcome::AlreadyComplete(_) => UploadEvent::Deduplicated { name: label },
                    UploadOutcome::Completed { parts, .. } => UploadEvent::Completed {
                        name: label,
                        parts: parts.len(),
                    },
                };
                self.emit(event).await;
                Ok(outcome)
            }
            Err(e) => {
                let err_msg = e.to_string();
                error!(file = %path.display(), error = %err_msg, "upload failed");
                self.emit(UploadEvent::Failed {
                    name: label,
                    error: err_msg,
                })
                .await;
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        path: &Path,
        parent_id: Option<&str>,
        name: Option<&str>,
    ) -> Result<UploadOutcome, UploadError> {
        // 1. Inspect
        self.emit_progress(0.0, "Inspecting file...").await;
        self.check_cancelled()?;

        let file = tokio::task::spawn_blocking({
            let path = path.to_path_buf();
            let name = name.map(str::to_string);
            move || FileDescriptor::inspect(&path, name.as_deref())
        })
        .await??;

        // 2. Hash
        self.emit_progress(0.02, "Hashing...").await;
        self.check_cancelled()?;

        let digest = tokio::task::spawn_blocking({
            let path = file.path.clone();
            let size = file.byte_size;
            let cancel = self.cancel.clone();
            move || -> Result<_, TransferError> {
                let reader = std::fs::File::open(&path)?;
                gcid_hash_reader_until(reader, size, || cancel.is_cancelled())
            }
        })
        .await??;
        debug!(file = %file.path.display(), size = file.byte_size, gcid = %digest, "hash computed");

        // 3. Register
        self.emit_progress(0.1, "Registering upload...").await;
        self.check_cancelled()?;

        let intent = UploadIntent::resumable(
            digest.into_string(),
            file.display_name.clone(),
            file.byte_size,
            parent_id.map(str::to_string),
        );
        let request = CreateFileRequest::from(&intent);
        let response = self.drive.create_file(&request).await?;
        info!(
            name = %file.display_name,
            size = file.byte_size,
            gcid = %intent.digest,
            "upload registered"
        );

        if response.is_complete() {
            info!(name = %file.display_name, "content already stored, skipping transfer");
            self.emit_progress(1.0, "Already uploaded").await;
            return Ok(UploadOutcome::AlreadyComplete(response));
        }

        // 4. Transfer + 5. Complete
        let credential = ResumableCredential::from_response(&response)?;
        let key = credential.object_key.clone();
        debug!(
            bucket = %credential.bucket,
            endpoint = %credential.endpoint,
            key = %key,
            "credentials issued"
        );
        let storage = self.connector.connect(credential)?;

        self.emit_progress(0.15, "Uploading...").await;
        let mut uploader = PartUploader::new(storage.as_ref(), self.cancel.clone())
            .with_abort_on_failure(self.options.abort_on_failure);
        if let Some(events) = &self.events {
            uploader = uploader.with_events(events.clone(), (0.15, 0.95));
        }
        let parts = uploader
            .upload_and_complete(&key, &file.path, self.options.part_size)
            .await?;

        self.emit_progress(1.0, "Upload complete!").await;
        Ok(UploadOutcome::Completed { response, parts })
    }

    fn check_cancelled(&self) -> Result<(), UploadError> {
        if self.cancel.is_cancelled() {
            Err(UploadError::Cancelled)
        } else {
            Ok(())
        }
    }

    async fn emit_progress(&self, progress: f64, status: &str) {
        self.emit(UploadEvent::Progress {
            progress,
            status: status.to_string(),
        })
        .await;
    }

    async fn emit(&self, event: UploadEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{
        Behaviour, Call, MockConnector, MockDrive, dedup_response, resumable_params,
        resumable_response, write_file,
    };
    use pikup_oss::CredentialParseError;

    const HELLO_GCID: &str = "67BECF85308ACF0261750DA1075681EE5C412F05";

    fn session(
        drive: &Arc<MockDrive>,
        connector: &Arc<MockConnector>,
        part_size: usize,
    ) -> UploadSession {
        UploadSession::new(
            drive.clone(),
            connector.clone(),
            UploadOptions {
                part_size,
                abort_on_failure: true,
            },
        )
    }

    #[tokio::test]
    async fn deduplicated_upload_makes_no_storage_calls() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "hello.txt", b"hello world");
        let drive = Arc::new(MockDrive::new(dedup_response()));
        let connector = Arc::new(MockConnector::new(Behaviour::default()));

        let outcome = session(&drive, &connector, 4)
            .upload(&path, Some("VNparent"), None)
            .await
            .unwrap();

        assert_eq!(outcome, UploadOutcome::AlreadyComplete(dedup_response()));
        assert_eq!(outcome.file_id(), Some("F1"));
        assert_eq!(connector.connect_count(), 0);
        assert!(connector.calls().is_empty());

        let requests = drive.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].hash, HELLO_GCID);
        assert_eq!(requests[0].name, "hello.txt");
        assert_eq!(requests[0].size, 11);
        assert_eq!(requests[0].parent_id, "VNparent");
    }

    #[tokio::test]
    async fn transfers_and_returns_initial_response() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "data.bin", &[3u8; 10]);
        let response = resumable_response(resumable_params());
        let drive = Arc::new(MockDrive::new(response.clone()));
        let connector = Arc::new(MockConnector::new(Behaviour::default()));

        let outcome = session(&drive, &connector, 4)
            .upload(&path, None, Some("renamed.bin"))
            .await
            .unwrap();

        match &outcome {
            UploadOutcome::Completed { response: r, parts } => {
                assert_eq!(r, &response);
                assert_eq!(parts.len(), 3);
            }
            other => panic!("expected Completed, got {other:?}"),
        }
        assert_eq!(outcome.file_id(), Some("F2"));

        let requests = drive.requests();
        assert_eq!(requests[0].name, "renamed.bin");
        assert_eq!(requests[0].parent_id, "");

        let connected = connector.connected.lock().unwrap();
        assert_eq!(connected.len(), 1);
        assert_eq!(connected[0].endpoint, "vip-bucket.mypikpak.com");
        drop(connected);

        let calls = connector.calls();
        assert_eq!(calls.first(), Some(&Call::Init("u/VNobject".into())));
        assert!(matches!(calls.last(), Some(Call::Complete(p)) if p.len() == 3));
    }

    #[tokio::test]
    async fn zero_byte_file_completes_with_no_parts() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "empty.txt", b"");
        let drive = Arc::new(MockDrive::new(resumable_response(resumable_params())));
        let connector = Arc::new(MockConnector::new(Behaviour::default()));

        let outcome = session(&drive, &connector, 4)
            .upload(&path, None, None)
            .await
            .unwrap();

        assert_eq!(outcome.part_count(), 0);
        assert_eq!(
            drive.requests()[0].hash,
            "DA39A3EE5E6B4B0D3255BFEF95601890AFD80709"
        );
        assert_eq!(
            connector.calls(),
            vec![Call::Init("u/VNobject".into()), Call::Complete(Vec::new())]
        );
    }

    #[tokio::test]
    async fn part_two_of_five_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "data.bin", &[9u8; 20]);
        let drive = Arc::new(MockDrive::new(resumable_response(resumable_params())));
        let connector = Arc::new(MockConnector::new(Behaviour {
            fail_part: Some(2),
            ..Default::default()
        }));

        let err = session(&drive, &connector, 4)
            .upload(&path, None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::ObjectStorage(_)));
        let calls = connector.calls();
        assert!(!calls.iter().any(|c| matches!(c, Call::Complete(_))));
        assert!(calls.iter().any(|c| matches!(c, Call::Abort(_))));
    }

    #[tokio::test]
    async fn missing_credential_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "data.bin", b"abc");
        let mut params = resumable_params();
        params.security_token = None;
        let drive = Arc::new(MockDrive::new(resumable_response(params)));
        let connector = Arc::new(MockConnector::new(Behaviour::default()));

        let err = session(&drive, &connector, 4)
            .upload(&path, None, None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            UploadError::CredentialParse(CredentialParseError::MissingField("security_token"))
        ));
        assert_eq!(connector.connect_count(), 0);
    }

    #[tokio::test]
    async fn no_resumable_params() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "data.bin", b"abc");
        let drive = Arc::new(MockDrive::new(Default::default()));
        let connector = Arc::new(MockConnector::new(Behaviour::default()));

        let err = session(&drive, &connector, 4)
            .upload(&path, None, None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            UploadError::CredentialParse(CredentialParseError::MissingParams)
        ));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let drive = Arc::new(MockDrive::new(dedup_response()));
        let connector = Arc::new(MockConnector::new(Behaviour::default()));

        let err = session(&drive, &connector, 4)
            .upload(&dir.path().join("nope.bin"), None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::NotFound(_)));
        assert!(drive.requests().is_empty());
    }

    #[tokio::test]
    async fn directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let drive = Arc::new(MockDrive::new(dedup_response()));
        let connector = Arc::new(MockConnector::new(Behaviour::default()));

        let err = session(&drive, &connector, 4)
            .upload(dir.path(), None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::NotFound(ref p) if p == dir.path()));
        assert!(drive.requests().is_empty());
    }

    #[tokio::test]
    async fn cancelled_before_registration() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "data.bin", b"abc");
        let drive = Arc::new(MockDrive::new(dedup_response()));
        let connector = Arc::new(MockConnector::new(Behaviour::default()));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = session(&drive, &connector, 4)
            .with_cancel(cancel)
            .upload(&path, None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Cancelled));
        assert!(drive.requests().is_empty());
    }

    #[tokio::test]
    async fn events_for_completed_upload() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "data.bin", &[1u8; 8]);
        let drive = Arc::new(MockDrive::new(resumable_response(resumable_params())));
        let connector = Arc::new(MockConnector::new(Behaviour::default()));
        let (tx, mut rx) = mpsc::channel(64);

        session(&drive, &connector, 4)
            .with_events(tx)
            .upload(&path, None, None)
            .await
            .unwrap();

        let mut progress = Vec::new();
        let mut last = None;
        while let Ok(event) = rx.try_recv() {
            match event {
                UploadEvent::Progress { progress: p, .. } => progress.push(p),
                other => last = Some(other),
            }
        }

        assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{progress:?}");
        assert_eq!(progress.first(), Some(&0.0));
        assert_eq!(progress.last(), Some(&1.0));
        assert_eq!(
            last,
            Some(UploadEvent::Completed {
                name: "data.bin".into(),
                parts: 2,
            })
        );
    }

    #[tokio::test]
    async fn events_for_failed_upload() {
        let dir = tempfile::tempdir().unwrap();
        let drive = Arc::new(MockDrive::new(dedup_response()));
        let connector = Arc::new(MockConnector::new(Behaviour::default()));
        let (tx, mut rx) = mpsc::channel(64);

        let _ = session(&drive, &connector, 4)
            .with_events(tx)
            .upload(&dir.path().join("nope.bin"), None, Some("x.bin"))
            .await;

        let mut failed = None;
        while let Ok(event) = rx.try_recv() {
            if let UploadEvent::Failed { name, error } = event {
                failed = Some((name, error));
            }
        }
        let (name, error) = failed.expect("failed event");
        assert_eq!(name, "x.bin");
        assert!(error.contains("file not found"));
    }

    #[tokio::test]
    async fn deduplicated_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "hello.txt", b"hello world");
        let drive = Arc::new(MockDrive::new(dedup_response()));
        let connector = Arc::new(MockConnector::new(Behaviour::default()));
        let (tx, mut rx) = mpsc::channel(64);

        session(&drive, &connector, 4)
            .with_events(tx)
            .upload(&path, None, Some("greeting.txt"))
            .await
            .unwrap();

        let mut saw = false;
        while let Ok(event) = rx.try_recv() {
            if event == (UploadEvent::Deduplicated { name: "greeting.txt".into() }) {
                saw = true;
            }
        }
        assert!(saw);
    }
}
