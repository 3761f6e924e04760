//! Recording mocks for the drive API and object storage.

use std::sync::{Arc, Mutex};

use pikup_drive::{DriveApi, DriveFuture};
use pikup_oss::{
    ObjectStorage, ObjectStorageError, Operation, PartRecord, ResumableCredential,
    StorageConnector, StorageFuture,
};
use pikup_protocol::{
    CreateFileRequest, CreateFileResponse, Resumable, ResumableParams, Task, TaskPhase,
};
use tokio_util::sync::CancellationToken;

pub(crate) const UPLOAD_ID: &str = "UP-1";

/// One call made against [`MockStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Init(String),
    Part { number: u32, len: usize },
    Complete(Vec<PartRecord>),
    Abort(String),
}

/// Failure and cancellation switches shared by a connector and its sessions.
#[derive(Clone, Default)]
pub(crate) struct Behaviour {
    pub fail_init: bool,
    pub fail_part: Option<u32>,
    pub fail_complete: bool,
    pub fail_abort: bool,
    /// Cancels the token right after the given part is stored.
    pub cancel_after_part: Option<(u32, CancellationToken)>,
}

pub(crate) struct MockStorage {
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub behaviour: Behaviour,
}

impl MockStorage {
    pub fn new(behaviour: Behaviour) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            behaviour,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

fn backend(operation: Operation) -> ObjectStorageError {
    ObjectStorageError::Backend {
        operation,
        message: "injected failure".into(),
    }
}

impl ObjectStorage for MockStorage {
    fn init_multipart_upload<'a>(&'a self, key: &'a str) -> StorageFuture<'a, String> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(Call::Init(key.to_string()));
            if self.behaviour.fail_init {
                return Err(backend(Operation::InitMultipartUpload));
            }
            Ok(UPLOAD_ID.to_string())
        })
    }

    fn upload_part<'a>(
        &'a self,
        _key: &'a str,
        upload_id: &'a str,
        part_number: u32,
        data: Vec<u8>,
    ) -> StorageFuture<'a, String> {
        Box::pin(async move {
            assert_eq!(upload_id, UPLOAD_ID);
            self.calls.lock().unwrap().push(Call::Part {
                number: part_number,
                len: data.len(),
            });
            if self.behaviour.fail_part == Some(part_number) {
                return Err(backend(Operation::UploadPart(part_number)));
            }
            if let Some((after, token)) = &self.behaviour.cancel_after_part
                && *after == part_number
            {
                token.cancel();
            }
            Ok(format!("\"ETAG-{part_number}\""))
        })
    }

    fn complete_multipart_upload<'a>(
        &'a self,
        _key: &'a str,
        _upload_id: &'a str,
        parts: &'a [PartRecord],
    ) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Complete(parts.to_vec()));
            if self.behaviour.fail_complete {
                return Err(backend(Operation::CompleteMultipartUpload));
            }
            Ok(())
        })
    }

    fn abort_multipart_upload<'a>(
        &'a self,
        _key: &'a str,
        upload_id: &'a str,
    ) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Abort(upload_id.to_string()));
            if self.behaviour.fail_abort {
                return Err(backend(Operation::AbortMultipartUpload));
            }
            Ok(())
        })
    }
}

/// Hands out [`MockStorage`] sessions that all record into one call log.
pub(crate) struct MockConnector {
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub connected: Mutex<Vec<ResumableCredential>>,
    pub behaviour: Behaviour,
}

impl MockConnector {
    pub fn new(behaviour: Behaviour) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            connected: Mutex::new(Vec::new()),
            behaviour,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn connect_count(&self) -> usize {
        self.connected.lock().unwrap().len()
    }
}

impl StorageConnector for MockConnector {
    fn connect(
        &self,
        credential: ResumableCredential,
    ) -> Result<Box<dyn ObjectStorage>, ObjectStorageError> {
        self.connected.lock().unwrap().push(credential);
        Ok(Box::new(MockStorage {
            calls: self.calls.clone(),
            behaviour: self.behaviour.clone(),
        }))
    }
}

/// Drive API mock answering every create-file call with a fixed response.
pub(crate) struct MockDrive {
    pub response: CreateFileResponse,
    pub requests: Mutex<Vec<CreateFileRequest>>,
}

impl MockDrive {
    pub fn new(response: CreateFileResponse) -> Self {
        Self {
            response,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CreateFileRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl DriveApi for MockDrive {
    fn create_file<'a>(
        &'a self,
        request: &'a CreateFileRequest,
    ) -> DriveFuture<'a, CreateFileResponse> {
        Box::pin(async move {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self.response.clone())
        })
    }
}

pub(crate) fn dedup_response() -> CreateFileResponse {
    CreateFileResponse {
        upload_type: Some("UPLOAD_TYPE_RESUMABLE".into()),
        task: Some(Task {
            id: Some("T1".into()),
            phase: Some(TaskPhase::Complete),
            file_id: Some("F1".into()),
            ..Default::default()
        }),
        resumable: None,
        file: Some(serde_json::json!({ "id": "F1", "name": "hello.txt" })),
        ..Default::default()
    }
}

pub(crate) fn resumable_params() -> ResumableParams {
    ResumableParams {
        bucket: Some("vip-bucket".into()),
        endpoint: Some("mypikpak.com".into()),
        access_key_id: Some("STS.key-id".into()),
        access_key_secret: Some("s3cr3t".into()),
        security_token: Some("tok3n".into()),
        key: Some("u/VNobject".into()),
        expiration: None,
        ..Default::default()
    }
}

pub(crate) fn resumable_response(params: ResumableParams) -> CreateFileResponse {
    CreateFileResponse {
        upload_type: Some("UPLOAD_TYPE_RESUMABLE".into()),
        task: Some(Task {
            id: Some("T2".into()),
            phase: Some(TaskPhase::Pending),
            file_id: Some("F2".into()),
            ..Default::default()
        }),
        resumable: Some(Resumable {
            kind: Some("drive#resumable".into()),
            provider: Some("PROVIDER_ALIYUN".into()),
            params: Some(params),
            ..Default::default()
        }),
        file: Some(serde_json::json!({ "id": "F2", "name": "data.bin" })),
        ..Default::default()
    }
}

pub(crate) fn write_file(dir: &std::path::Path, name: &str, data: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}
