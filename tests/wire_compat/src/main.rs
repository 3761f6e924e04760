fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use pikup_oss::ResumableCredential;
    use pikup_protocol::{CreateFileRequest, CreateFileResponse, TaskPhase, UploadIntent};

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    fn load_response(name: &str) -> CreateFileResponse {
        serde_json::from_value(load_fixture(name))
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent comparison).
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  Rust:    {reserialized}"
        );
    }

    // --- Request ---

    #[test]
    fn request_from_intent_matches_fixture() {
        let intent = UploadIntent::resumable(
            "FA680A95A453104398CD50CD1AB37B8A93822668",
            "holiday.mp4",
            600_000,
            Some("VNfolder0001".into()),
        );
        let built = serde_json::to_value(CreateFileRequest::from(&intent)).unwrap();
        assert_eq!(built, load_fixture("create_file_request.json"));
    }

    #[test]
    fn root_request_matches_fixture() {
        let intent = UploadIntent::resumable(
            "DA39A3EE5E6B4B0D3255BFEF95601890AFD80709",
            "empty.txt",
            0,
            None,
        );
        let built = serde_json::to_value(CreateFileRequest::from(&intent)).unwrap();
        assert_eq!(built, load_fixture("create_file_request_root.json"));
    }

    #[test]
    fn fixture_create_file_request() {
        roundtrip_test::<CreateFileRequest>("create_file_request.json");
        roundtrip_test::<CreateFileRequest>("create_file_request_root.json");
    }

    // --- Responses ---

    #[test]
    fn complete_response_short_circuits() {
        let resp = load_response("create_file_response_complete.json");
        assert!(resp.is_complete());
        assert!(resp.resumable_params().is_none());
        assert_eq!(resp.file_id(), Some("VNfile0002"));

        let task = resp.task.as_ref().unwrap();
        assert_eq!(task.phase, Some(TaskPhase::Complete));
        assert_eq!(task.task_type.as_deref(), Some("UPLOAD"));
        assert_eq!(task.message.as_deref(), Some("Saved"));
        assert_eq!(task.extra["user_id"], "ZZuser");
        assert_eq!(task.extra["progress"], 100);
    }

    #[test]
    fn fixture_create_file_response() {
        roundtrip_test::<CreateFileResponse>("create_file_response_complete.json");
        roundtrip_test::<CreateFileResponse>("create_file_response_resumable.json");
    }

    #[test]
    fn complete_response_keeps_file_metadata_verbatim() {
        let fixture = load_fixture("create_file_response_complete.json");
        let resp = load_response("create_file_response_complete.json");
        assert_eq!(resp.file.as_ref(), Some(&fixture["file"]));
    }

    #[test]
    fn resumable_response_yields_credential() {
        let resp = load_response("create_file_response_resumable.json");
        assert!(!resp.is_complete());

        let params = resp.resumable_params().unwrap();
        assert_eq!(params.expiration.as_deref(), Some("2025-01-01T01:00:00.000Z"));

        let cred = ResumableCredential::from_response(&resp).unwrap();
        assert_eq!(cred.bucket, "vip-lixian-07");
        // Already bucket-qualified; must not be prefixed twice.
        assert_eq!(cred.endpoint, "vip-lixian-07.mypikpak.com");
        assert_eq!(cred.access_key_id, "STS.NTexampleKeyId");
        assert_eq!(cred.object_key, "u/0/VNfile0004");
        assert_eq!(cred.access_key_secret.expose(), "exampleSecretValue");

        let debug = format!("{cred:?} {params:?}");
        assert!(!debug.contains("exampleSecretValue"));
        assert!(!debug.contains("CAIS-example-security-token"));
    }

    #[test]
    fn resumable_response_file_id() {
        let resp = load_response("create_file_response_resumable.json");
        assert_eq!(resp.file_id(), Some("VNfile0004"));
        assert_eq!(resp.task.as_ref().unwrap().phase, Some(TaskPhase::Pending));
    }
}
