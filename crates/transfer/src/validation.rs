use std::fs::Metadata;
use std::io::ErrorKind;
use std::path::Path;

use crate::TransferError;

/// Checks that `path` exists and is a regular file (symlinks are followed).
///
/// Returns the file metadata so callers can sample the size exactly once.
pub fn validate_upload_file(path: &Path) -> Result<Metadata, TransferError> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(TransferError::NotFound(path.to_path_buf()));
        }
        Err(e) => return Err(TransferError::Io(e)),
    };

    if !metadata.is_file() {
        return Err(TransferError::NotAFile(path.to_path_buf()));
    }

    Ok(metadata)
}

/// Validates the name a file will be stored under in the drive.
///
/// Rejects:
/// - Empty or whitespace-only names
/// - `.` and `..`
/// - Names containing `/`, `\` or NUL
pub fn validate_display_name(name: &str) -> Result<(), TransferError> {
    if name.trim().is_empty() {
        return Err(TransferError::InvalidName("empty name".into()));
    }

    if name == "." || name == ".." {
        return Err(TransferError::InvalidName(format!(
            "reserved name not allowed: {name}"
        )));
    }

    if name.contains(['/', '\\', '\0']) {
        return Err(TransferError::InvalidName(format!(
            "path separator not allowed: {name}"
        )));
    }

    Ok(())
}
