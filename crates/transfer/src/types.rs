use std::path::{Path, PathBuf};

use crate::TransferError;
use crate::validation::{validate_display_name, validate_upload_file};

/// One fixed-size slice of a file, ready to upload.
#[derive(Debug, Clone)]
pub struct Part {
    /// 1-based part number, contiguous in byte-offset order.
    pub number: u32,
    /// Byte offset within the file.
    pub offset: u64,
    /// Raw part data.
    pub data: Vec<u8>,
}

/// The local file being uploaded.
///
/// `byte_size` is sampled once and used for both the GCID chunk size and
/// the size announced to the drive service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub path: PathBuf,
    pub byte_size: u64,
    pub display_name: String,
}

impl FileDescriptor {
    /// Inspects `path` and resolves the name it will be stored under.
    ///
    /// The name is `name_override` when given, otherwise the file's base name.
    pub fn inspect(path: &Path, name_override: Option<&str>) -> Result<Self, TransferError> {
        let metadata = validate_upload_file(path)?;

        let display_name = match name_override {
            Some(name) => name.to_string(),
            None => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| TransferError::InvalidName(path.display().to_string()))?,
        };
        validate_display_name(&display_name)?;

        Ok(Self {
            path: path.to_path_buf(),
            byte_size: metadata.len(),
            display_name,
        })
    }
}
