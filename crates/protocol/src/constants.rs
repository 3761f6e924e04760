/// Path of the create-file endpoint, relative to the API base URL.
pub const FILES_ENDPOINT: &str = "/drive/v1/files";

/// Resource kind sent for regular files.
pub const KIND_FILE: &str = "drive#file";

/// Folder type sent for uploads into ordinary folders.
pub const FOLDER_TYPE_NORMAL: &str = "NORMAL";
