//! XML bodies exchanged with the multipart API.

use quick_xml::escape::partial_escape;
use serde::Deserialize;

use crate::storage::PartRecord;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct InitiateMultipartUploadResult {
    pub upload_id: String,
}

/// Error document returned with non-2xx statuses.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct OssErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub request_id: String,
}

pub(crate) fn parse_upload_id(body: &str) -> Result<String, String> {
    let result: InitiateMultipartUploadResult =
        quick_xml::de::from_str(body).map_err(|e| format!("failed to parse XML: {e}"))?;
    let upload_id = result.upload_id.trim();
    if upload_id.is_empty() {
        return Err("empty UploadId".into());
    }
    Ok(upload_id.to_string())
}

/// Parses an error document; a body that is not one yields empty fields.
pub(crate) fn parse_error(body: &str) -> OssErrorBody {
    quick_xml::de::from_str(body).unwrap_or_default()
}

/// `CompleteMultipartUpload` body. ETags are written verbatim, quotes
/// included; only markup characters are escaped.
pub(crate) fn complete_body(parts: &[PartRecord]) -> String {
    let mut xml = String::from("<CompleteMultipartUpload>");
    for part in parts {
        xml.push_str("<Part><PartNumber>");
        xml.push_str(&part.part_number.to_string());
        xml.push_str("</PartNumber><ETag>");
        xml.push_str(&partial_escape(&part.etag));
        xml.push_str("</ETag></Part>");
    }
    xml.push_str("</CompleteMultipartUpload>");
    xml
}
