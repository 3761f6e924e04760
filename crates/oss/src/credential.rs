//! Short-lived delegated (STS) credentials for one object key.

use std::fmt;

use pikup_protocol::{CreateFileResponse, ResumableParams};

use crate::error::CredentialParseError;

/// A secret string that never shows up in `Debug` or `Display` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw secret. Only for signing; never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Delegated object-storage credentials issued for a single upload.
///
/// Deliberately not `Clone`: the credential is moved into the storage
/// client for one multipart session and dropped with it.
#[derive(Debug, PartialEq, Eq)]
pub struct ResumableCredential {
    pub bucket: String,
    /// Connection host, always exactly one `{bucket}.` prefix.
    pub endpoint: String,
    pub access_key_id: String,
    pub access_key_secret: Secret,
    pub security_token: Secret,
    pub object_key: String,
}

impl ResumableCredential {
    /// Extracts the credential from a create-file response.
    pub fn from_response(resp: &CreateFileResponse) -> Result<Self, CredentialParseError> {
        let params = resp
            .resumable_params()
            .ok_or(CredentialParseError::MissingParams)?;
        Self::try_from(params)
    }
}

impl TryFrom<&ResumableParams> for ResumableCredential {
    type Error = CredentialParseError;

    fn try_from(params: &ResumableParams) -> Result<Self, Self::Error> {
        let bucket = required(&params.bucket, "bucket")?;
        validate_bucket(&bucket)?;
        let endpoint = required(&params.endpoint, "endpoint")?;
        let endpoint = normalize_endpoint(&bucket, &endpoint)?;
        let access_key_id = required(&params.access_key_id, "access_key_id")?;
        let access_key_secret = required(&params.access_key_secret, "access_key_secret")?;
        let security_token = required(&params.security_token, "security_token")?;
        let object_key = required(&params.key, "key")?;
        if object_key.starts_with('/') {
            return Err(CredentialParseError::Malformed {
                field: "key",
                reason: "object key must not start with '/'".into(),
            });
        }

        Ok(Self {
            bucket,
            endpoint,
            access_key_id,
            access_key_secret: Secret::new(access_key_secret),
            security_token: Secret::new(security_token),
            object_key,
        })
    }
}

fn required(value: &Option<String>, field: &'static str) -> Result<String, CredentialParseError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(CredentialParseError::MissingField(field)),
    }
}

fn validate_bucket(bucket: &str) -> Result<(), CredentialParseError> {
    let valid = bucket
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(CredentialParseError::Malformed {
            field: "bucket",
            reason: format!("invalid bucket name: {bucket}"),
        })
    }
}

/// Builds the connection host for `bucket` from a service-issued endpoint.
///
/// The endpoint may or may not already be bucket-qualified and may carry a
/// scheme or trailing slash. The result carries exactly one `{bucket}.`
/// prefix.
pub fn normalize_endpoint(bucket: &str, endpoint: &str) -> Result<String, CredentialParseError> {
    let mut host = endpoint.trim();
    for scheme in ["https://", "http://"] {
        if let Some(rest) = host.strip_prefix(scheme) {
            host = rest;
            break;
        }
    }
    let mut host = host.trim_end_matches('/');

    let prefix = format!("{bucket}.");
    while let Some(rest) = host.strip_prefix(prefix.as_str()) {
        host = rest;
    }

    if host.is_empty() || host.starts_with('.') {
        return Err(CredentialParseError::Malformed {
            field: "endpoint",
            reason: format!("no host left in endpoint: {endpoint}"),
        });
    }
    if host.contains(|c: char| c == '/' || c.is_whitespace()) {
        return Err(CredentialParseError::Malformed {
            field: "endpoint",
            reason: format!("endpoint is not a host: {endpoint}"),
        });
    }

    Ok(format!("{prefix}{host}"))
}
