//! Aliyun OSS multipart client signed with delegated STS credentials.

use std::time::Duration;

use chrono::Utc;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, DATE, ETAG};
use reqwest::{Method, Response};
use tracing::debug;

use crate::credential::ResumableCredential;
use crate::error::{ObjectStorageError, Operation};
use crate::sign::{SignRequest, authorization, canonical_resource, http_date, sign};
use crate::storage::{ObjectStorage, PartRecord, StorageConnector, StorageFuture};
use crate::xml;

const SECURITY_TOKEN_HEADER: &str = "x-oss-security-token";
const XML_CONTENT_TYPE: &str = "application/xml";

/// Characters left unescaped in an object key path.
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Builds [`OssClient`]s sharing one HTTP connection pool.
pub struct OssConnector {
    http: reqwest::Client,
}

impl OssConnector {
    /// Creates a connector whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ObjectStorageError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ObjectStorageError::ClientBuild)?;
        Ok(Self { http })
    }
}

impl StorageConnector for OssConnector {
    fn connect(
        &self,
        credential: ResumableCredential,
    ) -> Result<Box<dyn ObjectStorage>, ObjectStorageError> {
        Ok(Box::new(OssClient::new(self.http.clone(), credential)))
    }
}

/// One multipart session against `https://{bucket}.{endpoint}`.
pub struct OssClient {
    http: reqwest::Client,
    credential: ResumableCredential,
    base_url: String,
}

impl OssClient {
    pub fn new(http: reqwest::Client, credential: ResumableCredential) -> Self {
        let base_url = format!("https://{}", credential.endpoint);
        Self {
            http,
            credential,
            base_url,
        }
    }

    /// Sets a custom base URL (for testing).
    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Builds a signed request for `key` with the given sub-resources.
    ///
    /// Sub-resources are signed raw and sent percent-encoded.
    fn signed(
        &self,
        method: Method,
        key: &str,
        sub_resources: &[(&str, Option<&str>)],
        content_type: &str,
    ) -> reqwest::RequestBuilder {
        let date = http_date(Utc::now());
        let token = self.credential.security_token.expose();
        let resource = canonical_resource(&self.credential.bucket, key, sub_resources);
        let string_to_sign = SignRequest {
            method: method.as_str(),
            content_md5: "",
            content_type,
            date: &date,
            oss_headers: &[(SECURITY_TOKEN_HEADER, token)],
            resource: &resource,
        }
        .string_to_sign();
        let signature = sign(self.credential.access_key_secret.expose(), &string_to_sign);

        let mut url = format!(
            "{}/{}",
            self.base_url,
            utf8_percent_encode(key, KEY_ENCODE_SET)
        );
        let query: Vec<String> = sub_resources
            .iter()
            .map(|(k, v)| match v {
                Some(v) => format!("{k}={}", utf8_percent_encode(v, QUERY_ENCODE_SET)),
                None => (*k).to_string(),
            })
            .collect();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }

        let mut req = self
            .http
            .request(method, url)
            .header(DATE, date)
            .header(SECURITY_TOKEN_HEADER, token)
            .header(
                AUTHORIZATION,
                authorization(&self.credential.access_key_id, &signature),
            );
        if !content_type.is_empty() {
            req = req.header(CONTENT_TYPE, content_type);
        }
        req
    }

    async fn send(
        &self,
        operation: Operation,
        req: reqwest::RequestBuilder,
    ) -> Result<Response, ObjectStorageError> {
        let resp = req
            .send()
            .await
            .map_err(|source| ObjectStorageError::Http { operation, source })?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let parsed = xml::parse_error(&body);
        debug!(
            %operation,
            status = status.as_u16(),
            code = %parsed.code,
            request_id = %parsed.request_id,
            "OSS request rejected"
        );
        let code = if parsed.code.is_empty() {
            status.canonical_reason().unwrap_or("Unknown").to_string()
        } else {
            parsed.code
        };
        Err(ObjectStorageError::Api {
            operation,
            status: status.as_u16(),
            code,
            message: parsed.message,
        })
    }

    async fn init(&self, key: &str) -> Result<String, ObjectStorageError> {
        let operation = Operation::InitMultipartUpload;
        let req = self.signed(Method::POST, key, &[("uploads", None)], "");
        let resp = self.send(operation, req).await?;
        let body = resp
            .text()
            .await
            .map_err(|source| ObjectStorageError::Http { operation, source })?;
        let upload_id = xml::parse_upload_id(&body)
            .map_err(|reason| ObjectStorageError::InvalidResponse { operation, reason })?;
        debug!(key, upload_id = %upload_id, "multipart upload initiated");
        Ok(upload_id)
    }

    async fn put_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        data: Vec<u8>,
    ) -> Result<String, ObjectStorageError> {
        let operation = Operation::UploadPart(part_number);
        let number = part_number.to_string();
        let len = data.len();
        let req = self
            .signed(
                Method::PUT,
                key,
                &[("partNumber", Some(number.as_str())), ("uploadId", Some(upload_id))],
                "",
            )
            .body(data);
        let resp = self.send(operation, req).await?;

        let etag = resp
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ObjectStorageError::InvalidResponse {
                operation,
                reason: "response carries no ETag header".into(),
            })?;
        debug!(key, part_number, bytes = len, etag = %etag, "part uploaded");
        Ok(etag)
    }

    async fn complete(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[PartRecord],
    ) -> Result<(), ObjectStorageError> {
        let body = xml::complete_body(parts);
        let req = self
            .signed(
                Method::POST,
                key,
                &[("uploadId", Some(upload_id))],
                XML_CONTENT_TYPE,
            )
            .body(body);
        self.send(Operation::CompleteMultipartUpload, req).await?;
        debug!(key, parts = parts.len(), "multipart upload completed");
        Ok(())
    }

    async fn abort(&self, key: &str, upload_id: &str) -> Result<(), ObjectStorageError> {
        let req = self.signed(Method::DELETE, key, &[("uploadId", Some(upload_id))], "");
        self.send(Operation::AbortMultipartUpload, req).await?;
        debug!(key, "multipart upload aborted");
        Ok(())
    }
}

impl ObjectStorage for OssClient {
    fn init_multipart_upload<'a>(&'a self, key: &'a str) -> StorageFuture<'a, String> {
        Box::pin(self.init(key))
    }

    fn upload_part<'a>(
        &'a self,
        key: &'a str,
        upload_id: &'a str,
        part_number: u32,
        data: Vec<u8>,
    ) -> StorageFuture<'a, String> {
        Box::pin(self.put_part(key, upload_id, part_number, data))
    }

    fn complete_multipart_upload<'a>(
        &'a self,
        key: &'a str,
        upload_id: &'a str,
        parts: &'a [PartRecord],
    ) -> StorageFuture<'a, ()> {
        Box::pin(self.complete(key, upload_id, parts))
    }

    fn abort_multipart_upload<'a>(
        &'a self,
        key: &'a str,
        upload_id: &'a str,
    ) -> StorageFuture<'a, ()> {
        Box::pin(self.abort(key, upload_id))
    }
}
