use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use pikup_protocol::constants::FILES_ENDPOINT;
use pikup_protocol::{CreateFileRequest, CreateFileResponse};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api-drive.mypikpak.com";

const DEVICE_ID_HEADER: &str = "x-device-id";

/// Errors from the drive client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid access token")]
    InvalidToken,

    #[error("invalid device id")]
    InvalidDeviceId,
}

pub type DriveFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send + 'a>>;

/// The metadata-API calls the uploader needs.
pub trait DriveApi: Send + Sync {
    /// Registers an upload: `POST /drive/v1/files`.
    fn create_file<'a>(&'a self, request: &'a CreateFileRequest)
    -> DriveFuture<'a, CreateFileResponse>;
}

/// Drive metadata API client.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Creates a client authenticated with `access_token`.
    pub fn new(
        access_token: &str,
        device_id: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .map_err(|_| Error::InvalidToken)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        if let Some(id) = device_id.filter(|id| !id.is_empty()) {
            headers.insert(
                DEVICE_ID_HEADER,
                HeaderValue::from_str(id).map_err(|_| Error::InvalidDeviceId)?,
            );
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Points the client at another API host; a trailing `/` is ignored.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Performs an authenticated JSON POST.
    async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<Vec<u8>, Error> {
        let url = format!("{}{}", self.base_url, endpoint);
        let resp = self.http.post(&url).json(body).send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp.bytes().await?.to_vec())
    }

    /// Registers a file and returns the service's decision.
    pub async fn create_file(
        &self,
        request: &CreateFileRequest,
    ) -> Result<CreateFileResponse, Error> {
        let body = self.post(FILES_ENDPOINT, request).await?;
        let resp: CreateFileResponse = serde_json::from_slice(&body)?;
        debug!(
            name = %request.name,
            size = request.size,
            complete = resp.is_complete(),
            "create-file answered"
        );
        Ok(resp)
    }
}

impl DriveApi for Client {
    fn create_file<'a>(
        &'a self,
        request: &'a CreateFileRequest,
    ) -> DriveFuture<'a, CreateFileResponse> {
        Box::pin(Client::create_file(self, request))
    }
}
