//! Uploads: the uploader boundary and the publish pipeline.
//!
//! The storage network's transaction format is owned by an external upload
//! service. [`HttpUploader`] hands it the payload, the tags and the owner,
//! and gets back the new item's id.

use crate::error::{NetError, NetResult};
use base64::Engine;
use postmark_core::item::ImageFormat;
use postmark_core::memory::{
    AppIdentity, Memory, Tag, UploadMetadata, Visibility, build_upload_tags,
};
use postmark_core::storage::{BoxFuture, LastUpload, LastUploadStore, Storage};
use postmark_core::wallet::Wallet;
use postmark_render::compress::{CompressOptions, compress_image};
use serde::Deserialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Header carrying the base64-encoded JSON tag list.
pub const TAGS_HEADER: &str = "x-postmark-tags";
/// Header carrying the owner address.
pub const OWNER_HEADER: &str = "x-postmark-owner";
/// Header carrying the base64 signature of the payload.
pub const SIGNATURE_HEADER: &str = "x-postmark-signature";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Stores a payload with tags and returns its id.
pub trait Uploader: Send + Sync {
    fn upload<'a>(
        &'a self,
        data: &'a [u8],
        tags: &'a [Tag],
        wallet: &'a dyn Wallet,
    ) -> BoxFuture<'a, NetResult<String>>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: String,
}

/// Uploads through an HTTP upload service.
#[derive(Debug, Clone)]
pub struct HttpUploader {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpUploader {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    /// Uploader for the configured endpoint, if there is one.
    pub fn from_config(gateway: &postmark_core::config::GatewayConfig) -> NetResult<Self> {
        gateway
            .upload_endpoint
            .as_deref()
            .map(Self::new)
            .ok_or(NetError::NoUploadEndpoint)
    }

    async fn send(&self, data: &[u8], tags: &[Tag], wallet: &dyn Wallet) -> NetResult<String> {
        let owner = wallet.require_address()?;
        let tags_json =
            serde_json::to_vec(tags).map_err(|e| NetError::Decode(e.to_string()))?;
        let request_id = uuid::Uuid::new_v4().to_string();

        let mut request = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .header(TAGS_HEADER, base64::engine::general_purpose::STANDARD.encode(tags_json))
            .header(OWNER_HEADER, owner)
            .header(REQUEST_ID_HEADER, &request_id);
        if let Some(signer) = wallet.signer() {
            let signature = signer.sign(data).await?;
            request = request.header(
                SIGNATURE_HEADER,
                base64::engine::general_purpose::STANDARD.encode(signature),
            );
        }

        log::debug!("Uploading {} bytes ({})", data.len(), request_id);
        let response = request.body(data.to_vec()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NetError::Status {
                status: status.as_u16(),
                url: self.endpoint.clone(),
            });
        }
        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| NetError::Decode(e.to_string()))?;
        Ok(body.id)
    }
}

impl Uploader for HttpUploader {
    fn upload<'a>(
        &'a self,
        data: &'a [u8],
        tags: &'a [Tag],
        wallet: &'a dyn Wallet,
    ) -> BoxFuture<'a, NetResult<String>> {
        Box::pin(self.send(data, tags, wallet))
    }
}

/// A photo and its metadata, ready to publish.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub data: Vec<u8>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub handle: Option<String>,
    pub visibility: Visibility,
    /// Compress before uploading; `None` uploads the bytes as given.
    pub compress: Option<CompressOptions>,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Publish pipeline: compress, tag, upload, remember.
pub struct Publisher<U: Uploader, S: Storage + ?Sized> {
    uploader: U,
    last_upload: LastUploadStore<S>,
    app: AppIdentity,
    clock: fn() -> u64,
}

impl<U: Uploader, S: Storage + ?Sized> Publisher<U, S> {
    pub fn new(uploader: U, last_upload: LastUploadStore<S>, app: AppIdentity) -> Self {
        Self {
            uploader,
            last_upload,
            app,
            clock: unix_now,
        }
    }

    /// Replace the Unix-seconds clock used for timestamps.
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    /// Upload `request` as the wallet's active account.
    ///
    /// A failure to record the upload locally is logged; the upload itself
    /// has already succeeded at that point.
    pub async fn publish(&self, wallet: &dyn Wallet, request: UploadRequest) -> NetResult<Memory> {
        wallet.require_address()?;

        let (data, content_type) = match &request.compress {
            Some(opts) => {
                let compressed = compress_image(&request.data, opts)?;
                (compressed.bytes, compressed.mime)
            }
            None => {
                let format = ImageFormat::from_magic_bytes(&request.data).ok_or_else(|| {
                    NetError::UnsupportedContent("not a PNG, JPEG or WebP image".to_string())
                })?;
                (request.data, format.mime_type().to_string())
            }
        };

        let now = (self.clock)();
        let metadata = UploadMetadata {
            content_type,
            title: request.title,
            location: request.location,
            handle: request.handle,
            visibility: request.visibility,
            unix_time: now,
        };
        let tags = build_upload_tags(&metadata, &self.app);
        let id = self.uploader.upload(&data, &tags, wallet).await?;
        log::info!("Uploaded {} ({} bytes, {})", id, data.len(), metadata.content_type);

        let memory = Memory::from_upload(id, &metadata, &self.app);
        let record = LastUpload {
            memory: memory.clone(),
            uploaded_at: now,
        };
        if let Err(e) = self.last_upload.save(&record).await {
            log::warn!("Failed to store last upload: {}", e);
        }
        Ok(memory)
    }
}
