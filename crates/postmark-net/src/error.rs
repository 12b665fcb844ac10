//! Network errors.

use postmark_core::item::ItemError;
use postmark_core::storage::StorageError;
use postmark_core::wallet::WalletError;
use postmark_render::RenderError;
use thiserror::Error;

/// Errors from gateway, upload and gallery operations.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("GraphQL error: {0}")]
    GraphQl(String),
    #[error("Failed to decode response: {0}")]
    Decode(String),
    #[error("No upload endpoint configured")]
    NoUploadEndpoint,
    #[error("Unsupported content: {0}")]
    UnsupportedContent(String),
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Item(#[from] ItemError),
}

/// Result type for network operations.
pub type NetResult<T> = Result<T, NetError>;
