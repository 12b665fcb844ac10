//! Postmark Network Library
//!
//! Talks to the storage gateway: metadata queries over GraphQL, existence
//! probes for fresh uploads, the upload service, and the gallery built on
//! top of them.

pub mod client;
pub mod error;
pub mod gallery;
pub mod probe;
pub mod upload;

pub use client::{GatewayClient, MemoryQuery};
pub use error::{NetError, NetResult};
pub use gallery::Gallery;
pub use probe::ExistenceProbe;
pub use upload::{HttpUploader, Publisher, UploadRequest, Uploader};

#[cfg(test)]
pub(crate) mod test_support {
    use postmark_core::config::GatewayConfig;

    /// Serve `router` on an ephemeral local port and return its base URL.
    pub(crate) async fn serve(router: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// Gateway config pointing every endpoint at `base`.
    pub(crate) fn gateway(base: &str) -> GatewayConfig {
        GatewayConfig {
            graphql_endpoint: format!("{}/graphql", base),
            origin: base.to_string(),
            upload_endpoint: Some(format!("{}/upload", base)),
        }
    }
}
