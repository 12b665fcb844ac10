//! Gallery collaborator.
//!
//! Loads memories from the gateway, keeps a fresh upload visible until the
//! index catches up, and resolves image availability through its own
//! [`ImageCache`].

use crate::client::{GatewayClient, MemoryQuery};
use crate::error::NetResult;
use postmark_core::cache::{ImageCache, ImageStatus};
use postmark_core::device::DeviceClass;
use postmark_core::item::CanvasItem;
use postmark_core::layout::{GridLayout, UploadTilePlacement, build_items};
use postmark_core::memory::Memory;
use postmark_core::storage::{LastUploadStore, Storage};

/// Memories shown by one gallery view.
pub struct Gallery<S: Storage + ?Sized> {
    client: GatewayClient,
    cache: ImageCache,
    last_upload: LastUploadStore<S>,
    memories: Vec<Memory>,
}

impl<S: Storage + ?Sized> Gallery<S> {
    pub fn new(client: GatewayClient, last_upload: LastUploadStore<S>) -> Self {
        Self {
            client,
            cache: ImageCache::default(),
            last_upload,
            memories: Vec::new(),
        }
    }

    pub fn client(&self) -> &GatewayClient {
        &self.client
    }

    pub fn memories(&self) -> &[Memory] {
        &self.memories
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ImageCache {
        &mut self.cache
    }

    /// Reload memories, optionally for one owner.
    ///
    /// When `highlight` names the locally stored last upload and the index
    /// does not list it yet, it is shown first.
    pub async fn refresh(
        &mut self,
        owner: Option<&str>,
        highlight: Option<&str>,
    ) -> NetResult<&[Memory]> {
        let mut query = MemoryQuery::default();
        if let Some(owner) = owner {
            query = query.owner(owner);
        }
        let mut memories = self.client.query_memories(&query).await?;

        if let Some(highlight) = highlight.filter(|id| !memories.iter().any(|m| m.id == *id)) {
            if let Some(upload) = self.last_upload.highlight(highlight).await {
                log::info!("Showing pending upload {}", highlight);
                memories.insert(0, upload.memory);
            }
        }

        for memory in &memories {
            self.cache.ensure_pending(&memory.id);
        }
        self.memories = memories;
        Ok(&self.memories)
    }

    /// Grid items for the loaded memories.
    pub fn grid_items(
        &self,
        device: DeviceClass,
        placement: &UploadTilePlacement,
    ) -> NetResult<Vec<CanvasItem>> {
        let count = self.memories.len() + placement.requested();
        let layout = GridLayout::for_device(device, count);
        Ok(build_items(&self.memories, &layout, self.client.origin(), placement)?)
    }

    /// Availability of a memory's image, probing the gateway once when the
    /// cache has no final answer.
    pub async fn resolve_image(&mut self, id: &str) -> ImageStatus {
        match self.cache.get(id) {
            Some(ImageStatus::Pending) | None => {}
            Some(status) => return status.clone(),
        }

        let status = match self.client.probe(id).await {
            Ok(true) => {
                let content_type = self
                    .memories
                    .iter()
                    .find(|m| m.id == id)
                    .map(|m| m.content_type.clone())
                    .unwrap_or_else(|| "image/*".to_string());
                ImageStatus::Ready {
                    url: self.client.memory_url(id),
                    content_type,
                }
            }
            Ok(false) => ImageStatus::Missing,
            Err(e) => {
                // Transient failures leave the entry pending for a later retry.
                log::warn!("Probe for {} failed: {}", id, e);
                ImageStatus::Pending
            }
        };
        self.cache.insert(id, status.clone());
        status
    }
}
