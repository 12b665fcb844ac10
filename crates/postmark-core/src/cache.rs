//! Per-gallery cache of resolved image locations.
//!
//! One cache belongs to one gallery instance; dropping the gallery drops the
//! cache. Entries are evicted least-recently-used once `capacity` is reached.

use std::collections::{HashMap, VecDeque};

/// Default number of entries kept.
pub const DEFAULT_CAPACITY: usize = 256;

/// Resolution state of one memory's image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageStatus {
    /// Known id, not yet probed.
    Pending,
    /// The gateway serves an image for it.
    Ready { url: String, content_type: String },
    /// Probing finished without finding an image.
    Missing,
}

impl ImageStatus {
    pub fn url(&self) -> Option<&str> {
        match self {
            ImageStatus::Ready { url, .. } => Some(url),
            _ => None,
        }
    }
}

/// Bounded LRU map from memory id to image status.
#[derive(Debug, Clone)]
pub struct ImageCache {
    capacity: usize,
    entries: HashMap<String, ImageStatus>,
    lru: VecDeque<String>,
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ImageCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            lru: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry and mark it recently used.
    pub fn get(&mut self, id: &str) -> Option<&ImageStatus> {
        if !self.entries.contains_key(id) {
            return None;
        }
        self.touch(id);
        self.entries.get(id)
    }

    /// Look up an entry without affecting eviction order.
    pub fn peek(&self, id: &str) -> Option<&ImageStatus> {
        self.entries.get(id)
    }

    pub fn insert(&mut self, id: impl Into<String>, status: ImageStatus) {
        let id = id.into();
        self.touch(&id);
        self.entries.insert(id, status);
        while self.lru.len() > self.capacity {
            if let Some(old) = self.lru.pop_front() {
                log::debug!("Evicting cached image: {}", old);
                self.entries.remove(&old);
            }
        }
    }

    /// Add a pending entry unless the id is already known.
    pub fn ensure_pending(&mut self, id: &str) {
        if !self.entries.contains_key(id) {
            self.insert(id, ImageStatus::Pending);
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<ImageStatus> {
        if let Some(pos) = self.lru.iter().position(|x| x == id) {
            self.lru.remove(pos);
        }
        self.entries.remove(id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
    }

    fn touch(&mut self, id: &str) {
        if let Some(pos) = self.lru.iter().position(|x| x == id) {
            self.lru.remove(pos);
        }
        self.lru.push_back(id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready(url: &str) -> ImageStatus {
        ImageStatus::Ready {
            url: url.to_string(),
            content_type: "image/png".to_string(),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let mut cache = ImageCache::new(4);
        cache.insert("a", ready("https://gw/a"));
        assert_eq!(cache.get("a").and_then(|s| s.url()), Some("https://gw/a"));
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = ImageCache::new(2);
        cache.insert("a", ImageStatus::Pending);
        cache.insert("b", ImageStatus::Pending);
        cache.get("a");
        cache.insert("c", ImageStatus::Missing);

        assert_eq!(cache.len(), 2);
        assert!(cache.peek("a").is_some());
        assert!(cache.peek("b").is_none());
        assert_eq!(cache.peek("c"), Some(&ImageStatus::Missing));
    }

    #[test]
    fn test_ensure_pending_keeps_resolved() {
        let mut cache = ImageCache::default();
        cache.insert("a", ready("u"));
        cache.ensure_pending("a");
        cache.ensure_pending("b");
        assert_eq!(cache.peek("a"), Some(&ready("u")));
        assert_eq!(cache.peek("b"), Some(&ImageStatus::Pending));

        assert_eq!(cache.remove("a"), Some(ready("u")));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_instances_are_independent() {
        let mut first = ImageCache::default();
        let second = ImageCache::default();
        first.insert("a", ImageStatus::Missing);
        assert!(second.peek("a").is_none());
    }
}
