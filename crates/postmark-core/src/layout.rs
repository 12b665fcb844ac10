//! Gallery grid generation.
//!
//! Turns a list of memories into positioned [`CanvasItem`]s on a regular
//! grid, optionally interleaving upload action tiles.

use crate::device::DeviceClass;
use crate::item::{CanvasItem, ItemError, ItemMetadata};
use crate::memory::{Memory, format_date};
use kurbo::{Point, Rect, Size};
use std::collections::BTreeSet;

/// Id prefix of upload action tiles.
pub const UPLOAD_TILE_PREFIX: &str = "upload-";

/// Attempts per random upload tile before giving up on it.
const PLACEMENT_ATTEMPTS: usize = 32;

/// Regular grid geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub columns: usize,
    pub item_size: f64,
    pub gap: f64,
}

impl GridLayout {
    /// Grid geometry for a device, sized for `item_count` slots.
    ///
    /// Columns approximate a square arrangement within per-device limits.
    pub fn for_device(device: DeviceClass, item_count: usize) -> Self {
        let (min_cols, max_cols, item_size) = match device {
            DeviceClass::Mobile => (2, 4, 160.0),
            DeviceClass::Tablet => (3, 6, 220.0),
            DeviceClass::Desktop => (4, 8, 280.0),
        };
        let square = (item_count as f64).sqrt().ceil() as usize;
        Self {
            columns: square.clamp(min_cols, max_cols),
            item_size,
            gap: device.grid_gap(),
        }
    }

    /// Distance between the origins of neighbouring slots.
    pub fn step(&self) -> f64 {
        self.item_size + self.gap
    }

    /// Rectangle of the slot at `index`, in row-major order.
    pub fn slot_rect(&self, index: usize) -> Rect {
        let columns = self.columns.max(1);
        let origin = Point::new(
            (index % columns) as f64 * self.step(),
            (index / columns) as f64 * self.step(),
        );
        Rect::from_origin_size(origin, Size::new(self.item_size, self.item_size))
    }
}

/// Where upload action tiles go in the grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum UploadTilePlacement {
    #[default]
    None,
    /// Explicit slot indices.
    Fixed(Vec<usize>),
    /// `count` tiles at seeded, center-biased slots.
    Random { count: usize, seed: u32 },
}

impl UploadTilePlacement {
    /// Number of tiles this policy asks for.
    pub fn requested(&self) -> usize {
        match self {
            UploadTilePlacement::None => 0,
            UploadTilePlacement::Fixed(slots) => slots.iter().collect::<BTreeSet<_>>().len(),
            UploadTilePlacement::Random { count, .. } => *count,
        }
    }

    /// Slot indices for upload tiles among `memory_count` memories.
    pub fn slots(&self, memory_count: usize, columns: usize) -> BTreeSet<usize> {
        let total = memory_count + self.requested();
        match self {
            UploadTilePlacement::None => BTreeSet::new(),
            UploadTilePlacement::Fixed(slots) => {
                slots.iter().copied().filter(|slot| *slot < total).collect()
            }
            UploadTilePlacement::Random { count, seed } => {
                random_slots(*count, total, columns.max(1), *seed)
            }
        }
    }
}

/// Xorshift generator; deterministic per seed.
struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    fn new(seed: u32) -> Self {
        Self { state: seed.max(1) }
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform index below `bound`.
    fn below(&mut self, bound: usize) -> usize {
        (self.next_u32() as usize) % bound.max(1)
    }

    /// Index below `bound`, biased towards the middle.
    fn centered(&mut self, bound: usize) -> usize {
        (self.below(bound) + self.below(bound)) / 2
    }
}

fn random_slots(count: usize, total: usize, columns: usize, seed: u32) -> BTreeSet<usize> {
    let mut rng = SimpleRng::new(seed);
    let mut chosen = BTreeSet::new();
    if total == 0 {
        return chosen;
    }
    for _ in 0..count {
        for _ in 0..PLACEMENT_ATTEMPTS {
            let slot = rng.centered(total);
            let left = slot % columns != 0 && chosen.contains(&(slot - 1));
            let top = slot >= columns && chosen.contains(&(slot - columns));
            if !chosen.contains(&slot) && !left && !top {
                chosen.insert(slot);
                break;
            }
        }
    }
    if chosen.len() < count {
        log::debug!("Placed {} of {} upload tiles", chosen.len(), count);
    }
    chosen
}

/// Whether an item is an upload action tile.
pub fn is_upload_tile(item: &CanvasItem) -> bool {
    item.id.starts_with(UPLOAD_TILE_PREFIX) && item.is_placeholder()
}

/// Lay out memories on the grid, interleaving upload tiles.
///
/// Memory items point at `{gateway_origin}/{id}`. Upload tiles get ids
/// `upload-0`, `upload-1`, ... and no image.
pub fn build_items(
    memories: &[Memory],
    layout: &GridLayout,
    gateway_origin: &str,
    placement: &UploadTilePlacement,
) -> Result<Vec<CanvasItem>, ItemError> {
    let upload_slots = placement.slots(memories.len(), layout.columns);
    let total = memories.len() + upload_slots.len();

    let mut items = Vec::with_capacity(total);
    let mut remaining = memories.iter();
    let mut uploads = 0;
    for slot in 0..total {
        let rect = layout.slot_rect(slot);
        if upload_slots.contains(&slot) {
            items.push(CanvasItem::new(format!("{}{}", UPLOAD_TILE_PREFIX, uploads), rect)?);
            uploads += 1;
            continue;
        }
        let Some(memory) = remaining.next() else {
            break;
        };
        items.push(memory_item(memory, rect, gateway_origin)?);
    }
    Ok(items)
}

fn memory_item(memory: &Memory, rect: Rect, gateway_origin: &str) -> Result<CanvasItem, ItemError> {
    let metadata = ItemMetadata {
        date: memory.unix_time.map(format_date),
        location: memory.location.clone(),
        camera: None,
        tags: Vec::new(),
        description: memory.handle.clone(),
    };
    Ok(CanvasItem::new(memory.id.clone(), rect)?
        .with_image_url(memory.image_url(gateway_origin))
        .with_title(memory.display_title())
        .with_metadata(metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Visibility;

    fn memories(n: usize) -> Vec<Memory> {
        (0..n)
            .map(|i| Memory {
                id: format!("tx{}", i),
                content_type: "image/jpeg".to_string(),
                title: Some(format!("Photo {}", i)),
                location: None,
                handle: None,
                visibility: Visibility::Public,
                unix_time: Some(86_400 * 365),
                app_version: None,
            })
            .collect()
    }

    #[test]
    fn test_layout_for_device() {
        let desktop = GridLayout::for_device(DeviceClass::Desktop, 30);
        assert_eq!(desktop.columns, 6);
        assert_eq!(desktop.item_size, 280.0);
        assert_eq!(desktop.gap, 32.0);

        assert_eq!(GridLayout::for_device(DeviceClass::Mobile, 1).columns, 2);
        assert_eq!(GridLayout::for_device(DeviceClass::Mobile, 100).columns, 4);
        assert_eq!(GridLayout::for_device(DeviceClass::Tablet, 0).columns, 3);
    }

    #[test]
    fn test_slot_rects() {
        let layout = GridLayout::for_device(DeviceClass::Mobile, 4);
        assert_eq!(layout.slot_rect(0), Rect::new(0.0, 0.0, 160.0, 160.0));
        assert_eq!(layout.slot_rect(3), Rect::new(176.0, 176.0, 336.0, 336.0));
    }

    #[test]
    fn test_build_without_upload_tiles() {
        let layout = GridLayout::for_device(DeviceClass::Desktop, 5);
        let items = build_items(
            &memories(5),
            &layout,
            "https://gw.test/",
            &UploadTilePlacement::None,
        )
            .unwrap();
        assert_eq!(items.len(), 5);
        assert_eq!(items[0].image_url, "https://gw.test/tx0");
        assert_eq!(items[0].title.as_deref(), Some("Photo 0"));
        assert_eq!(
            items[0].metadata.as_ref().and_then(|m| m.date.as_deref()),
            Some("1971-01-01")
        );
        assert_eq!(items[4].x, 0.0);
        assert_eq!(items[4].y, 312.0);
    }

    #[test]
    fn test_fixed_upload_tiles() {
        let layout = GridLayout::for_device(DeviceClass::Desktop, 6);
        let placement = UploadTilePlacement::Fixed(vec![0, 3, 99]);
        let items = build_items(&memories(4), &layout, "https://gw.test", &placement).unwrap();

        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["upload-0", "tx0", "tx1", "upload-1", "tx2", "tx3"]);
        assert!(is_upload_tile(&items[0]));
        assert!(!is_upload_tile(&items[1]));
    }

    #[test]
    fn test_random_placement_is_seeded() {
        let placement = UploadTilePlacement::Random { count: 3, seed: 42 };
        let a = placement.slots(20, 4);
        let b = placement.slots(20, 4);
        assert_eq!(a, b);
        assert!(!a.is_empty());
        for slot in &a {
            assert!(*slot < 23);
            if slot % 4 != 0 {
                assert!(!a.contains(&(slot - 1)), "left neighbour of {}", slot);
            }
            if *slot >= 4 {
                assert!(!a.contains(&(slot - 4)), "top neighbour of {}", slot);
            }
        }
    }

    #[test]
    fn test_random_tiles_in_items() {
        let layout = GridLayout::for_device(DeviceClass::Tablet, 12);
        let placement = UploadTilePlacement::Random { count: 2, seed: 7 };
        let items = build_items(&memories(10), &layout, "https://gw.test", &placement).unwrap();
        let uploads = items.iter().filter(|i| is_upload_tile(i)).count();
        assert_eq!(items.len() - uploads, 10);
        assert_eq!(uploads, placement.slots(10, layout.columns).len());
    }
}
