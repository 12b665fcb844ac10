//! Postmark Core Library
//!
//! Platform-agnostic data model and logic for Postmark: gallery items and
//! stored memories, the infinite pan/zoom grid, gallery layouts, local
//! persistence, sharing and wallet capabilities.

pub mod cache;
pub mod camera;
pub mod config;
pub mod device;
pub mod grid;
pub mod input;
pub mod item;
pub mod layout;
pub mod memory;
pub mod share;
pub mod storage;
pub mod views;
pub mod virtualize;
pub mod wallet;

pub use cache::{ImageCache, ImageStatus};
pub use camera::Camera;
pub use config::{ConfigError, PostmarkConfig};
pub use device::DeviceClass;
pub use grid::{GridConfig, GridPhase, InfiniteGrid};
pub use input::{GestureState, InputResponse, MouseButton, PointerEvent, TouchEvent, TouchPoint};
pub use item::{CanvasItem, ImageFormat, ItemError, ItemMetadata};
pub use layout::{GridLayout, UploadTilePlacement, build_items};
pub use memory::{AppIdentity, Memory, Tag, UploadMetadata, Visibility};
pub use share::{ShareError, ShareSink, ShareTarget};
pub use storage::{LastUpload, LastUploadStore, Storage, StorageError};
pub use views::{Carousel, GalleryMode, ListWindow};
pub use virtualize::{TileGeometry, VisibleItem};
pub use wallet::{AddressWallet, Signer, Wallet, WalletError};
