//! Postmark Render Library
//!
//! Postcard composites and image compression, rendered on the CPU with
//! vello_cpu and Parley text layout.

pub mod compositor;
pub mod compress;
pub mod encode;
pub mod error;
pub mod layout;
pub mod options;
pub mod text;

pub use compositor::{Compositor, RenderedComposite, SourceImage};
pub use compress::{CompressOptions, Compressed, compress_image};
pub use encode::{parse_data_url, to_data_url};
pub use error::{RenderError, RenderResult};
pub use layout::{CompositeLayout, LineKind, Orientation, TextLine, content_size, wrap_text};
pub use options::{OutputFormat, PolaroidOptions, Rgba8};
pub use text::{FontSource, FontSpec, TextBackend, TextEngine};
