//! System clipboard as a share sink.

use postmark_core::share::{ClipboardImage, ShareCapabilities, ShareError, ShareResult, ShareSink};

/// Share sink backed by the native clipboard.
#[cfg(feature = "clipboard")]
pub struct ClipboardSink {
    clipboard: arboard::Clipboard,
}

#[cfg(feature = "clipboard")]
impl ClipboardSink {
    pub fn new() -> ShareResult<Self> {
        arboard::Clipboard::new()
            .map(|clipboard| Self { clipboard })
            .map_err(|e| ShareError::NotSupported(format!("clipboard unavailable: {}", e)))
    }
}

#[cfg(feature = "clipboard")]
impl ShareSink for ClipboardSink {
    fn capabilities(&self) -> ShareCapabilities {
        ShareCapabilities {
            copy_text: true,
            copy_image: true,
            native_share: false,
        }
    }

    fn copy_text(&mut self, text: &str) -> ShareResult<()> {
        self.clipboard
            .set_text(text)
            .map_err(|e| ShareError::Failed(e.to_string()))
    }

    fn copy_image(&mut self, image: &ClipboardImage) -> ShareResult<()> {
        // arboard expects raw RGBA pixels, not encoded PNG.
        let data = arboard::ImageData {
            width: image.width,
            height: image.height,
            bytes: std::borrow::Cow::Borrowed(&image.rgba),
        };
        self.clipboard
            .set_image(data)
            .map_err(|e| ShareError::Failed(e.to_string()))
    }
}

/// Sink for builds without clipboard support; it can do nothing.
#[cfg(not(feature = "clipboard"))]
pub struct ClipboardSink;

#[cfg(not(feature = "clipboard"))]
impl ClipboardSink {
    pub fn new() -> ShareResult<Self> {
        Ok(Self)
    }
}

#[cfg(not(feature = "clipboard"))]
impl ShareSink for ClipboardSink {
    fn capabilities(&self) -> ShareCapabilities {
        ShareCapabilities::default()
    }

    fn copy_text(&mut self, _text: &str) -> ShareResult<()> {
        Err(ShareError::NotSupported("built without clipboard support".to_string()))
    }

    fn copy_image(&mut self, _image: &ClipboardImage) -> ShareResult<()> {
        Err(ShareError::NotSupported("built without clipboard support".to_string()))
    }
}
