//! Social share links and the share/clipboard capability.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Share errors.
#[derive(Debug, Error, PartialEq)]
pub enum ShareError {
    #[error("Not supported on this platform: {0}")]
    NotSupported(String),
    #[error("Invalid share URL: {0}")]
    InvalidUrl(String),
    #[error("Share failed: {0}")]
    Failed(String),
}

pub type ShareResult<T> = Result<T, ShareError>;

/// Social networks with a share intent URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareTarget {
    X,
    Telegram,
    WhatsApp,
}

impl ShareTarget {
    pub const ALL: [ShareTarget; 3] = [
        ShareTarget::X,
        ShareTarget::Telegram,
        ShareTarget::WhatsApp,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "x" | "twitter" => Some(ShareTarget::X),
            "telegram" => Some(ShareTarget::Telegram),
            "whatsapp" => Some(ShareTarget::WhatsApp),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ShareTarget::X => "X",
            ShareTarget::Telegram => "Telegram",
            ShareTarget::WhatsApp => "WhatsApp",
        }
    }
}

/// Public link to a stored memory.
pub fn memory_link(origin: &str, id: &str) -> String {
    format!("{}/{}", origin.trim_end_matches('/'), id)
}

/// Deep link that opens `target`'s share dialog for `text` and `url`.
pub fn share_link(target: ShareTarget, text: &str, url: &str) -> ShareResult<String> {
    let link = match target {
        ShareTarget::X => Url::parse_with_params(
            "https://twitter.com/intent/tweet",
            &[("text", text), ("url", url)],
        ),
        ShareTarget::Telegram => {
            Url::parse_with_params("https://t.me/share/url", &[("url", url), ("text", text)])
        }
        // WhatsApp takes a single message; the link goes at the end.
        ShareTarget::WhatsApp => {
            let message = if text.is_empty() {
                url.to_string()
            } else {
                format!("{} {}", text, url)
            };
            Url::parse_with_params("https://wa.me/", &[("text", message.as_str())])
        }
    };
    link.map(String::from)
        .map_err(|e| ShareError::InvalidUrl(e.to_string()))
}

/// What a share sink can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShareCapabilities {
    pub copy_text: bool,
    pub copy_image: bool,
    pub native_share: bool,
}

/// Raw RGBA8 image handed to the clipboard.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

/// Payload for a platform share sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareRequest {
    pub title: String,
    pub text: String,
    pub url: String,
}

/// Platform clipboard / share sheet.
///
/// Callers check [`ShareSink::capabilities`] first; [`copy_link`] and
/// [`copy_composite`] do so and report [`ShareError::NotSupported`].
pub trait ShareSink {
    fn capabilities(&self) -> ShareCapabilities;

    fn copy_text(&mut self, text: &str) -> ShareResult<()>;

    fn copy_image(&mut self, image: &ClipboardImage) -> ShareResult<()>;

    fn share_native(&mut self, request: &ShareRequest) -> ShareResult<()> {
        Err(ShareError::NotSupported(format!("native share of {}", request.url)))
    }
}

/// Copy a memory link to the clipboard.
pub fn copy_link(sink: &mut dyn ShareSink, url: &str) -> ShareResult<()> {
    if !sink.capabilities().copy_text {
        return Err(ShareError::NotSupported("copying text".to_string()));
    }
    sink.copy_text(url)?;
    log::info!("Copied link: {}", url);
    Ok(())
}

/// Copy a rendered composite to the clipboard.
pub fn copy_composite(sink: &mut dyn ShareSink, image: &ClipboardImage) -> ShareResult<()> {
    if !sink.capabilities().copy_image {
        return Err(ShareError::NotSupported("copying images".to_string()));
    }
    if image.rgba.len() != image.width * image.height * 4 {
        return Err(ShareError::Failed(format!(
            "Image buffer of {} bytes does not match {}x{}",
            image.rgba.len(),
            image.width,
            image.height
        )));
    }
    sink.copy_image(image)?;
    log::info!("Copied composite: {}x{}", image.width, image.height);
    Ok(())
}
