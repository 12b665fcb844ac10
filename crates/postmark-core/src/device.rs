//! Device classes derived from viewport width.

use serde::{Deserialize, Serialize};

/// Viewports narrower than this are treated as phones.
pub const MOBILE_MAX_WIDTH: f64 = 768.0;
/// Viewports narrower than this (and not mobile) are treated as tablets.
pub const TABLET_MAX_WIDTH: f64 = 1024.0;

/// Coarse device class used to scale layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Tablet,
    #[default]
    Desktop,
}

impl DeviceClass {
    /// Classify a viewport by its width in CSS pixels.
    pub fn from_viewport_width(width: f64) -> Self {
        if width < MOBILE_MAX_WIDTH {
            DeviceClass::Mobile
        } else if width < TABLET_MAX_WIDTH {
            DeviceClass::Tablet
        } else {
            DeviceClass::Desktop
        }
    }

    /// Factor applied to the composite's maximum bounds.
    pub fn bounds_factor(self) -> f64 {
        match self {
            DeviceClass::Mobile => 0.6,
            DeviceClass::Tablet => 0.8,
            DeviceClass::Desktop => 1.0,
        }
    }

    /// Gap between grid items, also the fallback tile gap.
    pub fn grid_gap(self) -> f64 {
        match self {
            DeviceClass::Mobile => 16.0,
            DeviceClass::Tablet => 24.0,
            DeviceClass::Desktop => 32.0,
        }
    }

    /// Parse a device name as used on the command line.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "mobile" | "phone" => Some(DeviceClass::Mobile),
            "tablet" => Some(DeviceClass::Tablet),
            "desktop" => Some(DeviceClass::Desktop),
            _ => None,
        }
    }
}
