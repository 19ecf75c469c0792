//! Viewport classification and the popup placement table.
//!
//! Every placement decision is recomputed from the current window size; nothing
//! here is cached between requests.

use serde::{Deserialize, Serialize};

use crate::constants::{MOBILE_MAX_WIDTH, MOBILE_POPUP_MAX_WIDTH, TABLET_MAX_WIDTH};

/// Current window dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Mobile,
    Tablet,
    Desktop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Device and orientation pair derived from a [`Viewport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub device: Device,
    pub orientation: Orientation,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn device(&self) -> Device {
        if self.width <= MOBILE_MAX_WIDTH {
            Device::Mobile
        } else if self.width <= TABLET_MAX_WIDTH {
            Device::Tablet
        } else {
            Device::Desktop
        }
    }

    pub fn orientation(&self) -> Orientation {
        if self.width < self.height {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }

    pub fn classify(&self) -> Classification {
        Classification {
            device: self.device(),
            orientation: self.orientation(),
        }
    }
}

/// Layout class used to pick a placement rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    MobilePortrait,
    MobileLandscape,
    Tablet,
    Desktop,
}

impl From<Classification> for Layout {
    fn from(class: Classification) -> Self {
        match (class.device, class.orientation) {
            (Device::Mobile, Orientation::Portrait) => Layout::MobilePortrait,
            (Device::Mobile, Orientation::Landscape) => Layout::MobileLandscape,
            (Device::Tablet, _) => Layout::Tablet,
            (Device::Desktop, _) => Layout::Desktop,
        }
    }
}

/// Where the popup sits horizontally relative to its marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HorizontalAnchor {
    /// Centered over the marker; uses the measured content width.
    Centered,
    /// Fixed distance to the right of the marker.
    Side(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementRule {
    pub class_name: &'static str,
    pub padding: f64,
    /// Content width as a fraction of the viewport width.
    pub width_ratio: f64,
    pub max_width: Option<f64>,
    pub anchor: HorizontalAnchor,
    /// Added to the content height before lifting the popup above the anchor.
    pub lift: f64,
}

const MOBILE_PORTRAIT_RULE: PlacementRule = PlacementRule {
    class_name: "popup-content-mobile",
    padding: 8.0,
    width_ratio: 1.0,
    max_width: Some(MOBILE_POPUP_MAX_WIDTH),
    anchor: HorizontalAnchor::Centered,
    lift: 50.0,
};

const MOBILE_LANDSCAPE_RULE: PlacementRule = PlacementRule {
    class_name: "popup-content-mobile-landscape",
    padding: 8.0,
    width_ratio: 0.5,
    max_width: Some(MOBILE_POPUP_MAX_WIDTH),
    anchor: HorizontalAnchor::Side(100.0),
    lift: -100.0,
};

const TABLET_RULE: PlacementRule = PlacementRule {
    class_name: "popup-content-tablet",
    padding: 10.0,
    width_ratio: 0.5,
    max_width: None,
    anchor: HorizontalAnchor::Side(100.0),
    lift: -30.0,
};

const DESKTOP_RULE: PlacementRule = PlacementRule {
    class_name: "popup-content-desktop",
    padding: 16.0,
    width_ratio: 0.35,
    max_width: None,
    anchor: HorizontalAnchor::Side(50.0),
    lift: 0.0,
};

impl Layout {
    pub const ALL: [Layout; 4] = [
        Layout::MobilePortrait,
        Layout::MobileLandscape,
        Layout::Tablet,
        Layout::Desktop,
    ];

    pub fn rule(&self) -> &'static PlacementRule {
        match self {
            Layout::MobilePortrait => &MOBILE_PORTRAIT_RULE,
            Layout::MobileLandscape => &MOBILE_LANDSCAPE_RULE,
            Layout::Tablet => &TABLET_RULE,
            Layout::Desktop => &DESKTOP_RULE,
        }
    }
}

/// Pixel offset of the popup relative to its anchor marker.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    pub dx: f64,
    pub dy: f64,
}

/// Style applied to the popup content container before it is measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentStyle {
    pub class_name: String,
    pub width: f64,
    pub padding: f64,
}

/// Measured size of the rendered popup content.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentSize {
    pub width: f64,
    pub height: f64,
}

impl PlacementRule {
    pub fn content_style(&self, viewport: Viewport) -> ContentStyle {
        let available = (viewport.width as f64 * self.width_ratio - self.padding * 2.0).max(0.0);
        let width = match self.max_width {
            Some(max) => available.min(max),
            None => available,
        };
        ContentStyle {
            class_name: self.class_name.to_string(),
            width,
            padding: self.padding,
        }
    }

    pub fn offset(&self, content: ContentSize) -> Offset {
        let dx = match self.anchor {
            HorizontalAnchor::Centered => -(content.width / 2.0),
            HorizontalAnchor::Side(distance) => distance,
        };
        Offset {
            dx,
            dy: -(content.height + self.lift),
        }
    }
}

/// Full placement decision for one positioning request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub layout: Layout,
    pub style: ContentStyle,
    pub offset: Offset,
}

/// Decides the style and offset for a popup from the viewport and a measured content size.
///
/// The style is returned separately from the measurement so callers that can
/// re-measure after applying it (see `Carousel::place`) do so.
pub fn placement(viewport: Viewport, content: ContentSize) -> Placement {
    let layout = Layout::from(viewport.classify());
    let rule = layout.rule();
    Placement {
        layout,
        style: rule.content_style(viewport),
        offset: rule.offset(content),
    }
}
