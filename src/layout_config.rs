//! Layout config – the intermediate representation between composition and
//! PDF rendering. This is the "frozen" structure that encodes exactly what
//! goes on each page.
//!
//! Coordinates are PDF points with the origin at the bottom-left of the
//! page; text `y` is the baseline.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A complete document layout ready for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Document title embedded in the PDF metadata.
    #[serde(default = "LayoutConfig::default_title")]
    pub title: String,
    /// Width of each page in PDF points (1 pt = 1/72 inch).
    pub page_width_pt: f32,
    /// Height of each page in PDF points.
    pub page_height_pt: f32,
    /// Ordered list of pages.
    pub pages: Vec<PageLayout>,
}

/// One page of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_index: usize,
    pub items: Vec<DrawItem>,
}

/// Which part of the page an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Header,
    Body,
    Footer,
}

/// RGB colour, components in 0.0–1.0.
pub type Rgb = [f32; 3];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub width: f32,
    pub color: Rgb,
}

/// A single drawing primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawItem {
    Text {
        x: f32,
        y: f32,
        text: String,
        font_size: f32,
        bold: bool,
        color: Rgb,
        band: Band,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        stroke: Stroke,
        band: Band,
    },
    Rect {
        /// Bottom-left corner.
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Option<Rgb>,
        stroke: Option<Stroke>,
        band: Band,
    },
    Image {
        /// `data:` URI of a PNG or JPEG.
        src: String,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        band: Band,
    },
}

impl DrawItem {
    pub fn band(&self) -> Band {
        match self {
            DrawItem::Text { band, .. }
            | DrawItem::Line { band, .. }
            | DrawItem::Rect { band, .. }
            | DrawItem::Image { band, .. } => *band,
        }
    }

    /// Lowest y-coordinate the item touches.
    pub fn bottom(&self) -> f32 {
        match self {
            DrawItem::Text { y, .. } => *y,
            DrawItem::Line { y1, y2, .. } => y1.min(*y2),
            DrawItem::Rect { y, .. } | DrawItem::Image { y, .. } => *y,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            DrawItem::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

impl PageLayout {
    pub fn new(page_index: usize) -> Self {
        Self {
            page_index,
            items: Vec::new(),
        }
    }

    /// All text drawn on this page, in drawing order.
    pub fn texts(&self) -> Vec<&str> {
        self.items.iter().filter_map(DrawItem::text).collect()
    }

    /// Text drawn in the given band.
    pub fn texts_in(&self, band: Band) -> Vec<&str> {
        self.items
            .iter()
            .filter(|item| item.band() == band)
            .filter_map(DrawItem::text)
            .collect()
    }
}

impl LayoutConfig {
    /// Create an A4 layout config.
    pub fn a4() -> Self {
        Self {
            title: Self::default_title(),
            // A4: 210mm × 297mm = 595.28 × 841.89 points
            page_width_pt: 595.28,
            page_height_pt: 841.89,
            pages: Vec::new(),
        }
    }

    fn default_title() -> String {
        "campus-docs output".to_string()
    }

    /// Every text item of the document joined by newlines.
    pub fn plain_text(&self) -> String {
        self.pages
            .iter()
            .flat_map(|p| p.texts())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_filtering() {
        let mut page = PageLayout::new(0);
        page.items.push(DrawItem::Text {
            x: 0.0,
            y: 800.0,
            text: "Header".into(),
            font_size: 12.0,
            bold: true,
            color: [0.0; 3],
            band: Band::Header,
        });
        page.items.push(DrawItem::Text {
            x: 0.0,
            y: 400.0,
            text: "Body".into(),
            font_size: 10.0,
            bold: false,
            color: [0.0; 3],
            band: Band::Body,
        });
        assert_eq!(page.texts(), vec!["Header", "Body"]);
        assert_eq!(page.texts_in(Band::Body), vec!["Body"]);
        assert_eq!(page.items[1].bottom(), 400.0);
    }

    #[test]
    fn json_tags_items_by_kind() {
        let mut config = LayoutConfig::a4();
        let mut page = PageLayout::new(0);
        page.items.push(DrawItem::Line {
            x1: 40.0,
            y1: 60.0,
            x2: 555.0,
            y2: 60.0,
            stroke: Stroke {
                width: 0.5,
                color: [0.5; 3],
            },
            band: Band::Footer,
        });
        config.pages.push(page);
        let json = config.to_json();
        assert!(json.contains("\"kind\": \"line\""));
        assert!(json.contains("\"band\": \"footer\""));
        let parsed = LayoutConfig::from_json(&json).unwrap();
        assert_eq!(parsed.pages[0].items, config.pages[0].items);
    }
}
