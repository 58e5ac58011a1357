//! Snapshot-to-PDF composer.
//!
//! A fixed-size visual component paints itself into an off-screen
//! [`Scene`] (CSS pixels, origin top-left). A [`Rasterizer`] turns the scene
//! into a bitmap at a pixel-density multiplier, and the bitmap is embedded
//! full-bleed on a single PDF page. The page size is computed from the
//! measured bitmap, so a view and its page cannot disagree.
//!
//! Every capture owns its scene, bitmap and byte buffer; batch captures run
//! in parallel and one failure never affects the others.

use std::collections::HashSet;
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use image::{imageops, DynamicImage, ImageFormat, Rgba, RgbaImage};
use rayon::prelude::*;
use rusttype::{point, Font, Scale};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::render::{parse_data_uri, render_image_page};
use crate::storage::artifact_path;

/// Default rasterization multiplier for print sharpness.
pub const DEFAULT_PIXEL_RATIO: f32 = 2.0;
/// 1 CSS px = 0.75 pt (96 px per inch).
pub const CSS_PX_TO_PT: f32 = 0.75;
/// Largest bitmap edge we agree to allocate.
pub const MAX_BITMAP_EDGE: u32 = 12_000;
/// Shown to the user when a capture fails.
pub const DOWNLOAD_FAILED: &str = "Download failed. Please try again.";

/// RGBA colour, 0–255 per channel.
pub type Color = [u8; 4];

pub const INK: Color = [33, 33, 33, 255];
pub const NAVY: Color = [26, 54, 93, 255];
pub const GREY: Color = [107, 114, 128, 255];
pub const PAPER: Color = [255, 255, 255, 255];
pub const MIST: Color = [242, 244, 247, 255];
pub const GOLD: Color = [180, 142, 58, 255];

/// Document types produced by snapshot capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    IdCard,
    SalarySlip,
    Certificate,
    FeeReceipt,
}

impl DocumentKind {
    /// Prefix of the download filename.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::IdCard => "IDCard",
            DocumentKind::SalarySlip => "SalarySlip",
            DocumentKind::Certificate => "Certificate",
            DocumentKind::FeeReceipt => "FeeReceipt",
        }
    }

    /// Storage category.
    pub fn category(&self) -> &'static str {
        match self {
            DocumentKind::IdCard => "id-cards",
            DocumentKind::SalarySlip => "salary-slips",
            DocumentKind::Certificate => "certificates",
            DocumentKind::FeeReceipt => "fee-receipts",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DocumentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "id-card" | "idcard" => Ok(DocumentKind::IdCard),
            "salary-slip" | "salaryslip" => Ok(DocumentKind::SalarySlip),
            "certificate" => Ok(DocumentKind::Certificate),
            "fee-receipt" | "feereceipt" | "receipt" => Ok(DocumentKind::FeeReceipt),
            other => Err(Error::Config(format!("unknown document kind {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// One painted element, in CSS pixels from the top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneItem {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Option<Color>,
        border: Option<(f32, Color)>,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
        color: Color,
    },
    /// `x` is the anchor for `align`; `y` is the top of the line box.
    Text {
        x: f32,
        y: f32,
        text: String,
        size: f32,
        bold: bool,
        color: Color,
        align: TextAlign,
    },
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        src: String,
    },
}

/// Off-screen, fixed-size rendering of one view.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub background: Color,
    pub items: Vec<SceneItem>,
}

impl Scene {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: PAPER,
            items: Vec::new(),
        }
    }

    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, fill: Color) {
        self.items.push(SceneItem::Rect {
            x,
            y,
            width,
            height,
            fill: Some(fill),
            border: None,
        });
    }

    pub fn frame(&mut self, x: f32, y: f32, width: f32, height: f32, stroke: f32, color: Color) {
        self.items.push(SceneItem::Rect {
            x,
            y,
            width,
            height,
            fill: None,
            border: Some((stroke, color)),
        });
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32, color: Color) {
        self.items.push(SceneItem::Line {
            x1,
            y1,
            x2,
            y2,
            width,
            color,
        });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn text(
        &mut self,
        x: f32,
        y: f32,
        text: impl Into<String>,
        size: f32,
        bold: bool,
        color: Color,
        align: TextAlign,
    ) {
        self.items.push(SceneItem::Text {
            x,
            y,
            text: text.into(),
            size,
            bold,
            color,
            align,
        });
    }

    pub fn image(&mut self, x: f32, y: f32, width: f32, height: f32, src: impl Into<String>) {
        self.items.push(SceneItem::Image {
            x,
            y,
            width,
            height,
            src: src.into(),
        });
    }

    /// Text painted into the scene, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|item| match item {
                SceneItem::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// A fixed-pixel-size visual component that can be captured.
pub trait SnapshotView: Send + Sync {
    fn kind(&self) -> DocumentKind;
    fn external_id(&self) -> &str;
    fn person_name(&self) -> &str;
    /// Width and height in CSS pixels.
    fn size_px(&self) -> (u32, u32);
    fn paint(&self, scene: &mut Scene);

    /// Render into a fresh off-screen scene.
    fn scene(&self) -> Scene {
        let (w, h) = self.size_px();
        let mut scene = Scene::new(w, h);
        self.paint(&mut scene);
        scene
    }
}

/// Turns a scene into pixels.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, scene: &Scene, pixel_ratio: f32) -> Result<RgbaImage>;
}

/// Software rasterizer on `image` buffers. Text uses a TrueType font via
/// `rusttype` when one is loaded and is greeked (drawn as word bars)
/// otherwise.
#[derive(Default)]
pub struct BitmapRasterizer {
    font: Option<Font<'static>>,
}

impl BitmapRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_font(mut self, bytes: Vec<u8>) -> Result<Self> {
        self.font = Some(parse_font(bytes)?);
        Ok(self)
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_text(
        &self,
        img: &mut RgbaImage,
        ratio: f32,
        anchor: (f32, f32),
        text: &str,
        size: f32,
        bold: bool,
        color: Color,
        align: TextAlign,
    ) {
        let px = size * ratio;
        let (x, y) = (anchor.0 * ratio, anchor.1 * ratio);

        let Some(font) = &self.font else {
            greek(img, x, y, text, px, bold, color, align);
            return;
        };

        let scale = Scale::uniform(px);
        let width = font
            .layout(text, scale, point(0.0, 0.0))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0);
        let left = aligned_left(x, width, align);
        let baseline = y + font.v_metrics(scale).ascent;

        // Bold is overstruck.
        let passes: &[f32] = if bold { &[0.0, 0.6] } else { &[0.0] };
        for dx in passes {
            for glyph in font.layout(text, scale, point(left + dx * ratio, baseline)) {
                if let Some(bb) = glyph.pixel_bounding_box() {
                    glyph.draw(|gx, gy, v| {
                        blend(
                            img,
                            gx as i64 + bb.min.x as i64,
                            gy as i64 + bb.min.y as i64,
                            color,
                            v,
                        );
                    });
                }
            }
        }
    }
}

impl Rasterizer for BitmapRasterizer {
    fn rasterize(&self, scene: &Scene, pixel_ratio: f32) -> Result<RgbaImage> {
        if !(pixel_ratio.is_finite() && pixel_ratio > 0.0) {
            return Err(Error::Raster(format!("invalid pixel ratio {pixel_ratio}")));
        }
        if scene.width == 0 || scene.height == 0 {
            return Err(Error::Raster("view has zero size".into()));
        }
        let w = (scene.width as f32 * pixel_ratio).round() as u32;
        let h = (scene.height as f32 * pixel_ratio).round() as u32;
        if w > MAX_BITMAP_EDGE || h > MAX_BITMAP_EDGE {
            return Err(Error::Raster(format!("bitmap {w}x{h} exceeds {MAX_BITMAP_EDGE}px")));
        }

        let mut img = RgbaImage::from_pixel(w.max(1), h.max(1), Rgba(scene.background));
        let r = pixel_ratio;
        for item in &scene.items {
            match item {
                SceneItem::Rect {
                    x,
                    y,
                    width,
                    height,
                    fill,
                    border,
                } => {
                    let (x0, y0, x1, y1) = (x * r, y * r, (x + width) * r, (y + height) * r);
                    if let Some(fill) = fill {
                        fill_rect(&mut img, x0, y0, x1, y1, *fill);
                    }
                    if let Some((stroke, color)) = border {
                        let t = (stroke * r).max(1.0);
                        fill_rect(&mut img, x0, y0, x1, y0 + t, *color);
                        fill_rect(&mut img, x0, y1 - t, x1, y1, *color);
                        fill_rect(&mut img, x0, y0, x0 + t, y1, *color);
                        fill_rect(&mut img, x1 - t, y0, x1, y1, *color);
                    }
                }
                SceneItem::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    width,
                    color,
                } => draw_line(&mut img, (x1 * r, y1 * r), (x2 * r, y2 * r), width * r, *color),
                SceneItem::Text {
                    x,
                    y,
                    text,
                    size,
                    bold,
                    color,
                    align,
                } => self.draw_text(&mut img, r, (*x, *y), text, *size, *bold, *color, *align),
                SceneItem::Image {
                    x,
                    y,
                    width,
                    height,
                    src,
                } => {
                    let bytes = parse_data_uri(src).map_err(Error::Raster)?;
                    let picture = image::load_from_memory(&bytes)?.to_rgba8();
                    let tw = (width * r).round().max(1.0) as u32;
                    let th = (height * r).round().max(1.0) as u32;
                    let scaled = imageops::resize(&picture, tw, th, imageops::FilterType::Triangle);
                    imageops::overlay(
                        &mut img,
                        &scaled,
                        (x * r).round() as i64,
                        (y * r).round() as i64,
                    );
                }
            }
        }
        Ok(img)
    }
}

fn parse_font(bytes: Vec<u8>) -> Result<Font<'static>> {
    Font::try_from_vec(bytes).ok_or_else(|| Error::Font("not a TrueType/OpenType font".into()))
}

fn aligned_left(x: f32, width: f32, align: TextAlign) -> f32 {
    match align {
        TextAlign::Left => x,
        TextAlign::Center => x - width / 2.0,
        TextAlign::Right => x - width,
    }
}

fn blend(img: &mut RgbaImage, x: i64, y: i64, color: Color, coverage: f32) {
    if x < 0 || y < 0 || x >= img.width() as i64 || y >= img.height() as i64 {
        return;
    }
    let a = (color[3] as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    if a <= 0.0 {
        return;
    }
    let dst = img.get_pixel_mut(x as u32, y as u32);
    let inv = 1.0 - a;
    for c in 0..3 {
        dst.0[c] = (color[c] as f32 * a + dst.0[c] as f32 * inv).round() as u8;
    }
    dst.0[3] = 255;
}

fn fill_rect(img: &mut RgbaImage, x0: f32, y0: f32, x1: f32, y1: f32, color: Color) {
    let xs = x0.min(x1).round().max(0.0) as i64;
    let xe = x0.max(x1).round().min(img.width() as f32) as i64;
    let ys = y0.min(y1).round().max(0.0) as i64;
    let ye = y0.max(y1).round().min(img.height() as f32) as i64;
    for y in ys..ye {
        for x in xs..xe {
            blend(img, x, y, color, 1.0);
        }
    }
}

fn draw_line(img: &mut RgbaImage, from: (f32, f32), to: (f32, f32), width: f32, color: Color) {
    let half = (width / 2.0).max(0.5);
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    if dy.abs() < f32::EPSILON || dx.abs() < f32::EPSILON {
        fill_rect(
            img,
            from.0.min(to.0) - if dx.abs() < f32::EPSILON { half } else { 0.0 },
            from.1.min(to.1) - if dy.abs() < f32::EPSILON { half } else { 0.0 },
            from.0.max(to.0) + if dx.abs() < f32::EPSILON { half } else { 0.0 },
            from.1.max(to.1) + if dy.abs() < f32::EPSILON { half } else { 0.0 },
            color,
        );
        return;
    }
    let steps = dx.abs().max(dy.abs()).ceil() as usize;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let (cx, cy) = (from.0 + dx * t, from.1 + dy * t);
        fill_rect(img, cx - half, cy - half, cx + half, cy + half, color);
    }
}

/// Placeholder text: one bar per word, sized like the word would be.
#[allow(clippy::too_many_arguments)]
fn greek(
    img: &mut RgbaImage,
    x: f32,
    y: f32,
    text: &str,
    px: f32,
    bold: bool,
    color: Color,
    align: TextAlign,
) {
    let advance = px * if bold { 0.55 } else { 0.5 };
    let width = text.chars().count() as f32 * advance;
    let mut cursor = aligned_left(x, width, align);
    let (top, bottom) = (y + px * 0.3, y + px * 0.85);
    for word in text.split(' ') {
        let w = word.chars().count() as f32 * advance;
        if w > 0.0 {
            fill_rect(img, cursor, top, cursor + w - advance * 0.2, bottom, color);
        }
        cursor += w + advance;
    }
}

/// Encode an opaque PNG of the bitmap.
pub fn encode_png(bitmap: RgbaImage) -> Result<Vec<u8>> {
    let rgb = DynamicImage::ImageRgba8(bitmap).to_rgb8();
    let mut png = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

/// Physical page size for a bitmap captured at `pixel_ratio`.
pub fn page_size_pt(px_width: u32, px_height: u32, pixel_ratio: f32) -> (f32, f32) {
    (
        px_width as f32 / pixel_ratio * CSS_PX_TO_PT,
        px_height as f32 / pixel_ratio * CSS_PX_TO_PT,
    )
}

/// `<Kind>-<externalId>-<personName>.pdf`
pub fn download_filename(kind: DocumentKind, external_id: &str, person_name: &str) -> String {
    let clean = |s: &str| s.replace(['/', '\\'], "_");
    format!(
        "{}-{}-{}.pdf",
        kind.label(),
        clean(external_id),
        clean(person_name.trim())
    )
}

/// One captured document.
#[derive(Debug, Clone)]
pub struct SnapshotArtifact {
    pub kind: DocumentKind,
    pub external_id: String,
    pub person_name: String,
    pub filename: String,
    /// Page size in points, derived from the bitmap.
    pub page_size_pt: (f32, f32),
    /// The PNG embedded in the PDF.
    pub png: Vec<u8>,
    pub bytes: Vec<u8>,
}

impl SnapshotArtifact {
    /// Object storage path for this document.
    pub fn storage_path(&self) -> String {
        artifact_path(self.kind.category(), &self.external_id, &self.person_name)
    }

    /// Write the PDF into `dir` under its download filename.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.bytes)?;
        log::info!("saved {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

/// Result of one user-triggered capture.
#[derive(Debug, Clone)]
pub enum CaptureOutcome {
    Saved(SnapshotArtifact),
    /// The same document is already being captured.
    Busy { kind: DocumentKind, external_id: String },
    Failed {
        kind: DocumentKind,
        external_id: String,
        notice: &'static str,
    },
}

impl CaptureOutcome {
    pub fn artifact(&self) -> Option<&SnapshotArtifact> {
        match self {
            CaptureOutcome::Saved(a) => Some(a),
            _ => None,
        }
    }
}

/// Tracks documents with a capture in flight so the triggering control can
/// be disabled until it completes.
#[derive(Debug, Default)]
pub struct CaptureTracker {
    busy: Mutex<HashSet<String>>,
}

impl CaptureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Poisoning is recovered; the set is never left half-updated.
    fn busy(&self) -> MutexGuard<'_, HashSet<String>> {
        self.busy.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark `key` busy; `None` if it already is.
    pub fn try_begin(&self, key: &str) -> Option<CaptureGuard<'_>> {
        let mut busy = self.busy();
        if !busy.insert(key.to_string()) {
            return None;
        }
        Some(CaptureGuard {
            tracker: self,
            key: key.to_string(),
        })
    }

    pub fn is_busy(&self, key: &str) -> bool {
        self.busy().contains(key)
    }
}

/// Releases the busy mark on drop, whether the capture succeeded or not.
#[derive(Debug)]
pub struct CaptureGuard<'a> {
    tracker: &'a CaptureTracker,
    key: String,
}

impl Drop for CaptureGuard<'_> {
    fn drop(&mut self) {
        self.tracker.busy().remove(&self.key);
    }
}

fn tracker_key(view: &dyn SnapshotView) -> String {
    format!("{}:{}", view.kind().label(), view.external_id())
}

/// Captures views into single-page PDFs.
pub struct SnapshotComposer<R: Rasterizer = BitmapRasterizer> {
    rasterizer: R,
    pixel_ratio: f32,
}

impl SnapshotComposer<BitmapRasterizer> {
    pub fn new() -> Self {
        Self::with_rasterizer(BitmapRasterizer::new())
    }
}

impl Default for SnapshotComposer<BitmapRasterizer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rasterizer> SnapshotComposer<R> {
    pub fn with_rasterizer(rasterizer: R) -> Self {
        Self {
            rasterizer,
            pixel_ratio: DEFAULT_PIXEL_RATIO,
        }
    }

    pub fn pixel_ratio(mut self, ratio: f32) -> Self {
        self.pixel_ratio = ratio;
        self
    }

    /// Rasterize `view` and wrap the bitmap in a one-page PDF.
    pub fn capture(&self, view: &dyn SnapshotView) -> Result<SnapshotArtifact> {
        let scene = view.scene();
        let bitmap = self.rasterizer.rasterize(&scene, self.pixel_ratio)?;
        let page_size_pt = page_size_pt(bitmap.width(), bitmap.height(), self.pixel_ratio);
        let png = encode_png(bitmap)?;

        let filename = download_filename(view.kind(), view.external_id(), view.person_name());
        let title = filename.trim_end_matches(".pdf").to_string();
        let bytes = render_image_page(&title, &png, page_size_pt.0, page_size_pt.1)?;
        log::debug!(
            "captured {filename}: {:.1}x{:.1} pt, {} bytes",
            page_size_pt.0,
            page_size_pt.1,
            bytes.len()
        );

        Ok(SnapshotArtifact {
            kind: view.kind(),
            external_id: view.external_id().to_string(),
            person_name: view.person_name().to_string(),
            filename,
            page_size_pt,
            png,
            bytes,
        })
    }

    /// User-facing capture: never returns an error, and refuses to start a
    /// second capture of a document that is already in flight.
    pub fn capture_tracked(&self, view: &dyn SnapshotView, tracker: &CaptureTracker) -> CaptureOutcome {
        let Some(_guard) = tracker.try_begin(&tracker_key(view)) else {
            return CaptureOutcome::Busy {
                kind: view.kind(),
                external_id: view.external_id().to_string(),
            };
        };
        self.capture_outcome(view)
    }

    /// Capture every view in parallel; results keep the input order.
    pub fn capture_batch(&self, views: &[&dyn SnapshotView]) -> Vec<CaptureOutcome> {
        views
            .par_iter()
            .map(|view| self.capture_outcome(*view))
            .collect()
    }

    fn capture_outcome(&self, view: &dyn SnapshotView) -> CaptureOutcome {
        match self.capture(view) {
            Ok(artifact) => CaptureOutcome::Saved(artifact),
            Err(e) => {
                log::warn!(
                    "capture of {} {} failed: {e}",
                    view.kind(),
                    view.external_id()
                );
                CaptureOutcome::Failed {
                    kind: view.kind(),
                    external_id: view.external_id().to_string(),
                    notice: DOWNLOAD_FAILED,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Badge {
        id: String,
        name: String,
        size: (u32, u32),
    }

    impl SnapshotView for Badge {
        fn kind(&self) -> DocumentKind {
            DocumentKind::IdCard
        }
        fn external_id(&self) -> &str {
            &self.id
        }
        fn person_name(&self) -> &str {
            &self.name
        }
        fn size_px(&self) -> (u32, u32) {
            self.size
        }
        fn paint(&self, scene: &mut Scene) {
            scene.rect(0.0, 0.0, self.size.0 as f32, 20.0, NAVY);
            scene.text(10.0, 30.0, self.name.clone(), 12.0, true, INK, TextAlign::Left);
            scene.line(10.0, 60.0, 90.0, 60.0, 1.0, GREY);
            scene.line(10.0, 70.0, 90.0, 95.0, 1.0, GREY);
            scene.frame(0.0, 0.0, self.size.0 as f32, self.size.1 as f32, 1.0, GOLD);
        }
    }

    fn badge(id: &str, name: &str) -> Badge {
        Badge {
            id: id.into(),
            name: name.into(),
            size: (100, 100),
        }
    }

    #[test]
    fn rasterizes_at_pixel_ratio() {
        let scene = badge("S1", "Ravi").scene();
        let img = BitmapRasterizer::new().rasterize(&scene, 2.0).unwrap();
        assert_eq!((img.width(), img.height()), (200, 200));
        // Header band painted navy, body paper.
        assert_eq!(img.get_pixel(100, 10).0, NAVY);
        assert_eq!(img.get_pixel(100, 150).0, PAPER);
        // Border.
        assert_eq!(img.get_pixel(0, 150).0, GOLD);
    }

    #[test]
    fn translucent_photo_blends_over_paper() {
        // One green pixel at half alpha, scaled to a 20x20 photo.
        let mut scene = Scene::new(60, 60);
        scene.image(20.0, 20.0, 20.0, 20.0, crate::render::tests::PIXEL_PNG);
        let img = BitmapRasterizer::new().rasterize(&scene, 1.0).unwrap();
        let inside = img.get_pixel(30, 30).0;
        assert_eq!(inside[1], 255);
        assert_eq!(inside[3], 255);
        assert!((120..=136).contains(&inside[0]), "{inside:?}");
        assert_eq!(img.get_pixel(10, 10).0, PAPER);
        assert_eq!(img.get_pixel(45, 30).0, PAPER);
    }

    #[test]
    fn greeked_text_marks_pixels() {
        let mut scene = Scene::new(100, 40);
        scene.text(50.0, 5.0, "AB CD", 20.0, false, INK, TextAlign::Center);
        let img = BitmapRasterizer::new().rasterize(&scene, 1.0).unwrap();
        let inked = img.pixels().filter(|p| p.0 == INK).count();
        assert!(inked > 0);
        // Space between words stays paper.
        assert_eq!(img.get_pixel(50, 15).0, PAPER);
    }

    #[test]
    fn page_size_follows_bitmap() {
        let (w, h) = page_size_pt(680, 428, 2.0);
        assert!((w - 255.0).abs() < 0.01);
        assert!((h - 160.5).abs() < 0.01);
    }

    #[test]
    fn capture_produces_single_page_pdf() {
        let composer = SnapshotComposer::new();
        let artifact = composer.capture(&badge("STU-7", "Ravi Kumar")).unwrap();
        assert_eq!(&artifact.bytes[0..5], b"%PDF-");
        assert_eq!(artifact.filename, "IDCard-STU-7-Ravi Kumar.pdf");
        assert_eq!(artifact.storage_path(), "id-cards/STU-7_Ravi_Kumar.pdf");
        assert!((artifact.page_size_pt.0 - 75.0).abs() < 0.01);
        assert!(artifact.png.starts_with(b"\x89PNG"));
    }

    #[test]
    fn zero_sized_view_fails_softly() {
        let composer = SnapshotComposer::new();
        let bad = Badge {
            id: "X".into(),
            name: "Nobody".into(),
            size: (0, 0),
        };
        assert!(composer.capture(&bad).is_err());
        let tracker = CaptureTracker::new();
        match composer.capture_tracked(&bad, &tracker) {
            CaptureOutcome::Failed { notice, .. } => assert_eq!(notice, DOWNLOAD_FAILED),
            other => panic!("expected failure, got {other:?}"),
        }
        // Control re-enabled for a retry.
        assert!(!tracker.is_busy("IDCard:X"));
    }

    #[test]
    fn tracker_rejects_duplicate_capture() {
        let tracker = CaptureTracker::new();
        let composer = SnapshotComposer::new();
        let view = badge("STU-9", "Meera");
        let guard = tracker.try_begin("IDCard:STU-9").unwrap();
        assert!(matches!(
            composer.capture_tracked(&view, &tracker),
            CaptureOutcome::Busy { .. }
        ));
        drop(guard);
        assert!(matches!(
            composer.capture_tracked(&view, &tracker),
            CaptureOutcome::Saved(_)
        ));
    }

    #[test]
    fn tracker_survives_panicking_holder() {
        let tracker = CaptureTracker::new();
        let crashed = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _busy = tracker.busy.lock().unwrap();
            panic!("capture crashed while holding the tracker");
        }));
        assert!(crashed.is_err());
        assert!(tracker.busy.is_poisoned());

        let guard = tracker.try_begin("IDCard:STU-9");
        assert!(guard.is_some());
        assert!(tracker.is_busy("IDCard:STU-9"));
        drop(guard);
        assert!(!tracker.is_busy("IDCard:STU-9"));
    }

    #[test]
    fn filename_strips_path_separators() {
        assert_eq!(
            download_filename(DocumentKind::FeeReceipt, "R/2026/01", " Anil Rao "),
            "FeeReceipt-R_2026_01-Anil Rao.pdf"
        );
    }

    #[test]
    fn kind_parsing() {
        assert_eq!("salary_slip".parse::<DocumentKind>().unwrap(), DocumentKind::SalarySlip);
        assert_eq!("ID-Card".parse::<DocumentKind>().unwrap(), DocumentKind::IdCard);
        assert!("poster".parse::<DocumentKind>().is_err());
    }
}
