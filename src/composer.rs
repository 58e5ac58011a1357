//! Page composer – draws header/footer bands, key/value blocks, tables and
//! wrapped paragraphs onto fixed-size pages.
//!
//! Composition is two-phase: bodies are laid out first, then
//! [`PageComposer::finish`] stamps every footer once the page count is
//! final, so "Page X of N" is always correct at draw time.

use crate::config::{ComposerConfig, InstituteProfile};
use crate::error::{Error, Result};
use crate::fonts::{wrap_text, FontManager};
use crate::layout_config::{Band, DrawItem, LayoutConfig, PageLayout, Rgb, Stroke};
use crate::pagination::{place, FlowReport, OverflowPolicy, PageCursor, Placement};

pub const PRIMARY: Rgb = [0.10, 0.21, 0.36];
pub const TEXT: Rgb = [0.13, 0.13, 0.13];
pub const MUTED: Rgb = [0.42, 0.45, 0.50];
pub const WHITE: Rgb = [1.0, 1.0, 1.0];
pub const SHADE: Rgb = [0.95, 0.96, 0.97];
pub const TOTALS_FILL: Rgb = [0.86, 0.91, 0.97];
pub const RULE: Rgb = [0.80, 0.82, 0.85];

pub const CONFIDENTIAL_NOTICE: &str =
    "This document is confidential and intended solely for the addressee.";

const HEADER_NAME_SIZE: f32 = 18.0;
const HEADER_SMALL_SIZE: f32 = 9.0;
const FOOTER_SIZE: f32 = 8.0;
const LOGO_SIZE: f32 = 44.0;
const CELL_PAD: f32 = 6.0;

/// Horizontal alignment of a text run inside a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Styled text run.
#[derive(Debug, Clone, Copy)]
pub struct TextStyle {
    pub size: f32,
    pub bold: bool,
    pub color: Rgb,
}

impl TextStyle {
    pub fn body(size: f32) -> Self {
        Self {
            size,
            bold: false,
            color: TEXT,
        }
    }

    pub fn bold(size: f32) -> Self {
        Self {
            size,
            bold: true,
            color: TEXT,
        }
    }

    pub fn colored(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }
}

/// Lays out one document. Owns its pages; each page owns one cursor.
pub struct PageComposer<'a> {
    config: &'a ComposerConfig,
    profile: &'a InstituteProfile,
    fonts: FontManager,
    pages: Vec<PageLayout>,
    report: FlowReport,
    /// Pages on which body flow stopped at the footer boundary.
    halted: Vec<usize>,
}

impl<'a> PageComposer<'a> {
    pub fn new(config: &'a ComposerConfig, profile: &'a InstituteProfile) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            profile,
            fonts: FontManager::default(),
            pages: Vec::new(),
            report: FlowReport::default(),
            halted: Vec::new(),
        })
    }

    /// Measure with real font metrics instead of the Helvetica heuristic.
    pub fn with_fonts(mut self, fonts: FontManager) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn config(&self) -> &ComposerConfig {
        self.config
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Left edge of the body.
    pub fn left(&self) -> f32 {
        self.config.margin
    }

    /// Allocate a page, draw its header and return a cursor positioned at
    /// the top of the body area.
    pub fn new_page(&mut self) -> Result<PageCursor> {
        if self.pages.len() >= self.config.max_pages {
            return Err(Error::PageLimit(self.config.max_pages));
        }
        let index = self.pages.len();
        self.pages.push(PageLayout::new(index));
        self.draw_header(index);
        log::debug!("allocated page {}", index + 1);
        Ok(PageCursor::new(
            index,
            self.config.body_top(),
            self.config.footer_boundary(),
        ))
    }

    /// Institution name, tagline and contact line above a divider.
    pub fn draw_header(&mut self, page: usize) {
        let top = self.config.effective_height() - self.config.margin;
        let mut x = self.config.margin;

        if let Some(logo) = self.profile.logo.clone() {
            self.push(
                page,
                DrawItem::Image {
                    src: logo,
                    x,
                    y: top - LOGO_SIZE,
                    width: LOGO_SIZE,
                    height: LOGO_SIZE,
                    band: Band::Header,
                },
            );
            x += LOGO_SIZE + 10.0;
        }

        let name = self.profile.name.clone();
        let tagline = self.profile.tagline.clone();
        let contact = self.profile.contact_line.clone();
        self.push_text(
            page,
            x,
            top - HEADER_NAME_SIZE,
            &name,
            TextStyle::bold(HEADER_NAME_SIZE).colored(PRIMARY),
            Band::Header,
        );
        self.push_text(
            page,
            x,
            top - HEADER_NAME_SIZE - 14.0,
            &tagline,
            TextStyle::body(HEADER_SMALL_SIZE + 1.0).colored(MUTED),
            Band::Header,
        );
        self.push_text(
            page,
            x,
            top - HEADER_NAME_SIZE - 27.0,
            &contact,
            TextStyle::body(HEADER_SMALL_SIZE).colored(MUTED),
            Band::Header,
        );

        let rule_y = self.config.body_top() + 12.0;
        self.push(
            page,
            DrawItem::Line {
                x1: self.config.margin,
                y1: rule_y,
                x2: self.config.effective_width() - self.config.margin,
                y2: rule_y,
                stroke: Stroke {
                    width: 1.5,
                    color: PRIMARY,
                },
                band: Band::Header,
            },
        );
    }

    /// Divider, confidential notice and "Page X of N". `page_num` is 1-based.
    pub fn draw_footer(&mut self, page: usize, page_num: usize, total_pages: usize) {
        let m = self.config.margin;
        let right = self.config.effective_width() - m;
        let rule_y = self.config.footer_boundary() - 8.0;

        self.push(
            page,
            DrawItem::Line {
                x1: m,
                y1: rule_y,
                x2: right,
                y2: rule_y,
                stroke: Stroke {
                    width: 0.5,
                    color: RULE,
                },
                band: Band::Footer,
            },
        );
        let style = TextStyle::body(FOOTER_SIZE).colored(MUTED);
        self.push_text(page, m, m + 16.0, CONFIDENTIAL_NOTICE, style, Band::Footer);
        let address = self.profile.address.clone();
        self.push_text(page, m, m + 5.0, &address, style, Band::Footer);

        let label = format!("Page {page_num} of {total_pages}");
        let w = self.fonts.measure_text_width(&label, FOOTER_SIZE, false);
        self.push_text(page, right - w, m + 16.0, &label, style, Band::Footer);
    }

    /// Draw one body text run at an explicit position.
    pub fn draw_text(&mut self, cursor: &PageCursor, x: f32, text: &str, style: TextStyle) {
        self.push_text(cursor.page(), x, cursor.y(), text, style, Band::Body);
    }

    /// Draw text aligned inside `[x, x + width]` on the cursor's baseline.
    pub fn draw_text_aligned(
        &mut self,
        cursor: &PageCursor,
        x: f32,
        width: f32,
        align: Align,
        text: &str,
        style: TextStyle,
    ) {
        let tx = self.aligned_x(x, width, align, text, style);
        self.push_text(cursor.page(), tx, cursor.y(), text, style, Band::Body);
    }

    pub fn draw_line(&mut self, cursor: &PageCursor, x1: f32, x2: f32, stroke: Stroke) {
        self.push(
            cursor.page(),
            DrawItem::Line {
                x1,
                y1: cursor.y(),
                x2,
                y2: cursor.y(),
                stroke,
                band: Band::Body,
            },
        );
    }

    /// Rectangle whose top edge sits at the cursor.
    pub fn draw_rect(
        &mut self,
        cursor: &PageCursor,
        x: f32,
        width: f32,
        height: f32,
        fill: Option<Rgb>,
        stroke: Option<Stroke>,
    ) {
        self.push(
            cursor.page(),
            DrawItem::Rect {
                x,
                y: cursor.y() - height,
                width,
                height,
                fill,
                stroke,
                band: Band::Body,
            },
        );
    }

    /// Single line of text, advancing the cursor by `height` first.
    pub fn write_line(
        &mut self,
        cursor: &mut PageCursor,
        text: &str,
        style: TextStyle,
        height: f32,
    ) -> Result<()> {
        self.ensure_space(cursor, height)?;
        cursor.advance(height);
        let x = self.left();
        self.draw_text(cursor, x, text, style);
        Ok(())
    }

    /// Bordered title bar followed by one label/value row per pair.
    /// Rows that would cross the footer boundary continue on a new page,
    /// where the frame is closed and the title bar repeated.
    pub fn draw_key_value_block(
        &mut self,
        cursor: &mut PageCursor,
        title: &str,
        pairs: &[(&str, String)],
    ) -> Result<()> {
        let rh = self.config.row_height;
        let x = self.left();
        let width = self.config.content_width();

        // Title plus at least one row stays together.
        let lead = if pairs.is_empty() { 1.0 } else { 2.0 };
        self.ensure_space(cursor, rh * lead)?;
        let mut block_top = cursor.y();
        self.key_value_title(cursor, x, width, title);

        let value_x = x + width * 0.42;
        let size = self.config.body_font_size;
        for (i, (label, value)) in pairs.iter().enumerate() {
            if !cursor.fits(rh) {
                self.close_frame(cursor, x, width, block_top);
                *cursor = self.new_page()?;
                block_top = cursor.y();
                self.key_value_title(cursor, x, width, &format!("{title} (continued)"));
            }
            if i % 2 == 1 {
                self.draw_rect(cursor, x, width, rh, Some(SHADE), None);
            }
            cursor.advance(rh);
            let baseline = cursor.y() + rh * 0.32;
            self.push_text(
                cursor.page(),
                x + CELL_PAD,
                baseline,
                label,
                TextStyle::bold(size).colored(MUTED),
                Band::Body,
            );
            self.push_text(
                cursor.page(),
                value_x,
                baseline,
                value,
                TextStyle::body(size),
                Band::Body,
            );
        }

        self.close_frame(cursor, x, width, block_top);
        Ok(())
    }

    /// Coloured header row, alternating shaded rows and a distinct totals
    /// row. The first column is a label; the rest are right-aligned.
    /// If rows run past the footer boundary the table continues on a new
    /// page with the header repeated.
    pub fn draw_table(
        &mut self,
        cursor: &mut PageCursor,
        header: &[&str],
        rows: &[Vec<String>],
        totals: Option<&[String]>,
    ) -> Result<()> {
        let rh = self.config.row_height;
        let widths = self.column_widths(header.len());
        let header_cells: Vec<String> = header.iter().map(|s| s.to_string()).collect();

        // Header plus at least one row stays together.
        self.ensure_space(cursor, rh * 2.0)?;
        self.table_row(cursor, &widths, &header_cells, RowKind::Header);

        for (i, row) in rows.iter().enumerate() {
            if !cursor.fits(rh) {
                *cursor = self.new_page()?;
                self.table_row(cursor, &widths, &header_cells, RowKind::Header);
            }
            let kind = if i % 2 == 0 {
                RowKind::Plain
            } else {
                RowKind::Shaded
            };
            self.table_row(cursor, &widths, row, kind);
        }

        if let Some(totals) = totals {
            if !cursor.fits(rh) {
                *cursor = self.new_page()?;
                self.table_row(cursor, &widths, &header_cells, RowKind::Header);
            }
            self.table_row(cursor, &widths, totals, RowKind::Totals);
        }
        Ok(())
    }

    /// Numbered section: bold heading followed by wrapped paragraphs.
    pub fn draw_section(
        &mut self,
        cursor: &mut PageCursor,
        heading: &str,
        paragraphs: &[String],
    ) -> Result<FlowReport> {
        let lh = self.config.line_height;
        let mut report = FlowReport::default();
        let first_line = paragraphs
            .first()
            .map(|p| !p.trim().is_empty())
            .unwrap_or(false);
        let need = lh * 1.3 + if first_line { lh } else { 0.0 };

        match self.placement(cursor, need) {
            Placement::Here => {}
            Placement::NewPage => {
                *cursor = self.new_page()?;
                report.pages_added += 1;
            }
            Placement::Drop => {
                let dropped = 1 + paragraphs
                    .iter()
                    .map(|p| wrap_text(p, self.config.wrap_chars).len())
                    .sum::<usize>();
                report.lines_dropped += dropped;
                self.halt(cursor.page(), heading, dropped);
                self.report.merge(&report);
                return Ok(report);
            }
        }
        cursor.advance(lh * 1.3);
        let x = self.left();
        self.draw_text(cursor, x, heading, TextStyle::bold(11.0).colored(PRIMARY));
        report.lines_emitted += 1;
        self.report.merge(&report);

        let body = self.draw_paragraphs(cursor, paragraphs)?;
        report.merge(&body);
        Ok(report)
    }

    /// Wrap and emit paragraphs line by line, never below the footer
    /// boundary. Lines that do not fit either continue on a new page or are
    /// dropped, depending on the configured [`OverflowPolicy`].
    pub fn draw_paragraphs(
        &mut self,
        cursor: &mut PageCursor,
        paragraphs: &[String],
    ) -> Result<FlowReport> {
        let lh = self.config.line_height;
        let style = TextStyle::body(self.config.body_font_size);
        let x = self.left();
        let mut report = FlowReport::default();

        for (pi, paragraph) in paragraphs.iter().enumerate() {
            let lines = wrap_text(paragraph, self.config.wrap_chars);
            for (li, line) in lines.iter().enumerate() {
                match self.placement(cursor, lh) {
                    Placement::Here => {}
                    Placement::NewPage => {
                        *cursor = self.new_page()?;
                        report.pages_added += 1;
                    }
                    Placement::Drop => {
                        let rest_here = lines.len() - li;
                        let rest_after: usize = paragraphs[pi + 1..]
                            .iter()
                            .map(|p| wrap_text(p, self.config.wrap_chars).len())
                            .sum();
                        report.lines_dropped += rest_here + rest_after;
                        self.halt(cursor.page(), line, rest_here + rest_after);
                        self.report.merge(&report);
                        return Ok(report);
                    }
                }
                cursor.advance(lh);
                self.draw_text(cursor, x, line, style);
                report.lines_emitted += 1;
            }
            cursor.skip(lh * 0.4);
        }
        self.report.merge(&report);
        Ok(report)
    }

    /// Open a continuation page when `height` does not fit. Fixed-size
    /// blocks never truncate; running out of pages is an error.
    pub fn ensure_space(&mut self, cursor: &mut PageCursor, height: f32) -> Result<()> {
        if !cursor.fits(height) {
            *cursor = self.new_page()?;
        }
        Ok(())
    }

    /// Stamp footers and return the finished layout with its flow report.
    pub fn finish(mut self) -> (LayoutConfig, FlowReport) {
        let total = self.pages.len();
        for page in 0..total {
            self.draw_footer(page, page + 1, total);
        }
        let config = LayoutConfig {
            title: self.config.title.clone(),
            page_width_pt: self.config.effective_width(),
            page_height_pt: self.config.effective_height(),
            pages: self.pages,
        };
        (config, self.report)
    }

    fn placement(&self, cursor: &PageCursor, height: f32) -> Placement {
        if self.halted.contains(&cursor.page()) {
            return Placement::Drop;
        }
        place(
            cursor,
            height,
            self.config.overflow,
            self.pages.len(),
            self.config.max_pages,
        )
    }

    fn halt(&mut self, page: usize, at: &str, dropped: usize) {
        if !self.halted.contains(&page) {
            self.halted.push(page);
        }
        let why = match self.config.overflow {
            OverflowPolicy::Truncate => "truncation policy",
            OverflowPolicy::Continue => "page cap",
        };
        log::warn!(
            "body text truncated at footer boundary on page {} ({why}): {dropped} line(s) dropped starting at {:?}",
            page + 1,
            at
        );
    }

    fn key_value_title(&mut self, cursor: &mut PageCursor, x: f32, width: f32, title: &str) {
        let rh = self.config.row_height;
        self.draw_rect(cursor, x, width, rh, Some(PRIMARY), None);
        cursor.advance(rh);
        let baseline = cursor.y() + rh * 0.32;
        self.push_text(
            cursor.page(),
            x + CELL_PAD,
            baseline,
            title,
            TextStyle::bold(11.0).colored(WHITE),
            Band::Body,
        );
    }

    fn close_frame(&mut self, cursor: &PageCursor, x: f32, width: f32, top: f32) {
        self.push(
            cursor.page(),
            DrawItem::Rect {
                x,
                y: cursor.y(),
                width,
                height: top - cursor.y(),
                fill: None,
                stroke: Some(Stroke {
                    width: 0.75,
                    color: RULE,
                }),
                band: Band::Body,
            },
        );
    }

    fn column_widths(&self, columns: usize) -> Vec<f32> {
        let width = self.config.content_width();
        if columns <= 1 {
            return vec![width];
        }
        let first = width * 0.46;
        let rest = (width - first) / (columns - 1) as f32;
        std::iter::once(first)
            .chain(std::iter::repeat(rest).take(columns - 1))
            .collect()
    }

    fn table_row(&mut self, cursor: &mut PageCursor, widths: &[f32], cells: &[String], kind: RowKind) {
        let rh = self.config.row_height;
        let x0 = self.left();
        let width: f32 = widths.iter().sum();
        let size = self.config.body_font_size;

        let (fill, style) = match kind {
            RowKind::Header => (Some(PRIMARY), TextStyle::bold(size).colored(WHITE)),
            RowKind::Plain => (None, TextStyle::body(size)),
            RowKind::Shaded => (Some(SHADE), TextStyle::body(size)),
            RowKind::Totals => (Some(TOTALS_FILL), TextStyle::bold(size).colored(PRIMARY)),
        };
        self.draw_rect(
            cursor,
            x0,
            width,
            rh,
            fill,
            Some(Stroke {
                width: 0.5,
                color: RULE,
            }),
        );
        if kind == RowKind::Totals {
            self.draw_line(
                cursor,
                x0,
                x0 + width,
                Stroke {
                    width: 1.2,
                    color: PRIMARY,
                },
            );
        }
        cursor.advance(rh);
        let baseline = cursor.y() + rh * 0.32;

        let mut x = x0;
        for (i, (cell, w)) in cells.iter().zip(widths).enumerate() {
            let align = if i == 0 { Align::Left } else { Align::Right };
            let tx = self.aligned_x(x + CELL_PAD, w - 2.0 * CELL_PAD, align, cell, style);
            self.push_text(cursor.page(), tx, baseline, cell, style, Band::Body);
            x += w;
        }
    }

    fn aligned_x(&self, x: f32, width: f32, align: Align, text: &str, style: TextStyle) -> f32 {
        let w = self.fonts.measure_text_width(text, style.size, style.bold);
        match align {
            Align::Left => x,
            Align::Center => x + ((width - w) / 2.0).max(0.0),
            Align::Right => x + (width - w).max(0.0),
        }
    }

    fn push_text(&mut self, page: usize, x: f32, y: f32, text: &str, style: TextStyle, band: Band) {
        if text.is_empty() {
            return;
        }
        self.push(
            page,
            DrawItem::Text {
                x,
                y,
                text: text.to_string(),
                font_size: style.size,
                bold: style.bold,
                color: style.color,
                band,
            },
        );
    }

    fn push(&mut self, page: usize, item: DrawItem) {
        if let Some(p) = self.pages.get_mut(page) {
            p.items.push(item);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Header,
    Plain,
    Shaded,
    Totals,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_paragraphs(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| {
                format!(
                    "Clause {i}: the employee agrees to follow the academic calendar, \
                     attend staff meetings, maintain student records and comply with \
                     every policy published by the institute administration."
                )
            })
            .collect()
    }

    #[test]
    fn header_drawn_on_new_page() {
        let cfg = ComposerConfig::default();
        let profile = InstituteProfile::default();
        let mut composer = PageComposer::new(&cfg, &profile).unwrap();
        let cursor = composer.new_page().unwrap();
        assert_eq!(cursor.y(), cfg.body_top());
        let (layout, _) = composer.finish();
        let header = layout.pages[0].texts_in(Band::Header);
        assert!(header.contains(&"Campus Institute"));
        assert!(header.contains(&"Excellence in Education"));
        let footer = layout.pages[0].texts_in(Band::Footer);
        assert!(footer.contains(&"Page 1 of 1"));
        assert!(footer.contains(&CONFIDENTIAL_NOTICE));
    }

    #[test]
    fn key_value_rows_decrement_cursor() {
        let cfg = ComposerConfig::default();
        let profile = InstituteProfile::default();
        let mut composer = PageComposer::new(&cfg, &profile).unwrap();
        let mut cursor = composer.new_page().unwrap();
        let start = cursor.y();
        let pairs = [("Position", "Teacher".to_string()), ("Department", "Maths".to_string())];
        composer
            .draw_key_value_block(&mut cursor, "Employment Details", &pairs)
            .unwrap();
        assert_eq!(cursor.y(), start - 3.0 * cfg.row_height);
    }

    #[test]
    fn tall_key_value_block_continues_above_footer() {
        let cfg = ComposerConfig::default();
        let profile = InstituteProfile::default();
        let mut composer = PageComposer::new(&cfg, &profile).unwrap();
        let mut cursor = composer.new_page().unwrap();
        let pairs: Vec<(&str, String)> = (0..40).map(|i| ("Label", format!("value-{i}"))).collect();
        composer
            .draw_key_value_block(&mut cursor, "Big", &pairs)
            .unwrap();
        assert!(cursor.y() >= cfg.footer_boundary());

        let (layout, _) = composer.finish();
        assert!(layout.pages.len() > 1);
        for page in &layout.pages {
            for item in page.items.iter().filter(|i| i.band() == Band::Body) {
                assert!(
                    item.bottom() >= cfg.footer_boundary(),
                    "page {} body item at {}",
                    page.page_index + 1,
                    item.bottom()
                );
            }
        }
        assert!(layout.pages[1].texts_in(Band::Body).contains(&"Big (continued)"));
        let values: usize = layout
            .pages
            .iter()
            .map(|p| p.texts().iter().filter(|t| t.starts_with("value-")).count())
            .sum();
        assert_eq!(values, 40);
    }

    #[test]
    fn table_rows_shade_alternately() {
        let cfg = ComposerConfig::default();
        let profile = InstituteProfile::default();
        let mut composer = PageComposer::new(&cfg, &profile).unwrap();
        let mut cursor = composer.new_page().unwrap();
        let start = cursor.y();
        let rows: Vec<Vec<String>> = (0..4)
            .map(|i| vec![format!("Row {i}"), i.to_string()])
            .collect();
        let totals = vec!["Total".to_string(), "6".to_string()];
        composer
            .draw_table(&mut cursor, &["Item", "Qty"], &rows, Some(&totals))
            .unwrap();
        assert_eq!(cursor.y(), start - 6.0 * cfg.row_height);

        let (layout, _) = composer.finish();
        let fills: Vec<Option<Rgb>> = layout.pages[0]
            .items
            .iter()
            .filter_map(|item| match item {
                DrawItem::Rect {
                    fill,
                    band: Band::Body,
                    ..
                } => Some(*fill),
                _ => None,
            })
            .collect();
        assert_eq!(
            fills,
            vec![Some(PRIMARY), None, Some(SHADE), None, Some(SHADE), Some(TOTALS_FILL)]
        );
    }

    #[test]
    fn truncate_policy_stops_at_footer_boundary() {
        let cfg = ComposerConfig {
            overflow: OverflowPolicy::Truncate,
            ..ComposerConfig::default()
        };
        let profile = InstituteProfile::default();
        let mut composer = PageComposer::new(&cfg, &profile).unwrap();
        let mut cursor = composer.new_page().unwrap();
        let report = composer
            .draw_paragraphs(&mut cursor, &long_paragraphs(40))
            .unwrap();
        assert!(report.truncated());
        assert_eq!(report.pages_added, 0);
        assert!(cursor.y() >= cfg.footer_boundary());

        let (layout, total) = composer.finish();
        assert_eq!(layout.pages.len(), 1);
        assert_eq!(total, report);
        for item in layout.pages[0].items.iter().filter(|i| i.band() == Band::Body) {
            assert!(item.bottom() >= cfg.footer_boundary(), "{item:?}");
        }
    }

    #[test]
    fn continue_policy_spills_onto_new_pages() {
        let cfg = ComposerConfig::default();
        let profile = InstituteProfile::default();
        let mut composer = PageComposer::new(&cfg, &profile).unwrap();
        let mut cursor = composer.new_page().unwrap();
        let paragraphs = long_paragraphs(40);
        let expected: usize = paragraphs.iter().map(|p| wrap_text(p, cfg.wrap_chars).len()).sum();
        let report = composer.draw_paragraphs(&mut cursor, &paragraphs).unwrap();
        assert!(!report.truncated());
        assert_eq!(report.lines_emitted, expected);
        assert!(report.pages_added >= 1);

        let (layout, _) = composer.finish();
        let n = layout.pages.len();
        assert_eq!(n, 1 + report.pages_added);
        for page in &layout.pages {
            assert!(page
                .texts_in(Band::Footer)
                .contains(&format!("Page {} of {n}", page.page_index + 1).as_str()));
        }
    }

    #[test]
    fn page_cap_is_enforced() {
        let cfg = ComposerConfig {
            max_pages: 1,
            ..ComposerConfig::default()
        };
        let profile = InstituteProfile::default();
        let mut composer = PageComposer::new(&cfg, &profile).unwrap();
        composer.new_page().unwrap();
        assert!(matches!(composer.new_page(), Err(Error::PageLimit(1))));
    }
}
