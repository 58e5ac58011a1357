//! PDF renderer – takes a [`LayoutConfig`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API).

use std::collections::{HashMap, HashSet};

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use printpdf::*;

use crate::error::{Error, Result};
use crate::layout_config::{DrawItem, LayoutConfig, Rgb as LayoutRgb, Stroke};

const PT_TO_MM: f32 = 0.352778;

/// A printpdf XObject together with the pixel dimensions of the source image.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

/// Render a LayoutConfig into PDF bytes.
///
/// Image items whose `src` is not a base64 data URI, or whose bytes cannot
/// be decoded, are skipped with a `log::warn`.
pub fn render_pdf(config: &LayoutConfig) -> Result<Vec<u8>> {
    let page_w = Mm(config.page_width_pt * PT_TO_MM);
    let page_h = Mm(config.page_height_pt * PT_TO_MM);

    let mut doc = PdfDocument::new(&config.title);

    // ── Pre-register all images ────────────────────────────────────────────
    let all_srcs: HashSet<&str> = config
        .pages
        .iter()
        .flat_map(|p| p.items.iter())
        .filter_map(|item| match item {
            DrawItem::Image { src, .. } => Some(src.as_str()),
            _ => None,
        })
        .collect();

    let mut image_resources: HashMap<String, ImageResource> = HashMap::new();
    for src in all_srcs {
        let bytes = match parse_data_uri(src) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("Skipping image: {e}");
                continue;
            }
        };
        match register_image(&mut doc, &bytes) {
            Ok(res) => {
                image_resources.insert(src.to_string(), res);
            }
            Err(e) => log::warn!("Skipping image: {e}"),
        }
    }

    // ── Render pages ──────────────────────────────────────────────────────
    let mut pages: Vec<PdfPage> = config
        .pages
        .iter()
        .map(|page_layout| {
            let mut ops = Vec::new();
            for item in &page_layout.items {
                render_item(&mut ops, item, &image_resources);
            }
            PdfPage::new(page_w, page_h, ops)
        })
        .collect();

    // Ensure at least one page.
    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    doc.with_pages(pages);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut Vec::new());
    if bytes.is_empty() {
        return Err(Error::Render("printpdf produced no output".into()));
    }
    Ok(bytes)
}

/// One page of `page_w_pt × page_h_pt` carrying `image_bytes` full-bleed.
pub fn render_image_page(
    title: &str,
    image_bytes: &[u8],
    page_w_pt: f32,
    page_h_pt: f32,
) -> Result<Vec<u8>> {
    let mut doc = PdfDocument::new(title);
    let res = register_image(&mut doc, image_bytes).map_err(Error::Render)?;

    // At dpi=72 printpdf renders 1 px = 1 pt, so scale = desired_pt / px_dim.
    let ops = vec![Op::UseXobject {
        id: res.xobj_id.clone(),
        transform: XObjectTransform {
            translate_x: Some(Pt(0.0)),
            translate_y: Some(Pt(0.0)),
            dpi: Some(72.0),
            scale_x: Some(page_w_pt / res.px_width.max(1) as f32),
            scale_y: Some(page_h_pt / res.px_height.max(1) as f32),
            rotate: None,
        },
    }];
    let page = PdfPage::new(Mm(page_w_pt * PT_TO_MM), Mm(page_h_pt * PT_TO_MM), ops);
    doc.with_pages(vec![page]);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut Vec::new());
    if bytes.is_empty() {
        return Err(Error::Render("printpdf produced no output".into()));
    }
    Ok(bytes)
}

fn register_image(
    doc: &mut PdfDocument,
    bytes: &[u8],
) -> std::result::Result<ImageResource, String> {
    // Decode with the `image` crate to obtain pixel dimensions.
    let dyn_img =
        ::image::load_from_memory(bytes).map_err(|e| format!("decode error: {e}"))?;
    let (px_width, px_height) = (dyn_img.width(), dyn_img.height());

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let raw = RawImage::decode_from_bytes(bytes, &mut warnings)
        .map_err(|e| format!("PDF encode error: {e}"))?;
    let xobj_id = doc.add_image(&raw);
    Ok(ImageResource {
        xobj_id,
        px_width,
        px_height,
    })
}

/// Convert a UTF-8 string to raw Windows-1252 bytes then wrap in a String so
/// printpdf writes the bytes unchanged into the PDF stream (builtin fonts use
/// WinAnsiEncoding, so each glyph is one byte 0x00–0xFF).
fn to_winlatin(s: &str) -> String {
    let bytes: Vec<u8> = s
        .chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80, // euro
            '\u{2018}' => 0x91, // left single quote
            '\u{2019}' => 0x92, // right single quote
            '\u{201C}' => 0x93, // left double quote
            '\u{201D}' => 0x94, // right double quote
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96, // en-dash
            '\u{2014}' => 0x97, // em-dash
            '\u{20B9}' => b'R', // rupee sign has no WinAnsi glyph
            '\u{00A0}' => 0x20, // non-breaking space -> space
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect();
    // SAFETY: intentionally non-UTF-8 for 0x80-0x9F range; printpdf passes
    // these bytes straight to the PDF stream, decoded by WinAnsiEncoding.
    #[allow(unsafe_code)]
    unsafe {
        String::from_utf8_unchecked(bytes)
    }
}

/// Parse a `data:<mime>;base64,<data>` URI and return the raw decoded bytes.
pub fn parse_data_uri(src: &str) -> std::result::Result<Vec<u8>, String> {
    let Some(rest) = src.strip_prefix("data:") else {
        let preview: String = src.chars().take(80).collect();
        return Err(format!(
            "Image src must be a base64 data URI (e.g. `data:image/png;base64,...`). Got: {preview:?}"
        ));
    };
    let comma_pos = rest
        .find(',')
        .ok_or_else(|| "Invalid data URI: missing `,` separator".to_string())?;
    let header = &rest[..comma_pos];
    if !header.contains(";base64") {
        return Err("Only base64-encoded data URIs are supported".to_string());
    }
    BASE64_STD
        .decode(rest[comma_pos + 1..].trim())
        .map_err(|e| format!("Base64 decode error: {e}"))
}

fn color(c: LayoutRgb) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

fn point(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

fn set_stroke(ops: &mut Vec<Op>, stroke: &Stroke) {
    ops.push(Op::SetOutlineColor {
        col: color(stroke.color),
    });
    ops.push(Op::SetOutlineThickness {
        pt: Pt(stroke.width),
    });
}

/// Emit the PDF ops for one draw item. Layout coordinates are already PDF
/// coordinates (origin bottom-left).
fn render_item(ops: &mut Vec<Op>, item: &DrawItem, images: &HashMap<String, ImageResource>) {
    match item {
        DrawItem::Text {
            x,
            y,
            text,
            font_size,
            bold,
            color: c,
            ..
        } => {
            let font = if *bold {
                BuiltinFont::HelveticaBold
            } else {
                BuiltinFont::Helvetica
            };
            ops.push(Op::StartTextSection);
            ops.push(Op::SetTextCursor {
                pos: Point { x: Pt(*x), y: Pt(*y) },
            });
            ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(*font_size),
                font,
            });
            ops.push(Op::SetFillColor { col: color(*c) });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(to_winlatin(text))],
                font,
            });
            ops.push(Op::EndTextSection);
        }
        DrawItem::Line {
            x1,
            y1,
            x2,
            y2,
            stroke,
            ..
        } => {
            set_stroke(ops, stroke);
            ops.push(Op::DrawLine {
                line: Line {
                    points: vec![point(*x1, *y1), point(*x2, *y2)],
                    is_closed: false,
                },
            });
        }
        DrawItem::Rect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
            ..
        } => {
            let corners = vec![
                point(*x, *y),
                point(x + width, *y),
                point(x + width, y + height),
                point(*x, y + height),
            ];
            if let Some(fill) = fill {
                ops.push(Op::SetFillColor { col: color(*fill) });
                ops.push(Op::DrawPolygon {
                    polygon: Polygon {
                        rings: vec![PolygonRing {
                            points: corners.clone(),
                        }],
                        mode: PaintMode::Fill,
                        winding_order: WindingOrder::NonZero,
                    },
                });
            }
            if let Some(stroke) = stroke {
                set_stroke(ops, stroke);
                ops.push(Op::DrawLine {
                    line: Line {
                        points: corners,
                        is_closed: true,
                    },
                });
            }
        }
        DrawItem::Image {
            src,
            x,
            y,
            width,
            height,
            ..
        } => {
            let Some(res) = images.get(src) else {
                return;
            };
            ops.push(Op::UseXobject {
                id: res.xobj_id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Pt(*x)),
                    translate_y: Some(Pt(*y)),
                    dpi: Some(72.0),
                    scale_x: Some(width / res.px_width.max(1) as f32),
                    scale_y: Some(height / res.px_height.max(1) as f32),
                    rotate: None,
                },
            });
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::layout_config::{Band, PageLayout};

    // 1×1 PNG.
    pub(crate) const PIXEL_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

    #[test]
    fn render_empty_page() {
        let config = LayoutConfig::a4();
        let bytes = render_pdf(&config).unwrap();
        assert!(bytes.len() > 100, "PDF should have content");
        // PDF magic number
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn render_all_item_kinds() {
        let mut config = LayoutConfig::a4();
        let mut page = PageLayout::new(0);
        let stroke = Stroke {
            width: 1.0,
            color: [0.0, 0.0, 0.0],
        };
        page.items.push(DrawItem::Text {
            x: 40.0,
            y: 700.0,
            text: "Fee – Rs. 1,000.00 ₹".into(),
            font_size: 12.0,
            bold: true,
            color: [0.1, 0.2, 0.3],
            band: Band::Body,
        });
        page.items.push(DrawItem::Line {
            x1: 40.0,
            y1: 690.0,
            x2: 300.0,
            y2: 690.0,
            stroke,
            band: Band::Body,
        });
        page.items.push(DrawItem::Rect {
            x: 40.0,
            y: 600.0,
            width: 100.0,
            height: 40.0,
            fill: Some([0.9, 0.9, 0.9]),
            stroke: Some(stroke),
            band: Band::Body,
        });
        page.items.push(DrawItem::Image {
            src: PIXEL_PNG.into(),
            x: 40.0,
            y: 500.0,
            width: 50.0,
            height: 50.0,
            band: Band::Header,
        });
        page.items.push(DrawItem::Image {
            src: "logo.png".into(),
            x: 40.0,
            y: 400.0,
            width: 50.0,
            height: 50.0,
            band: Band::Header,
        });
        config.pages.push(page);
        let bytes = render_pdf(&config).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn data_uri_parsing() {
        assert!(parse_data_uri(PIXEL_PNG).unwrap().starts_with(b"\x89PNG"));
        assert!(parse_data_uri("photo.jpg").is_err());
        assert!(parse_data_uri("data:image/png,abc").is_err());
    }

    #[test]
    fn winlatin_maps_typographic_characters() {
        assert_eq!(to_winlatin("a–b").as_bytes(), &[b'a', 0x96, b'b']);
        assert_eq!(to_winlatin("₹5").as_bytes(), b"R5");
    }
}
