//! Font metrics and word wrapping.
//!
//! Documents are drawn with the PDF builtin Helvetica family, so by default
//! we measure with Helvetica-like average advances. Loading real TTF bytes
//! through `ttf-parser` switches measurement to actual glyph advances.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// A loaded font face with metrics.
#[derive(Clone)]
pub struct FontData {
    /// Raw font bytes (kept alive for ttf-parser's zero-copy API).
    pub bytes: Vec<u8>,
    pub units_per_em: f32,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub bold: bool,
}

/// Measures text for alignment and measured-width wrapping.
///
/// The first family loaded becomes the measuring family. Bold text falls
/// back to the regular face when no bold face is loaded.
#[derive(Clone)]
pub struct FontManager {
    fonts: HashMap<FontKey, FontData>,
    family: Option<String>,
}

impl FontManager {
    pub fn new() -> Self {
        Self {
            fonts: HashMap::new(),
            family: None,
        }
    }

    /// Metrics of the PDF builtin Helvetica faces the renderer draws with.
    pub fn helvetica() -> Result<Self> {
        let mut fonts = Self::new();
        fonts.load_font(
            "Helvetica",
            false,
            printpdf::BuiltinFont::Helvetica.get_subset_font().bytes,
        )?;
        fonts.load_font(
            "Helvetica",
            true,
            printpdf::BuiltinFont::HelveticaBold.get_subset_font().bytes,
        )?;
        Ok(fonts)
    }

    /// Load a TTF/OTF font from bytes.
    pub fn load_font(&mut self, family: &str, bold: bool, bytes: Vec<u8>) -> Result<()> {
        let face = ttf_parser::Face::parse(&bytes, 0)
            .map_err(|e| Error::Font(format!("failed to parse {family}: {e}")))?;

        let data = FontData {
            units_per_em: face.units_per_em() as f32,
            bytes,
        };
        self.fonts.insert(
            FontKey {
                family: family.to_string(),
                bold,
            },
            data,
        );
        if self.family.is_none() {
            self.family = Some(family.to_string());
        }
        log::debug!("loaded font {family} (bold: {bold})");
        Ok(())
    }

    /// Family used for measurement, if any face is loaded.
    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    fn face(&self, bold: bool) -> Option<&FontData> {
        let family = self.family.clone()?;
        self.fonts
            .get(&FontKey {
                family: family.clone(),
                bold,
            })
            .or_else(|| self.fonts.get(&FontKey { family, bold: false }))
    }

    /// Width of `text` in points at `font_size`.
    ///
    /// Without loaded font bytes we use the average advance of Helvetica
    /// (≈ 0.5 em, bold ≈ 0.55 em).
    pub fn measure_text_width(&self, text: &str, font_size: f32, bold: bool) -> f32 {
        let Some(data) = self.face(bold) else {
            let avg = if bold { 0.55 } else { 0.5 };
            return text.chars().count() as f32 * font_size * avg;
        };

        match ttf_parser::Face::parse(&data.bytes, 0) {
            Ok(face) => {
                let scale = font_size / data.units_per_em;
                text.chars()
                    .map(|ch| match face.glyph_index(ch) {
                        Some(gid) => face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale,
                        None => font_size * 0.5,
                    })
                    .sum()
            }
            Err(_) => text.chars().count() as f32 * font_size * 0.5,
        }
    }

    /// Check if real font bytes are loaded for the regular face.
    pub fn has_real_fonts(&self) -> bool {
        self.face(false).is_some()
    }
}

impl Default for FontManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Greedy word wrap on a character budget.
///
/// A word is appended to the current line unless that would push the line
/// past `max_chars`; then the line is flushed and the word starts the next
/// one. Words are never split, so a word longer than the budget sits alone
/// on its own line. Character counts only approximate rendered width.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Word wrap on measured width in points.
pub fn wrap_text_measured(
    text: &str,
    font_size: f32,
    bold: bool,
    max_width: f32,
    fonts: &FontManager,
) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current_line = String::new();
    for word in text.split_whitespace() {
        let candidate = if current_line.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current_line, word)
        };
        let w = fonts.measure_text_width(&candidate, font_size, bold);
        if w > max_width && !current_line.is_empty() {
            lines.push(current_line);
            current_line = word.to_string();
        } else {
            current_line = candidate;
        }
    }
    if !current_line.is_empty() {
        lines.push(current_line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "The employee shall maintain strict confidentiality of all \
        institute information including student records, examination papers and \
        internal communications during and after the period of employment.";

    #[test]
    fn heuristic_text_width() {
        let mgr = FontManager::default();
        let w = mgr.measure_text_width("Hello", 16.0, false);
        // 5 chars × 16 × 0.5 = 40
        assert!((w - 40.0).abs() < 0.1);
        assert!(!mgr.has_real_fonts());
        assert_eq!(mgr.family(), None);
    }

    #[test]
    fn loaded_face_measures_glyph_advances() {
        let mut mgr = FontManager::new();
        mgr.load_font(
            "Body",
            false,
            printpdf::BuiltinFont::Helvetica.get_subset_font().bytes,
        )
        .unwrap();
        assert!(mgr.has_real_fonts());
        assert_eq!(mgr.family(), Some("Body"));

        // Helvetica advances: H 722, e 556, l 222, l 222, o 556 per 1000 em.
        let w = mgr.measure_text_width("Hello", 16.0, false);
        assert!((w - 36.45).abs() < 1.0, "width {w}");
        assert!(mgr.measure_text_width("iiii", 10.0, false) < mgr.measure_text_width("MMMM", 10.0, false));
        // No bold face: bold measures with the regular one.
        assert_eq!(mgr.measure_text_width("Hello", 16.0, true), w);
    }

    #[test]
    fn helvetica_loads_both_weights() {
        let mgr = FontManager::helvetica().unwrap();
        assert_eq!(mgr.family(), Some("Helvetica"));
        let regular = mgr.measure_text_width("Salary Structure", 11.0, false);
        let bold = mgr.measure_text_width("Salary Structure", 11.0, true);
        assert!(bold > regular);
    }

    #[test]
    fn unparseable_font_is_rejected() {
        let mut mgr = FontManager::new();
        let err = mgr.load_font("Broken", false, b"not a font".to_vec()).unwrap_err();
        assert!(matches!(err, Error::Font(_)));
        assert!(!mgr.has_real_fonts());
    }

    #[test]
    fn wrap_respects_budget_and_preserves_words() {
        for budget in [12, 20, 37, 80] {
            let lines = wrap_text(SAMPLE, budget);
            for line in &lines {
                assert!(
                    line.trim().chars().count() <= budget,
                    "line {line:?} exceeds {budget}"
                );
            }
            let normalised = SAMPLE.split_whitespace().collect::<Vec<_>>().join(" ");
            assert_eq!(lines.join(" "), normalised);
        }
    }

    #[test]
    fn overlong_word_gets_its_own_line() {
        let lines = wrap_text("a supercalifragilistic b", 5);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn empty_and_whitespace_input() {
        assert!(wrap_text("", 10).is_empty());
        assert!(wrap_text("   \n\t ", 10).is_empty());
    }

    #[test]
    fn measured_wrap_fits_width() {
        let mgr = FontManager::default();
        let lines = wrap_text_measured(SAMPLE, 10.0, false, 150.0, &mgr);
        assert!(lines.len() > 1);
        for line in &lines {
            if line.contains(' ') {
                assert!(mgr.measure_text_width(line, 10.0, false) <= 150.0);
            }
        }
    }
}
