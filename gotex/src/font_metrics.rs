//! Font loading and glyph-width measurement, backed by `ttf-parser`.
//!
//! Glyph advance widths come straight from the TTF `hmtx` table; the
//! coarser vertical metrics (ascent/descent/line height) are fixed ratios
//! of the point size, the same ratios this project's predecessor used
//! rather than reading the font's own `OS/2`/`hhea` tables.

use std::path::{Path, PathBuf};

use crate::error::GotexError;

const HEIGHT_RATIO: f32 = 1.2;
const ASCENT_RATIO: f32 = 0.8;
const DESCENT_RATIO: f32 = 0.2;

/// A font weight/slant combination. Applies to both the body-text face set
/// and the math face set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

/// Which glyph set a piece of text should be measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontDomain {
    /// DejaVu Sans, used for ordinary document text.
    Text,
    /// TeX Gyre Pagella, used for math symbols and variables.
    Math,
}

pub trait FontMetrics {
    fn text_width(&self, text: &str, domain: FontDomain, style: FontStyle, size_pt: f32) -> f32;
    fn line_height(&self, size_pt: f32) -> f32 {
        size_pt * HEIGHT_RATIO
    }
    fn ascent(&self, size_pt: f32) -> f32 {
        size_pt * ASCENT_RATIO
    }
    fn descent(&self, size_pt: f32) -> f32 {
        size_pt * DESCENT_RATIO
    }
}

struct FaceSet {
    regular: Vec<u8>,
    bold: Vec<u8>,
    italic: Vec<u8>,
    bold_italic: Vec<u8>,
}

impl FaceSet {
    fn bytes_for(&self, style: FontStyle) -> &[u8] {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
            FontStyle::BoldItalic => &self.bold_italic,
        }
    }
}

/// Loads DejaVu Sans regular and the four TeX Gyre Pagella weights from a
/// `ttf/` directory and measures text against them. Only five files are
/// ever read: DejaVu backs plain body text, and Pagella backs everything
/// else — bold/italic/bold-italic body text as well as math of any style.
pub struct TtfFontMetrics {
    dejavu_regular: Vec<u8>,
    pagella: FaceSet,
}

impl TtfFontMetrics {
    /// Locate the font directory: `<exe_dir>/ttf` if present, else `./ttf`.
    pub fn locate_font_dir() -> Option<PathBuf> {
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let candidate = dir.join("ttf");
                if candidate.is_dir() {
                    return Some(candidate);
                }
            }
        }
        let cwd_candidate = PathBuf::from("./ttf");
        if cwd_candidate.is_dir() {
            return Some(cwd_candidate);
        }
        None
    }

    /// Load every required TTF file from `dir`. Fails fatally (a missing
    /// font is unrecoverable — there is no fallback glyph set) if any file
    /// is absent or unreadable.
    pub fn load(dir: &Path) -> Result<Self, GotexError> {
        let dejavu_regular = load_required(&dir.join("dejavu-sans").join("DejaVuSans.ttf"))?;
        let pagella = FaceSet {
            regular: load_required(&dir.join("pagella").join("texgyrepagella-regular.ttf"))?,
            bold: load_required(&dir.join("pagella").join("texgyrepagella-bold.ttf"))?,
            italic: load_required(&dir.join("pagella").join("texgyrepagella-italic.ttf"))?,
            bold_italic: load_required(
                &dir.join("pagella").join("texgyrepagella-bolditalic.ttf"),
            )?,
        };
        Ok(TtfFontMetrics {
            dejavu_regular,
            pagella,
        })
    }

    fn bytes_for(&self, domain: FontDomain, style: FontStyle) -> &[u8] {
        match (domain, style) {
            (FontDomain::Text, FontStyle::Regular) => &self.dejavu_regular,
            _ => self.pagella.bytes_for(style),
        }
    }
}

fn load_required(path: &Path) -> Result<Vec<u8>, GotexError> {
    std::fs::read(path).map_err(|e| {
        GotexError::FontLoad(format!("could not read font file {}: {e}", path.display()))
    })
}

impl FontMetrics for TtfFontMetrics {
    fn text_width(&self, text: &str, domain: FontDomain, style: FontStyle, size_pt: f32) -> f32 {
        let bytes = self.bytes_for(domain, style);
        let face = match ttf_parser::Face::parse(bytes, 0) {
            Ok(f) => f,
            Err(_) => return fallback_width(text, size_pt),
        };
        let units_per_em = face.units_per_em() as f32;
        if units_per_em == 0.0 {
            return fallback_width(text, size_pt);
        }
        let scale = size_pt / units_per_em;
        let mut width = 0.0;
        for ch in text.chars() {
            let advance = face
                .glyph_index(ch)
                .and_then(|gid| face.glyph_hor_advance(gid))
                .map(|units| units as f32 * scale);
            width += advance.unwrap_or(size_pt * 0.5);
        }
        width
    }
}

/// Used only if a face's bytes fail to parse after having loaded
/// successfully from disk (corrupt file): an even-width approximation so
/// layout can still proceed instead of aborting mid-page.
fn fallback_width(text: &str, size_pt: f32) -> f32 {
    text.chars().count() as f32 * size_pt * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_height_ascent_descent_ratios() {
        struct Dummy;
        impl FontMetrics for Dummy {
            fn text_width(&self, _: &str, _: FontDomain, _: FontStyle, _: f32) -> f32 {
                0.0
            }
        }
        let d = Dummy;
        assert_eq!(d.line_height(10.0), 12.0);
        assert_eq!(d.ascent(10.0), 8.0);
        assert_eq!(d.descent(10.0), 2.0);
    }

    #[test]
    fn locate_font_dir_falls_back_to_cwd_or_none() {
        // Doesn't assert a specific outcome (depends on the test sandbox's
        // filesystem), just that this doesn't panic.
        let _ = TtfFontMetrics::locate_font_dir();
    }
}
