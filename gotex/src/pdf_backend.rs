//! PDF emission, backed by `printpdf`.
//!
//! The rest of the compiler works in a top-left-origin, y-down point
//! coordinate system (`spec.md` §9); this module is the one place that
//! flips `y` into PDF's bottom-left-origin, y-up page space, the same
//! seam this project's predecessor isolated its own PDF writer behind.

use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::path::Path;

use printpdf::{IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerIndex,
    PdfPageIndex, Point, Pt};

use crate::error::GotexError;
use crate::font_metrics::{FontDomain, FontStyle};

/// The PDF-emission half of the document processor's two collaborators
/// (the other being [`crate::font_metrics::FontMetrics`]).
pub trait PdfBackend {
    /// Start a new page of the given size, in points, and make it current.
    fn new_page(&mut self, width_pt: f32, height_pt: f32);

    /// Draw `text` with its left edge at `(x, y)`, `y` measured down from
    /// the page's top-left corner.
    fn add_text(&mut self, x: f32, y: f32, text: &str, size_pt: f32, style: FontStyle, domain: FontDomain);

    /// Draw a straight line (used for the fraction vinculum).
    fn add_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, thickness: f32);

    fn page_count(&self) -> usize;

    fn write_file(&self, path: &Path) -> Result<(), GotexError>;
}

/// The four weights of TeX Gyre Pagella. Pagella backs every style except
/// plain regular text, which uses DejaVu Sans instead (see
/// [`PrintPdfBackend::font_handle`]).
struct PagellaHandles {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
    bold_italic: IndirectFontRef,
}

impl PagellaHandles {
    fn handle(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
            FontStyle::BoldItalic => &self.bold_italic,
        }
    }
}

pub struct PrintPdfBackend {
    doc: PdfDocumentReference,
    pages: Vec<(PdfPageIndex, PdfLayerIndex, f32)>, // (page, layer, page_height_pt)
    dejavu_regular: IndirectFontRef,
    pagella: PagellaHandles,
}

impl PrintPdfBackend {
    /// Build a backend with DejaVu Sans regular and the four Pagella
    /// weights already embedded, so every page created afterward can use
    /// them. Only five font files are ever loaded: DejaVu backs plain
    /// text, Pagella backs everything else (bold/italic/bold-italic text,
    /// and math of any style).
    pub fn new(
        title: &str,
        dejavu_regular: Vec<u8>,
        pagella: (Vec<u8>, Vec<u8>, Vec<u8>, Vec<u8>),
    ) -> Result<Self, GotexError> {
        let (doc, page_idx, layer_idx) = PdfDocument::new(title, Mm(210.0), Mm(297.0), "Layer 1");
        let embed = |doc: &PdfDocumentReference, bytes: Vec<u8>| -> Result<IndirectFontRef, GotexError> {
            doc.add_external_font(Cursor::new(bytes))
                .map_err(|e| GotexError::PdfWrite(format!("font embedding failed: {e}")))
        };

        let dejavu_regular = embed(&doc, dejavu_regular)?;
        let pagella = PagellaHandles {
            regular: embed(&doc, pagella.0)?,
            bold: embed(&doc, pagella.1)?,
            italic: embed(&doc, pagella.2)?,
            bold_italic: embed(&doc, pagella.3)?,
        };

        Ok(PrintPdfBackend {
            doc,
            pages: vec![(page_idx, layer_idx, 297.0 * MM_TO_PT)],
            dejavu_regular,
            pagella,
        })
    }

    fn current(&self) -> &(PdfPageIndex, PdfLayerIndex, f32) {
        self.pages.last().expect("at least one page always exists")
    }

    fn font_handle(&self, domain: FontDomain, style: FontStyle) -> &IndirectFontRef {
        match (domain, style) {
            (FontDomain::Text, FontStyle::Regular) => &self.dejavu_regular,
            _ => self.pagella.handle(style),
        }
    }
}

const MM_TO_PT: f32 = 72.0 / 25.4;

fn pt_to_mm(pt: f32) -> Mm {
    Mm::from(Pt(pt as f64))
}

impl PdfBackend for PrintPdfBackend {
    fn new_page(&mut self, width_pt: f32, height_pt: f32) {
        let (page_idx, layer_idx) =
            self.doc
                .add_page(pt_to_mm(width_pt), pt_to_mm(height_pt), "Layer 1");
        self.pages.push((page_idx, layer_idx, height_pt));
    }

    fn add_text(
        &mut self,
        x: f32,
        y: f32,
        text: &str,
        size_pt: f32,
        style: FontStyle,
        domain: FontDomain,
    ) {
        let (page_idx, layer_idx, page_height) = *self.current();
        let layer = self.doc.get_page(page_idx).get_layer(layer_idx);
        let font = self.font_handle(domain, style);
        let pdf_y = page_height - y;
        layer.use_text(text, size_pt as f64, pt_to_mm(x), pt_to_mm(pdf_y), font);
    }

    fn add_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, thickness: f32) {
        let (page_idx, layer_idx, page_height) = *self.current();
        let layer = self.doc.get_page(page_idx).get_layer(layer_idx);
        layer.set_outline_thickness(thickness as f64);
        let p1 = Point::new(pt_to_mm(x1), pt_to_mm(page_height - y1));
        let p2 = Point::new(pt_to_mm(x2), pt_to_mm(page_height - y2));
        let line = Line {
            points: vec![(p1, false), (p2, false)],
            is_closed: false,
        };
        layer.add_line(line);
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn write_file(&self, path: &Path) -> Result<(), GotexError> {
        let file = File::create(path).map_err(GotexError::Io)?;
        self.doc
            .save(&mut BufWriter::new(file))
            .map_err(|e| GotexError::PdfWrite(e.to_string()))
    }
}
