//! gotex: compiles a subset of LaTeX/TeX source into a paginated PDF
//! document. See each module for the stage of the pipeline it implements:
//! tokenizing, parsing, macro expansion, and finally layout/typesetting.

pub mod ast;
pub mod config;
pub mod document_processor;
pub mod environments;
pub mod error;
pub mod font_metrics;
pub mod lexer;
pub mod macros;
pub mod math_parser;
pub mod math_processor;
pub mod parser;
pub mod pdf_backend;
pub mod position;
pub mod reporter;
pub mod symbols;
pub mod token;

use std::path::Path;

use ast::MacroStore;
use config::GotexConfig;
use document_processor::DocumentProcessor;
use error::{GotexError, ParseError};
use font_metrics::{FontMetrics, TtfFontMetrics};
use pdf_backend::{PdfBackend, PrintPdfBackend};

/// Compile `source` (the contents of a `.tex` file) and write the result to
/// `output_path`. Returns the parse diagnostics collected along the way —
/// compilation proceeds and a PDF is still written even when diagnostics are
/// present, per the parser's best-effort recovery policy; only I/O, font,
/// or PDF-writing failures are returned as `Err`.
pub fn compile_to_pdf(
    source: &str,
    output_path: &Path,
    config: &GotexConfig,
) -> Result<Vec<ParseError>, GotexError> {
    let (doc, errors) = parser::parse_document(source);

    let mut store = MacroStore::with_builtins();
    for m in config.macro_definitions() {
        store.set(m);
    }
    let expanded = macros::expand_document(doc, &store);

    let ttf_dir = config
        .ttf_dir
        .as_ref()
        .map(std::path::PathBuf::from)
        .or_else(TtfFontMetrics::locate_font_dir)
        .ok_or_else(|| GotexError::FontLoad("could not locate a ttf/ font directory".to_string()))?;
    let metrics = TtfFontMetrics::load(&ttf_dir)?;

    let mut backend = build_pdf_backend(&ttf_dir)?;
    let mut processor = DocumentProcessor::new(&mut backend, &metrics as &dyn FontMetrics);
    processor.process_document(&expanded);
    drop(processor);

    backend.write_file(output_path)?;
    Ok(errors)
}

/// Reads the same five files `TtfFontMetrics::load` does: DejaVu backs
/// plain text, Pagella's four weights back everything else.
fn build_pdf_backend(ttf_dir: &Path) -> Result<PrintPdfBackend, GotexError> {
    let dejavu_regular = std::fs::read(ttf_dir.join("dejavu-sans").join("DejaVuSans.ttf"))?;
    let pagella = (
        std::fs::read(ttf_dir.join("pagella").join("texgyrepagella-regular.ttf"))?,
        std::fs::read(ttf_dir.join("pagella").join("texgyrepagella-bold.ttf"))?,
        std::fs::read(ttf_dir.join("pagella").join("texgyrepagella-italic.ttf"))?,
        std::fs::read(ttf_dir.join("pagella").join("texgyrepagella-bolditalic.ttf"))?,
    );
    PrintPdfBackend::new("gotex document", dejavu_regular, pagella)
}
