//! End-to-end scenarios driving the full parse → expand → layout pipeline
//! through the public API, with fake `PdfBackend`/`FontMetrics`
//! collaborators standing in for real font files and PDF bytes.

use std::path::Path;

use gotex::ast::MacroStore;
use gotex::document_processor::DocumentProcessor;
use gotex::error::GotexError;
use gotex::font_metrics::{FontDomain, FontMetrics, FontStyle};
use gotex::macros;
use gotex::parser::parse_document;
use gotex::pdf_backend::PdfBackend;

struct FixedWidthMetrics;

impl FontMetrics for FixedWidthMetrics {
    fn text_width(&self, text: &str, _domain: FontDomain, _style: FontStyle, size_pt: f32) -> f32 {
        text.chars().count() as f32 * size_pt * 0.5
    }
}

#[derive(Debug, Clone)]
struct DrawnText {
    x: f32,
    y: f32,
    text: String,
    size_pt: f32,
    style: FontStyle,
}

struct RecordingBackend {
    texts: Vec<DrawnText>,
    lines: Vec<(f32, f32, f32, f32)>,
    pages: usize,
}

impl RecordingBackend {
    fn new() -> Self {
        RecordingBackend {
            texts: Vec::new(),
            lines: Vec::new(),
            pages: 0,
        }
    }
}

impl PdfBackend for RecordingBackend {
    fn new_page(&mut self, _width_pt: f32, _height_pt: f32) {
        self.pages += 1;
    }

    fn add_text(&mut self, x: f32, y: f32, text: &str, size_pt: f32, style: FontStyle, _domain: FontDomain) {
        self.texts.push(DrawnText {
            x,
            y,
            text: text.to_string(),
            size_pt,
            style,
        });
    }

    fn add_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, _thickness: f32) {
        self.lines.push((x1, y1, x2, y2));
    }

    fn page_count(&self) -> usize {
        self.pages.max(1)
    }

    fn write_file(&self, _path: &Path) -> Result<(), GotexError> {
        Ok(())
    }
}

fn render(source: &str) -> RecordingBackend {
    let (doc, _errors) = parse_document(source);
    let store = MacroStore::with_builtins();
    let expanded = macros::expand_document(doc, &store);

    let metrics = FixedWidthMetrics;
    let mut backend = RecordingBackend::new();
    {
        let mut processor = DocumentProcessor::new(&mut backend, &metrics);
        processor.process_document(&expanded);
    }
    backend
}

#[test]
fn hello_world_renders_on_a_single_page() {
    let backend = render("Hello, world.");
    assert_eq!(backend.page_count(), 1);
    assert!(backend.texts.iter().any(|t| t.text == "Hello,"));
    assert!(backend.texts.iter().any(|t| t.text == "world."));
}

#[test]
fn section_command_produces_numbered_bold_heading() {
    let backend = render(r"\section{Intro}Body text.");
    let heading = backend
        .texts
        .iter()
        .find(|t| t.text == "1 Intro")
        .expect("numbered section heading rendered");
    assert_eq!(heading.style, FontStyle::Bold);
    assert_eq!(heading.size_pt, 12.0 * 1.4);
    assert!(backend.texts.iter().any(|t| t.text == "Body"));
}

#[test]
fn inline_math_spacing_separates_operator_and_operands() {
    let backend = render(r"$x+y$");
    let x_pos = backend.texts.iter().find(|t| t.text == "x").unwrap().x;
    let plus_pos = backend.texts.iter().find(|t| t.text == "+").unwrap().x;
    let y_pos = backend.texts.iter().find(|t| t.text == "y").unwrap().x;
    assert!(plus_pos > x_pos);
    assert!(y_pos > plus_pos);
}

#[test]
fn fraction_draws_a_vinculum_spanning_its_width() {
    let backend = render(r"$\frac{1}{2}$");
    assert_eq!(backend.lines.len(), 1);
    let (x1, y1, x2, y2) = backend.lines[0];
    assert_eq!(y1, y2, "vinculum is horizontal");
    assert!(x2 > x1, "vinculum spans nonzero width");
}

#[test]
fn equation_environment_is_numbered_and_right_aligned() {
    let backend = render(r"\section{Intro}\begin{equation}a=b\end{equation}");
    let number = backend.texts.iter().find(|t| t.text == "(1.1)").expect("equation number rendered");
    let a = backend.texts.iter().find(|t| t.text == "a").unwrap();
    assert!(number.x > a.x, "equation number sits to the right of the equation body");
}

#[test]
fn itemize_list_renders_bullets_with_indented_content() {
    let backend = render(r"\begin{itemize}\item First\item Second\end{itemize}");
    let bullets: Vec<_> = backend.texts.iter().filter(|t| t.text == "\u{2022}").collect();
    assert_eq!(bullets.len(), 2);
    let first_word = backend.texts.iter().find(|t| t.text == "First").unwrap();
    assert!(first_word.x > bullets[0].x, "item content is indented past its bullet");
}

#[test]
fn nested_textbf_textit_compose_to_bold_italic() {
    let backend = render(r"\textbf{\textit{emphatic}}");
    let word = backend.texts.iter().find(|t| t.text == "emphatic").unwrap();
    assert_eq!(word.style, FontStyle::BoldItalic);
}

#[test]
fn unterminated_brace_is_recovered_and_surrounding_text_still_renders() {
    let (doc, errors) = parse_document("before { after");
    assert_eq!(errors.len(), 1);
    assert!(!doc.body.is_empty());

    let store = MacroStore::with_builtins();
    let expanded = macros::expand_document(doc, &store);
    let metrics = FixedWidthMetrics;
    let mut backend = RecordingBackend::new();
    {
        let mut processor = DocumentProcessor::new(&mut backend, &metrics);
        processor.process_document(&expanded);
    }
    assert!(backend.texts.iter().any(|t| t.text == "before"));
}
