//! The layout engine: walks the (macro-expanded) document tree and drives
//! a [`PdfBackend`] through a cursor over a paginated, top-left-origin,
//! y-down canvas. Grounded on this project's predecessor's `processor`
//! package — the same cursor fields, the same line-wrapping and
//! section/list spacing constants, ported onto the `PdfBackend`/
//! `FontMetrics`/`MathProcessor` collaborators.

use crate::ast::{Document, Node, NodeKind};
use crate::environments::{self, ListKind};
use crate::font_metrics::{FontDomain, FontMetrics, FontStyle};
use crate::math_processor::MathProcessor;
use crate::pdf_backend::PdfBackend;

/// US Letter and A4 both work; this follows the predecessor's choice of A4.
pub const PAGE_WIDTH_PT: f32 = 595.2756;
pub const PAGE_HEIGHT_PT: f32 = 841.8898;

const MARGIN_TOP: f32 = 72.0;
const MARGIN_RIGHT: f32 = 72.0;
const MARGIN_BOTTOM: f32 = 72.0;
const MARGIN_LEFT: f32 = 72.0;
const LINE_HEIGHT: f32 = 20.0;
const BASE_FONT_SIZE: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Normal,
    Bold,
    Italic,
    BoldItalic,
}

impl TextStyle {
    fn to_font_style(self) -> FontStyle {
        match self {
            TextStyle::Normal => FontStyle::Regular,
            TextStyle::Bold => FontStyle::Bold,
            TextStyle::Italic => FontStyle::Italic,
            TextStyle::BoldItalic => FontStyle::BoldItalic,
        }
    }

    /// Compose with a `"bold"`/`"italic"` font-switch argument the way a
    /// nested `\textbf`/`\textit` expansion does: `textbf` inside `italic`
    /// gives `bold-italic`, and so on.
    fn with_font_arg(self, arg: &str) -> TextStyle {
        match (self, arg) {
            (TextStyle::BoldItalic, _) => TextStyle::BoldItalic,
            (TextStyle::Italic, "bold") | (TextStyle::Bold, "italic") => TextStyle::BoldItalic,
            (_, "bold") => TextStyle::Bold,
            (_, "italic") => TextStyle::Italic,
            _ => self,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ListEntry {
    kind: ListKind,
    counter: u32,
}

/// Stateful walker: current cursor, line/paragraph state, list stack,
/// section/subsection/equation counters, and the title/author/date
/// strings collected along the way.
pub struct DocumentProcessor<'a> {
    backend: &'a mut dyn PdfBackend,
    metrics: &'a dyn FontMetrics,
    math: MathProcessor<'a>,
    font_size: f32,
    current_y: f32,
    current_line_x: f32,
    line_has_content: bool,
    section_counter: u32,
    subsection_counter: u32,
    equation_counter: u32,
    list_stack: Vec<ListEntry>,
    title: Option<String>,
    author: Option<String>,
    date: Option<String>,
}

impl<'a> DocumentProcessor<'a> {
    pub fn new(backend: &'a mut dyn PdfBackend, metrics: &'a dyn FontMetrics) -> Self {
        backend.new_page(PAGE_WIDTH_PT, PAGE_HEIGHT_PT);
        DocumentProcessor {
            backend,
            metrics,
            math: MathProcessor::new(metrics, BASE_FONT_SIZE),
            font_size: BASE_FONT_SIZE,
            current_y: PAGE_HEIGHT_PT - MARGIN_TOP,
            current_line_x: MARGIN_LEFT,
            line_has_content: false,
            section_counter: 0,
            subsection_counter: 0,
            equation_counter: 0,
            list_stack: Vec::new(),
            title: None,
            author: None,
            date: None,
        }
    }

    pub fn process_document(&mut self, doc: &Document) {
        self.process_nodes(&doc.body, TextStyle::Normal);
    }

    fn content_width(&self) -> f32 {
        PAGE_WIDTH_PT - MARGIN_LEFT - MARGIN_RIGHT
    }

    fn right_margin_x(&self) -> f32 {
        PAGE_WIDTH_PT - MARGIN_RIGHT
    }

    fn line_start_x(&self) -> f32 {
        MARGIN_LEFT + self.list_stack.len() as f32 * 15.0
    }

    // ---- cursor primitives ----------------------------------------------

    fn check_new_page(&mut self) {
        if self.current_y < MARGIN_BOTTOM + 50.0 {
            self.backend.new_page(PAGE_WIDTH_PT, PAGE_HEIGHT_PT);
            self.current_y = PAGE_HEIGHT_PT - MARGIN_TOP;
            self.current_line_x = self.line_start_x();
        }
    }

    fn new_line(&mut self) {
        self.current_y -= LINE_HEIGHT;
        self.current_line_x = self.line_start_x();
        self.line_has_content = false;
        self.check_new_page();
    }

    fn add_vertical_space(&mut self, amount: f32) {
        self.current_y -= amount;
        self.check_new_page();
    }

    fn add_paragraph_break(&mut self) {
        self.new_line();
        self.add_vertical_space(LINE_HEIGHT * 0.8);
    }

    // ---- text flow (spec.md 4.6.1) ---------------------------------------

    fn process_text(&mut self, text: &str, style: TextStyle) {
        let mut first_paragraph = true;
        for paragraph in text.split("\n\n") {
            if !first_paragraph {
                self.add_paragraph_break();
            }
            first_paragraph = false;
            let normalized = paragraph.replace('\n', " ");
            for word in normalized.split_whitespace() {
                self.add_word(word, style);
            }
        }
    }

    fn add_word(&mut self, word: &str, style: TextStyle) {
        let font_style = style.to_font_style();
        let space_width = if self.line_has_content {
            self.metrics.text_width(" ", FontDomain::Text, font_style, self.font_size)
        } else {
            0.0
        };
        let word_width = self.metrics.text_width(word, FontDomain::Text, font_style, self.font_size);

        if self.line_has_content && self.current_line_x + space_width + word_width > self.right_margin_x() {
            self.new_line();
        } else if self.line_has_content {
            self.current_line_x += space_width;
        }

        self.check_new_page();
        self.backend
            .add_text(self.current_line_x, self.current_y, word, self.font_size, font_style, FontDomain::Text);
        self.current_line_x += word_width;
        self.line_has_content = true;
    }

    // ---- text extraction (spec.md 4.6.2, 4.6.5) --------------------------

    /// Flatten a node tree down to its rendered text, recursing into
    /// `textbf`/`textit`/`font`-wrapped arguments and resolving `\today`.
    fn extract_text(&self, nodes: &[Node]) -> String {
        let mut out = String::new();
        for (i, node) in nodes.iter().enumerate() {
            let piece = self.extract_text_node(node);
            if i > 0
                && should_add_space_between_nodes(&nodes[i - 1], node)
                && !out.ends_with(char::is_whitespace)
                && !piece.starts_with(char::is_whitespace)
            {
                out.push(' ');
            }
            out.push_str(&piece);
        }
        out
    }

    fn extract_text_node(&self, node: &Node) -> String {
        match &node.kind {
            NodeKind::Text(t) => t.clone(),
            NodeKind::Command { name, .. } if name == "today" => today_string(),
            NodeKind::Command { required_args, .. } => self.extract_text(required_args),
            NodeKind::Group(nodes) => self.extract_text(nodes),
            _ => String::new(),
        }
    }

    // ---- dispatch ---------------------------------------------------------

    fn process_nodes(&mut self, nodes: &[Node], style: TextStyle) {
        for node in nodes {
            self.process_node(node, style);
        }
    }

    fn process_node(&mut self, node: &Node, style: TextStyle) {
        match &node.kind {
            NodeKind::Text(s) => self.process_text(s, style),
            NodeKind::Comment(_) => {}
            NodeKind::Command {
                name,
                required_args,
                optional_args,
            } => self.process_command(name, required_args, optional_args, style),
            NodeKind::Environment { name, body } => self.process_environment(name, body, style),
            NodeKind::Group(nodes) => self.process_group(nodes, style),
            NodeKind::MathNode { inline, content } => self.process_math(content, *inline),
            NodeKind::ArgumentPlaceholder(_) => {}
            NodeKind::ErrorRecovery { .. } => {}
            // A bare math element outside a `MathNode` container shouldn't
            // occur from the parser, but render it inline rather than drop
            // it silently if it does (e.g. after an unusual macro expansion).
            NodeKind::MathSymbol { .. }
            | NodeKind::MathSuperscript { .. }
            | NodeKind::MathSubscript { .. }
            | NodeKind::MathFraction { .. } => self.process_math(std::slice::from_ref(node), true),
        }
    }

    /// A `Group` whose first child is `Command("font", [style])` is a
    /// macro-expansion artifact (`\textbf`/`\textit`): read the style
    /// argument and render the rest of the group with the composed style.
    fn process_group(&mut self, nodes: &[Node], style: TextStyle) {
        if let Some(first) = nodes.first() {
            if let NodeKind::Command { name, required_args, .. } = &first.kind {
                if name == "font" {
                    let arg = required_args
                        .first()
                        .map(|n| self.extract_text(std::slice::from_ref(n)))
                        .unwrap_or_default();
                    let new_style = style.with_font_arg(arg.trim());
                    self.process_nodes(&nodes[1..], new_style);
                    return;
                }
            }
        }
        self.process_nodes(nodes, style);
    }

    fn process_math(&mut self, content: &[Node], inline: bool) {
        if inline {
            self.check_new_page();
            let advance = self.math.render(&mut *self.backend, content, self.current_line_x, self.current_y);
            self.current_line_x += advance;
            self.line_has_content = true;
        } else {
            self.new_line();
            self.check_new_page();
            let content_width = self.content_width();
            self.math.process_math_node(
                &mut *self.backend,
                content,
                false,
                MARGIN_LEFT,
                self.current_y,
                content_width,
                MARGIN_LEFT,
            );
            self.new_line();
        }
    }

    // ---- commands (spec.md 4.6.2) -----------------------------------------

    fn process_command(&mut self, name: &str, required_args: &[Node], _optional_args: &[Node], style: TextStyle) {
        match name {
            "documentclass" | "usepackage" => {}
            "title" => self.title = Some(self.extract_text(required_args)),
            "author" => self.author = Some(self.extract_text(required_args)),
            "date" => self.date = Some(self.extract_text(required_args)),
            "maketitle" => self.add_title(),
            "section" => {
                let text = self.extract_text(required_args);
                self.add_section(&text);
            }
            "subsection" => {
                let text = self.extract_text(required_args);
                self.add_subsection(&text);
            }
            "subsubsection" => {
                let text = self.extract_text(required_args);
                self.add_subsubsection(&text);
            }
            // Only reachable without its enclosing `Group` if a macro
            // expansion produced a lone `font` switch; there is nothing
            // after it in that case to restyle.
            "font" => {}
            "item" => self.add_list_item(style),
            "today" => self.process_text(&today_string(), style),
            _ => self.process_nodes(required_args, style),
        }
    }

    fn render_heading(&mut self, text: &str, size: f32) {
        self.check_new_page();
        self.backend
            .add_text(MARGIN_LEFT, self.current_y, text, size, FontStyle::Bold, FontDomain::Text);
        self.new_line();
    }

    fn add_section(&mut self, text: &str) {
        self.section_counter += 1;
        self.subsection_counter = 0;
        self.equation_counter = 0;
        let ex = self.font_size * 0.5;
        self.add_vertical_space((3.5 + 1.0) * ex);
        let title = format!("{} {}", self.section_counter, text);
        self.render_heading(&title, self.font_size * 1.4);
        self.add_vertical_space(2.3 * ex);
    }

    fn add_subsection(&mut self, text: &str) {
        self.subsection_counter += 1;
        let ex = self.font_size * 0.5;
        self.add_vertical_space((3.25 + 1.0) * ex);
        let title = format!("{}.{} {}", self.section_counter, self.subsection_counter, text);
        self.render_heading(&title, self.font_size * 1.2);
        self.add_vertical_space(1.5 * ex);
    }

    fn add_subsubsection(&mut self, text: &str) {
        let ex = self.font_size * 0.5;
        self.add_vertical_space((3.25 + 1.0) * ex);
        self.render_heading(text, self.font_size * 1.05);
        self.add_vertical_space(1.5 * ex);
    }

    fn add_title(&mut self) {
        let title = self.title.clone();
        let author = self.author.clone();
        let date = self.date.clone();

        self.add_vertical_space(40.0);
        if let Some(t) = &title {
            self.add_centered_text(t, self.font_size * 1.8, FontStyle::Regular);
        }
        self.add_vertical_space(40.0);

        if let Some(a) = &author {
            self.add_vertical_space(15.0);
            self.add_centered_text(a, self.font_size, FontStyle::Regular);
            self.add_vertical_space(LINE_HEIGHT);
        }

        if let Some(d) = &date {
            self.add_vertical_space(8.0);
            self.add_centered_text(d, self.font_size, FontStyle::Regular);
            self.add_vertical_space(LINE_HEIGHT * 2.0);
        }

        self.current_line_x = self.line_start_x();
        self.line_has_content = false;
    }

    fn add_centered_text(&mut self, text: &str, size: f32, style: FontStyle) {
        self.check_new_page();
        let width = self.metrics.text_width(text, FontDomain::Text, style, size);
        let x = MARGIN_LEFT + (self.content_width() - width) / 2.0;
        self.backend.add_text(x, self.current_y, text, size, style, FontDomain::Text);
    }

    // ---- environments (spec.md 4.6.3, 4.6.4) -------------------------------

    fn process_environment(&mut self, name: &str, body: &[Node], style: TextStyle) {
        if let Some(kind) = ListKind::from_env_name(name) {
            self.enter_list(kind);
            self.process_nodes(body, style);
            self.exit_list();
            return;
        }
        match name {
            "document" => self.process_nodes(body, style),
            "center" => {
                self.add_vertical_space(10.0);
                self.process_nodes(body, style);
                self.add_vertical_space(10.0);
            }
            name if environments::is_math_environment(name) => self.process_equation_environment(body),
            _ => self.process_nodes(body, style),
        }
    }

    fn enter_list(&mut self, kind: ListKind) {
        self.add_vertical_space(5.0);
        self.list_stack.push(ListEntry { kind, counter: 0 });
    }

    fn exit_list(&mut self) {
        self.list_stack.pop();
        self.new_line();
        self.add_vertical_space(15.0);
    }

    fn add_list_item(&mut self, style: TextStyle) {
        self.new_line();
        let level = self.list_stack.len().max(1) as f32;
        let indent_x = MARGIN_LEFT + (level - 1.0) * 15.0;
        let content_x = indent_x + 25.0;

        let marker = match self.list_stack.last_mut() {
            Some(entry) => match entry.kind {
                ListKind::Itemize => "\u{2022}".to_string(),
                ListKind::Enumerate => {
                    entry.counter += 1;
                    format!("{}.", entry.counter)
                }
            },
            None => "\u{2022}".to_string(),
        };

        self.check_new_page();
        self.backend
            .add_text(indent_x, self.current_y, &marker, self.font_size, style.to_font_style(), FontDomain::Text);
        self.current_line_x = content_x;
        self.line_has_content = false;
    }

    fn process_equation_environment(&mut self, content: &[Node]) {
        self.add_vertical_space(LINE_HEIGHT * 0.5);
        self.equation_counter += 1;
        let number = if self.section_counter > 0 {
            format!("({}.{})", self.section_counter, self.equation_counter)
        } else {
            format!("({})", self.equation_counter)
        };

        self.check_new_page();
        let content_width = self.content_width();
        self.math.process_math_node(
            &mut *self.backend,
            content,
            false,
            MARGIN_LEFT,
            self.current_y,
            content_width,
            MARGIN_LEFT,
        );

        let number_width = self.metrics.text_width(&number, FontDomain::Text, FontStyle::Regular, self.font_size);
        let number_x = MARGIN_LEFT + content_width - number_width;
        self.backend
            .add_text(number_x, self.current_y, &number, self.font_size, FontStyle::Regular, FontDomain::Text);

        self.new_line();
        self.add_vertical_space(LINE_HEIGHT * 0.5);
    }
}

/// Spaces are inserted between adjacent nodes only for text-to-text,
/// text-to-command, and command-to-text pairs, and only where neither side
/// already carries explicit whitespace; command-to-command pairs are left
/// alone since a run of commands carries no text of its own to space out.
fn should_add_space_between_nodes(a: &Node, b: &Node) -> bool {
    matches!(
        (&a.kind, &b.kind),
        (NodeKind::Text(_), NodeKind::Text(_))
            | (NodeKind::Text(_), NodeKind::Command { .. })
            | (NodeKind::Command { .. }, NodeKind::Text(_))
    )
}

/// `\today`, formatted the way the predecessor's Go runtime formatted it
/// (`"January 2, 2006"`, i.e. month name, day without a leading zero, year).
/// Hand-rolled from `SystemTime` rather than pulling in a date/time crate
/// for one field.
fn today_string() -> String {
    let days_since_epoch = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| (d.as_secs() / 86_400) as i64)
        .unwrap_or(0);
    let (year, month, day) = civil_from_days(days_since_epoch);
    format!("{} {}, {}", month_name(month), day, year)
}

/// Howard Hinnant's `civil_from_days`: days since the Unix epoch to a
/// proleptic-Gregorian `(year, month, day)` triple, without pulling in a
/// calendar crate.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let y = if m <= 2 { y + 1 } else { y };
    (y, m, d)
}

fn month_name(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "January", "February", "March", "April", "May", "June", "July", "August", "September",
        "October", "November", "December",
    ];
    NAMES[(month - 1) as usize % 12]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macros;
    use crate::parser::parse_document;
    use std::path::Path;

    struct RecordingBackend {
        texts: Vec<(f32, f32, String, f32, FontStyle)>,
        pages: usize,
    }

    impl RecordingBackend {
        fn new() -> Self {
            RecordingBackend {
                texts: Vec::new(),
                pages: 0,
            }
        }
    }

    impl PdfBackend for RecordingBackend {
        fn new_page(&mut self, _width_pt: f32, _height_pt: f32) {
            self.pages += 1;
        }

        fn add_text(&mut self, x: f32, y: f32, text: &str, size_pt: f32, style: FontStyle, _domain: FontDomain) {
            self.texts.push((x, y, text.to_string(), size_pt, style));
        }

        fn add_line(&mut self, _x1: f32, _y1: f32, _x2: f32, _y2: f32, _thickness: f32) {}

        fn page_count(&self) -> usize {
            self.pages
        }

        fn write_file(&self, _path: &Path) -> Result<(), crate::error::GotexError> {
            Ok(())
        }
    }

    struct FixedWidthMetrics;
    impl FontMetrics for FixedWidthMetrics {
        fn text_width(&self, text: &str, _domain: FontDomain, _style: FontStyle, size_pt: f32) -> f32 {
            text.chars().count() as f32 * size_pt * 0.5
        }
    }

    fn run(source: &str) -> RecordingBackend {
        let (doc, _errors) = parse_document(source);
        let store = crate::ast::MacroStore::with_builtins();
        let doc = macros::expand_document(doc, &store);
        let metrics = FixedWidthMetrics;
        let mut backend = RecordingBackend::new();
        {
            let mut processor = DocumentProcessor::new(&mut backend, &metrics);
            processor.process_document(&doc);
        }
        backend
    }

    #[test]
    fn section_renders_numbered_bold_heading() {
        let backend = run(r"\section{Intro}Hello.");
        let heading = backend
            .texts
            .iter()
            .find(|(_, _, text, _, style)| text == "1 Intro" && *style == FontStyle::Bold)
            .expect("numbered section heading");
        assert_eq!(heading.3, 12.0 * 1.4);
    }

    #[test]
    fn subsection_resets_to_one_after_new_section() {
        let backend = run(r"\section{A}\subsection{One}\section{B}\subsection{Two}");
        assert!(backend.texts.iter().any(|(_, _, t, _, _)| t == "1.1 One"));
        assert!(backend.texts.iter().any(|(_, _, t, _, _)| t == "2.1 Two"));
    }

    #[test]
    fn enumerate_items_get_increasing_numbers() {
        let backend = run(r"\begin{enumerate}\item A\item B\item C\end{enumerate}");
        let markers: Vec<&str> = backend
            .texts
            .iter()
            .filter(|(_, _, t, _, _)| t.ends_with('.') && t.len() <= 2)
            .map(|(_, _, t, _, _)| t.as_str())
            .collect();
        assert_eq!(markers, vec!["1.", "2.", "3."]);
    }

    #[test]
    fn itemize_items_use_bullet_glyph() {
        let backend = run(r"\begin{itemize}\item A\item B\end{itemize}");
        let bullets = backend.texts.iter().filter(|(_, _, t, _, _)| t == "\u{2022}").count();
        assert_eq!(bullets, 2);
    }

    #[test]
    fn equation_without_prior_section_is_numbered_plain() {
        let backend = run(r"\begin{equation}x=y\end{equation}");
        assert!(backend.texts.iter().any(|(_, _, t, _, _)| t == "(1)"));
    }

    #[test]
    fn equation_after_section_is_numbered_with_section_prefix() {
        let backend = run(r"\section{Intro}\begin{equation}x=y\end{equation}");
        assert!(backend.texts.iter().any(|(_, _, t, _, _)| t == "(1.1)"));
    }

    #[test]
    fn textbf_renders_argument_in_bold_style() {
        let backend = run(r"\textbf{strong}");
        assert!(backend
            .texts
            .iter()
            .any(|(_, _, t, _, style)| t == "strong" && *style == FontStyle::Bold));
    }

    #[test]
    fn nested_textbf_textit_composes_bold_italic() {
        let backend = run(r"\textbf{\textit{both}}");
        assert!(backend
            .texts
            .iter()
            .any(|(_, _, t, _, style)| t == "both" && *style == FontStyle::BoldItalic));
    }

    #[test]
    fn long_words_wrap_onto_a_new_line() {
        let long_word_a = "a".repeat(60);
        let long_word_b = "b".repeat(60);
        let backend = run(&format!("{long_word_a} {long_word_b}"));
        let y_a = backend.texts.iter().find(|(_, _, t, _, _)| t == &long_word_a).unwrap().1;
        let y_b = backend.texts.iter().find(|(_, _, t, _, _)| t == &long_word_b).unwrap().1;
        assert!(y_b < y_a);
    }

    #[test]
    fn today_string_has_month_day_year_shape() {
        let s = today_string();
        let parts: Vec<&str> = s.splitn(2, ' ').collect();
        assert_eq!(parts.len(), 2);
        assert!(s.ends_with(char::is_numeric));
        assert!(s.contains(','));
    }
}
