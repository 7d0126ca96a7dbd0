//! Renders a parsed math subtree (inline or display) to the page, and
//! measures how wide one would be without drawing it. Grounded on this
//! project's predecessor's `math` package: the same fraction geometry,
//! super/subscript shrink-and-shift rule, and operator/relation spacing
//! table, ported onto the `FontMetrics`/`PdfBackend` collaborators.

use crate::ast::{Node, NodeKind};
use crate::font_metrics::{FontDomain, FontMetrics, FontStyle};
use crate::pdf_backend::PdfBackend;
use crate::symbols;

/// Spacing inserted between adjacent math elements, scaled to the base
/// font size. Only the two rules the renderer actually consults are kept;
/// everything else falls back to a fixed tenth-of-an-em gap.
pub struct MathSpacing {
    before_operator: f32,
    before_relation: f32,
    default_gap: f32,
}

pub fn standard_spacing(font_size: f32) -> MathSpacing {
    let base_unit = font_size * 0.1;
    MathSpacing {
        before_operator: base_unit * 2.0,
        before_relation: base_unit * 3.0,
        default_gap: base_unit,
    }
}

pub struct MathProcessor<'a> {
    metrics: &'a dyn FontMetrics,
    font_size: f32,
    spacing: MathSpacing,
}

impl<'a> MathProcessor<'a> {
    pub fn new(metrics: &'a dyn FontMetrics, font_size: f32) -> Self {
        MathProcessor {
            metrics,
            font_size,
            spacing: standard_spacing(font_size),
        }
    }

    /// Render a math node's content and return the horizontal space it
    /// occupies. `x`/`y` are the top-left-origin, y-down coordinates of the
    /// baseline's left end.
    pub fn process_math_node(
        &self,
        backend: &mut dyn PdfBackend,
        content: &[Node],
        inline: bool,
        x: f32,
        y: f32,
        content_width: f32,
        margin_left: f32,
    ) -> f32 {
        if inline {
            self.process_inline(backend, content, x, y)
        } else {
            let total = self.calculate_math_width(content);
            let center_x = margin_left + (content_width - total) / 2.0;
            self.process_inline(backend, content, center_x, y)
        }
    }

    /// The core rendering loop, shared by inline math and (after the
    /// caller has computed a centered `x`) display math and equation
    /// environments.
    pub fn render(&self, backend: &mut dyn PdfBackend, content: &[Node], x: f32, y: f32) -> f32 {
        self.process_inline(backend, content, x, y)
    }

    fn process_inline(&self, backend: &mut dyn PdfBackend, content: &[Node], x: f32, y: f32) -> f32 {
        let mut cursor = x;
        for (i, node) in content.iter().enumerate() {
            if i > 0 {
                cursor += self.spacing_between(&content[i - 1], node);
            }
            cursor += self.render_element(backend, node, cursor, y, self.font_size);
        }
        cursor - x
    }

    /// Total width `content` would occupy if rendered, without drawing
    /// anything (used to center display equations and right-align the
    /// equation number).
    pub fn calculate_math_width(&self, content: &[Node]) -> f32 {
        let mut total = 0.0;
        for (i, node) in content.iter().enumerate() {
            if i > 0 {
                total += self.spacing_between(&content[i - 1], node);
            }
            total += self.element_width(node, self.font_size);
        }
        total
    }

    fn spacing_between(&self, prev: &Node, curr: &Node) -> f32 {
        let prev_text = extract_text_content(prev);
        let curr_text = extract_text_content(curr);
        if is_operator_str(&prev_text) || is_operator_str(&curr_text) {
            self.spacing.before_operator
        } else if is_relation_str(&prev_text) || is_relation_str(&curr_text) {
            self.spacing.before_relation
        } else {
            self.spacing.default_gap
        }
    }

    fn element_width(&self, node: &Node, font_size: f32) -> f32 {
        match &node.kind {
            NodeKind::Text(s) => self.metrics.text_width(s, FontDomain::Math, FontStyle::Regular, font_size),
            NodeKind::MathSymbol { glyph, .. } => {
                self.metrics
                    .text_width(&glyph.to_string(), FontDomain::Math, FontStyle::Regular, font_size)
            }
            NodeKind::Command {
                name,
                required_args,
                ..
            } => {
                if let Some(glyph) = symbols::resolve(name) {
                    return self
                        .metrics
                        .text_width(&glyph.to_string(), FontDomain::Math, FontStyle::Regular, font_size);
                }
                required_args
                    .iter()
                    .map(|a| self.element_width(a, font_size))
                    .sum()
            }
            NodeKind::Group(nodes) => {
                let mut total = 0.0;
                for (i, n) in nodes.iter().enumerate() {
                    if i > 0 {
                        total += self.spacing_between(&nodes[i - 1], n);
                    }
                    total += self.element_width(n, font_size);
                }
                total
            }
            NodeKind::MathFraction {
                numerator,
                denominator,
            } => {
                let shrink = font_size * 0.7;
                self.element_width(numerator, shrink)
                    .max(self.element_width(denominator, shrink))
            }
            NodeKind::MathSuperscript { base, exponent } => {
                let base_width = base
                    .as_ref()
                    .map(|b| self.element_width(b, font_size))
                    .unwrap_or(0.0);
                base_width + self.element_width(exponent, font_size * 0.7) * 0.8
            }
            NodeKind::MathSubscript { base, index } => {
                let base_width = base
                    .as_ref()
                    .map(|b| self.element_width(b, font_size))
                    .unwrap_or(0.0);
                base_width + self.element_width(index, font_size * 0.7) * 0.8
            }
            _ => font_size * 0.5,
        }
    }

    /// Height above the baseline a node occupies, used only to size the
    /// vertical gap around a fraction's bar.
    fn element_height(&self, node: &Node, font_size: f32) -> f32 {
        match &node.kind {
            NodeKind::MathFraction {
                numerator,
                denominator,
            } => {
                let shrink = font_size * 0.7;
                self.element_height(numerator, shrink) + self.element_height(denominator, shrink)
                    + font_size * 0.6
            }
            NodeKind::MathSuperscript { base, exponent } => {
                let base_height = base
                    .as_ref()
                    .map(|b| self.element_height(b, font_size))
                    .unwrap_or(font_size);
                base_height + self.element_height(exponent, font_size * 0.7) * 0.5
            }
            NodeKind::MathSubscript { base, .. } => {
                let base_height = base
                    .as_ref()
                    .map(|b| self.element_height(b, font_size))
                    .unwrap_or(font_size);
                base_height + font_size * 0.3
            }
            NodeKind::Group(nodes) => nodes
                .iter()
                .map(|n| self.element_height(n, font_size))
                .fold(font_size, f32::max),
            NodeKind::Command { required_args, .. } => required_args
                .iter()
                .map(|a| self.element_height(a, font_size))
                .fold(font_size, f32::max),
            _ => font_size,
        }
    }

    fn render_element(
        &self,
        backend: &mut dyn PdfBackend,
        node: &Node,
        x: f32,
        y: f32,
        font_size: f32,
    ) -> f32 {
        match &node.kind {
            NodeKind::Text(s) => self.render_text(backend, s, x, y, font_size),
            NodeKind::MathSymbol { glyph, .. } => self.render_glyph(backend, *glyph, x, y, font_size),
            NodeKind::Command { name, required_args, .. } => {
                self.render_command(backend, name, required_args, x, y, font_size)
            }
            NodeKind::Group(nodes) => self.render_group(backend, nodes, x, y, font_size),
            NodeKind::MathSuperscript { base, exponent } => {
                self.render_superscript(backend, base.as_deref(), exponent, x, y, font_size)
            }
            NodeKind::MathSubscript { base, index } => {
                self.render_subscript(backend, base.as_deref(), index, x, y, font_size)
            }
            NodeKind::MathFraction {
                numerator,
                denominator,
            } => self.render_fraction(backend, numerator, denominator, x, y, font_size),
            _ => 0.0,
        }
    }

    fn render_text(&self, backend: &mut dyn PdfBackend, text: &str, x: f32, y: f32, font_size: f32) -> f32 {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return 0.0;
        }
        backend.add_text(x, y, trimmed, font_size, FontStyle::Regular, FontDomain::Math);
        self.metrics
            .text_width(trimmed, FontDomain::Math, FontStyle::Regular, font_size)
    }

    fn render_glyph(&self, backend: &mut dyn PdfBackend, glyph: char, x: f32, y: f32, font_size: f32) -> f32 {
        let s = glyph.to_string();
        backend.add_text(x, y, &s, font_size, FontStyle::Regular, FontDomain::Math);
        self.metrics.text_width(&s, FontDomain::Math, FontStyle::Regular, font_size)
    }

    fn render_command(
        &self,
        backend: &mut dyn PdfBackend,
        name: &str,
        args: &[Node],
        x: f32,
        y: f32,
        font_size: f32,
    ) -> f32 {
        if let Some(glyph) = symbols::resolve(name) {
            return self.render_glyph(backend, glyph, x, y, font_size);
        }
        match name {
            "sqrt" => {
                if let Some(arg) = args.first() {
                    self.render_square_root(backend, arg, x, y, font_size)
                } else {
                    0.0
                }
            }
            "frac" if args.len() >= 2 => self.render_fraction(backend, &args[0], &args[1], x, y, font_size),
            _ => {
                let mut cursor = x;
                for arg in args {
                    cursor += self.render_element(backend, arg, cursor, y, font_size);
                }
                cursor - x
            }
        }
    }

    fn render_group(&self, backend: &mut dyn PdfBackend, nodes: &[Node], x: f32, y: f32, font_size: f32) -> f32 {
        let mut cursor = x;
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                cursor += self.spacing_between(&nodes[i - 1], node);
            }
            cursor += self.render_element(backend, node, cursor, y, font_size);
        }
        cursor - x
    }

    fn render_superscript(
        &self,
        backend: &mut dyn PdfBackend,
        base: Option<&Node>,
        exponent: &Node,
        x: f32,
        y: f32,
        font_size: f32,
    ) -> f32 {
        let base_width = base
            .map(|b| self.render_element(backend, b, x, y, font_size))
            .unwrap_or(0.0);
        let exp_size = font_size * 0.7;
        let exp_y = y + font_size * 0.3;
        self.render_element(backend, exponent, x + base_width, exp_y, exp_size);
        base_width + self.element_width(exponent, exp_size)
    }

    fn render_subscript(
        &self,
        backend: &mut dyn PdfBackend,
        base: Option<&Node>,
        index: &Node,
        x: f32,
        y: f32,
        font_size: f32,
    ) -> f32 {
        let base_width = base
            .map(|b| self.render_element(backend, b, x, y, font_size))
            .unwrap_or(0.0);
        let idx_size = font_size * 0.7;
        let idx_y = y - font_size * 0.3;
        self.render_element(backend, index, x + base_width, idx_y, idx_size);
        base_width + self.element_width(index, idx_size)
    }

    fn render_fraction(
        &self,
        backend: &mut dyn PdfBackend,
        numerator: &Node,
        denominator: &Node,
        x: f32,
        y: f32,
        font_size: f32,
    ) -> f32 {
        let frac_font_size = font_size * 0.7;
        let num_width = self.element_width(numerator, frac_font_size);
        let den_width = self.element_width(denominator, frac_font_size);
        let max_width = num_width.max(den_width);

        let num_height = self.element_height(numerator, frac_font_size);
        let den_height = self.element_height(denominator, frac_font_size);

        let thickness = font_size * 0.05;
        let padding = 2.0 * thickness;
        let total_width = max_width + 2.0 * padding;

        let num_x = x + padding + (max_width - num_width) / 2.0;
        let den_x = x + padding + (max_width - den_width) / 2.0;
        let line_y = y;

        let base_gap = font_size * 0.2;
        let mut num_gap = base_gap + num_height * 0.2;
        let den_gap = base_gap + den_height * 0.1;
        if is_fraction(numerator) {
            num_gap += font_size * 0.15;
        }

        let num_y = line_y + num_gap + frac_font_size * 0.2;
        let den_y = line_y - den_gap - frac_font_size * 0.8;

        self.render_element(backend, numerator, num_x, num_y, frac_font_size);
        self.render_element(backend, denominator, den_x, den_y, frac_font_size);
        backend.add_line(x + padding, line_y, x + padding + max_width, line_y, thickness);

        total_width
    }

    fn render_square_root(&self, backend: &mut dyn PdfBackend, arg: &Node, x: f32, y: f32, font_size: f32) -> f32 {
        let radical = "\u{221A}";
        backend.add_text(x, y, radical, font_size, FontStyle::Regular, FontDomain::Math);
        let symbol_width = self
            .metrics
            .text_width(radical, FontDomain::Math, FontStyle::Regular, font_size);

        let arg_width = self.element_width(arg, font_size);
        self.render_element(backend, arg, x + symbol_width, y, font_size);

        let vinculum_y = y + font_size * 0.85;
        backend.add_line(x + symbol_width, vinculum_y, x + symbol_width + arg_width, vinculum_y, font_size * 0.04);

        symbol_width + arg_width
    }
}

fn is_fraction(node: &Node) -> bool {
    match &node.kind {
        NodeKind::MathFraction { .. } => true,
        NodeKind::Group(nodes) => nodes.iter().any(is_fraction),
        _ => false,
    }
}

/// Extract the text content used for spacing-rule lookups: the literal
/// text of a `Text`/`MathSymbol` node, or the resolved glyph of a command
/// that names a known symbol.
fn extract_text_content(node: &Node) -> String {
    match &node.kind {
        NodeKind::Text(s) => s.clone(),
        NodeKind::MathSymbol { glyph, .. } => glyph.to_string(),
        NodeKind::Command { name, .. } => symbols::resolve(name)
            .map(|g| g.to_string())
            .unwrap_or_else(|| name.clone()),
        _ => String::new(),
    }
}

/// `s` is almost always a single glyph (a `MathSymbol` or a one-char `Text`
/// node); delegates to [`symbols::is_operator_glyph`], with `*`/`·` added
/// since plain ASCII/Unicode text can spell an operator the symbol table
/// doesn't resolve a command to.
fn is_operator_str(s: &str) -> bool {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => symbols::is_operator_glyph(c) || matches!(c, '*' | '·'),
        _ => false,
    }
}

fn is_relation_str(s: &str) -> bool {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => symbols::is_relation_glyph(c),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_metrics::FontMetrics;
    use crate::position::Position;

    struct FixedWidthMetrics;
    impl FontMetrics for FixedWidthMetrics {
        fn text_width(&self, text: &str, _: FontDomain, _: FontStyle, size_pt: f32) -> f32 {
            text.chars().count() as f32 * size_pt * 0.5
        }
    }

    #[test]
    fn spacing_inserts_relation_gap_around_equals() {
        let metrics = FixedWidthMetrics;
        let processor = MathProcessor::new(&metrics, 12.0);
        let content = vec![
            Node::text("x", Position::start()),
            Node::text("=", Position::start()),
            Node::text("y", Position::start()),
        ];
        let width = processor.calculate_math_width(&content);
        let no_spacing: f32 = content
            .iter()
            .map(|n| processor.element_width(n, 12.0))
            .sum();
        assert!(width > no_spacing);
    }

    #[test]
    fn fraction_width_is_max_of_numerator_and_denominator() {
        let metrics = FixedWidthMetrics;
        let processor = MathProcessor::new(&metrics, 12.0);
        let node = Node::new(
            NodeKind::MathFraction {
                numerator: Box::new(Node::text("1", Position::start())),
                denominator: Box::new(Node::text("22", Position::start())),
            },
            Position::start(),
        );
        let width = processor.element_width(&node, 12.0);
        let den_width = processor.element_width(
            &Node::text("22", Position::start()),
            12.0 * 0.7,
        );
        assert_eq!(width, den_width);
    }
}
