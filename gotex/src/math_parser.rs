//! The second, inner recursive-descent layer: walks the raw math payload
//! string captured by a `MathInline`/`MathDisplay` token and produces a
//! structured math subtree, per `spec.md` §4.3.

use crate::ast::{Node, NodeKind};
use crate::position::Position;
use crate::symbols;

const MATH_SPECIAL: [char; 3] = ['^', '_', '\\'];

pub struct MathParser {
    chars: Vec<char>,
    idx: usize,
    pos: Position,
}

impl MathParser {
    pub fn new(payload: &str, start: Position) -> Self {
        MathParser {
            chars: payload.chars().collect(),
            idx: 0,
            pos: start,
        }
    }

    /// Parse the whole payload into a sequence of math nodes.
    pub fn parse(&mut self) -> Vec<Node> {
        self.parse_sequence(false)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.idx).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.idx += 1;
        self.pos.advance(ch);
        Some(ch)
    }

    /// Parse nodes until EOF, or (if `stop_at_rbrace`) until an unmatched
    /// `}`, which is consumed. Nesting of `{`/`}` encountered while scanning
    /// a bare group is handled by recursing into [`Self::parse_braced_group`].
    fn parse_sequence(&mut self, stop_at_rbrace: bool) -> Vec<Node> {
        let mut out: Vec<Node> = Vec::new();
        loop {
            match self.peek() {
                None => break,
                Some('}') if stop_at_rbrace => {
                    self.bump();
                    break;
                }
                Some('^') => {
                    let pos = self.pos;
                    self.bump();
                    let base = out.pop().map(Box::new);
                    let exponent = Box::new(self.parse_script_content());
                    out.push(Node::new(
                        NodeKind::MathSuperscript { base, exponent },
                        pos,
                    ));
                }
                Some('_') => {
                    let pos = self.pos;
                    self.bump();
                    let base = out.pop().map(Box::new);
                    let index = Box::new(self.parse_script_content());
                    out.push(Node::new(NodeKind::MathSubscript { base, index }, pos));
                }
                Some('\\') => out.push(self.parse_command()),
                Some('{') => {
                    let pos = self.pos;
                    self.bump();
                    out.push(self.parse_braced_group(pos));
                }
                Some(_) => out.push(self.parse_text_run()),
            }
        }
        out
    }

    /// The content of a `^`/`_` script: a single character if the next
    /// character isn't `{`, otherwise the balanced braced expression.
    fn parse_script_content(&mut self) -> Node {
        let pos = self.pos;
        if self.peek() == Some('{') {
            self.bump();
            return self.parse_braced_group(pos);
        }
        match self.bump() {
            Some(ch) => Node::new(NodeKind::Text(ch.to_string()), pos),
            None => Node::new(NodeKind::Text(String::new()), pos),
        }
    }

    /// Assumes the opening `{` has already been consumed. Parses the
    /// content up to the matching `}` (or EOF, as recovery) and unwraps a
    /// single resulting node rather than re-wrapping it in a `Group`.
    fn parse_braced_group(&mut self, pos: Position) -> Node {
        let nodes = self.parse_sequence(true);
        wrap_group(nodes, pos)
    }

    /// Consume a balanced-brace payload and recursively parse it,
    /// returning the resulting node. Used for `\frac{..}{..}` and
    /// `\sqrt{..}` arguments.
    fn parse_balanced_argument(&mut self) -> Node {
        let pos = self.pos;
        if self.peek() != Some('{') {
            // Missing argument: recover by treating the rest of the
            // payload as the argument, per the unbalanced-braces recovery
            // rule.
            let nodes = self.parse_sequence(false);
            return wrap_group(nodes, pos);
        }
        self.bump(); // consume '{'
        self.parse_braced_group(pos)
    }

    fn parse_command(&mut self) -> Node {
        let pos = self.pos;
        self.bump(); // consume '\'
        let name_start = self.idx;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphabetic()) {
            self.bump();
        }
        let name: String = self.chars[name_start..self.idx].iter().collect();

        if let Some(glyph) = symbols::resolve(&name) {
            return Node::new(
                NodeKind::MathSymbol {
                    glyph,
                    command_name: name,
                },
                pos,
            );
        }

        match name.as_str() {
            "frac" => {
                let numerator = Box::new(self.parse_balanced_argument());
                let denominator = Box::new(self.parse_balanced_argument());
                Node::new(
                    NodeKind::MathFraction {
                        numerator,
                        denominator,
                    },
                    pos,
                )
            }
            "sqrt" => {
                let arg = self.parse_balanced_argument();
                Node::new(
                    NodeKind::Command {
                        name: "sqrt".to_string(),
                        required_args: vec![arg],
                        optional_args: vec![],
                    },
                    pos,
                )
            }
            _ => Node::new(
                NodeKind::Command {
                    name,
                    required_args: vec![],
                    optional_args: vec![],
                },
                pos,
            ),
        }
    }

    fn parse_text_run(&mut self) -> Node {
        let pos = self.pos;
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if MATH_SPECIAL.contains(&c) || c == '}' {
                break;
            }
            text.push(self.bump().unwrap());
        }
        Node::new(NodeKind::Text(text), pos)
    }
}

fn wrap_group(mut nodes: Vec<Node>, pos: Position) -> Node {
    if nodes.len() == 1 {
        nodes.pop().unwrap()
    } else {
        Node::new(NodeKind::Group(nodes), pos)
    }
}

/// Parse a math payload into a structured math subtree.
pub fn parse_math_payload(payload: &str, start: Position) -> Vec<Node> {
    MathParser::new(payload, start).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_superscript() {
        let nodes = parse_math_payload("x^2", Position::start());
        assert_eq!(nodes.len(), 1);
        match &nodes[0].kind {
            NodeKind::MathSuperscript { base, exponent } => {
                assert!(matches!(&base.as_ref().unwrap().kind, NodeKind::Text(s) if s == "x"));
                assert!(matches!(&exponent.kind, NodeKind::Text(s) if s == "2"));
            }
            other => panic!("expected superscript, got {other:?}"),
        }
    }

    #[test]
    fn symbol_resolution() {
        let nodes = parse_math_payload(r"\alpha + \beta", Position::start());
        assert!(matches!(&nodes[0].kind, NodeKind::MathSymbol { glyph: 'α', .. }));
    }

    #[test]
    fn fraction_parses_both_arguments() {
        let nodes = parse_math_payload(r"\frac{1}{2}", Position::start());
        match &nodes[0].kind {
            NodeKind::MathFraction {
                numerator,
                denominator,
            } => {
                assert!(matches!(&numerator.kind, NodeKind::Text(s) if s == "1"));
                assert!(matches!(&denominator.kind, NodeKind::Text(s) if s == "2"));
            }
            other => panic!("expected fraction, got {other:?}"),
        }
    }

    #[test]
    fn sqrt_wraps_single_argument() {
        let nodes = parse_math_payload(r"\sqrt{2}", Position::start());
        match &nodes[0].kind {
            NodeKind::Command {
                name,
                required_args,
                ..
            } => {
                assert_eq!(name, "sqrt");
                assert_eq!(required_args.len(), 1);
            }
            other => panic!("expected sqrt command, got {other:?}"),
        }
    }

    #[test]
    fn degenerate_leading_script_has_no_base() {
        let nodes = parse_math_payload("^2", Position::start());
        match &nodes[0].kind {
            NodeKind::MathSuperscript { base, .. } => assert!(base.is_none()),
            other => panic!("expected superscript, got {other:?}"),
        }
    }

    #[test]
    fn unbalanced_braces_recover_to_end_of_payload() {
        let nodes = parse_math_payload(r"\frac{1}{2", Position::start());
        match &nodes[0].kind {
            NodeKind::MathFraction { denominator, .. } => {
                assert!(matches!(&denominator.kind, NodeKind::Text(s) if s == "2"));
            }
            other => panic!("expected fraction, got {other:?}"),
        }
    }
}
