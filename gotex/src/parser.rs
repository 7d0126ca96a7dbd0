//! The outer recursive-descent parser: walks the token stream produced by
//! [`crate::lexer`] and produces a [`Document`], per `spec.md` §4.2.
//!
//! Parsing never aborts on malformed input. Every recoverable problem is
//! pushed onto an error list and the parser keeps going; an unmatched
//! `\end{...}` leaves an [`NodeKind::ErrorRecovery`] marker node, while a
//! bare `{`/`}` is diagnosed and simply emits no node at all.

use crate::ast::{merge_adjacent_text, Document, Node, NodeKind};
use crate::environments;
use crate::error::{ParseError, ParseErrorKind, Severity};
use crate::lexer;
use crate::math_parser;
use crate::position::Position;
use crate::token::{Token, TokenKind};

/// Parse `source` into a [`Document`] along with any diagnostics collected
/// along the way. The document is always produced, even when `errors` is
/// non-empty.
pub fn parse_document(source: &str) -> (Document, Vec<ParseError>) {
    let tokens = lexer::tokenize(source);
    let mut parser = Parser::new(&tokens);
    let body = parser.parse_sequence(|k| k == TokenKind::Eof);
    (Document::new(body, Position::start()), parser.errors)
}

struct Parser<'a> {
    tokens: &'a [Token],
    idx: usize,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Parser {
            tokens,
            idx: 0,
            errors: Vec::new(),
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.idx.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn bump(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.idx < self.tokens.len() - 1 {
            self.idx += 1;
        }
        tok
    }

    /// Parse nodes until `stop` matches the upcoming token kind (the stop
    /// token itself is left unconsumed) or `Eof` is reached. A token that
    /// is recorded as a diagnostic and emits no node (bare `{`/`}`) does not
    /// end the sequence early — only `stop` or `Eof` does.
    fn parse_sequence(&mut self, stop: impl Fn(TokenKind) -> bool) -> Vec<Node> {
        let mut nodes = Vec::new();
        loop {
            if stop(self.peek_kind()) || self.peek_kind() == TokenKind::Eof {
                break;
            }
            if let Some(n) = self.parse_node() {
                nodes.push(n);
            }
        }
        merge_adjacent_text(nodes)
    }

    fn parse_node(&mut self) -> Option<Node> {
        match self.peek_kind() {
            TokenKind::Eof => None,
            TokenKind::Text => {
                let tok = self.bump();
                Some(Node::text(tok.value, tok.position))
            }
            TokenKind::Comment => {
                let tok = self.bump();
                Some(Node::new(NodeKind::Comment(tok.value), tok.position))
            }
            TokenKind::Command => Some(self.parse_command()),
            TokenKind::BeginEnv => Some(self.parse_environment()),
            TokenKind::MathInline | TokenKind::MathDisplay => Some(self.parse_math()),
            TokenKind::LBrace => {
                let tok = self.bump();
                self.errors.push(ParseError::new(
                    ParseErrorKind::UnexpectedToken,
                    "unexpected `{`",
                    tok.position,
                    Severity::Error,
                ));
                None
            }
            TokenKind::OptionalArg => {
                let tok = self.bump();
                Some(Node::text(format!("[{}]", tok.value), tok.position))
            }
            TokenKind::RBrace => {
                let tok = self.bump();
                self.errors.push(ParseError::new(
                    ParseErrorKind::UnexpectedToken,
                    "unexpected `}`",
                    tok.position,
                    Severity::Warning,
                ));
                None
            }
            TokenKind::EndEnv => {
                let tok = self.bump();
                let message = format!("unmatched \\end{{{}}}", tok.value);
                self.errors.push(ParseError::new(
                    ParseErrorKind::UnmatchedEnvironment,
                    message.clone(),
                    tok.position,
                    Severity::Error,
                ));
                Some(Node::new(
                    NodeKind::ErrorRecovery {
                        error: message,
                        raw_text: format!("\\end{{{}}}", tok.value),
                    },
                    tok.position,
                ))
            }
        }
    }

    fn parse_command(&mut self) -> Node {
        let pos = self.peek().position;
        let tok = self.bump();
        let name = tok.value;

        let mut optional_args = Vec::new();
        if self.peek_kind() == TokenKind::OptionalArg {
            let opt = self.bump();
            optional_args.push(Node::text(opt.value, opt.position));
        }

        // Zero or more `{…}` required args: consume consecutive braced
        // groups as long as one follows, with no arity cap — a command not
        // otherwise recognized by the document processor or an expanded
        // macro still gets all of its arguments attached.
        let mut required_args = Vec::new();
        while self.peek_kind() == TokenKind::LBrace {
            let arg_pos = self.peek().position;
            self.bump(); // LBrace
            let body = self.parse_sequence(|k| matches!(k, TokenKind::RBrace | TokenKind::Eof));
            match self.peek_kind() {
                TokenKind::RBrace => {
                    self.bump();
                }
                _ => self.errors.push(ParseError::new(
                    ParseErrorKind::MissingArgument,
                    format!("unterminated argument to \\{name}"),
                    arg_pos,
                    Severity::Error,
                )),
            }
            required_args.extend(body);
        }

        Node::new(
            NodeKind::Command {
                name,
                required_args,
                optional_args,
            },
            pos,
        )
    }

    fn parse_math(&mut self) -> Node {
        let tok = self.bump();
        let inline = tok.kind == TokenKind::MathInline;
        let content = math_parser::parse_math_payload(&tok.value, tok.position);
        Node::new(NodeKind::MathNode { inline, content }, tok.position)
    }

    fn parse_environment(&mut self) -> Node {
        let pos = self.peek().position;
        let begin_tok = self.bump();
        let name = begin_tok.value;

        if environments::is_math_environment(&name) {
            return self.parse_math_environment(name, pos);
        }

        let body = self.parse_sequence(|k| matches!(k, TokenKind::EndEnv | TokenKind::Eof));
        match self.peek_kind() {
            TokenKind::EndEnv if self.peek().value == name => {
                self.bump();
            }
            TokenKind::EndEnv => {
                let end_tok = self.bump();
                self.errors.push(ParseError::new(
                    ParseErrorKind::UnmatchedEnvironment,
                    format!("expected \\end{{{name}}}, found \\end{{{}}}", end_tok.value),
                    end_tok.position,
                    Severity::Error,
                ));
            }
            _ => self.errors.push(ParseError::new(
                ParseErrorKind::UnmatchedEnvironment,
                format!("unterminated environment `{name}`"),
                pos,
                Severity::Error,
            )),
        }

        if body.is_empty() {
            self.errors.push(ParseError::new(
                ParseErrorKind::EmptyEnvironment,
                format!("environment `{name}` has no content"),
                pos,
                Severity::Warning,
            ));
        }

        Node::new(NodeKind::Environment { name, body }, pos)
    }

    /// Math-aware environments (`equation`, `align`, ...) are re-serialized
    /// back into a raw payload and handed to the math payload parser, the
    /// same way `$...$` content is, rather than parsed as ordinary document
    /// nodes.
    fn parse_math_environment(&mut self, name: String, pos: Position) -> Node {
        let body_start = self.peek().position;
        let mut payload = String::new();
        loop {
            match self.peek_kind() {
                TokenKind::Eof => {
                    self.errors.push(ParseError::new(
                        ParseErrorKind::UnmatchedEnvironment,
                        format!("unterminated environment `{name}`"),
                        pos,
                        Severity::Error,
                    ));
                    break;
                }
                TokenKind::EndEnv if self.peek().value == name => {
                    self.bump();
                    break;
                }
                _ => {
                    let tok = self.bump();
                    payload.push_str(&render_token_text(&tok));
                }
            }
        }
        let body = math_parser::parse_math_payload(&payload, body_start);
        Node::new(NodeKind::Environment { name, body }, pos)
    }
}

/// Reconstruct the literal source text a token was scanned from, used to
/// rebuild a raw payload for math environments.
fn render_token_text(tok: &Token) -> String {
    match tok.kind {
        TokenKind::Text => tok.value.clone(),
        TokenKind::Command => format!("\\{}", tok.value),
        TokenKind::LBrace => "{".to_string(),
        TokenKind::RBrace => "}".to_string(),
        TokenKind::Comment => format!("%{}", tok.value),
        TokenKind::OptionalArg => format!("[{}]", tok.value),
        TokenKind::BeginEnv => format!("\\begin{{{}}}", tok.value),
        TokenKind::EndEnv => format!("\\end{{{}}}", tok.value),
        TokenKind::MathInline => format!("${}$", tok.value),
        TokenKind::MathDisplay => format!("$${}$$", tok.value),
        TokenKind::Eof => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_becomes_single_node() {
        let (doc, errors) = parse_document("Hello world.");
        assert!(errors.is_empty());
        assert_eq!(doc.body.len(), 1);
        assert!(matches!(&doc.body[0].kind, NodeKind::Text(s) if s == "Hello world."));
    }

    #[test]
    fn section_command_captures_one_argument() {
        let (doc, errors) = parse_document(r"\section{Intro}");
        assert!(errors.is_empty());
        match &doc.body[0].kind {
            NodeKind::Command {
                name,
                required_args,
                ..
            } => {
                assert_eq!(name, "section");
                assert_eq!(required_args.len(), 1);
                assert!(matches!(&required_args[0].kind, NodeKind::Text(s) if s == "Intro"));
            }
            other => panic!("expected section command, got {other:?}"),
        }
    }

    #[test]
    fn unmatched_brace_is_recorded_but_parsing_continues() {
        let (doc, errors) = parse_document("a } b");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ParseErrorKind::UnexpectedToken);
        assert_eq!(errors[0].severity, Severity::Warning);
        // The stray `}` emits no node at all, so "a " and " b" merge into
        // one text run.
        assert_eq!(doc.body.len(), 1);
        assert!(matches!(&doc.body[0].kind, NodeKind::Text(s) if s == "a b"));
    }

    #[test]
    fn equation_environment_reparses_as_math() {
        let (doc, errors) = parse_document(r"\begin{equation}x^2+y^2=z^2\end{equation}");
        assert!(errors.is_empty());
        match &doc.body[0].kind {
            NodeKind::Environment { name, body } => {
                assert_eq!(name, "equation");
                assert!(body
                    .iter()
                    .any(|n| matches!(&n.kind, NodeKind::MathSuperscript { .. })));
            }
            other => panic!("expected equation environment, got {other:?}"),
        }
    }

    #[test]
    fn mismatched_environment_end_is_recorded() {
        let (_doc, errors) = parse_document(r"\begin{itemize}\item a\end{enumerate}");
        assert!(errors
            .iter()
            .any(|e| e.kind == ParseErrorKind::UnmatchedEnvironment));
    }

    #[test]
    fn nested_groups_and_textbf() {
        // Braces only ever close a command's own argument — a bare nested
        // `{` inside one is diagnosed as unexpected, and the `}` that
        // follows it closes the argument early rather than nesting a
        // `Group`. The remaining "` text}`" is left over as top-level
        // content, with its own trailing `}` diagnosed too.
        let (doc, errors) = parse_document(r"\textbf{bold {inner} text}");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].kind, ParseErrorKind::UnexpectedToken);
        assert_eq!(errors[0].severity, Severity::Error);
        assert_eq!(errors[1].kind, ParseErrorKind::UnexpectedToken);
        assert_eq!(errors[1].severity, Severity::Warning);
        match &doc.body[0].kind {
            NodeKind::Command {
                name,
                required_args,
                ..
            } => {
                assert_eq!(name, "textbf");
                assert_eq!(required_args.len(), 1);
                assert!(matches!(&required_args[0].kind, NodeKind::Text(s) if s == "bold inner"));
            }
            other => panic!("expected textbf command, got {other:?}"),
        }
        assert!(doc
            .body
            .iter()
            .any(|n| matches!(&n.kind, NodeKind::Text(s) if s == " text")));
    }
}
