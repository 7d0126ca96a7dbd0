//! The parsed (and, later, macro-expanded) document tree.
//!
//! Every node carries its source [`Position`]. The tree is owned (`Box`
//! children) rather than arena-allocated: macro expansion rebuilds nodes
//! rather than mutating the parsed tree in place, which an owned tree makes
//! straightforward without needing integer handles.

use std::collections::HashMap;
use std::rc::Rc;

use crate::position::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A run of literal characters. Adjacent `Text` siblings at document
    /// top-level are merged at parse time.
    Text(String),
    /// Content from `%` to end-of-line; preserved but never rendered.
    Comment(String),
    /// A control sequence with zero or more `{…}` required arguments and at
    /// most one `[…]` optional argument (so `optional_args` holds 0 or 1
    /// element).
    Command {
        name: String,
        required_args: Vec<Node>,
        optional_args: Vec<Node>,
    },
    /// Content bracketed by matched `\begin{name}` / `\end{name}`.
    Environment { name: String, body: Vec<Node> },
    /// Content bracketed by `{…}` not attached to a command.
    Group(Vec<Node>),
    /// A math container; `content` holds math-mode nodes.
    MathNode { inline: bool, content: Vec<Node> },
    /// A command resolved to a Unicode math glyph via the symbol table.
    MathSymbol { glyph: char, command_name: String },
    /// `base` is `None` only when the script appears at the very start of a
    /// math payload (degenerate but accepted, per spec invariant).
    MathSuperscript {
        base: Option<Box<Node>>,
        exponent: Box<Node>,
    },
    MathSubscript {
        base: Option<Box<Node>>,
        index: Box<Node>,
    },
    MathFraction {
        numerator: Box<Node>,
        denominator: Box<Node>,
    },
    /// Only appears inside macro definition bodies, never in a parsed
    /// document.
    ArgumentPlaceholder(usize),
    /// Placeholder for unparsable input; the accompanying error has already
    /// been recorded in the parser's error list.
    ErrorRecovery { error: String, raw_text: String },
}

impl Node {
    pub fn new(kind: NodeKind, position: Position) -> Self {
        Node { kind, position }
    }

    pub fn text(value: impl Into<String>, position: Position) -> Self {
        Node::new(NodeKind::Text(value.into()), position)
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_))
    }

    /// Append to this node's text payload, panicking if it is not `Text`.
    /// Used only by the top-level adjacent-text merge pass.
    pub fn push_text(&mut self, more: &str) {
        match &mut self.kind {
            NodeKind::Text(s) => s.push_str(more),
            _ => panic!("push_text called on a non-Text node"),
        }
    }
}

/// Merge adjacent `Text` nodes in `nodes`, preserving order and the
/// position of the first node in each run.
pub fn merge_adjacent_text(nodes: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if node.is_text() {
            if let Some(last) = out.last_mut() {
                if last.is_text() {
                    if let NodeKind::Text(s) = &node.kind {
                        last.push_text(s);
                    }
                    continue;
                }
            }
        }
        out.push(node);
    }
    out
}

/// Top-level parsed (or expanded) document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub body: Vec<Node>,
    pub position: Position,
}

impl Document {
    pub fn new(body: Vec<Node>, position: Position) -> Self {
        Document { body, position }
    }
}

/// A builtin macro definition. `body` may reference its arguments via
/// [`NodeKind::ArgumentPlaceholder`].
#[derive(Debug, Clone, PartialEq)]
pub struct Macro {
    pub name: String,
    pub num_args: usize,
    pub body: Vec<Node>,
    pub expandable: bool,
}

/// A mapping from macro name to definition, with lexical nesting via an
/// optional parent store. Lookup cascades to the parent on miss.
#[derive(Debug, Clone)]
pub struct MacroStore {
    macros: HashMap<String, Macro>,
    parent: Option<Rc<MacroStore>>,
}

impl MacroStore {
    /// An empty store with no parent.
    pub fn empty() -> Self {
        MacroStore {
            macros: HashMap::new(),
            parent: None,
        }
    }

    /// The root store, seeded with the builtin macros (`textbf`, `textit`).
    pub fn with_builtins() -> Self {
        let mut store = MacroStore::empty();
        store.set(builtin_textbf());
        store.set(builtin_textit());
        store
    }

    /// A fresh child store, parented to `parent` for lexical nesting.
    pub fn child(parent: Rc<MacroStore>) -> Self {
        MacroStore {
            macros: HashMap::new(),
            parent: Some(parent),
        }
    }

    pub fn set(&mut self, m: Macro) {
        self.macros.insert(m.name.clone(), m);
    }

    /// Look up `name`, cascading to the parent store on miss.
    pub fn get(&self, name: &str) -> Option<&Macro> {
        if let Some(m) = self.macros.get(name) {
            return Some(m);
        }
        self.parent.as_deref().and_then(|p| p.get(name))
    }
}

fn builtin_textbf() -> Macro {
    Macro {
        name: "textbf".to_string(),
        num_args: 1,
        body: vec![
            Node::new(
                NodeKind::Command {
                    name: "font".to_string(),
                    required_args: vec![Node::text("bold", Position::start())],
                    optional_args: vec![],
                },
                Position::start(),
            ),
            Node::new(NodeKind::ArgumentPlaceholder(0), Position::start()),
        ],
        expandable: true,
    }
}

fn builtin_textit() -> Macro {
    Macro {
        name: "textit".to_string(),
        num_args: 1,
        body: vec![
            Node::new(
                NodeKind::Command {
                    name: "font".to_string(),
                    required_args: vec![Node::text("italic", Position::start())],
                    optional_args: vec![],
                },
                Position::start(),
            ),
            Node::new(NodeKind::ArgumentPlaceholder(0), Position::start()),
        ],
        expandable: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_adjacent_text() {
        let nodes = vec![
            Node::text("Hello", Position::start()),
            Node::text(" world", Position::start()),
            Node::new(
                NodeKind::Command {
                    name: "foo".into(),
                    required_args: vec![],
                    optional_args: vec![],
                },
                Position::start(),
            ),
            Node::text("!", Position::start()),
        ];
        let merged = merge_adjacent_text(nodes);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].kind, NodeKind::Text("Hello world".to_string()));
    }

    #[test]
    fn macro_store_cascades_to_parent() {
        let root = Rc::new(MacroStore::with_builtins());
        let child = MacroStore::child(Rc::clone(&root));
        assert!(child.get("textbf").is_some());
        assert!(child.get("nonexistent").is_none());
    }
}
