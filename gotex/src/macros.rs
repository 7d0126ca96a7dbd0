//! Macro expansion: rewrites `Command` nodes whose name resolves in a
//! [`MacroStore`] into their expansion, substituting call-site arguments for
//! [`NodeKind::ArgumentPlaceholder`] markers in the macro body. Mirrors the
//! `Expand`/`expandMacro`/`expandNodes` split used by the system this was
//! ported from.

use crate::ast::{Document, Macro, MacroStore, Node, NodeKind};
use crate::position::Position;

/// Expand every macro-invoking command in `doc`, recursively, using `store`
/// for lookups.
pub fn expand_document(doc: Document, store: &MacroStore) -> Document {
    let body = expand_nodes(doc.body, store);
    Document::new(body, doc.position)
}

fn expand_nodes(nodes: Vec<Node>, store: &MacroStore) -> Vec<Node> {
    nodes.into_iter().map(|n| expand_node(n, store)).collect()
}

fn expand_node(node: Node, store: &MacroStore) -> Node {
    let Node { kind, position } = node;
    match kind {
        NodeKind::Command {
            name,
            required_args,
            optional_args,
        } => {
            let required_args = expand_nodes(required_args, store);
            let optional_args = expand_nodes(optional_args, store);
            match store.get(&name) {
                Some(m) if m.expandable => {
                    let arg0 = wrap_nodes(required_args, position);
                    expand_macro(m, &[arg0], position, store)
                }
                _ => Node::new(
                    NodeKind::Command {
                        name,
                        required_args,
                        optional_args,
                    },
                    position,
                ),
            }
        }
        NodeKind::Environment { name, body } => {
            let child = MacroStore::child(std::rc::Rc::new(store.clone()));
            Node::new(
                NodeKind::Environment {
                    name,
                    body: expand_nodes(body, &child),
                },
                position,
            )
        }
        NodeKind::Group(nodes) => Node::new(NodeKind::Group(expand_nodes(nodes, store)), position),
        NodeKind::MathNode { inline, content } => Node::new(
            NodeKind::MathNode {
                inline,
                content: expand_nodes(content, store),
            },
            position,
        ),
        NodeKind::MathSuperscript { base, exponent } => Node::new(
            NodeKind::MathSuperscript {
                base: base.map(|b| Box::new(expand_node(*b, store))),
                exponent: Box::new(expand_node(*exponent, store)),
            },
            position,
        ),
        NodeKind::MathSubscript { base, index } => Node::new(
            NodeKind::MathSubscript {
                base: base.map(|b| Box::new(expand_node(*b, store))),
                index: Box::new(expand_node(*index, store)),
            },
            position,
        ),
        NodeKind::MathFraction {
            numerator,
            denominator,
        } => Node::new(
            NodeKind::MathFraction {
                numerator: Box::new(expand_node(*numerator, store)),
                denominator: Box::new(expand_node(*denominator, store)),
            },
            position,
        ),
        other => Node::new(other, position),
    }
}

/// Fold a parsed argument's contents down to the single `Node` a placeholder
/// substitutes for: unwrapped if there is exactly one, grouped if there are
/// several, an empty `Text` if the argument was empty.
fn wrap_nodes(mut nodes: Vec<Node>, pos: Position) -> Node {
    match nodes.len() {
        0 => Node::text(String::new(), pos),
        1 => nodes.pop().unwrap(),
        _ => Node::new(NodeKind::Group(nodes), pos),
    }
}

fn expand_macro(m: &Macro, args: &[Node], call_pos: Position, store: &MacroStore) -> Node {
    let substituted = substitute_nodes(m.body.clone(), args, call_pos);
    let mut nodes = expand_nodes(substituted, store);
    wrap_nodes(std::mem::take(&mut nodes), call_pos)
}

fn substitute_nodes(nodes: Vec<Node>, args: &[Node], call_pos: Position) -> Vec<Node> {
    nodes
        .into_iter()
        .map(|n| substitute_node(n, args, call_pos))
        .collect()
}

fn substitute_node(node: Node, args: &[Node], call_pos: Position) -> Node {
    let Node { kind, position } = node;
    match kind {
        NodeKind::ArgumentPlaceholder(i) => match args.get(i) {
            Some(arg) => arg.clone(),
            None => Node::text(String::new(), call_pos),
        },
        NodeKind::Command {
            name,
            required_args,
            optional_args,
        } => Node::new(
            NodeKind::Command {
                name,
                required_args: substitute_nodes(required_args, args, call_pos),
                optional_args: substitute_nodes(optional_args, args, call_pos),
            },
            position,
        ),
        NodeKind::Group(nodes) => Node::new(
            NodeKind::Group(substitute_nodes(nodes, args, call_pos)),
            position,
        ),
        NodeKind::Environment { name, body } => Node::new(
            NodeKind::Environment {
                name,
                body: substitute_nodes(body, args, call_pos),
            },
            position,
        ),
        other => Node::new(other, position),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;

    #[test]
    fn textbf_expands_to_font_command_and_argument() {
        let (doc, _errors) = parse_document(r"\textbf{bold}");
        let store = MacroStore::with_builtins();
        let expanded = expand_document(doc, &store);
        match &expanded.body[0].kind {
            NodeKind::Group(nodes) => {
                assert_eq!(nodes.len(), 2);
                match &nodes[0].kind {
                    NodeKind::Command {
                        name,
                        required_args,
                        ..
                    } => {
                        assert_eq!(name, "font");
                        assert!(
                            matches!(&required_args[0].kind, NodeKind::Text(s) if s == "bold")
                        );
                    }
                    other => panic!("expected font command, got {other:?}"),
                }
                assert!(matches!(&nodes[1].kind, NodeKind::Text(s) if s == "bold"));
            }
            other => panic!("expected group, got {other:?}"),
        }
    }

    #[test]
    fn non_macro_commands_pass_through_unchanged() {
        let (doc, _errors) = parse_document(r"\section{Intro}");
        let store = MacroStore::with_builtins();
        let expanded = expand_document(doc, &store);
        assert!(matches!(&expanded.body[0].kind, NodeKind::Command { name, .. } if name == "section"));
    }

    #[test]
    fn nested_textbf_and_textit_both_expand() {
        let (doc, _errors) = parse_document(r"\textbf{\textit{both}}");
        let store = MacroStore::with_builtins();
        let expanded = expand_document(doc, &store);
        // Outer textbf expands to Group[font(bold), <expanded textit>].
        match &expanded.body[0].kind {
            NodeKind::Group(nodes) => match &nodes[1].kind {
                NodeKind::Group(inner) => {
                    assert!(matches!(&inner[0].kind, NodeKind::Command { name, .. } if name == "font"));
                }
                other => panic!("expected inner group, got {other:?}"),
            },
            other => panic!("expected group, got {other:?}"),
        }
    }
}
