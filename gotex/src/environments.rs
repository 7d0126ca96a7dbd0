//! Classification of environment names the parser and document processor
//! need to special-case.

/// `equation`, `align`, `gather`, `multline`, `split` — the math-aware
/// environments whose body is parsed by the math-aware variant described
/// in `spec.md` §4.2 (braces inside the body start a `Group` rather than
/// being parsed as text groups).
pub fn is_math_environment(name: &str) -> bool {
    matches!(name, "equation" | "align" | "gather" | "multline" | "split")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Itemize,
    Enumerate,
}

impl ListKind {
    pub fn from_env_name(name: &str) -> Option<Self> {
        match name {
            "itemize" => Some(ListKind::Itemize),
            "enumerate" => Some(ListKind::Enumerate),
            _ => None,
        }
    }
}
