//! Command name → Unicode glyph table for math mode.
//!
//! Covers the Greek alphabet (both cases), common binary operators,
//! relations, set/logic operators, and arrows, per `spec.md` §4.4. A few
//! additional symbols present in `original_source/symbols/symbols.go` but
//! not enumerated in the prose spec (`dagger`, `angle`, `therefore`,
//! `because`) are included as harmless supplementation.

use std::collections::HashMap;

use lazy_static::lazy_static;

lazy_static! {
    static ref SYMBOL_TABLE: HashMap<&'static str, char> = build_symbol_table();
}

/// Resolve a command name (with or without a leading backslash) to its
/// math glyph.
pub fn resolve(command_name: &str) -> Option<char> {
    let name = command_name.strip_prefix('\\').unwrap_or(command_name);
    SYMBOL_TABLE.get(name).copied()
}

fn build_symbol_table() -> HashMap<&'static str, char> {
    let mut m = HashMap::new();

    // Greek letters (lowercase)
    for (name, glyph) in [
        ("alpha", 'α'),
        ("beta", 'β'),
        ("gamma", 'γ'),
        ("delta", 'δ'),
        ("epsilon", 'ε'),
        ("zeta", 'ζ'),
        ("eta", 'η'),
        ("theta", 'θ'),
        ("iota", 'ι'),
        ("kappa", 'κ'),
        ("lambda", 'λ'),
        ("mu", 'μ'),
        ("nu", 'ν'),
        ("xi", 'ξ'),
        ("pi", 'π'),
        ("rho", 'ρ'),
        ("sigma", 'σ'),
        ("tau", 'τ'),
        ("upsilon", 'υ'),
        ("phi", 'φ'),
        ("chi", 'χ'),
        ("psi", 'ψ'),
        ("omega", 'ω'),
    ] {
        m.insert(name, glyph);
    }

    // Greek letters (uppercase)
    for (name, glyph) in [
        ("Alpha", 'Α'),
        ("Beta", 'Β'),
        ("Gamma", 'Γ'),
        ("Delta", 'Δ'),
        ("Epsilon", 'Ε'),
        ("Zeta", 'Ζ'),
        ("Eta", 'Η'),
        ("Theta", 'Θ'),
        ("Iota", 'Ι'),
        ("Kappa", 'Κ'),
        ("Lambda", 'Λ'),
        ("Mu", 'Μ'),
        ("Nu", 'Ν'),
        ("Xi", 'Ξ'),
        ("Pi", 'Π'),
        ("Rho", 'Ρ'),
        ("Sigma", 'Σ'),
        ("Tau", 'Τ'),
        ("Upsilon", 'Υ'),
        ("Phi", 'Φ'),
        ("Chi", 'Χ'),
        ("Psi", 'Ψ'),
        ("Omega", 'Ω'),
    ] {
        m.insert(name, glyph);
    }

    // Binary operators
    for (name, glyph) in [
        ("sum", '∑'),
        ("prod", '∏'),
        ("int", '∫'),
        ("oint", '∮'),
        ("partial", '∂'),
        ("infty", '∞'),
        ("nabla", '∇'),
        ("pm", '±'),
        ("mp", '∓'),
        ("times", '×'),
        ("div", '÷'),
        ("cdot", '⋅'),
        ("bullet", '∙'),
    ] {
        m.insert(name, glyph);
    }

    // Relations
    for (name, glyph) in [
        ("leq", '≤'),
        ("geq", '≥'),
        ("neq", '≠'),
        ("equiv", '≡'),
        ("approx", '≈'),
        ("sim", '∼'),
        ("simeq", '≃'),
        ("cong", '≅'),
        ("propto", '∝'),
    ] {
        m.insert(name, glyph);
    }

    // Set and logic operators
    for (name, glyph) in [
        ("in", '∈'),
        ("notin", '∉'),
        ("subset", '⊂'),
        ("supset", '⊃'),
        ("subseteq", '⊆'),
        ("supseteq", '⊇'),
        ("cup", '∪'),
        ("cap", '∩'),
        ("emptyset", '∅'),
        ("forall", '∀'),
        ("exists", '∃'),
        ("neg", '¬'),
        ("land", '∧'),
        ("lor", '∨'),
        ("implies", '⟹'),
        ("iff", '⟺'),
    ] {
        m.insert(name, glyph);
    }

    // Arrows
    for (name, glyph) in [
        ("leftarrow", '←'),
        ("rightarrow", '→'),
        ("uparrow", '↑'),
        ("downarrow", '↓'),
        ("leftrightarrow", '↔'),
        ("Leftarrow", '⇐'),
        ("Rightarrow", '⇒'),
        ("Uparrow", '⇑'),
        ("Downarrow", '⇓'),
        ("Leftrightarrow", '⇔'),
    ] {
        m.insert(name, glyph);
    }

    // Supplemented from original_source/symbols/symbols.go.
    for (name, glyph) in [
        ("dagger", '†'),
        ("angle", '∠'),
        ("therefore", '∴'),
        ("because", '∵'),
        ("wedge", '∧'),
        ("vee", '∨'),
    ] {
        m.insert(name, glyph);
    }

    m
}

/// Returns `true` if `glyph` belongs to the "operator" spacing class used
/// by the math processor's spacing table (`spec.md` §4.7.4).
pub fn is_operator_glyph(glyph: char) -> bool {
    matches!(glyph, '+' | '−' | '-' | '×' | '÷' | '⋅' | '±' | '∓')
}

/// Returns `true` if `glyph` belongs to the "relation" spacing class.
pub fn is_relation_glyph(glyph: char) -> bool {
    matches!(
        glyph,
        '=' | '<' | '>' | '≤' | '≥' | '≠' | '≡' | '≈' | '∼' | '≃' | '≅' | '∝'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_with_and_without_backslash() {
        assert_eq!(resolve("alpha"), Some('α'));
        assert_eq!(resolve(r"\alpha"), Some('α'));
    }

    #[test]
    fn unknown_command_resolves_to_none() {
        assert_eq!(resolve("notasymbol"), None);
    }

    #[test]
    fn double_arrows_use_capital_variants() {
        assert_eq!(resolve("Rightarrow"), Some('⇒'));
        assert_eq!(resolve("rightarrow"), Some('→'));
    }
}
