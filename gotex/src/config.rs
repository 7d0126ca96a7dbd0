//! User-facing configuration: font size, where to look for `ttf/`, and a
//! table of zero-argument text macros, loadable from a TOML file the same
//! way this project's predecessor's config module reads its own.

use std::collections::HashMap;
use std::env;
use std::fs;

use serde::{Deserialize, Serialize};

use crate::ast::{Macro, Node};
use crate::position::Position;

/// Deserializable configuration. Every field is optional so a partial TOML
/// file only overrides what it names; [`GotexConfig::resolved`] fills in
/// the rest from [`GotexConfig::default`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GotexConfig {
    pub font_size: Option<f32>,
    pub ttf_dir: Option<String>,
    pub output_dir: Option<String>,
    /// Zero-argument text macros: `name = "replacement"`, seeded into the
    /// root `MacroStore` alongside the builtins before expansion.
    #[serde(default)]
    pub macros: HashMap<String, String>,
}

impl GotexConfig {
    pub fn default_values() -> Self {
        GotexConfig {
            font_size: Some(12.0),
            ttf_dir: None,
            output_dir: Some(".".to_string()),
            macros: HashMap::new(),
        }
    }

    pub fn font_size(&self) -> f32 {
        self.font_size.unwrap_or(12.0)
    }

    pub fn output_dir(&self) -> String {
        self.output_dir.clone().unwrap_or_else(|| ".".to_string())
    }

    /// Read `~/.config/gotex/config.toml`, falling back to defaults (with a
    /// logged warning) if it is absent or fails to parse.
    pub fn load_user_config() -> Self {
        match Self::user_config_path().and_then(|p| fs::read_to_string(p).ok()) {
            Some(raw) => match toml::from_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("failed to parse config file: {e}");
                    Self::default_values()
                }
            },
            None => Self::default_values(),
        }
    }

    fn user_config_path() -> Option<std::path::PathBuf> {
        let home = env::var("HOME").ok()?;
        Some(std::path::PathBuf::from(home).join(".config/gotex/config.toml"))
    }

    /// Build `Macro` definitions for every configured text macro, to seed
    /// into the root `MacroStore` before expansion.
    pub fn macro_definitions(&self) -> Vec<Macro> {
        self.macros
            .iter()
            .map(|(name, replacement)| Macro {
                name: name.clone(),
                num_args: 0,
                body: vec![Node::text(replacement.clone(), Position::start())],
                expandable: true,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_font_size_is_twelve_point() {
        let config = GotexConfig::default_values();
        assert_eq!(config.font_size(), 12.0);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config: GotexConfig = toml::from_str(r#"font_size = 14.0"#).unwrap();
        assert_eq!(config.font_size(), 14.0);
        assert_eq!(config.output_dir(), ".");
    }

    #[test]
    fn macro_table_becomes_zero_arg_macros() {
        let mut config = GotexConfig::default_values();
        config.macros.insert("companyname".to_string(), "Acme Corp".to_string());
        let macros = config.macro_definitions();
        assert_eq!(macros.len(), 1);
        assert_eq!(macros[0].num_args, 0);
        assert!(macros[0].expandable);
    }
}
