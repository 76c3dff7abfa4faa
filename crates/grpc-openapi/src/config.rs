//! Generator configuration, loadable from YAML.
//!
//! # File format
//!
//! ```yaml
//! # Component naming: `fqn` (default) or `simple`.
//! naming_strategy: simple
//!
//! # Restriction labels whose elements are included.
//! visibility_selectors:
//!   - PUBLIC
//!   - PREVIEW
//!
//! # Only emit the primary HTTP binding of each method.
//! ignore_additional_bindings: false
//!
//! # Rewrite body property names to lowerCamelCase (default true).
//! json_names: true
//!
//! # Skip the `default` error response on every operation.
//! disable_default_errors: false
//!
//! version: 2.1.0
//! title: Library API
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;

/// How component schema keys are derived from fully-qualified type names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingStrategy {
    /// The fully-qualified name without its leading dot (`lib.v1.Book`).
    #[default]
    Fqn,
    /// The shortest trailing part of the name that is unique (`Book`).
    Simple,
}

/// Options of one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct GeneratorConfig {
    /// Component naming strategy.
    pub naming_strategy: NamingStrategy,

    /// Enabled visibility restriction labels.
    pub visibility_selectors: BTreeSet<String>,

    /// Process only binding `0` of each method.
    pub ignore_additional_bindings: bool,

    /// Rewrite property keys of body schemas to lowerCamelCase.
    pub json_names: bool,

    /// Omit the `default` error response.
    pub disable_default_errors: bool,

    /// `info.version` of the produced document.
    pub version: String,

    /// `info.title` of the produced document.
    pub title: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            naming_strategy: NamingStrategy::default(),
            visibility_selectors: BTreeSet::new(),
            ignore_additional_bindings: false,
            json_names: true,
            disable_default_errors: false,
            version: "1.0.0".to_string(),
            title: None,
        }
    }
}

impl GeneratorConfig {
    /// Load config from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }

    /// Set the naming strategy.
    #[must_use]
    pub fn naming_strategy(mut self, strategy: NamingStrategy) -> Self {
        self.naming_strategy = strategy;
        self
    }

    /// Enable one visibility restriction label.
    #[must_use]
    pub fn visibility_selector(mut self, label: impl Into<String>) -> Self {
        self.visibility_selectors.insert(label.into());
        self
    }

    /// Process only the primary binding of each method.
    #[must_use]
    pub fn ignore_additional_bindings(mut self, enabled: bool) -> Self {
        self.ignore_additional_bindings = enabled;
        self
    }

    /// Toggle lowerCamelCase property keys.
    #[must_use]
    pub fn json_names(mut self, enabled: bool) -> Self {
        self.json_names = enabled;
        self
    }

    /// Toggle the `default` error response.
    #[must_use]
    pub fn disable_default_errors(mut self, disabled: bool) -> Self {
        self.disable_default_errors = disabled;
        self
    }

    /// Set `info.version`.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set `info.title`.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}
