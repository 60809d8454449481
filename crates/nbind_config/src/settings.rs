//! Combined configuration: binding options plus library search rules.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::binding::BindingConfig;
use crate::search::SearchConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub binding: BindingConfig,
    pub search: SearchConfig,
}

impl Settings {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            binding: BindingConfig::from_env(),
            search: SearchConfig::from_env(),
        }
    }

    /// Load configuration from TOML file
    #[cfg(feature = "toml-config")]
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&contents)
    }

    #[cfg(feature = "toml-config")]
    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load configuration from TOML file (stub when toml feature is disabled)
    #[cfg(not(feature = "toml-config"))]
    pub fn from_file(_path: &Path) -> anyhow::Result<Self> {
        anyhow::bail!("TOML support not enabled. Enable the 'toml-config' feature.")
    }

    /// Merge with environment variables (env vars take precedence)
    pub fn merge_with_env(self) -> Self {
        self.merge_with_lookup(|key| std::env::var(key).ok())
    }

    pub fn merge_with_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let env_binding = BindingConfig::from_lookup(&lookup);
        if lookup("NATIVEBIND_LAZY_BINDING").is_some() {
            self.binding.binding = env_binding.binding;
        }
        if lookup("NATIVEBIND_SYMBOL_PREFIX").is_some() {
            self.binding.symbol_prefix = env_binding.symbol_prefix;
        }

        let env_search = SearchConfig::from_lookup(&lookup);
        if lookup("NATIVEBIND_SEARCH_PATH").is_some() {
            let defaults = SearchConfig::default().locations.len();
            let extra = env_search.locations.len().saturating_sub(defaults);
            let mut locations = env_search.locations[..extra].to_vec();
            locations.append(&mut self.search.locations);
            self.search.locations = locations;
        }

        self
    }
}
