//! Where native libraries are looked for and how bare names are decorated.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchLocation {
    WorkingDirectory,
    /// Directory containing the running executable
    ExecutableDirectory,
    Directory(PathBuf),
    /// Loader path variables and the conventional system library directories
    PlatformDefaults,
}

/// OS-specific file naming for shared libraries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameDecoration {
    pub prefix: String,
    pub suffixes: Vec<String>,
}

impl NameDecoration {
    /// Decoration rules of the compilation target.
    pub fn native() -> Self {
        if cfg!(windows) {
            Self {
                prefix: String::new(),
                suffixes: vec![".dll".to_string()],
            }
        } else if cfg!(target_os = "macos") {
            Self {
                prefix: "lib".to_string(),
                suffixes: vec![".dylib".to_string(), ".so".to_string()],
            }
        } else {
            Self {
                prefix: "lib".to_string(),
                suffixes: vec![".so".to_string()],
            }
        }
    }

    /// File names to try for `name`, most specific first. The name as given is
    /// always the first candidate.
    pub fn candidates(&self, name: &str) -> Vec<String> {
        let mut out = vec![name.to_string()];
        if self.suffixes.iter().any(|suffix| name.ends_with(suffix.as_str())) {
            return out;
        }

        for suffix in &self.suffixes {
            if !self.prefix.is_empty() && !name.starts_with(self.prefix.as_str()) {
                out.push(format!("{}{name}{suffix}", self.prefix));
            }
            out.push(format!("{name}{suffix}"));
        }
        out
    }
}

impl Default for NameDecoration {
    fn default() -> Self {
        Self::native()
    }
}

/// Ordered library search configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub locations: Vec<SearchLocation>,
    pub decoration: NameDecoration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            locations: vec![
                SearchLocation::WorkingDirectory,
                SearchLocation::ExecutableDirectory,
                SearchLocation::PlatformDefaults,
            ],
            decoration: NameDecoration::native(),
        }
    }
}

impl SearchConfig {
    /// Search only the given directories, in order.
    pub fn directories<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            locations: dirs
                .into_iter()
                .map(|dir| SearchLocation::Directory(dir.into()))
                .collect(),
            decoration: NameDecoration::native(),
        }
    }

    pub fn with_location(mut self, location: SearchLocation) -> Self {
        self.locations.push(location);
        self
    }

    pub fn with_decoration(mut self, decoration: NameDecoration) -> Self {
        self.decoration = decoration;
        self
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `NATIVEBIND_SEARCH_PATH` directories are searched before the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(paths) = lookup("NATIVEBIND_SEARCH_PATH") {
            let mut locations: Vec<SearchLocation> = std::env::split_paths(&paths)
                .filter(|path| !path.as_os_str().is_empty())
                .map(SearchLocation::Directory)
                .collect();
            locations.append(&mut config.locations);
            config.locations = locations;
        }

        config
    }
}
