use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use nbind_config::BindingConfig;
use nbind_symbol::InterfaceId;

/// Cache key of a binding: which interface, bound against which library file,
/// generated with which options.
///
/// The library path is compared byte for byte, so it must already be the
/// canonical absolute path produced by the resolver.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Identifier {
    interface: InterfaceId,
    library: OsString,
    config: BindingConfig,
}

impl Identifier {
    pub fn new(interface: InterfaceId, library: PathBuf, config: BindingConfig) -> Self {
        Self {
            interface,
            library: library.into_os_string(),
            config,
        }
    }

    pub fn interface(&self) -> &InterfaceId {
        &self.interface
    }

    pub fn library_path(&self) -> &Path {
        Path::new(&self.library)
    }

    pub fn config(&self) -> &BindingConfig {
        &self.config
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.interface, self.library_path().display())
    }
}
