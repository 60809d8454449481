//! OS dynamic loader: `dlopen`/`dlsym`/`dlclose` on POSIX systems,
//! `LoadLibraryExW`/`GetProcAddress`/`FreeLibrary` on Windows.

use std::path::{Path, PathBuf};

use nbind_config::SymbolBinding;
use tracing::{debug, trace, warn};

use crate::{LoaderError, PlatformLoader, SymbolAddress};

#[cfg(unix)]
mod unix;
#[cfg(unix)]
use self::unix as platform;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
use self::windows as platform;

/// An open OS library handle together with the path it was opened from.
pub struct SystemHandle {
    library: platform::NativeLibrary,
    path: PathBuf,
}

impl SystemHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLoader;

impl SystemLoader {
    pub fn new() -> Self {
        Self
    }
}

impl PlatformLoader for SystemLoader {
    type Handle = SystemHandle;

    fn open(&self, path: &Path, binding: SymbolBinding) -> Result<SystemHandle, LoaderError> {
        let library =
            platform::open(path, binding).map_err(|err| LoaderError::open(path, &err))?;
        debug!(path = %path.display(), ?binding, "opened native library");
        Ok(SystemHandle {
            library,
            path: path.to_path_buf(),
        })
    }

    fn resolve_symbol(
        &self,
        handle: &SystemHandle,
        name: &str,
    ) -> Result<SymbolAddress, LoaderError> {
        let ptr = platform::resolve(&handle.library, name)
            .map_err(|err| LoaderError::symbol(name, &err))?;
        trace!(symbol = name, library = %handle.path.display(), "resolved symbol");
        SymbolAddress::new(ptr).ok_or_else(|| LoaderError::NullSymbol {
            symbol: name.to_string(),
        })
    }

    fn close(&self, handle: SystemHandle) -> bool {
        let SystemHandle { library, path } = handle;
        match library.close() {
            Ok(()) => {
                debug!(path = %path.display(), "closed native library");
                true
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to close native library");
                false
            }
        }
    }
}
