//! Native library loading: the [`PlatformLoader`] seam, its OS-backed and
//! in-process implementations, and the search-path resolver that runs before
//! any loader is touched.

use std::fmt;
use std::path::Path;

use nbind_config::SymbolBinding;

pub mod error;
pub mod resolver;
pub mod statics;
pub mod system;

pub use error::LoaderError;
pub use resolver::LibraryResolver;
pub use statics::{LoaderStats, StaticLoader, SymbolTable};
pub use system::{SystemHandle, SystemLoader};

/// Address of a resolved native entry point. Never null.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolAddress(usize);

impl SymbolAddress {
    pub fn new(ptr: *const ()) -> Option<Self> {
        (!ptr.is_null()).then(|| Self(ptr as usize))
    }

    pub fn as_ptr(self) -> *const () {
        self.0 as *const ()
    }
}

impl fmt::Debug for SymbolAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolAddress({:#x})", self.0)
    }
}

/// OS loader primitives. Implementations keep no caches of their own; callers
/// only pass back handles this loader produced.
pub trait PlatformLoader: Send + Sync + 'static {
    type Handle: Send + Sync + 'static;

    /// Map the library at `path`. `binding` hints how eagerly the OS should
    /// process the library's own relocations.
    fn open(&self, path: &Path, binding: SymbolBinding) -> Result<Self::Handle, LoaderError>;

    fn resolve_symbol(
        &self,
        handle: &Self::Handle,
        name: &str,
    ) -> Result<SymbolAddress, LoaderError>;

    /// Unmap the library; reports whether the OS accepted the request.
    fn close(&self, handle: Self::Handle) -> bool;
}
