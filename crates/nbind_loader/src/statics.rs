//! In-process loader backed by registered symbol tables.
//!
//! Useful when the "library" is linked into the executable (static builds,
//! plugins compiled in) and for observing exactly which loader calls the
//! binding engine makes.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ahash::AHashMap;
use nbind_config::SymbolBinding;
use parking_lot::RwLock;
use tracing::debug;

use crate::{LoaderError, PlatformLoader, SymbolAddress};

#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    symbols: AHashMap<String, SymbolAddress>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `ptr` under `name`. Null pointers are ignored.
    pub fn with(mut self, name: impl Into<String>, ptr: *const ()) -> Self {
        if let Some(address) = SymbolAddress::new(ptr) {
            self.symbols.insert(name.into(), address);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<SymbolAddress> {
        self.symbols.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Snapshot of the calls a [`StaticLoader`] has served.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoaderStats {
    pub opens: usize,
    pub resolves: usize,
    pub closes: usize,
    pub open_handles: usize,
}

#[derive(Debug)]
pub struct StaticHandle {
    path: PathBuf,
    table: Arc<SymbolTable>,
}

impl StaticHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Default)]
pub struct StaticLoader {
    libraries: RwLock<AHashMap<PathBuf, Arc<SymbolTable>>>,
    opens: AtomicUsize,
    resolves: AtomicUsize,
    closes: AtomicUsize,
    open_handles: AtomicUsize,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `table` for opens of `path`. The path is canonicalized when it
    /// exists so it matches what the resolver produces.
    pub fn register(&self, path: impl AsRef<Path>, table: SymbolTable) {
        let path = path.as_ref();
        let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.libraries.write().insert(key, Arc::new(table));
    }

    pub fn stats(&self) -> LoaderStats {
        LoaderStats {
            opens: self.opens.load(Ordering::SeqCst),
            resolves: self.resolves.load(Ordering::SeqCst),
            closes: self.closes.load(Ordering::SeqCst),
            open_handles: self.open_handles.load(Ordering::SeqCst),
        }
    }
}

impl PlatformLoader for StaticLoader {
    type Handle = StaticHandle;

    fn open(&self, path: &Path, binding: SymbolBinding) -> Result<StaticHandle, LoaderError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let table = self.libraries.read().get(path).cloned().ok_or_else(|| {
            LoaderError::Open {
                path: path.to_path_buf(),
                detail: "no symbol table registered for path".to_string(),
                code: None,
            }
        })?;
        self.open_handles.fetch_add(1, Ordering::SeqCst);
        debug!(path = %path.display(), ?binding, symbols = table.len(), "opened static library");
        Ok(StaticHandle {
            path: path.to_path_buf(),
            table,
        })
    }

    fn resolve_symbol(
        &self,
        handle: &StaticHandle,
        name: &str,
    ) -> Result<SymbolAddress, LoaderError> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        handle.table.get(name).ok_or_else(|| LoaderError::Symbol {
            symbol: name.to_string(),
            detail: format!("not exported by {}", handle.path.display()),
            code: None,
        })
    }

    fn close(&self, handle: StaticHandle) -> bool {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.open_handles.fetch_sub(1, Ordering::SeqCst);
        debug!(path = %handle.path.display(), "closed static library");
        true
    }
}
