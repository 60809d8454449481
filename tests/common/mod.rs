#![allow(dead_code)]

use std::ffi::c_char;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Barrier};

use nativebind::{
    BindingCache, FfiType, InterfaceDescription, LoaderError, NativeBinder, PlatformLoader,
    PropertyAccess, SearchConfig, StaticLoader, SymbolAddress, SymbolBinding, SymbolTable,
};
use tempfile::TempDir;

pub extern "C" fn calc_add(a: i32, b: i32) -> i32 {
    a + b
}

pub extern "C" fn calc_scale(value: f64, factor: f32) -> f64 {
    value * f64::from(factor)
}

pub extern "C" fn calc_name() -> *const c_char {
    c"calc".as_ptr()
}

pub extern "C" fn calc_nothing() -> *const c_char {
    std::ptr::null()
}

static WIDTH: AtomicI32 = AtomicI32::new(0);

pub extern "C" fn calc_get_width() -> i32 {
    WIDTH.load(Ordering::SeqCst)
}

pub extern "C" fn calc_set_width(width: i32) {
    WIDTH.store(width, Ordering::SeqCst);
}

pub fn calc_table() -> SymbolTable {
    SymbolTable::new()
        .with("calc_add", calc_add as *const ())
        .with("calc_scale", calc_scale as *const ())
        .with("calc_name", calc_name as *const ())
        .with("calc_nothing", calc_nothing as *const ())
        .with("calc_get_width", calc_get_width as *const ())
        .with("calc_set_width", calc_set_width as *const ())
}

pub fn calc_interface() -> InterfaceDescription {
    InterfaceDescription::new("calc")
        .method("calc_add", vec![FfiType::I32, FfiType::I32], FfiType::I32)
        .method("calc_scale", vec![FfiType::F64, FfiType::F32], FfiType::F64)
        .method("calc_name", vec![], FfiType::Str)
}

pub fn width_interface() -> InterfaceDescription {
    InterfaceDescription::new("calc_width").property("width", FfiType::I32, PropertyAccess::ReadWrite)
}

/// A fake library file on disk served by an in-process loader.
pub struct Fixture {
    pub dir: TempDir,
    pub library: PathBuf,
    pub loader: Arc<StaticLoader>,
    pub binder: NativeBinder<StaticLoader>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_table(calc_table())
    }

    pub fn with_table(table: SymbolTable) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let library = dir.path().join("libcalc.so");
        File::create(&library).unwrap();

        let loader = Arc::new(StaticLoader::new());
        loader.register(&library, table);
        let binder = NativeBinder::with_cache(
            Arc::clone(&loader),
            SearchConfig::directories([dir.path()]),
            Arc::new(BindingCache::new()),
        );

        Self {
            dir,
            library,
            loader,
            binder,
        }
    }
}

/// Wraps a [`StaticLoader`] so the next `open` parks until the test lets it
/// continue, holding the resolving thread inside construction.
pub struct GatedLoader {
    pub inner: StaticLoader,
    armed: AtomicBool,
    entered: Barrier,
    proceed: Barrier,
}

impl GatedLoader {
    pub fn new(inner: StaticLoader) -> Self {
        Self {
            inner,
            armed: AtomicBool::new(false),
            entered: Barrier::new(2),
            proceed: Barrier::new(2),
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Blocks until a gated `open` is in progress.
    pub fn wait_entered(&self) {
        self.entered.wait();
    }

    pub fn proceed(&self) {
        self.proceed.wait();
    }
}

impl PlatformLoader for GatedLoader {
    type Handle = <StaticLoader as PlatformLoader>::Handle;

    fn open(&self, path: &Path, binding: SymbolBinding) -> Result<Self::Handle, LoaderError> {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.wait();
            self.proceed.wait();
        }
        self.inner.open(path, binding)
    }

    fn resolve_symbol(&self, handle: &Self::Handle, name: &str) -> Result<SymbolAddress, LoaderError> {
        self.inner.resolve_symbol(handle, name)
    }

    fn close(&self, handle: Self::Handle) -> bool {
        self.inner.close(handle)
    }
}
