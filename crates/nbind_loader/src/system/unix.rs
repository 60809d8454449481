use std::path::Path;

use libloading::os::unix::{Library, RTLD_LAZY, RTLD_LOCAL, RTLD_NOW};
use nbind_config::SymbolBinding;

pub(super) type NativeLibrary = Library;

pub(super) fn open(path: &Path, binding: SymbolBinding) -> Result<Library, libloading::Error> {
    let flags = match binding {
        SymbolBinding::Eager => RTLD_NOW,
        SymbolBinding::Lazy => RTLD_LAZY,
    } | RTLD_LOCAL;
    // SAFETY: running library initialisers is inherent to binding native code;
    // the path was validated by the resolver.
    unsafe { Library::open(Some(path), flags) }
}

pub(super) fn resolve(library: &Library, name: &str) -> Result<*const (), libloading::Error> {
    // SAFETY: the symbol is read as an untyped address and never called here.
    let symbol = unsafe { library.get::<*const ()>(name.as_bytes()) }?;
    Ok(*symbol)
}
