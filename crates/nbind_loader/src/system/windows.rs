use std::path::Path;

use libloading::os::windows::Library;
use nbind_config::SymbolBinding;

pub(super) type NativeLibrary = Library;

/// The Windows loader always resolves imports at load time; the binding mode
/// only affects when this crate looks up exports.
pub(super) fn open(path: &Path, _binding: SymbolBinding) -> Result<Library, libloading::Error> {
    // SAFETY: running DllMain is inherent to binding native code; the path was
    // validated by the resolver.
    unsafe { Library::new(path) }
}

pub(super) fn resolve(library: &Library, name: &str) -> Result<*const (), libloading::Error> {
    // SAFETY: the symbol is read as an untyped address and never called here.
    let symbol = unsafe { library.get::<*const ()>(name.as_bytes()) }?;
    Ok(*symbol)
}
