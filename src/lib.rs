//! nativebind: bind interface descriptions to exported functions of native
//! shared libraries, memoizing the generated bindings per
//! (interface, library, configuration).
//!
//! ```ignore
//! use nativebind::{BindingConfig, FfiType, FfiValue, InterfaceDescription, NativeBinder};
//!
//! let libm = InterfaceDescription::new("libm").method("cos", vec![FfiType::F64], FfiType::F64);
//! let instance = NativeBinder::global().resolve(&libm, "libm.so.6", &BindingConfig::default())?;
//! let one = instance.invoke("cos", &[FfiValue::F64(0.0)])?;
//! ```

pub mod blueprint;
pub mod builder;
pub mod cache;
pub mod error;
pub mod generator;
pub mod identifier;
pub mod instance;
pub mod interface;
pub mod marshal;
mod trampoline;
pub mod validate;

pub use blueprint::Blueprint;
pub use builder::NativeBinder;
pub use cache::{BindingCache, CacheStats, EntryState, InstanceSlot};
pub use error::BindingError;
pub use generator::{
    DispatchTable, MemberGenerator, MemberRecipe, MethodGenerator, PropertyGenerator, PropertySlots,
    build_table,
};
pub use identifier::Identifier;
pub use instance::{BindingInstance, InstanceState};
pub use interface::NativeInterface;
pub use marshal::NativeType;
pub use trampoline::MAX_ARITY;
pub use validate::validate;

pub use nbind_config::{
    BindingConfig, CallingConvention, NameDecoration, SearchConfig, SearchLocation, Settings,
    SymbolBinding, SymbolNaming,
};
pub use nbind_loader::{
    LibraryResolver, LoaderError, LoaderStats, PlatformLoader, StaticLoader, SymbolAddress,
    SymbolTable, SystemLoader,
};
pub use nbind_symbol::{
    FfiSignature, FfiType, FfiValue, InterfaceDescription, InterfaceId, MemberDescriptor,
    MemberKind, PropertyAccess,
};
pub use nbind_utils::init_logging;
