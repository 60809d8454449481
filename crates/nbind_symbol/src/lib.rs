//! Type model shared by the nativebind crates: the FFI scalar types a
//! trampoline can marshal, runtime values, and interface descriptions.

pub mod interface;
pub mod ty;
pub mod value;

pub use interface::{
    InterfaceDescription, InterfaceId, MemberDescriptor, MemberKind, PropertyAccess,
};
pub use ty::{FfiSignature, FfiType};
pub use value::FfiValue;
