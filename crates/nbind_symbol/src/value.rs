use std::fmt;

use crate::ty::FfiType;

/// A runtime value crossing a binding boundary.
#[derive(Clone, Debug, PartialEq)]
pub enum FfiValue {
    Unit,
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Opaque(usize),
}

impl FfiValue {
    pub fn ty(&self) -> FfiType {
        match self {
            FfiValue::Unit => FfiType::Unit,
            FfiValue::Bool(_) => FfiType::Bool,
            FfiValue::I32(_) => FfiType::I32,
            FfiValue::I64(_) => FfiType::I64,
            FfiValue::U32(_) => FfiType::U32,
            FfiValue::U64(_) => FfiType::U64,
            FfiValue::F32(_) => FfiType::F32,
            FfiValue::F64(_) => FfiType::F64,
            FfiValue::Str(_) => FfiType::Str,
            FfiValue::Opaque(_) => FfiType::Opaque,
        }
    }
}

impl fmt::Display for FfiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FfiValue::Unit => write!(f, "()"),
            FfiValue::Bool(v) => write!(f, "{v}"),
            FfiValue::I32(v) => write!(f, "{v}"),
            FfiValue::I64(v) => write!(f, "{v}"),
            FfiValue::U32(v) => write!(f, "{v}"),
            FfiValue::U64(v) => write!(f, "{v}"),
            FfiValue::F32(v) => write!(f, "{v}"),
            FfiValue::F64(v) => write!(f, "{v}"),
            FfiValue::Str(v) => write!(f, "{v:?}"),
            FfiValue::Opaque(v) => write!(f, "{v:#x}"),
        }
    }
}
