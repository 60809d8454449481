use std::fmt;

/// Scalar types a forwarding trampoline knows how to pass through the C ABI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FfiType {
    Unit,
    Bool,
    I32,
    I64,
    U32,
    U64,
    F32,
    F64,
    /// NUL-terminated string, passed as `*const c_char`.
    Str,
    /// Untyped pointer-sized value, passed through untouched.
    Opaque,
}

impl FfiType {
    /// Whether the type travels in a general purpose register.
    pub fn is_integral(self) -> bool {
        !matches!(self, FfiType::Unit | FfiType::F32 | FfiType::F64)
    }
}

impl fmt::Display for FfiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FfiType::Unit => write!(f, "unit"),
            FfiType::Bool => write!(f, "bool"),
            FfiType::I32 => write!(f, "i32"),
            FfiType::I64 => write!(f, "i64"),
            FfiType::U32 => write!(f, "u32"),
            FfiType::U64 => write!(f, "u64"),
            FfiType::F32 => write!(f, "f32"),
            FfiType::F64 => write!(f, "f64"),
            FfiType::Str => write!(f, "str"),
            FfiType::Opaque => write!(f, "opaque"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FfiSignature {
    pub params: Vec<FfiType>,
    pub result: FfiType,
}

impl FfiSignature {
    pub fn new(params: Vec<FfiType>, result: FfiType) -> Self {
        Self { params, result }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for FfiSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .params
            .iter()
            .map(|ty| ty.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "({params}) -> {}", self.result)
    }
}
