//! Conversion between [`FfiValue`]s and trampoline registers, plus the
//! [`NativeType`] bridge used by typed interfaces.

use std::ffi::{CStr, CString, c_char, c_void};

use nbind_symbol::{FfiSignature, FfiType, FfiValue};

use crate::error::BindingError;
use crate::trampoline::{RawReturn, RegisterArg};

/// Marshaled arguments of one call. Owns any temporary C strings, so it must
/// outlive the native call.
pub(crate) struct ArgumentFrame {
    registers: Vec<RegisterArg>,
    _strings: Vec<CString>,
}

impl ArgumentFrame {
    pub(crate) fn new(
        member: &str,
        signature: &FfiSignature,
        args: &[FfiValue],
    ) -> Result<Self, BindingError> {
        if args.len() != signature.params.len() {
            return Err(BindingError::ArgumentMismatch {
                member: member.to_string(),
                expected: format!("{} arguments", signature.params.len()),
                found: format!("{} arguments", args.len()),
            });
        }

        let mut registers = Vec::with_capacity(args.len());
        let mut strings = Vec::new();
        for (expected, value) in signature.params.iter().zip(args) {
            if value.ty() != *expected {
                return Err(BindingError::ArgumentMismatch {
                    member: member.to_string(),
                    expected: expected.to_string(),
                    found: value.ty().to_string(),
                });
            }

            let register = match value {
                FfiValue::Bool(v) => RegisterArg::Word(u64::from(*v)),
                FfiValue::I32(v) => RegisterArg::Word(i64::from(*v) as u64),
                FfiValue::I64(v) => RegisterArg::Word(*v as u64),
                FfiValue::U32(v) => RegisterArg::Word(u64::from(*v)),
                FfiValue::U64(v) => RegisterArg::Word(*v),
                FfiValue::F32(v) => RegisterArg::Float(f64::from_bits(u64::from(v.to_bits()))),
                FfiValue::F64(v) => RegisterArg::Float(*v),
                FfiValue::Opaque(v) => RegisterArg::Word(*v as u64),
                FfiValue::Str(v) => {
                    let c_string =
                        CString::new(v.as_str()).map_err(|_| BindingError::ArgumentMismatch {
                            member: member.to_string(),
                            expected: "str without interior NUL".to_string(),
                            found: format!("{v:?}"),
                        })?;
                    let register = RegisterArg::Word(c_string.as_ptr() as usize as u64);
                    strings.push(c_string);
                    register
                }
                FfiValue::Unit => {
                    return Err(BindingError::ArgumentMismatch {
                        member: member.to_string(),
                        expected: "a value".to_string(),
                        found: "unit".to_string(),
                    });
                }
            };
            registers.push(register);
        }

        Ok(Self {
            registers,
            _strings: strings,
        })
    }

    pub(crate) fn registers(&self) -> &[RegisterArg] {
        &self.registers
    }
}

/// Rebuild the declared result type from the raw return registers.
///
/// # Safety
/// For `FfiType::Str` results the word must be null or point at a
/// NUL-terminated string that stays valid for the duration of this call.
pub(crate) unsafe fn decode_return(
    member: &str,
    result: FfiType,
    raw: RawReturn,
) -> Result<FfiValue, BindingError> {
    let value = match (result, raw) {
        (FfiType::Unit, _) => FfiValue::Unit,
        (FfiType::Bool, RawReturn::Word(w)) => FfiValue::Bool(w as u8 != 0),
        (FfiType::I32, RawReturn::Word(w)) => FfiValue::I32(w as u32 as i32),
        (FfiType::I64, RawReturn::Word(w)) => FfiValue::I64(w as i64),
        (FfiType::U32, RawReturn::Word(w)) => FfiValue::U32(w as u32),
        (FfiType::U64, RawReturn::Word(w)) => FfiValue::U64(w),
        (FfiType::Opaque, RawReturn::Word(w)) => FfiValue::Opaque(w as usize),
        (FfiType::F32, RawReturn::Float(f)) => FfiValue::F32(f32::from_bits(f.to_bits() as u32)),
        (FfiType::F64, RawReturn::Float(f)) => FfiValue::F64(f),
        (FfiType::Str, RawReturn::Word(w)) => {
            let ptr = w as usize as *const c_char;
            if ptr.is_null() {
                return Err(BindingError::NullString {
                    member: member.to_string(),
                });
            }
            // SAFETY: non-null and NUL-terminated per the caller's contract.
            let text = unsafe { CStr::from_ptr(ptr) };
            FfiValue::Str(text.to_string_lossy().into_owned())
        }
        (expected, raw) => {
            return Err(BindingError::ArgumentMismatch {
                member: member.to_string(),
                expected: format!("{expected} result"),
                found: format!("{raw:?}"),
            });
        }
    };
    Ok(value)
}

/// Rust types that map one-to-one onto an [`FfiType`].
pub trait NativeType: Sized {
    const FFI_TYPE: FfiType;

    fn into_value(self) -> FfiValue;

    fn from_value(member: &str, value: FfiValue) -> Result<Self, BindingError>;
}

macro_rules! native_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl NativeType for $ty {
                const FFI_TYPE: FfiType = FfiType::$variant;

                fn into_value(self) -> FfiValue {
                    FfiValue::$variant(self)
                }

                fn from_value(member: &str, value: FfiValue) -> Result<Self, BindingError> {
                    match value {
                        FfiValue::$variant(v) => Ok(v),
                        other => Err(mismatch(member, Self::FFI_TYPE, &other)),
                    }
                }
            }
        )*
    };
}

native_scalar! {
    bool => Bool,
    i32 => I32,
    i64 => I64,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => Str,
}

impl NativeType for () {
    const FFI_TYPE: FfiType = FfiType::Unit;

    fn into_value(self) -> FfiValue {
        FfiValue::Unit
    }

    fn from_value(member: &str, value: FfiValue) -> Result<Self, BindingError> {
        match value {
            FfiValue::Unit => Ok(()),
            other => Err(mismatch(member, Self::FFI_TYPE, &other)),
        }
    }
}

impl NativeType for *mut c_void {
    const FFI_TYPE: FfiType = FfiType::Opaque;

    fn into_value(self) -> FfiValue {
        FfiValue::Opaque(self as usize)
    }

    fn from_value(member: &str, value: FfiValue) -> Result<Self, BindingError> {
        match value {
            FfiValue::Opaque(v) => Ok(v as *mut c_void),
            other => Err(mismatch(member, Self::FFI_TYPE, &other)),
        }
    }
}

fn mismatch(member: &str, expected: FfiType, found: &FfiValue) -> BindingError {
    BindingError::ArgumentMismatch {
        member: member.to_string(),
        expected: expected.to_string(),
        found: found.ty().to_string(),
    }
}
