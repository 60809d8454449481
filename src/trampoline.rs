//! Generic forwarding of a call to a native address.
//!
//! Arguments are reduced to two register classes before the call: integers,
//! booleans and pointers are widened to a 64-bit word, floating point values
//! travel as a 64-bit float (an `f32` in the low half of its bit pattern). On
//! the supported 64-bit targets the C ABI places each of these exactly where
//! the narrower declared type would go, so one monomorphized call path per
//! register shape serves every declared signature.

use nbind_symbol::FfiType;

/// Highest parameter count a trampoline dispatches.
pub const MAX_ARITY: usize = 6;

/// Whether register-class forwarding is valid for the compilation target.
pub const SUPPORTED_TARGET: bool = cfg!(any(target_arch = "x86_64", target_arch = "aarch64"));

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum RegisterArg {
    Word(u64),
    Float(f64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ReturnClass {
    Unit,
    Word,
    Float,
}

impl ReturnClass {
    pub(crate) fn of(ty: FfiType) -> Self {
        if ty == FfiType::Unit {
            ReturnClass::Unit
        } else if ty.is_integral() {
            ReturnClass::Word
        } else {
            ReturnClass::Float
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum RawReturn {
    Unit,
    Word(u64),
    Float(f64),
}

// Expands to a match tree over the register class of each argument, ending in
// a transmute to the matching `extern "C"` pointer type and the call itself.
macro_rules! dispatch {
    ($addr:expr; [$($ty:ty),*]; [$($arg:ident),*]; []) => {{
        // SAFETY: the caller guarantees `$addr` is a C ABI function whose
        // parameters occupy exactly these register classes.
        let func = unsafe {
            std::mem::transmute::<*const (), unsafe extern "C" fn($($ty),*) -> R>($addr)
        };
        unsafe { func($($arg),*) }
    }};
    ($addr:expr; [$($ty:ty),*]; [$($arg:ident),*]; [$next:ident $(, $rest:ident)*]) => {
        match $next {
            RegisterArg::Word($next) => {
                dispatch!($addr; [$($ty,)* u64]; [$($arg,)* $next]; [$($rest),*])
            }
            RegisterArg::Float($next) => {
                dispatch!($addr; [$($ty,)* f64]; [$($arg,)* $next]; [$($rest),*])
            }
        }
    };
}

/// # Safety
/// `addr` must point to a live `extern "C"` function taking `args.len()`
/// parameters of the given classes and returning a value of class `R`.
unsafe fn call<R: Copy>(addr: *const (), args: &[RegisterArg]) -> Option<R> {
    let value = match *args {
        [] => dispatch!(addr; []; []; []),
        [a0] => dispatch!(addr; []; []; [a0]),
        [a0, a1] => dispatch!(addr; []; []; [a0, a1]),
        [a0, a1, a2] => dispatch!(addr; []; []; [a0, a1, a2]),
        [a0, a1, a2, a3] => dispatch!(addr; []; []; [a0, a1, a2, a3]),
        [a0, a1, a2, a3, a4] => dispatch!(addr; []; []; [a0, a1, a2, a3, a4]),
        [a0, a1, a2, a3, a4, a5] => dispatch!(addr; []; []; [a0, a1, a2, a3, a4, a5]),
        _ => return None,
    };
    Some(value)
}

/// Invoke `addr` with `args`. `None` when the arity exceeds [`MAX_ARITY`].
///
/// # Safety
/// `addr` must point to a live `extern "C"` function whose declared signature
/// reduces to `args` and `ret`. The library owning it must stay loaded for the
/// duration of the call.
pub(crate) unsafe fn invoke(
    addr: *const (),
    args: &[RegisterArg],
    ret: ReturnClass,
) -> Option<RawReturn> {
    // SAFETY: forwarded from the caller's contract.
    unsafe {
        match ret {
            ReturnClass::Unit => call::<()>(addr, args).map(|()| RawReturn::Unit),
            ReturnClass::Word => call::<u64>(addr, args).map(RawReturn::Word),
            ReturnClass::Float => call::<f64>(addr, args).map(RawReturn::Float),
        }
    }
}
