//! Statically typed interfaces over [`BindingInstance`].

use std::sync::Arc;

use nbind_loader::{PlatformLoader, SystemLoader};
use nbind_symbol::InterfaceDescription;

use crate::instance::BindingInstance;

/// A Rust type standing for a native interface. Usually produced by
/// [`native_interface!`](crate::native_interface).
pub trait NativeInterface<L: PlatformLoader = SystemLoader>: Sized {
    fn describe() -> InterfaceDescription;

    fn from_instance(instance: Arc<BindingInstance<L>>) -> Self;
}

/// Declare a typed native interface.
///
/// ```ignore
/// nativebind::native_interface! {
///     pub struct LibM {
///         fn cos(x: f64) -> f64;
///         #[symbol = "sqrt"]
///         fn square_root(x: f64) -> f64;
///     }
/// }
///
/// let libm: LibM = NativeBinder::global().resolve_interface("libm.so.6", &BindingConfig::default())?;
/// assert_eq!(libm.cos(0.0)?, 1.0);
/// ```
///
/// Every method returns `Result<T, BindingError>`. Parameter and return types
/// must implement [`NativeType`](crate::NativeType).
#[macro_export]
macro_rules! native_interface {
    (@ret) => { () };
    (@ret $ret:ty) => { $ret };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[symbol = $symbol:literal])?
                fn $method:ident($($arg:ident : $arg_ty:ty),* $(,)?) $(-> $ret:ty)?;
            )*
        }
    ) => {
        $(#[$meta])*
        $vis struct $name<L: $crate::PlatformLoader = $crate::SystemLoader> {
            instance: ::std::sync::Arc<$crate::BindingInstance<L>>,
        }

        impl<L: $crate::PlatformLoader> ::std::clone::Clone for $name<L> {
            fn clone(&self) -> Self {
                Self {
                    instance: ::std::sync::Arc::clone(&self.instance),
                }
            }
        }

        impl<L: $crate::PlatformLoader> $crate::NativeInterface<L> for $name<L> {
            fn describe() -> $crate::InterfaceDescription {
                let mut members = ::std::vec::Vec::new();
                $(
                    let member = $crate::MemberDescriptor::method(
                        stringify!($method),
                        vec![$(<$arg_ty as $crate::NativeType>::FFI_TYPE),*],
                        <$crate::native_interface!(@ret $($ret)?) as $crate::NativeType>::FFI_TYPE,
                    );
                    $(let member = member.with_symbol($symbol);)?
                    members.push(member);
                )*
                $crate::InterfaceDescription::with_members(stringify!($name), members)
            }

            fn from_instance(instance: ::std::sync::Arc<$crate::BindingInstance<L>>) -> Self {
                Self { instance }
            }
        }

        impl<L: $crate::PlatformLoader> $name<L> {
            /// The untyped binding behind this interface.
            pub fn instance(&self) -> &::std::sync::Arc<$crate::BindingInstance<L>> {
                &self.instance
            }

            $(
                pub fn $method(
                    &self,
                    $($arg: $arg_ty),*
                ) -> ::std::result::Result<$crate::native_interface!(@ret $($ret)?), $crate::BindingError> {
                    let value = self.instance.invoke(
                        stringify!($method),
                        &[$($crate::NativeType::into_value($arg)),*],
                    )?;
                    <$crate::native_interface!(@ret $($ret)?) as $crate::NativeType>::from_value(
                        stringify!($method),
                        value,
                    )
                }
            )*
        }
    };
}
