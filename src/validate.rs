//! Up-front checks that an interface can be bound under a configuration.
//! Runs before the filesystem or any loader is touched.

use ahash::AHashSet;
use nbind_config::BindingConfig;
use nbind_symbol::{FfiType, InterfaceDescription, MemberDescriptor, MemberKind};

use crate::error::BindingError;
use crate::generator::PropertyGenerator;
use crate::trampoline::{MAX_ARITY, SUPPORTED_TARGET};

pub fn validate(interface: &InterfaceDescription, config: &BindingConfig) -> Result<(), BindingError> {
    let name = interface.name();
    let fail = |reason: String| Err(BindingError::configuration(name, reason));

    if name.is_empty() {
        return fail("interface name is empty".to_string());
    }
    if !SUPPORTED_TARGET {
        return fail(format!(
            "call forwarding is not supported on {}",
            std::env::consts::ARCH
        ));
    }
    if !config.calling_convention.is_c_compatible() {
        return fail(format!(
            "calling convention {:?} differs from the C ABI on this target",
            config.calling_convention
        ));
    }
    if config.symbol_prefix.contains('\0') {
        return fail("symbol prefix contains a NUL byte".to_string());
    }

    let mut declared = AHashSet::new();
    let mut callables = AHashSet::new();
    for member in interface.members() {
        check_member(member).or_else(fail)?;

        if member.is_property() && config.getter_prefix == config.setter_prefix {
            return fail(format!(
                "property `{}` needs distinct getter and setter prefixes",
                member.name
            ));
        }

        let callable = match member.kind {
            MemberKind::Method(_) => vec![member.name.clone()],
            MemberKind::Property { .. } => PropertyGenerator::accessors(member, config)
                .into_iter()
                .map(|accessor| accessor.name)
                .collect(),
        };
        if !declared.insert(member.name.clone()) {
            return fail(format!("member `{}` is declared twice", member.name));
        }
        for callable_name in callable {
            if !callables.insert(callable_name.clone()) {
                return fail(format!("`{callable_name}` collides with another member"));
            }
        }
    }
    Ok(())
}

fn check_member(member: &MemberDescriptor) -> Result<(), String> {
    if member.name.is_empty() || member.name.chars().any(|ch| ch.is_whitespace() || ch == '\0') {
        return Err(format!("invalid member name {:?}", member.name));
    }
    if let Some(symbol) = &member.symbol {
        if symbol.is_empty() || symbol.contains('\0') {
            return Err(format!("invalid symbol override {symbol:?} on `{}`", member.name));
        }
    }

    match &member.kind {
        MemberKind::Method(signature) => {
            if signature.arity() > MAX_ARITY {
                return Err(format!(
                    "`{}` takes {} parameters, at most {MAX_ARITY} are supported",
                    member.name,
                    signature.arity()
                ));
            }
            if signature.params.contains(&FfiType::Unit) {
                return Err(format!("`{}` declares a unit parameter", member.name));
            }
        }
        MemberKind::Property { ty, .. } => {
            if *ty == FfiType::Unit {
                return Err(format!("property `{}` has unit type", member.name));
            }
        }
    }
    Ok(())
}
