use nbind_config::BindingConfig;
use nbind_symbol::{FfiType, InterfaceDescription, MemberDescriptor, MemberKind};

use super::{DispatchTable, MemberGenerator, MethodGenerator, PropertySlots};
use crate::error::BindingError;

/// Splits a property into `get_`/`set_` accessor methods (prefixes come from
/// the configuration) and delegates each to [`MethodGenerator`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PropertyGenerator;

impl PropertyGenerator {
    /// Synthetic accessor methods of `member`, getter first. Empty for
    /// anything that is not a property.
    pub fn accessors(member: &MemberDescriptor, config: &BindingConfig) -> Vec<MemberDescriptor> {
        let MemberKind::Property { ty, access } = member.kind else {
            return Vec::new();
        };

        let accessor = |prefix: &str, params: Vec<FfiType>, result: FfiType| {
            let mut method = MemberDescriptor::method(format!("{prefix}{}", member.name), params, result);
            if let Some(base) = &member.symbol {
                method = method.with_symbol(format!("{prefix}{base}"));
            }
            method.optional = member.optional;
            method
        };

        let mut out = Vec::with_capacity(2);
        if access.can_read() {
            out.push(accessor(&config.getter_prefix, vec![], ty));
        }
        if access.can_write() {
            out.push(accessor(&config.setter_prefix, vec![ty], FfiType::Unit));
        }
        out
    }
}

impl MemberGenerator for PropertyGenerator {
    fn generate(
        &self,
        interface: &InterfaceDescription,
        member: &MemberDescriptor,
        config: &BindingConfig,
        table: &mut DispatchTable,
    ) -> Result<(), BindingError> {
        let MemberKind::Property { access, .. } = member.kind else {
            return Ok(());
        };

        let mut slots = PropertySlots::default();
        for accessor in Self::accessors(member, config) {
            MethodGenerator.generate(interface, &accessor, config, table)?;
            let ordinal = table.ordinal(&accessor.name);
            if slots.getter.is_none() && access.can_read() {
                slots.getter = ordinal;
            } else {
                slots.setter = ordinal;
            }
        }
        table.attach_property(&member.name, slots);
        Ok(())
    }
}
