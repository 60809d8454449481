use nbind_config::{BindingConfig, SymbolBinding};
use nbind_loader::PlatformLoader;
use nbind_symbol::{InterfaceDescription, MemberDescriptor, MemberKind};
use once_cell::sync::OnceCell;
use tracing::trace;

use super::{DispatchTable, MemberGenerator, MemberRecipe};
use crate::error::BindingError;
use crate::instance::SymbolSlot;

/// Generates one dispatch entry per plain method. Properties are left to the
/// property generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct MethodGenerator;

impl MemberGenerator for MethodGenerator {
    fn generate(
        &self,
        interface: &InterfaceDescription,
        member: &MemberDescriptor,
        config: &BindingConfig,
        table: &mut DispatchTable,
    ) -> Result<(), BindingError> {
        let MemberKind::Method(signature) = &member.kind else {
            return Ok(());
        };

        let symbol = member
            .symbol
            .clone()
            .unwrap_or_else(|| config.symbol_name(&member.name));
        trace!(interface = interface.name(), member = %member.name, %symbol, %signature, "generated method");
        table.push(
            interface,
            MemberRecipe {
                name: member.name.clone(),
                symbol,
                signature: signature.clone(),
                optional: member.optional,
            },
        )?;
        Ok(())
    }
}

impl MethodGenerator {
    /// Bind `recipe` against an open library. Eager binding resolves now and
    /// fails on a missing required symbol; lazy binding leaves an empty slot.
    pub(crate) fn bind<L: PlatformLoader>(
        recipe: &MemberRecipe,
        loader: &L,
        handle: &L::Handle,
        binding: SymbolBinding,
    ) -> Result<SymbolSlot, BindingError> {
        if binding == SymbolBinding::Lazy {
            return Ok(SymbolSlot::Deferred(OnceCell::new()));
        }

        match loader.resolve_symbol(handle, &recipe.symbol) {
            Ok(address) => Ok(SymbolSlot::Bound(address)),
            Err(err) if recipe.optional => {
                trace!(symbol = %recipe.symbol, error = %err, "optional symbol unavailable");
                Ok(SymbolSlot::Missing {
                    detail: err.to_string(),
                    code: err.code(),
                })
            }
            Err(err) => Err(err.into()),
        }
    }
}
