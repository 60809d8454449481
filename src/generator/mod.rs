//! Member implementation generators.
//!
//! A generator turns one interface member into entries of a
//! [`DispatchTable`]: the recipe a trampoline needs to forward calls to a
//! native symbol. Methods map to one entry each; properties are split into
//! synthetic accessor methods and handed to the method generator.

mod method;
mod property;

use ahash::AHashMap;
use nbind_config::BindingConfig;
use nbind_symbol::{FfiSignature, InterfaceDescription, MemberDescriptor};

use crate::error::BindingError;

pub use method::MethodGenerator;
pub use property::PropertyGenerator;

/// Produces dispatch entries for the members it understands and ignores the
/// rest, so every generator can be run over every member.
pub trait MemberGenerator {
    fn generate(
        &self,
        interface: &InterfaceDescription,
        member: &MemberDescriptor,
        config: &BindingConfig,
        table: &mut DispatchTable,
    ) -> Result<(), BindingError>;
}

/// Forwarding recipe of one callable entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRecipe {
    name: String,
    symbol: String,
    signature: FfiSignature,
    optional: bool,
}

impl MemberRecipe {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn signature(&self) -> &FfiSignature {
        &self.signature
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropertySlots {
    pub getter: Option<usize>,
    pub setter: Option<usize>,
}

/// Ordinal-indexed recipes plus name lookups.
#[derive(Debug, Default)]
pub struct DispatchTable {
    recipes: Vec<MemberRecipe>,
    ordinals: AHashMap<String, usize>,
    properties: AHashMap<String, PropertySlots>,
}

impl DispatchTable {
    /// Append a recipe; a name may only be bound once.
    pub(crate) fn push(
        &mut self,
        interface: &InterfaceDescription,
        recipe: MemberRecipe,
    ) -> Result<usize, BindingError> {
        if self.ordinals.contains_key(&recipe.name) {
            return Err(BindingError::configuration(
                interface.name(),
                format!("member `{}` is bound twice", recipe.name),
            ));
        }
        let ordinal = self.recipes.len();
        self.ordinals.insert(recipe.name.clone(), ordinal);
        self.recipes.push(recipe);
        Ok(ordinal)
    }

    pub(crate) fn attach_property(&mut self, name: &str, slots: PropertySlots) {
        self.properties.insert(name.to_string(), slots);
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn recipes(&self) -> &[MemberRecipe] {
        &self.recipes
    }

    pub fn recipe(&self, ordinal: usize) -> Option<&MemberRecipe> {
        self.recipes.get(ordinal)
    }

    pub fn ordinal(&self, name: &str) -> Option<usize> {
        self.ordinals.get(name).copied()
    }

    pub fn property(&self, name: &str) -> Option<PropertySlots> {
        self.properties.get(name).copied()
    }
}

/// Run every generator over every member, in declaration order.
pub fn build_table(
    interface: &InterfaceDescription,
    config: &BindingConfig,
) -> Result<DispatchTable, BindingError> {
    let generators: [&dyn MemberGenerator; 2] = [&MethodGenerator, &PropertyGenerator];
    let mut table = DispatchTable::default();
    for member in interface.members() {
        for generator in generators {
            generator.generate(interface, member, config, &mut table)?;
        }
    }
    Ok(table)
}
