//! Live bindings: one open library plus the addresses bound from it.

use std::fmt;
use std::sync::Arc;

use nbind_loader::{PlatformLoader, SymbolAddress};
use nbind_symbol::FfiValue;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::blueprint::Blueprint;
use crate::error::BindingError;
use crate::generator::{MemberRecipe, MethodGenerator};
use crate::identifier::Identifier;
use crate::marshal::{ArgumentFrame, decode_return};
use crate::trampoline::{self, ReturnClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Active,
    Disposed,
}

pub(crate) enum SymbolSlot {
    Bound(SymbolAddress),
    /// Lazily bound; filled on first successful lookup.
    Deferred(OnceCell<SymbolAddress>),
    /// Optional member whose symbol the library does not export.
    Missing { detail: String, code: Option<i32> },
}

struct LiveLibrary<H> {
    handle: H,
    slots: Vec<SymbolSlot>,
}

/// An activated binding.
///
/// Instances are shared through the cache. Disposal, whether through
/// [`BindingInstance::dispose`] or a cache release, affects every holder:
/// later calls fail with [`BindingError::Disposed`]. Calls already running
/// finish before the library is closed.
pub struct BindingInstance<L: PlatformLoader> {
    identifier: Identifier,
    blueprint: Arc<Blueprint>,
    loader: Arc<L>,
    live: RwLock<Option<LiveLibrary<L::Handle>>>,
}

impl<L: PlatformLoader> BindingInstance<L> {
    /// Open the library and bind every entry of the blueprint. Either all
    /// required symbols bind or the library is closed again and the error
    /// returned.
    pub(crate) fn construct(
        identifier: Identifier,
        blueprint: Arc<Blueprint>,
        loader: Arc<L>,
    ) -> Result<Arc<Self>, BindingError> {
        let binding = identifier.config().binding;
        let handle = loader.open(identifier.library_path(), binding)?;

        let mut slots = Vec::with_capacity(blueprint.table().len());
        for recipe in blueprint.table().recipes() {
            match MethodGenerator::bind(recipe, loader.as_ref(), &handle, binding) {
                Ok(slot) => slots.push(slot),
                Err(err) => {
                    loader.close(handle);
                    return Err(err);
                }
            }
        }

        debug!(%identifier, members = slots.len(), "activated binding");
        Ok(Arc::new(Self {
            identifier,
            blueprint,
            loader,
            live: RwLock::new(Some(LiveLibrary { handle, slots })),
        }))
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn blueprint(&self) -> &Arc<Blueprint> {
        &self.blueprint
    }

    pub fn state(&self) -> InstanceState {
        // Recursive: may run inside a native callback while a dispose waits.
        if self.live.read_recursive().is_some() {
            InstanceState::Active
        } else {
            InstanceState::Disposed
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.state() == InstanceState::Disposed
    }

    /// Call a method (or a synthetic accessor such as `get_width`) by name.
    pub fn invoke(&self, member: &str, args: &[FfiValue]) -> Result<FfiValue, BindingError> {
        let ordinal = self
            .blueprint
            .table()
            .ordinal(member)
            .ok_or_else(|| self.unknown(member))?;
        self.invoke_ordinal(ordinal, args)
    }

    pub fn invoke_ordinal(&self, ordinal: usize, args: &[FfiValue]) -> Result<FfiValue, BindingError> {
        let recipe = self
            .blueprint
            .table()
            .recipe(ordinal)
            .ok_or_else(|| self.unknown(&format!("#{ordinal}")))?;
        let frame = ArgumentFrame::new(recipe.name(), recipe.signature(), args)?;

        // Recursive read: native code may call back into this binding.
        let live = self.live.read_recursive();
        let Some(live) = live.as_ref() else {
            return Err(self.disposed());
        };
        let address = self.address(live, ordinal, recipe)?;

        let result = recipe.signature().result;
        // SAFETY: the address was exported under the recipe's symbol and the
        // library stays open while `live` is held.
        let raw = unsafe {
            trampoline::invoke(address.as_ptr(), frame.registers(), ReturnClass::of(result))
        }
        .ok_or_else(|| BindingError::ArgumentMismatch {
            member: recipe.name().to_string(),
            expected: format!("at most {} arguments", trampoline::MAX_ARITY),
            found: format!("{} arguments", args.len()),
        })?;
        // SAFETY: string results are read before the library can be closed.
        unsafe { decode_return(recipe.name(), result, raw) }
    }

    /// Read a property through its native getter.
    pub fn get(&self, property: &str) -> Result<FfiValue, BindingError> {
        let getter = self
            .blueprint
            .table()
            .property(property)
            .and_then(|slots| slots.getter)
            .ok_or_else(|| self.unknown(&format!("{property} (getter)")))?;
        self.invoke_ordinal(getter, &[])
    }

    /// Write a property through its native setter.
    pub fn set(&self, property: &str, value: FfiValue) -> Result<(), BindingError> {
        let setter = self
            .blueprint
            .table()
            .property(property)
            .and_then(|slots| slots.setter)
            .ok_or_else(|| self.unknown(&format!("{property} (setter)")))?;
        self.invoke_ordinal(setter, &[value]).map(|_| ())
    }

    /// Whether the member's symbol is bound or can still be looked up.
    pub fn is_available(&self, member: &str) -> bool {
        let Some(ordinal) = self.blueprint.table().ordinal(member) else {
            return false;
        };
        let live = self.live.read_recursive();
        live.as_ref()
            .and_then(|live| live.slots.get(ordinal))
            .is_some_and(|slot| !matches!(slot, SymbolSlot::Missing { .. }))
    }

    /// Close the library and invalidate the instance. Returns `false` when it
    /// was already disposed.
    pub fn dispose(&self) -> bool {
        let Some(live) = self.live.write().take() else {
            return false;
        };
        if !self.loader.close(live.handle) {
            warn!(identifier = %self.identifier, "native library reported a close failure");
        }
        debug!(identifier = %self.identifier, "disposed binding");
        true
    }

    fn address(
        &self,
        live: &LiveLibrary<L::Handle>,
        ordinal: usize,
        recipe: &MemberRecipe,
    ) -> Result<SymbolAddress, BindingError> {
        match live.slots.get(ordinal) {
            Some(SymbolSlot::Bound(address)) => Ok(*address),
            Some(SymbolSlot::Deferred(cell)) => cell
                .get_or_try_init(|| self.loader.resolve_symbol(&live.handle, recipe.symbol()))
                .copied()
                .map_err(BindingError::from),
            Some(SymbolSlot::Missing { detail, code }) => Err(BindingError::SymbolLoad {
                symbol: recipe.symbol().to_string(),
                detail: detail.clone(),
                code: *code,
            }),
            None => Err(self.unknown(recipe.name())),
        }
    }

    fn unknown(&self, member: &str) -> BindingError {
        BindingError::UnknownMember {
            interface: self.identifier.interface().name().to_string(),
            member: member.to_string(),
        }
    }

    fn disposed(&self) -> BindingError {
        BindingError::Disposed {
            interface: self.identifier.interface().name().to_string(),
        }
    }
}

impl<L: PlatformLoader> Drop for BindingInstance<L> {
    fn drop(&mut self) {
        if let Some(live) = self.live.get_mut().take() {
            self.loader.close(live.handle);
        }
    }
}

impl<L: PlatformLoader> fmt::Debug for BindingInstance<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingInstance")
            .field("identifier", &self.identifier)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

