use nbind_config::BindingConfig;
use nbind_symbol::{InterfaceDescription, InterfaceId};
use tracing::debug;

use crate::error::BindingError;
use crate::generator::{DispatchTable, build_table};

/// Reusable forwarding recipe for one identifier: the interface's dispatch
/// table, independent of any open library. Instances are stamped out of it.
#[derive(Debug)]
pub struct Blueprint {
    interface: InterfaceId,
    table: DispatchTable,
}

impl Blueprint {
    pub fn generate(
        interface: &InterfaceDescription,
        config: &BindingConfig,
    ) -> Result<Self, BindingError> {
        let table = build_table(interface, config)?;
        debug!(interface = %interface.id(), entries = table.len(), "generated blueprint");
        Ok(Self {
            interface: interface.id().clone(),
            table,
        })
    }

    pub fn interface(&self) -> &InterfaceId {
        &self.interface
    }

    pub fn table(&self) -> &DispatchTable {
        &self.table
    }
}
