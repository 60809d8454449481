pub mod binding;
pub mod search;
pub mod settings;

pub use crate::binding::{BindingConfig, CallingConvention, SymbolBinding, SymbolNaming};
pub use crate::search::{NameDecoration, SearchConfig, SearchLocation};
pub use crate::settings::Settings;

/// Interprets the usual spellings of a boolean environment value.
pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
