//! Options that shape how a binding is generated.
//!
//! A [`BindingConfig`] is part of every cache key, so two resolutions that
//! differ only in configuration produce independent bindings.

use serde::{Deserialize, Serialize};

use crate::parse_flag;

/// When native symbols are looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolBinding {
    /// Every required symbol is resolved while the instance is constructed.
    #[default]
    Eager,
    /// Symbols are resolved on first invocation of their member.
    Lazy,
}

/// Calling convention the native entry points are expected to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallingConvention {
    #[default]
    C,
    /// The platform's system convention (`stdcall` on 32-bit Windows).
    System,
}

impl CallingConvention {
    /// Whether the convention is ABI-identical to `extern "C"` on this target.
    pub fn is_c_compatible(self) -> bool {
        match self {
            CallingConvention::C => true,
            CallingConvention::System => !cfg!(all(windows, target_arch = "x86")),
        }
    }
}

/// Transformation applied to member names to obtain native symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolNaming {
    #[default]
    AsDeclared,
    /// `getValue` becomes `get_value`.
    Underscore,
    /// `get_value` becomes `GetValue`.
    PascalCase,
}

impl SymbolNaming {
    pub fn apply(self, name: &str) -> String {
        match self {
            SymbolNaming::AsDeclared => name.to_string(),
            SymbolNaming::Underscore => to_underscore(name),
            SymbolNaming::PascalCase => to_pascal(name),
        }
    }
}

fn to_underscore(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
            prev_lower = false;
        } else {
            out.push(ch);
            prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        }
    }
    out
}

fn to_pascal(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Binding generation options
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    pub binding: SymbolBinding,
    pub calling_convention: CallingConvention,
    /// Prefix used to name the native getter of a property
    pub getter_prefix: String,
    /// Prefix used to name the native setter of a property
    pub setter_prefix: String,
    /// Prepended to every derived symbol name (not to explicit overrides)
    pub symbol_prefix: String,
    pub naming: SymbolNaming,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            binding: SymbolBinding::Eager,
            calling_convention: CallingConvention::C,
            getter_prefix: "get_".to_string(),
            setter_prefix: "set_".to_string(),
            symbol_prefix: String::new(),
            naming: SymbolNaming::AsDeclared,
        }
    }
}

impl BindingConfig {
    pub fn lazy() -> Self {
        Self::default().with_binding(SymbolBinding::Lazy)
    }

    pub fn with_binding(mut self, binding: SymbolBinding) -> Self {
        self.binding = binding;
        self
    }

    pub fn with_calling_convention(mut self, convention: CallingConvention) -> Self {
        self.calling_convention = convention;
        self
    }

    pub fn with_accessor_prefixes(
        mut self,
        getter: impl Into<String>,
        setter: impl Into<String>,
    ) -> Self {
        self.getter_prefix = getter.into();
        self.setter_prefix = setter.into();
        self
    }

    pub fn with_symbol_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.symbol_prefix = prefix.into();
        self
    }

    pub fn with_naming(mut self, naming: SymbolNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn is_lazy(&self) -> bool {
        self.binding == SymbolBinding::Lazy
    }

    /// Native symbol name for a member without an explicit override.
    pub fn symbol_name(&self, member: &str) -> String {
        format!("{}{}", self.symbol_prefix, self.naming.apply(member))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(lazy) = lookup("NATIVEBIND_LAZY_BINDING").as_deref().and_then(parse_flag) {
            config.binding = if lazy {
                SymbolBinding::Lazy
            } else {
                SymbolBinding::Eager
            };
        }

        if let Some(prefix) = lookup("NATIVEBIND_SYMBOL_PREFIX") {
            config.symbol_prefix = prefix;
        }

        config
    }
}
