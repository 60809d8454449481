//! Interface descriptions: the ordered member list a binding is generated from.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ahash::AHasher;

use crate::ty::{FfiSignature, FfiType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyAccess {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl PropertyAccess {
    pub fn can_read(self) -> bool {
        matches!(self, PropertyAccess::ReadOnly | PropertyAccess::ReadWrite)
    }

    pub fn can_write(self) -> bool {
        matches!(self, PropertyAccess::WriteOnly | PropertyAccess::ReadWrite)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Method(FfiSignature),
    /// Backed by a pair of native accessor functions.
    Property { ty: FfiType, access: PropertyAccess },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemberDescriptor {
    pub name: String,
    pub kind: MemberKind,
    /// Explicit native entry point name, bypassing naming rules.
    pub symbol: Option<String>,
    /// A missing symbol for an optional member does not fail construction.
    pub optional: bool,
}

impl MemberDescriptor {
    pub fn method(name: impl Into<String>, params: Vec<FfiType>, result: FfiType) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Method(FfiSignature::new(params, result)),
            symbol: None,
            optional: false,
        }
    }

    pub fn property(name: impl Into<String>, ty: FfiType, access: PropertyAccess) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Property { ty, access },
            symbol: None,
            optional: false,
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn is_property(&self) -> bool {
        matches!(self.kind, MemberKind::Property { .. })
    }
}

/// Identity of an interface description: its name and full member list.
/// Two differently shaped descriptions never share a cache slot. The
/// fingerprint is a display aid only.
#[derive(Clone, Debug)]
pub struct InterfaceId {
    name: String,
    members: Arc<[MemberDescriptor]>,
    fingerprint: u64,
}

impl InterfaceId {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

impl PartialEq for InterfaceId {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && (Arc::ptr_eq(&self.members, &other.members) || self.members == other.members)
    }
}

impl Eq for InterfaceId {}

impl Hash for InterfaceId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.members.hash(state);
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:016x}", self.name, self.fingerprint)
    }
}

#[derive(Clone, Debug)]
pub struct InterfaceDescription {
    id: InterfaceId,
}

impl InterfaceDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_members(name, Vec::new())
    }

    pub fn with_members(name: impl Into<String>, members: Vec<MemberDescriptor>) -> Self {
        let name = name.into();
        let fingerprint = fingerprint(&name, &members);
        Self {
            id: InterfaceId {
                name,
                members: members.into(),
                fingerprint,
            },
        }
    }

    pub fn member(self, member: MemberDescriptor) -> Self {
        let mut members = self.id.members.to_vec();
        members.push(member);
        Self::with_members(self.id.name, members)
    }

    pub fn method(self, name: impl Into<String>, params: Vec<FfiType>, result: FfiType) -> Self {
        self.member(MemberDescriptor::method(name, params, result))
    }

    pub fn property(self, name: impl Into<String>, ty: FfiType, access: PropertyAccess) -> Self {
        self.member(MemberDescriptor::property(name, ty, access))
    }

    pub fn id(&self) -> &InterfaceId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.id.name()
    }

    pub fn members(&self) -> &[MemberDescriptor] {
        self.id.members()
    }

    pub fn find(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members().iter().find(|member| member.name == name)
    }
}

fn fingerprint(name: &str, members: &[MemberDescriptor]) -> u64 {
    let mut hasher = AHasher::default();
    name.hash(&mut hasher);
    members.hash(&mut hasher);
    hasher.finish()
}
