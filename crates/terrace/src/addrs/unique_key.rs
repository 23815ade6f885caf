/// Comparable identity of an address
///
/// Two addresses have equal unique keys exactly when they are the same address of the same kind.
/// The kind is part of the key, so a resource and its [super::InstanceKey::NoKey] instance, which
/// render identically, still have different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniqueKey {
    kind: UniqueKeyKind,
    repr: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UniqueKeyKind {
    Module,
    ModuleInstance,
    ModuleCall,
    ModuleCallInstance,
    ModuleCallInstanceOutput,
    AbsModuleCall,
    Resource,
    ResourceInstance,
    AbsResource,
    AbsResourceInstance,
    ConfigResource,
    InputVariable,
    LocalValue,
    OutputValue,
    Check,
    PathAttr,
    TerraformAttr,
    CountAttr,
    ForEachAttr,
    SelfRef,
    ProviderFunction,
    AbsProviderInstance,
}

impl UniqueKey {
    pub fn new(kind: UniqueKeyKind, repr: impl Into<String>) -> Self {
        Self {
            kind,
            repr: repr.into(),
        }
    }

    pub fn kind(&self) -> UniqueKeyKind {
        self.kind
    }
}

impl std::fmt::Display for UniqueKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}({})", self.kind, self.repr)
    }
}

/// Addresses that can be members of a [super::Set]
pub trait UniqueKeyer {
    fn unique_key(&self) -> UniqueKey;
}

/// Implements [UniqueKeyer] from the address' [std::fmt::Display] form
macro_rules! display_unique_key {
    ($($ty:ty => $kind:ident),+ $(,)?) => {
        $(
            impl $crate::addrs::UniqueKeyer for $ty {
                fn unique_key(&self) -> $crate::addrs::UniqueKey {
                    $crate::addrs::UniqueKey::new(
                        $crate::addrs::UniqueKeyKind::$kind,
                        self.to_string(),
                    )
                }
            }
        )+
    };
}
pub(crate) use display_unique_key;
