use super::{
    display_unique_key, ModuleCall, ModuleCallInstance, ModuleCallInstanceOutput,
    ProviderFunction, Resource, ResourceInstance, UniqueKey, UniqueKeyKind, UniqueKeyer,
};
use std::fmt;

/// `var.name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InputVariable {
    pub name: String,
}

/// `local.name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalValue {
    pub name: String,
}

/// `output.name`, only referenceable from test files
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputValue {
    pub name: String,
}

/// `check.name`, only referenceable from test files
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Check {
    pub name: String,
}

/// `path.module`, `path.root`, `path.cwd`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathAttr {
    pub name: String,
}

/// `count.index`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CountAttr {
    pub name: String,
}

/// `each.key`, `each.value`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ForEachAttr {
    pub name: String,
}

/// Spelling of the `terraform.*` object. Both spellings name the same object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TerraformIdent {
    Terraform,
    Tofu,
}

impl TerraformIdent {
    pub fn as_str(self) -> &'static str {
        match self {
            TerraformIdent::Terraform => "terraform",
            TerraformIdent::Tofu => "tofu",
        }
    }
}

/// `terraform.workspace` or `tofu.workspace`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TerraformAttr {
    pub ident: TerraformIdent,
    pub name: String,
}

macro_rules! named_referenceable {
    ($($ty:ident => $prefix:literal),+ $(,)?) => {
        $(
            impl $ty {
                pub fn new(name: impl Into<String>) -> Self {
                    Self { name: name.into() }
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, concat!($prefix, ".{}"), self.name)
                }
            }
        )+
    };
}

named_referenceable!(
    InputVariable => "var",
    LocalValue => "local",
    OutputValue => "output",
    Check => "check",
    PathAttr => "path",
    CountAttr => "count",
    ForEachAttr => "each",
);

display_unique_key!(
    InputVariable => InputVariable,
    LocalValue => LocalValue,
    OutputValue => OutputValue,
    Check => Check,
    PathAttr => PathAttr,
    CountAttr => CountAttr,
    ForEachAttr => ForEachAttr,
);

impl TerraformAttr {
    pub fn new(ident: TerraformIdent, name: impl Into<String>) -> Self {
        Self {
            ident,
            name: name.into(),
        }
    }
}

impl fmt::Display for TerraformAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.ident.as_str(), self.name)
    }
}

impl UniqueKeyer for TerraformAttr {
    fn unique_key(&self) -> UniqueKey {
        // the spelling is not part of the identity
        UniqueKey::new(UniqueKeyKind::TerraformAttr, &self.name)
    }
}

/// Anything an expression can refer to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Referenceable {
    Resource(Resource),
    ResourceInstance(ResourceInstance),
    ModuleCall(ModuleCall),
    ModuleCallInstance(ModuleCallInstance),
    ModuleCallInstanceOutput(ModuleCallInstanceOutput),
    InputVariable(InputVariable),
    LocalValue(LocalValue),
    OutputValue(OutputValue),
    Check(Check),
    PathAttr(PathAttr),
    TerraformAttr(TerraformAttr),
    CountAttr(CountAttr),
    ForEachAttr(ForEachAttr),
    /// `self`, an alias for the resource instance currently being evaluated
    SelfRef,
    ProviderFunction(ProviderFunction),
}

impl Referenceable {
    /// Short name of the address kind
    pub fn kind(&self) -> &'static str {
        match self {
            Referenceable::Resource(_) => "resource",
            Referenceable::ResourceInstance(_) => "resource_instance",
            Referenceable::ModuleCall(_) => "module_call",
            Referenceable::ModuleCallInstance(_) => "module_call_instance",
            Referenceable::ModuleCallInstanceOutput(_) => "module_call_instance_output",
            Referenceable::InputVariable(_) => "input_variable",
            Referenceable::LocalValue(_) => "local_value",
            Referenceable::OutputValue(_) => "output_value",
            Referenceable::Check(_) => "check",
            Referenceable::PathAttr(_) => "path_attr",
            Referenceable::TerraformAttr(_) => "terraform_attr",
            Referenceable::CountAttr(_) => "count_attr",
            Referenceable::ForEachAttr(_) => "for_each_attr",
            Referenceable::SelfRef => "self",
            Referenceable::ProviderFunction(_) => "provider_function",
        }
    }
}

impl fmt::Display for Referenceable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Referenceable::Resource(addr) => fmt::Display::fmt(addr, f),
            Referenceable::ResourceInstance(addr) => fmt::Display::fmt(addr, f),
            Referenceable::ModuleCall(addr) => fmt::Display::fmt(addr, f),
            Referenceable::ModuleCallInstance(addr) => fmt::Display::fmt(addr, f),
            Referenceable::ModuleCallInstanceOutput(addr) => fmt::Display::fmt(addr, f),
            Referenceable::InputVariable(addr) => fmt::Display::fmt(addr, f),
            Referenceable::LocalValue(addr) => fmt::Display::fmt(addr, f),
            Referenceable::OutputValue(addr) => fmt::Display::fmt(addr, f),
            Referenceable::Check(addr) => fmt::Display::fmt(addr, f),
            Referenceable::PathAttr(addr) => fmt::Display::fmt(addr, f),
            Referenceable::TerraformAttr(addr) => fmt::Display::fmt(addr, f),
            Referenceable::CountAttr(addr) => fmt::Display::fmt(addr, f),
            Referenceable::ForEachAttr(addr) => fmt::Display::fmt(addr, f),
            Referenceable::SelfRef => f.write_str("self"),
            Referenceable::ProviderFunction(addr) => fmt::Display::fmt(addr, f),
        }
    }
}

impl UniqueKeyer for Referenceable {
    fn unique_key(&self) -> UniqueKey {
        match self {
            Referenceable::Resource(addr) => addr.unique_key(),
            Referenceable::ResourceInstance(addr) => addr.unique_key(),
            Referenceable::ModuleCall(addr) => addr.unique_key(),
            Referenceable::ModuleCallInstance(addr) => addr.unique_key(),
            Referenceable::ModuleCallInstanceOutput(addr) => addr.unique_key(),
            Referenceable::InputVariable(addr) => addr.unique_key(),
            Referenceable::LocalValue(addr) => addr.unique_key(),
            Referenceable::OutputValue(addr) => addr.unique_key(),
            Referenceable::Check(addr) => addr.unique_key(),
            Referenceable::PathAttr(addr) => addr.unique_key(),
            Referenceable::TerraformAttr(addr) => addr.unique_key(),
            Referenceable::CountAttr(addr) => addr.unique_key(),
            Referenceable::ForEachAttr(addr) => addr.unique_key(),
            Referenceable::SelfRef => UniqueKey::new(UniqueKeyKind::SelfRef, "self"),
            Referenceable::ProviderFunction(addr) => addr.unique_key(),
        }
    }
}

macro_rules! referenceable_from {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl From<$ty> for Referenceable {
                fn from(value: $ty) -> Self {
                    Referenceable::$ty(value)
                }
            }
        )+
    };
}

referenceable_from!(
    Resource,
    ResourceInstance,
    ModuleCall,
    ModuleCallInstance,
    ModuleCallInstanceOutput,
    InputVariable,
    LocalValue,
    OutputValue,
    Check,
    PathAttr,
    TerraformAttr,
    CountAttr,
    ForEachAttr,
    ProviderFunction,
);
