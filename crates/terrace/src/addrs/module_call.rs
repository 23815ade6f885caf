use super::{display_unique_key, InstanceKey, ModuleInstance};
use std::fmt;

/// A `module` block, as seen from the calling module
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleCall {
    pub name: String,
}

impl ModuleCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn instance(&self, key: InstanceKey) -> ModuleCallInstance {
        ModuleCallInstance {
            call: self.clone(),
            key,
        }
    }

    pub fn absolute(&self, module: ModuleInstance) -> AbsModuleCall {
        AbsModuleCall {
            module,
            call: self.clone(),
        }
    }
}

impl fmt::Display for ModuleCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module.{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleCallInstance {
    pub call: ModuleCall,
    pub key: InstanceKey,
}

impl ModuleCallInstance {
    /// The module instance this call instance produces when called from `caller`
    pub fn module_instance(&self, caller: &ModuleInstance) -> ModuleInstance {
        caller.child(self.call.name.clone(), self.key.clone())
    }

    pub fn output(&self, name: impl Into<String>) -> ModuleCallInstanceOutput {
        ModuleCallInstanceOutput {
            call: self.clone(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ModuleCallInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module.{}{}", self.call.name, self.key)
    }
}

/// An output value of a module call instance, as seen from the calling module
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleCallInstanceOutput {
    pub call: ModuleCallInstance,
    pub name: String,
}

impl fmt::Display for ModuleCallInstanceOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.call, self.name)
    }
}

/// A module call within a particular module instance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AbsModuleCall {
    pub module: ModuleInstance,
    pub call: ModuleCall,
}

impl AbsModuleCall {
    pub fn instance(&self, key: InstanceKey) -> ModuleInstance {
        self.module.child(self.call.name.clone(), key)
    }
}

impl fmt::Display for AbsModuleCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.module.is_root() {
            write!(f, "{}", self.call)
        } else {
            write!(f, "{}.{}", self.module, self.call)
        }
    }
}

display_unique_key!(
    ModuleCall => ModuleCall,
    ModuleCallInstance => ModuleCallInstance,
    ModuleCallInstanceOutput => ModuleCallInstanceOutput,
    AbsModuleCall => AbsModuleCall,
);

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display() {
        let call = ModuleCall::new("net");
        assert_eq!(call.to_string(), "module.net");
        assert_eq!(call.instance(InstanceKey::Int(0)).to_string(), "module.net[0]");
        assert_eq!(
            call.instance(InstanceKey::from("a")).output("id").to_string(),
            "module.net[\"a\"].id"
        );

        let parent = ModuleInstance::root().child("outer", InstanceKey::NoKey);
        let abs = call.absolute(parent.clone());
        assert_eq!(abs.to_string(), "module.outer.module.net");
        assert_eq!(abs.instance(InstanceKey::Int(1)).to_string(), "module.outer.module.net[1]");
        assert_eq!(call.absolute(ModuleInstance::root()).to_string(), "module.net");
    }
}
