use super::Expander;
use crate::addrs::{AbsModuleCall, AbsResource, AbsResourceInstance, Module, ModuleInstance};

/// Read-only view of every instance an [Expander] knows about, see [Expander::all_instances]
///
/// Addresses that were never registered are simply not members.
#[derive(Debug, Clone, Copy)]
pub struct Set<'a> {
    expander: &'a Expander,
}

impl<'a> Set<'a> {
    pub(super) fn new(expander: &'a Expander) -> Self {
        Self { expander }
    }

    pub fn has_module_instance(&self, want: &ModuleInstance) -> bool {
        self.expander.knows_module_instance(want)
    }

    pub fn has_module_call(&self, want: &AbsModuleCall) -> bool {
        self.expander.knows_module_call(want)
    }

    pub fn has_resource(&self, want: &AbsResource) -> bool {
        self.expander.knows_resource(want)
    }

    pub fn has_resource_instance(&self, want: &AbsResourceInstance) -> bool {
        self.expander.knows_resource_instance(want)
    }

    /// All known instances of a static module, sorted. Empty if any call on the path is unknown.
    pub fn instances_for_module(&self, module: &Module) -> Vec<ModuleInstance> {
        self.expander.expand_module_inner(module, true)
    }
}
