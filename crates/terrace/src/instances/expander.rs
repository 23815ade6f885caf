use super::{Expansion, RepetitionData, Set};
use crate::addrs::{
    AbsModuleCall, AbsResource, AbsResourceInstance, InstanceKey, Module, ModuleCall,
    ModuleInstance, ModuleInstanceStep, Resource,
};
use crate::value::Value;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Collects the repetition mode of every module call and resource, then enumerates their
/// instances
///
/// Modules nest, so module expansion multiplies: a resource with `count = 2` inside a module
/// called with `count = 3` has six instances. All instances of a module are assumed to declare
/// the same objects and may only differ in how those objects repeat.
///
/// Registration must happen top-down. The expansion of a module call has to be set before
/// anything inside its instances is set or expanded, and every object is set exactly once. A
/// caller walking a dependency graph gets this order for free. Breaking it is a bug in the
/// caller, so it panics instead of returning an error.
///
/// All methods lock the whole expander: setters exclusively, queries shared.
#[derive(Debug, Default)]
pub struct Expander {
    exps: RwLock<ExpanderModule>,
}

#[derive(Debug, Default)]
struct ExpanderModule {
    module_calls: HashMap<ModuleCall, Expansion>,
    resources: HashMap<Resource, Expansion>,
    child_instances: HashMap<ModuleInstanceStep, ExpanderModule>,
}

impl Expander {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_module_single(&self, parent: &ModuleInstance, call: &ModuleCall) {
        self.set_module_expansion(parent, call, Expansion::Single)
    }

    pub fn set_module_count(&self, parent: &ModuleInstance, call: &ModuleCall, count: usize) {
        self.set_module_expansion(parent, call, Expansion::Count(count))
    }

    /// A set-typed `for_each` has to be converted into an identity map by the caller
    pub fn set_module_for_each(
        &self,
        parent: &ModuleInstance,
        call: &ModuleCall,
        mapping: IndexMap<String, Value>,
    ) {
        self.set_module_expansion(parent, call, Expansion::ForEach(mapping))
    }

    pub fn set_module_enabled(&self, parent: &ModuleInstance, call: &ModuleCall, enabled: bool) {
        self.set_module_expansion(parent, call, Expansion::Enabled(enabled))
    }

    pub fn set_resource_single(&self, module: &ModuleInstance, resource: &Resource) {
        self.set_resource_expansion(module, resource, Expansion::Single)
    }

    pub fn set_resource_count(&self, module: &ModuleInstance, resource: &Resource, count: usize) {
        self.set_resource_expansion(module, resource, Expansion::Count(count))
    }

    /// A set-typed `for_each` has to be converted into an identity map by the caller
    pub fn set_resource_for_each(
        &self,
        module: &ModuleInstance,
        resource: &Resource,
        mapping: IndexMap<String, Value>,
    ) {
        self.set_resource_expansion(module, resource, Expansion::ForEach(mapping))
    }

    pub fn set_resource_enabled(&self, module: &ModuleInstance, resource: &Resource, enabled: bool) {
        self.set_resource_expansion(module, resource, Expansion::Enabled(enabled))
    }

    fn set_module_expansion(&self, parent: &ModuleInstance, call: &ModuleCall, exp: Expansion) {
        let mut exps = self.exps.write();
        let module = exps.find_module_mut(parent);
        if module.module_calls.contains_key(call) {
            panic!(
                "expansion already registered for {}",
                parent.child(call.name.clone(), InstanceKey::NoKey)
            );
        }
        tracing::trace!(%parent, %call, expansion = ?exp, "registering module expansion");

        // instances exist from now on, so their contents can be registered next
        for key in exp.instance_keys() {
            module
                .child_instances
                .insert(ModuleInstanceStep::new(call.name.clone(), key), ExpanderModule::default());
        }
        module.module_calls.insert(call.clone(), exp);
    }

    fn set_resource_expansion(&self, module: &ModuleInstance, resource: &Resource, exp: Expansion) {
        let mut exps = self.exps.write();
        let expander_module = exps.find_module_mut(module);
        if expander_module.resources.contains_key(resource) {
            panic!(
                "expansion already registered for {}",
                resource.absolute(module.clone())
            );
        }
        tracing::trace!(%module, %resource, expansion = ?exp, "registering resource expansion");
        expander_module.resources.insert(resource.clone(), exp);
    }

    /// All instances of a static module, through every module call on its path, sorted
    ///
    /// # Panic
    /// Panics if the expansion of a module call on the path was not registered.
    #[tracing::instrument(level = "trace", skip_all, fields(module = %module))]
    pub fn expand_module(&self, module: &Module) -> Vec<ModuleInstance> {
        self.expand_module_inner(module, false)
    }

    pub(super) fn expand_module_inner(&self, module: &Module, skip_unknown: bool) -> Vec<ModuleInstance> {
        if module.is_root() {
            return vec![ModuleInstance::root()];
        }
        let exps = self.exps.read();
        let mut ret = exps.module_instances(module.steps(), &ModuleInstance::root(), skip_unknown);
        ret.sort();
        ret
    }

    /// Longest prefix of `given` that only steps through module instances that exist
    ///
    /// # Panic
    /// Panics if the expansion of a module call on the path was not registered.
    pub fn get_deepest_existing_module_instance(&self, given: &ModuleInstance) -> ModuleInstance {
        let exps = self.exps.read();
        let mut current = &*exps;
        for (i, step) in given.steps().iter().enumerate() {
            if !current.module_calls.contains_key(&ModuleCall::new(step.name.clone())) {
                panic!(
                    "no expansion has been registered for {}",
                    given.prefix(i).child(step.name.clone(), InstanceKey::NoKey)
                );
            }
            match current.child_instances.get(step) {
                Some(next) => current = next,
                None => return given.prefix(i),
            }
        }
        given.clone()
    }

    /// All instances of a resource across all instances of its static module, sorted
    ///
    /// # Panic
    /// Panics if an expansion on the path, or the resource's own, was not registered.
    #[tracing::instrument(level = "trace", skip_all, fields(module = %module, resource = %resource))]
    pub fn expand_module_resource(
        &self,
        module: &Module,
        resource: &Resource,
    ) -> Vec<AbsResourceInstance> {
        let exps = self.exps.read();
        let mut ret = exps.module_resource_instances(module.steps(), resource, &ModuleInstance::root());
        ret.sort();
        ret
    }

    /// Instances of a resource within one module instance, sorted
    ///
    /// Empty if that module instance does not exist: a module instance that is not declared
    /// contains nothing.
    ///
    /// # Panic
    /// Panics if an expansion on the path, or the resource's own, was not registered.
    #[tracing::instrument(level = "trace", skip_all, fields(resource = %resource))]
    pub fn expand_resource(&self, resource: &AbsResource) -> Vec<AbsResourceInstance> {
        let exps = self.exps.read();
        let mut ret = exps.resource_instances(
            resource.module.steps(),
            &resource.resource,
            &ModuleInstance::root(),
        );
        ret.sort();
        ret
    }

    /// `count.index`, `each.key` and `each.value` inside the call block of a module instance
    ///
    /// # Panic
    /// Panics if the module instance's expansion was not registered.
    pub fn get_module_instance_repetition_data(&self, module: &ModuleInstance) -> RepetitionData {
        if module.is_root() {
            return RepetitionData::default();
        }
        let exps = self.exps.read();
        let (parent, call_instance) = module.call_instance();
        let Some(exp) = exps.find_module(&parent).module_calls.get(&call_instance.call) else {
            panic!("no expansion has been registered for {module}");
        };
        exp.repetition_data(&call_instance.key)
    }

    /// `count.index`, `each.key` and `each.value` inside the block of a resource instance
    ///
    /// # Panic
    /// Panics if the resource's expansion was not registered.
    pub fn get_resource_instance_repetition_data(
        &self,
        instance: &AbsResourceInstance,
    ) -> RepetitionData {
        let exps = self.exps.read();
        let Some(exp) = exps
            .find_module(&instance.module)
            .resources
            .get(&instance.resource.resource)
        else {
            panic!(
                "no expansion has been registered for {}",
                instance.containing_resource()
            );
        };
        exp.repetition_data(&instance.resource.key)
    }

    /// Membership queries over everything registered so far
    ///
    /// Intended for use after all registrations are done. Unlike the `expand_*` methods the
    /// queries tolerate addresses that were never registered.
    pub fn all_instances(&self) -> Set<'_> {
        Set::new(self)
    }

    pub(super) fn knows_module_instance(&self, want: &ModuleInstance) -> bool {
        want.is_root() || self.exps.read().get_module_instance(want).is_some()
    }

    pub(super) fn knows_module_call(&self, want: &AbsModuleCall) -> bool {
        self.exps
            .read()
            .get_module_instance(&want.module)
            .is_some_and(|module| module.module_calls.contains_key(&want.call))
    }

    pub(super) fn knows_resource(&self, want: &AbsResource) -> bool {
        self.exps
            .read()
            .get_module_instance(&want.module)
            .is_some_and(|module| module.resources.contains_key(&want.resource))
    }

    pub(super) fn knows_resource_instance(&self, want: &AbsResourceInstance) -> bool {
        self.exps
            .read()
            .get_module_instance(&want.module)
            .and_then(|module| module.resources.get(&want.resource.resource))
            .is_some_and(|exp| exp.instance_keys().contains(&want.resource.key))
    }
}

impl ExpanderModule {
    fn find_module(&self, module: &ModuleInstance) -> &ExpanderModule {
        let mut current = self;
        for (i, step) in module.steps().iter().enumerate() {
            match current.child_instances.get(step) {
                Some(next) => current = next,
                None => panic!(
                    "no expansion has been registered for ancestor module {}",
                    module.prefix(i + 1)
                ),
            }
        }
        current
    }

    fn find_module_mut(&mut self, module: &ModuleInstance) -> &mut ExpanderModule {
        let mut current = self;
        for (i, step) in module.steps().iter().enumerate() {
            match current.child_instances.get_mut(step) {
                Some(next) => current = next,
                None => panic!(
                    "no expansion has been registered for ancestor module {}",
                    module.prefix(i + 1)
                ),
            }
        }
        current
    }

    fn get_module_instance(&self, want: &ModuleInstance) -> Option<&ExpanderModule> {
        let mut current = self;
        for step in want.steps() {
            current = current.child_instances.get(step)?;
        }
        Some(current)
    }

    /// Checks that the call named `name` has a registered expansion
    fn require_call(&self, name: &str, parent: &ModuleInstance) -> &Expansion {
        match self.module_calls.get(&ModuleCall::new(name)) {
            Some(exp) => exp,
            None => panic!(
                "no expansion has been registered for {}",
                parent.child(name, InstanceKey::NoKey)
            ),
        }
    }

    /// Child instances of the call named `name`
    fn call_instances<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = (&'a ModuleInstanceStep, &'a ExpanderModule)> + 'a {
        self.child_instances
            .iter()
            .filter(move |(step, _)| step.name == name)
    }

    fn module_instances(
        &self,
        module: &[String],
        parent: &ModuleInstance,
        skip_unknown: bool,
    ) -> Vec<ModuleInstance> {
        let call_name = &module[0];
        let exp = if skip_unknown {
            match self.module_calls.get(&ModuleCall::new(call_name.clone())) {
                Some(exp) => exp,
                None => {
                    tracing::debug!(%parent, call = %call_name, "skipping unregistered module call");
                    return vec![];
                }
            }
        } else {
            self.require_call(call_name, parent)
        };

        if module.len() > 1 {
            return self
                .call_instances(call_name)
                .flat_map(|(step, instance)| {
                    let instance_addr = parent.child(step.name.clone(), step.instance_key.clone());
                    instance.module_instances(&module[1..], &instance_addr, skip_unknown)
                })
                .collect();
        }

        exp.instance_keys()
            .into_iter()
            .map(|key| parent.child(call_name.clone(), key))
            .collect()
    }

    fn module_resource_instances(
        &self,
        module: &[String],
        resource: &Resource,
        parent: &ModuleInstance,
    ) -> Vec<AbsResourceInstance> {
        let Some(call_name) = module.first() else {
            return self.only_resource_instances(resource, parent);
        };
        self.require_call(call_name, parent);

        self.call_instances(call_name)
            .flat_map(|(step, instance)| {
                let instance_addr = parent.child(step.name.clone(), step.instance_key.clone());
                instance.module_resource_instances(&module[1..], resource, &instance_addr)
            })
            .collect()
    }

    fn resource_instances(
        &self,
        module: &[ModuleInstanceStep],
        resource: &Resource,
        parent: &ModuleInstance,
    ) -> Vec<AbsResourceInstance> {
        let Some(step) = module.first() else {
            return self.only_resource_instances(resource, parent);
        };
        self.require_call(&step.name, parent);

        match self.child_instances.get(step) {
            Some(instance) => instance.resource_instances(
                &module[1..],
                resource,
                &parent.child(step.name.clone(), step.instance_key.clone()),
            ),
            // the call exists but this instance of it does not
            None => {
                tracing::debug!(%parent, %step, "module instance is not declared");
                vec![]
            }
        }
    }

    fn only_resource_instances(
        &self,
        resource: &Resource,
        parent: &ModuleInstance,
    ) -> Vec<AbsResourceInstance> {
        let Some(exp) = self.resources.get(resource) else {
            panic!(
                "no expansion has been registered for {}",
                resource.absolute(parent.clone())
            );
        };
        exp.instance_keys()
            .into_iter()
            .map(|key| resource.instance(key).absolute(parent.clone()))
            .collect()
    }
}
