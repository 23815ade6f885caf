use crate::addrs::{
    Check, CountAttr, ForEachAttr, InputVariable, InstanceKey, LocalValue, ModuleCall,
    ModuleCallInstanceOutput, OutputValue, PathAttr, Reference, Referenceable, Resource,
    TerraformAttr,
};
use crate::diagnostics::{Diagnostic, Diagnostics, SourceRange};
use crate::value::Value;

/// Source of the values that references resolve to
///
/// A [super::Scope] asks its `Data` for every object an expression refers to. How the values
/// are obtained (state, plan, configuration) is up to the implementation. Each getter returns
/// the best value it has together with any problems; when the diagnostics contain errors the
/// value is replaced by an unknown of the same type before it is bound.
pub trait Data {
    /// Checks references before any value is looked up.
    ///
    /// `self_addr` is the object `self` refers to and `source` the object the expression
    /// belongs to, when known.
    fn static_validate_references(
        &self,
        refs: &[Reference],
        self_addr: Option<&Referenceable>,
        source: Option<&Referenceable>,
    ) -> Diagnostics;

    fn get_count_attr(&self, addr: &CountAttr, range: &SourceRange) -> (Value, Diagnostics);
    fn get_for_each_attr(&self, addr: &ForEachAttr, range: &SourceRange) -> (Value, Diagnostics);

    /// Value of a whole resource: an object for a single instance, a tuple for `count` and
    /// an object keyed by instance key for `for_each`.
    fn get_resource(&self, addr: &Resource, range: &SourceRange) -> (Value, Diagnostics);
    fn get_local_value(&self, addr: &LocalValue, range: &SourceRange) -> (Value, Diagnostics);

    /// Outputs of every instance of a module call, shaped like [Data::get_resource]
    fn get_module(&self, addr: &ModuleCall, range: &SourceRange) -> (Value, Diagnostics);

    /// One output of one module instance
    ///
    /// Defaults to looking the output up in [Data::get_module].
    fn get_module_instance_output(
        &self,
        addr: &ModuleCallInstanceOutput,
        range: &SourceRange,
    ) -> (Value, Diagnostics) {
        let (module, mut diags) = self.get_module(&addr.call.call, range);
        let instance = match &addr.call.key {
            InstanceKey::NoKey => Ok(module),
            key => module.index(&key.value()),
        };
        match instance.and_then(|instance| instance.get_attr(&addr.name)) {
            Ok(value) => (value, diags),
            Err(detail) => {
                diags.push(
                    Diagnostic::error("Unsupported attribute", detail).with_subject(range.clone()),
                );
                (Value::dynamic(), diags)
            }
        }
    }

    fn get_path_attr(&self, addr: &PathAttr, range: &SourceRange) -> (Value, Diagnostics);
    fn get_terraform_attr(&self, addr: &TerraformAttr, range: &SourceRange)
        -> (Value, Diagnostics);
    fn get_input_variable(&self, addr: &InputVariable, range: &SourceRange)
        -> (Value, Diagnostics);

    /// Only called for scopes that parse references like test files do
    fn get_output(&self, addr: &OutputValue, range: &SourceRange) -> (Value, Diagnostics);
    /// Only called for scopes that parse references like test files do
    fn get_check_block(&self, addr: &Check, range: &SourceRange) -> (Value, Diagnostics);
}
