use super::functions::{make_base_function_table, Function, Functions};
use super::Data;
use crate::addrs::{
    parse_ref, parse_ref_from_testing_scope, InstanceKey, ProviderFunction, RefParser, Reference,
    Referenceable, Resource, ResourceMode,
};
use crate::diagnostics::{Diagnostic, Diagnostics, SourceRange};
use crate::value::Value;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Settings that change which functions a [Scope] offers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScopeOptions {
    /// Impure functions evaluate to unknown values
    pub pure_only: bool,
    /// Adds the `type` function
    pub console_mode: bool,
}

/// Resolves `provider::<name>[::<alias>]::<function>` calls
pub trait ProviderFunctions {
    fn provider_function(
        &self,
        addr: &ProviderFunction,
        range: &SourceRange,
    ) -> Result<hcl::eval::FuncDef, Diagnostics>;
}

/// Variables and functions available to an expression
///
/// Lookups fall back to the parent context.
#[derive(Debug, Default)]
pub struct EvalContext<'p> {
    parent: Option<&'p EvalContext<'p>>,
    variables: IndexMap<String, Value>,
    functions: Functions,
}

impl EvalContext<'static> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<'p> EvalContext<'p> {
    pub fn child(&self) -> EvalContext<'_> {
        EvalContext {
            parent: Some(self),
            variables: IndexMap::new(),
            functions: IndexMap::new(),
        }
    }

    pub fn declare_var(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn declare_func(&mut self, name: impl Into<String>, function: Function) {
        self.functions.insert(name.into(), function);
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables
            .get(name)
            .or_else(|| self.parent.and_then(|parent| parent.variable(name)))
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions
            .get(name)
            .or_else(|| self.parent.and_then(|parent| parent.function(name)))
    }

    /// Variables declared in this context, without those of its parents
    pub fn variables(&self) -> &IndexMap<String, Value> {
        &self.variables
    }

    pub(super) fn own_functions(&self) -> &Functions {
        &self.functions
    }

    /// This context and its ancestors, outermost first
    pub(super) fn layers(&self) -> Vec<&EvalContext<'_>> {
        let mut layers = vec![self];
        let mut current = self.parent;
        while let Some(parent) = current {
            layers.push(parent);
            current = parent.parent;
        }
        layers.reverse();
        layers
    }
}

/// Everything needed to evaluate expressions of one module instance
///
/// References are parsed with [Scope::parse_ref] and resolved through [Data]. `self_addr` is the
/// resource instance `self` stands for, if `self` is allowed at all.
pub struct Scope<'a> {
    pub data: &'a dyn Data,
    pub parse_ref: RefParser,
    pub self_addr: Option<Referenceable>,
    pub source_addr: Option<Referenceable>,
    pub provider_functions: Option<&'a dyn ProviderFunctions>,
    options: ScopeOptions,
    functions: OnceLock<Functions>,
}

impl<'a> Scope<'a> {
    pub fn new(data: &'a dyn Data) -> Self {
        Self {
            data,
            parse_ref,
            self_addr: None,
            source_addr: None,
            provider_functions: None,
            options: ScopeOptions::default(),
            functions: OnceLock::new(),
        }
    }

    /// A scope for test files, where `output.<name>` and `check.<name>` can be referenced
    pub fn for_testing(data: &'a dyn Data) -> Self {
        Self {
            parse_ref: parse_ref_from_testing_scope,
            ..Self::new(data)
        }
    }

    pub fn with_self(mut self, addr: impl Into<Referenceable>) -> Self {
        self.self_addr = Some(addr.into());
        self
    }

    pub fn with_source(mut self, addr: impl Into<Referenceable>) -> Self {
        self.source_addr = Some(addr.into());
        self
    }

    pub fn with_provider_functions(mut self, functions: &'a dyn ProviderFunctions) -> Self {
        self.provider_functions = Some(functions);
        self
    }

    pub fn with_options(mut self, options: ScopeOptions) -> Self {
        self.options = options;
        self.functions = OnceLock::new();
        self
    }

    pub fn options(&self) -> ScopeOptions {
        self.options
    }

    /// Base functions, built on first use
    pub fn functions(&self) -> &Functions {
        self.functions.get_or_init(|| {
            make_base_function_table(self.options.pure_only, self.options.console_mode)
        })
    }

    /// Context with bindings for every object `refs` point to
    pub fn eval_context(&self, refs: &[Reference]) -> (EvalContext<'static>, Diagnostics) {
        self.build_eval_context(EvalContext::new(), refs)
    }

    /// Like [Scope::eval_context], but names not bound here are looked up in `parent`
    pub fn eval_context_with_parent<'p>(
        &self,
        parent: &'p EvalContext<'p>,
        refs: &[Reference],
    ) -> (EvalContext<'p>, Diagnostics) {
        self.build_eval_context(parent.child(), refs)
    }

    #[tracing::instrument(level = "trace", skip_all, fields(refs = refs.len()))]
    fn build_eval_context<'p>(
        &self,
        mut ctx: EvalContext<'p>,
        refs: &[Reference],
    ) -> (EvalContext<'p>, Diagnostics) {
        let mut diags = Diagnostics::new();

        for (name, function) in self.functions() {
            ctx.declare_func(name.clone(), function.clone());
        }

        if refs.is_empty() {
            return (ctx, diags);
        }

        let static_diags = self.data.static_validate_references(
            refs,
            self.self_addr.as_ref(),
            self.source_addr.as_ref(),
        );
        let invalid = static_diags.has_errors();
        diags.extend(static_diags);
        if invalid {
            tracing::debug!("references failed static validation, not looking up values");
            return (ctx, diags);
        }

        // The same object can be referenced many times, and both an instance and its whole
        // collection can be referenced. Every reference is still looked up so that all problems
        // are reported.
        let mut vars = VarBuilder::default();
        for reference in refs {
            let range = &reference.source_range;
            tracing::trace!(subject = %reference.subject, "routing reference");

            let subject = match &reference.subject {
                Referenceable::SelfRef => {
                    diags.extend(vars.put_self_value(self.data, self.self_addr.as_ref(), range));
                    continue;
                }
                Referenceable::ProviderFunction(function) => {
                    diags.extend(self.put_provider_function(&mut ctx, function, range));
                    continue;
                }
                // a bare reference exposes the whole collection, never one instance
                Referenceable::ResourceInstance(instance) => {
                    Referenceable::Resource(instance.resource.clone())
                }
                Referenceable::ModuleCallInstance(instance) => {
                    Referenceable::ModuleCall(instance.call.clone())
                }
                Referenceable::ModuleCallInstanceOutput(output) => {
                    Referenceable::ModuleCall(output.call.call.clone())
                }
                other => other.clone(),
            };
            diags.extend(vars.put_value_by_subject(self.data, &subject, range));
        }

        vars.build_into(&mut ctx);
        (ctx, diags)
    }

    fn put_provider_function(
        &self,
        ctx: &mut EvalContext<'_>,
        function: &ProviderFunction,
        range: &SourceRange,
    ) -> Diagnostics {
        let name = function.to_string();
        if ctx.function(&name).is_some() {
            return Diagnostics::new();
        }

        let Some(resolver) = self.provider_functions else {
            return Diagnostics::from(
                Diagnostic::error(
                    "Call to unknown function",
                    format!("Provider functions are not available here, so {name:?} cannot be called."),
                )
                .with_subject(range.clone()),
            );
        };

        match resolver.provider_function(function, range) {
            Ok(def) => {
                tracing::trace!(function = %name, "resolved provider function");
                ctx.declare_func(name, Function::Def(def));
                Diagnostics::new()
            }
            Err(diags) => diags,
        }
    }
}

/// Errors turn the value into an unknown of the same type so evaluation can go on without
/// repeating them.
pub(super) fn normalize_ref_value((value, diags): (Value, Diagnostics)) -> (Value, Diagnostics) {
    if diags.has_errors() {
        return (Value::Unknown(value.ty()), diags);
    }
    (value, diags)
}

type NamedValues = BTreeMap<String, Value>;

/// Accumulates looked up values until they are bound as nested objects
#[derive(Default)]
struct VarBuilder {
    managed_resources: BTreeMap<String, NamedValues>,
    data_resources: BTreeMap<String, NamedValues>,
    ephemeral_resources: BTreeMap<String, NamedValues>,
    whole_modules: NamedValues,
    input_variables: NamedValues,
    local_values: NamedValues,
    output_values: NamedValues,
    path_attrs: NamedValues,
    terraform_attrs: NamedValues,
    count_attrs: NamedValues,
    for_each_attrs: NamedValues,
    check_blocks: NamedValues,
    self_value: Option<Value>,
}

impl VarBuilder {
    fn put_self_value(
        &mut self,
        data: &dyn Data,
        self_addr: Option<&Referenceable>,
        range: &SourceRange,
    ) -> Diagnostics {
        let instance = match self_addr {
            None => {
                return Diagnostics::from(
                    Diagnostic::error(
                        "Invalid \"self\" reference",
                        "The \"self\" object is not available in this context. This object can \
                         be used only in resource provisioner, connection, and postcondition \
                         blocks.",
                    )
                    .with_subject(range.clone()),
                )
            }
            Some(Referenceable::SelfRef) => panic!("scope self address attempting to alias itself"),
            Some(Referenceable::ResourceInstance(instance)) => instance,
            Some(other) => panic!("self address must be a resource instance, got {}", other.kind()),
        };

        let (value, mut diags) = normalize_ref_value(data.get_resource(&instance.resource, range));

        // `self` is always one instance, even though the resource value holds all of them
        let indexed = match &instance.key {
            InstanceKey::Int(_) | InstanceKey::String(_) => value.index(&instance.key.value()),
            InstanceKey::NoKey | InstanceKey::Wildcard(_) => Ok(value),
        };
        self.self_value = Some(match indexed {
            Ok(value) => value,
            Err(detail) => {
                diags.push(Diagnostic::error("Invalid index", detail).with_subject(range.clone()));
                Value::dynamic()
            }
        });
        diags
    }

    fn put_value_by_subject(
        &mut self,
        data: &dyn Data,
        subject: &Referenceable,
        range: &SourceRange,
    ) -> Diagnostics {
        let (into, name, looked_up) = match subject {
            Referenceable::Resource(resource) => return self.put_resource_value(data, resource, range),
            Referenceable::ModuleCall(call) => (
                &mut self.whole_modules,
                &call.name,
                data.get_module(call, range),
            ),
            Referenceable::InputVariable(addr) => (
                &mut self.input_variables,
                &addr.name,
                data.get_input_variable(addr, range),
            ),
            Referenceable::LocalValue(addr) => (
                &mut self.local_values,
                &addr.name,
                data.get_local_value(addr, range),
            ),
            Referenceable::PathAttr(addr) => {
                (&mut self.path_attrs, &addr.name, data.get_path_attr(addr, range))
            }
            Referenceable::TerraformAttr(addr) => (
                &mut self.terraform_attrs,
                &addr.name,
                data.get_terraform_attr(addr, range),
            ),
            Referenceable::CountAttr(addr) => {
                (&mut self.count_attrs, &addr.name, data.get_count_attr(addr, range))
            }
            Referenceable::ForEachAttr(addr) => (
                &mut self.for_each_attrs,
                &addr.name,
                data.get_for_each_attr(addr, range),
            ),
            Referenceable::OutputValue(addr) => {
                (&mut self.output_values, &addr.name, data.get_output(addr, range))
            }
            Referenceable::Check(addr) => {
                (&mut self.check_blocks, &addr.name, data.get_check_block(addr, range))
            }
            Referenceable::ResourceInstance(_)
            | Referenceable::ModuleCallInstance(_)
            | Referenceable::ModuleCallInstanceOutput(_)
            | Referenceable::SelfRef
            | Referenceable::ProviderFunction(_) => {
                unreachable!("{} references are resolved before routing", subject.kind())
            }
        };

        let (value, diags) = normalize_ref_value(looked_up);
        into.insert(name.clone(), value);
        diags
    }

    fn put_resource_value(
        &mut self,
        data: &dyn Data,
        resource: &Resource,
        range: &SourceRange,
    ) -> Diagnostics {
        let into = match resource.mode {
            ResourceMode::Managed => &mut self.managed_resources,
            ResourceMode::Data => &mut self.data_resources,
            ResourceMode::Ephemeral => &mut self.ephemeral_resources,
        };
        let (value, diags) = normalize_ref_value(data.get_resource(resource, range));
        into.entry(resource.type_name.clone())
            .or_default()
            .insert(resource.name.clone(), value);
        diags
    }

    fn build_into(self, ctx: &mut EvalContext<'_>) {
        // Managed resources are bound under their type name and again under `resource`, the
        // escape for type names that collide with reserved words.
        let managed = resource_objects(self.managed_resources);
        for (type_name, value) in &managed {
            ctx.declare_var(type_name.clone(), value.clone());
        }
        ctx.declare_var("resource", Value::object(managed));

        ctx.declare_var("data", Value::object(resource_objects(self.data_resources)));
        ctx.declare_var(
            "ephemeral",
            Value::object(resource_objects(self.ephemeral_resources)),
        );
        ctx.declare_var("module", Value::object(self.whole_modules));
        ctx.declare_var("var", Value::object(self.input_variables));
        ctx.declare_var("local", Value::object(self.local_values));
        ctx.declare_var("path", Value::object(self.path_attrs));
        ctx.declare_var("terraform", Value::object(self.terraform_attrs.clone()));
        ctx.declare_var("tofu", Value::object(self.terraform_attrs));
        ctx.declare_var("count", Value::object(self.count_attrs));
        ctx.declare_var("each", Value::object(self.for_each_attrs));

        // only available to test files
        if !self.check_blocks.is_empty() {
            ctx.declare_var("check", Value::object(self.check_blocks));
        }
        if !self.output_values.is_empty() {
            ctx.declare_var("output", Value::object(self.output_values));
        }

        if let Some(value) = self.self_value {
            ctx.declare_var("self", value);
        }
    }
}

fn resource_objects(resources: BTreeMap<String, NamedValues>) -> BTreeMap<String, Value> {
    resources
        .into_iter()
        .map(|(type_name, by_name)| (type_name, Value::object(by_name)))
        .collect()
}
