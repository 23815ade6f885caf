use super::{Data, ProviderFunctions};
use crate::addrs::{
    Check, CountAttr, ForEachAttr, InputVariable, LocalValue, ModuleCall, OutputValue, PathAttr,
    ProviderFunction, Reference, Referenceable, Resource, TerraformAttr,
};
use crate::diagnostics::{Diagnostic, Diagnostics, SourceRange};
use crate::value::Value;
use indexmap::IndexMap;

/// [Data] backed by maps keyed by address strings
///
/// Input variables that are not in the map fail static validation.
#[derive(Debug, Default)]
pub(crate) struct DataForTests {
    pub count_attrs: IndexMap<String, Value>,
    pub for_each_attrs: IndexMap<String, Value>,
    pub resources: IndexMap<String, Value>,
    pub local_values: IndexMap<String, Value>,
    pub modules: IndexMap<String, Value>,
    pub path_attrs: IndexMap<String, Value>,
    pub terraform_attrs: IndexMap<String, Value>,
    pub input_variables: IndexMap<String, Value>,
    pub outputs: IndexMap<String, Value>,
    pub checks: IndexMap<String, Value>,
}

fn lookup(map: &IndexMap<String, Value>, key: &str, range: &SourceRange) -> (Value, Diagnostics) {
    match map.get(key) {
        Some(value) => (value.clone(), Diagnostics::new()),
        None => (
            Value::dynamic(),
            Diagnostics::from(
                Diagnostic::error(
                    "Reference to undeclared object",
                    format!("{key} is not declared"),
                )
                .with_subject(range.clone()),
            ),
        ),
    }
}

impl Data for DataForTests {
    fn static_validate_references(
        &self,
        refs: &[Reference],
        _: Option<&Referenceable>,
        _: Option<&Referenceable>,
    ) -> Diagnostics {
        refs.iter()
            .filter_map(|reference| match &reference.subject {
                Referenceable::InputVariable(addr)
                    if !self.input_variables.contains_key(&addr.name) =>
                {
                    Some(
                        Diagnostic::error(
                            "Reference to undeclared input variable",
                            format!(
                                "An input variable with the name {:?} has not been declared.",
                                addr.name
                            ),
                        )
                        .with_subject(reference.source_range.clone()),
                    )
                }
                _ => None,
            })
            .collect()
    }

    fn get_count_attr(&self, addr: &CountAttr, range: &SourceRange) -> (Value, Diagnostics) {
        lookup(&self.count_attrs, &addr.name, range)
    }

    fn get_for_each_attr(&self, addr: &ForEachAttr, range: &SourceRange) -> (Value, Diagnostics) {
        lookup(&self.for_each_attrs, &addr.name, range)
    }

    fn get_resource(&self, addr: &Resource, range: &SourceRange) -> (Value, Diagnostics) {
        lookup(&self.resources, &addr.to_string(), range)
    }

    fn get_local_value(&self, addr: &LocalValue, range: &SourceRange) -> (Value, Diagnostics) {
        lookup(&self.local_values, &addr.name, range)
    }

    fn get_module(&self, addr: &ModuleCall, range: &SourceRange) -> (Value, Diagnostics) {
        lookup(&self.modules, &addr.to_string(), range)
    }

    fn get_path_attr(&self, addr: &PathAttr, range: &SourceRange) -> (Value, Diagnostics) {
        lookup(&self.path_attrs, &addr.name, range)
    }

    fn get_terraform_attr(
        &self,
        addr: &TerraformAttr,
        range: &SourceRange,
    ) -> (Value, Diagnostics) {
        lookup(&self.terraform_attrs, &addr.name, range)
    }

    fn get_input_variable(
        &self,
        addr: &InputVariable,
        range: &SourceRange,
    ) -> (Value, Diagnostics) {
        lookup(&self.input_variables, &addr.name, range)
    }

    fn get_output(&self, addr: &OutputValue, range: &SourceRange) -> (Value, Diagnostics) {
        lookup(&self.outputs, &addr.name, range)
    }

    fn get_check_block(&self, addr: &Check, range: &SourceRange) -> (Value, Diagnostics) {
        lookup(&self.checks, &addr.name, range)
    }
}

/// The data used by most scope tests
pub(crate) fn sample_data() -> DataForTests {
    fn object(items: &[(&str, Value)]) -> Value {
        Value::object(items.iter().cloned())
    }
    fn map(items: &[(&str, Value)]) -> IndexMap<String, Value> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    DataForTests {
        count_attrs: map(&[("index", Value::from(0))]),
        for_each_attrs: map(&[("key", Value::from("a")), ("value", Value::from(1))]),
        resources: map(&[
            ("null_resource.foo", object(&[("attr", Value::from("bar"))])),
            ("data.null_data_source.foo", object(&[("attr", Value::from("bar"))])),
            (
                "null_resource.multi",
                Value::Tuple(vec![
                    object(&[("attr", Value::from("multi0"))]),
                    object(&[("attr", Value::from("multi1"))]),
                ]),
            ),
            (
                "null_resource.each",
                object(&[
                    ("each0", object(&[("attr", Value::from("each0"))])),
                    ("each1", object(&[("attr", Value::from("each1"))])),
                ]),
            ),
            ("ephemeral.foo_ephemeral.bar", object(&[("attr", Value::from("baz"))])),
        ]),
        local_values: map(&[
            ("foo", Value::from("bar")),
            ("list", Value::from(vec!["a", "b"])),
            ("pending", Value::Unknown(crate::value::Type::String)),
        ]),
        modules: map(&[(
            "module.foo",
            object(&[("output0", Value::from("bar0")), ("output1", Value::from("bar1"))]),
        )]),
        path_attrs: map(&[
            ("module", Value::from("foo/bar")),
            ("cwd", Value::from("/home/foo/bar")),
            ("root", Value::from("/home/foo")),
        ]),
        terraform_attrs: map(&[("workspace", Value::from("default"))]),
        input_variables: map(&[("baz", Value::from("boop"))]),
        outputs: map(&[("rootoutput0", Value::from("rootbar0"))]),
        checks: map(&[("check0", object(&[("status", Value::from("pass"))]))]),
    }
}

/// Provider functions where only `echo` exists, returning its argument
pub(crate) struct EchoProvider;

impl ProviderFunctions for EchoProvider {
    fn provider_function(
        &self,
        addr: &ProviderFunction,
        range: &SourceRange,
    ) -> Result<hcl::eval::FuncDef, Diagnostics> {
        if addr.function == "echo" {
            return Ok(hcl::eval::FuncDef::builder()
                .param(hcl::eval::ParamType::Any)
                .build(|args| Ok(args[0].clone())));
        }
        Err(Diagnostics::from(
            Diagnostic::error("Unknown provider function", addr.to_string())
                .with_subject(range.clone()),
        ))
    }
}
