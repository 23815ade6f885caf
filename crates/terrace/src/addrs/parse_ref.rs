//! reference parsing
//!
//! Turns a static traversal from an expression (`aws_instance.web[0].id`, `var.region`, ...) into a
//! [Reference]: the [Referenceable] object it points at plus whatever steps are left over. Leftover
//! steps address something inside the object's value and are not interpreted here.
use super::{
    parse_function, parse_instance_key, Check, CountAttr, ForEachAttr, InputVariable,
    InstanceKey, LocalValue, ModuleCall, OutputValue, PathAttr, Referenceable, Resource,
    ResourceMode, TerraformAttr, TerraformIdent, FUNCTION_NAMESPACE_PROVIDER,
};
use crate::diagnostics::{Diagnostic, Diagnostics, SourceRange};
use crate::traversal::{parse_traversal_abs, Traversal, TraversalStep};

/// A parsed reference: its subject, where it was written, and the steps after the subject
#[derive(Debug, Clone, PartialEq, derive_new::new)]
pub struct Reference {
    pub subject: Referenceable,
    pub source_range: SourceRange,
    #[new(default)]
    pub remaining: Traversal,
}

impl Reference {
    fn with_remaining(mut self, remaining: &[TraversalStep]) -> Self {
        self.remaining = Traversal(remaining.to_vec());
        self
    }

    /// The subject followed by the remaining steps, e.g. `aws_instance.web[0].tags["Name"]`
    pub fn display_string(&self) -> String {
        format!("{}{}", self.subject, self.remaining)
    }
}

/// Function signature shared by the reference parsers
pub type RefParser = fn(&Traversal) -> Result<Reference, Diagnostics>;

fn invalid_reference(detail: impl Into<String>, subject: SourceRange) -> Diagnostics {
    Diagnostics::from(Diagnostic::error("Invalid reference", detail).with_subject(subject))
}

/// Parses a reference as it may appear in a module
///
/// # Panic
/// Panics if the traversal is relative.
pub fn parse_ref(traversal: &Traversal) -> Result<Reference, Diagnostics> {
    let steps = traversal.steps();
    let root = traversal.root_name();
    let root_range = steps[0].source_range().clone();

    match root {
        "count" => single_attr_ref(steps, |name| CountAttr::new(name).into()),
        "each" => single_attr_ref(steps, |name| ForEachAttr::new(name).into()),
        "local" => single_attr_ref(steps, |name| LocalValue::new(name).into()),
        "path" => single_attr_ref(steps, |name| PathAttr::new(name).into()),
        "var" => single_attr_ref(steps, |name| InputVariable::new(name).into()),
        "terraform" => single_attr_ref(steps, |name| {
            TerraformAttr::new(TerraformIdent::Terraform, name).into()
        }),
        "tofu" => single_attr_ref(steps, |name| {
            TerraformAttr::new(TerraformIdent::Tofu, name).into()
        }),
        "data" | "ephemeral" | "resource" => {
            if steps.len() < 3 {
                let detail = match root {
                    "data" => {
                        "The \"data\" object must be followed by two attribute names: the data \
                         source type and the resource name."
                    }
                    "ephemeral" => {
                        "The \"ephemeral\" object must be followed by two attribute names: the \
                         ephemeral resource type and its name."
                    }
                    _ => {
                        "The \"resource\" object must be followed by two attribute names: the \
                         resource type and the resource name."
                    }
                };
                return Err(invalid_reference(detail, traversal.source_range()));
            }
            let mode = match root {
                "data" => ResourceMode::Data,
                "ephemeral" => ResourceMode::Ephemeral,
                // escape hatch for resource types that collide with reserved words
                _ => ResourceMode::Managed,
            };
            resource_ref(mode, root, root_range, &steps[1..])
        }
        "module" => module_call_ref(steps),
        "self" => {
            Ok(Reference::new(Referenceable::SelfRef, root_range).with_remaining(&steps[1..]))
        }
        "template" | "lazy" | "arg" => Err(Diagnostics::from(
            Diagnostic::error(
                "Reserved symbol name",
                format!(
                    "The symbol name {root:?} is reserved for use in a future version. If \
                     you are using a provider that already uses this as a resource type name, \
                     add the prefix \"resource.\" to force interpretation as a resource type name."
                ),
            )
            .with_subject(root_range),
        )),
        _ => {
            let function = parse_function(root);
            if function.is_namespace(FUNCTION_NAMESPACE_PROVIDER) {
                let provider_function = function.as_provider_function().map_err(|err| {
                    Diagnostics::from(
                        Diagnostic::error("Unable to parse provider function", err.to_string())
                            .with_subject(root_range.clone()),
                    )
                })?;
                return Ok(Reference::new(provider_function.into(), root_range)
                    .with_remaining(&steps[1..]));
            }
            resource_ref(ResourceMode::Managed, root, root_range, steps)
        }
    }
}

/// Parses a reference as it may appear in a test file
///
/// Test files can additionally refer to `output.<name>` and `check.<name>`.
pub fn parse_ref_from_testing_scope(traversal: &Traversal) -> Result<Reference, Diagnostics> {
    match traversal.root_name() {
        "output" => single_attr_ref(traversal.steps(), |name| OutputValue::new(name).into()),
        "check" => single_attr_ref(traversal.steps(), |name| Check::new(name).into()),
        _ => parse_ref(traversal),
    }
}

/// [parse_ref] from source text
pub fn parse_ref_str(src: &str) -> Result<Reference, Diagnostics> {
    parse_ref(&parse_traversal_abs(src, "")?)
}

/// [parse_ref_from_testing_scope] from source text
pub fn parse_ref_str_from_testing_scope(src: &str) -> Result<Reference, Diagnostics> {
    parse_ref_from_testing_scope(&parse_traversal_abs(src, "")?)
}

/// `<root>.<name>` followed by anything
fn single_attr_ref(
    steps: &[TraversalStep],
    subject: impl FnOnce(String) -> Referenceable,
) -> Result<Reference, Diagnostics> {
    let (name, range, remain) = parse_single_attr(steps)?;
    Ok(Reference::new(subject(name), range).with_remaining(remain))
}

fn parse_single_attr(
    steps: &[TraversalStep],
) -> Result<(String, SourceRange, &[TraversalStep]), Diagnostics> {
    let root = steps[0].name().unwrap_or_default();
    let root_range = steps[0].source_range();

    match steps.get(1) {
        None => Err(invalid_reference(
            format!(
                "The {root:?} object cannot be accessed directly. Instead, access one of its \
                 attributes."
            ),
            root_range.clone(),
        )),
        Some(TraversalStep::Attr { name, range }) => {
            Ok((name.clone(), root_range.to(range), &steps[2..]))
        }
        Some(other) => Err(invalid_reference(
            format!("The {root:?} object does not support this operation."),
            other.source_range().clone(),
        )),
    }
}

/// `type.name[key]...`, where `steps` starts at the type name
fn resource_ref(
    mode: ResourceMode,
    root: &str,
    start_range: SourceRange,
    steps: &[TraversalStep],
) -> Result<Reference, Diagnostics> {
    if steps.len() < 2 {
        return Err(invalid_reference(
            "A reference to a resource type must be followed by at least one attribute access, \
             specifying the resource name.",
            Traversal(steps.to_vec()).source_range(),
        ));
    }

    let Some(type_name) = steps[0].name() else {
        return Err(invalid_reference(
            format!("The {root:?} object does not support this operation."),
            steps[0].source_range().clone(),
        ));
    };

    let TraversalStep::Attr {
        name,
        range: name_range,
    } = &steps[1]
    else {
        let what = match mode {
            ResourceMode::Data => "a data source",
            ResourceMode::Ephemeral => "an ephemeral resource",
            ResourceMode::Managed => "a resource type",
        };
        return Err(invalid_reference(
            format!(
                "A reference to {what} must be followed by at least one attribute access, \
                 specifying the resource name."
            ),
            steps[1].source_range().clone(),
        ));
    };

    let resource = Resource::new(mode, type_name, name.clone());
    let mut range = start_range.to(name_range);
    let mut remain = &steps[2..];

    if remain.is_empty() {
        // could also mean every instance of the resource, callers decide
        return Ok(Reference::new(resource.into(), range));
    }

    let mut key = InstanceKey::NoKey;
    if let TraversalStep::Index {
        key: index,
        range: index_range,
    } = &remain[0]
    {
        key = parse_instance_key(index).map_err(|err| {
            Diagnostics::from(
                Diagnostic::error(
                    "Invalid index key",
                    format!("Invalid index for resource instance: {err}."),
                )
                .with_subject(index_range.clone()),
            )
        })?;
        range = range.to(index_range);
        remain = &remain[1..];
    }

    Ok(Reference::new(resource.instance(key).into(), range).with_remaining(remain))
}

fn module_call_ref(steps: &[TraversalStep]) -> Result<Reference, Diagnostics> {
    let (call_name, call_range, remain) = parse_single_attr(steps)?;
    let call = ModuleCall::new(call_name);

    let unsupported = |step: &TraversalStep| {
        invalid_reference(
            "Module instance objects do not support this operation.",
            step.source_range().clone(),
        )
    };

    match remain {
        // the whole call, or maybe its single instance; callers decide
        [] => Ok(Reference::new(call.into(), call_range)),
        [TraversalStep::Index { key, range }, rest @ ..] => {
            let key = parse_instance_key(key).map_err(|err| {
                Diagnostics::from(
                    Diagnostic::error(
                        "Invalid index key",
                        format!("Invalid index for module instance: {err}."),
                    )
                    .with_subject(range.clone()),
                )
            })?;
            let call_instance = call.instance(key);
            match rest {
                [] => Ok(Reference::new(call_instance.into(), call_range.to(range))),
                [TraversalStep::Attr {
                    name,
                    range: output_range,
                }, rest @ ..] => Ok(Reference::new(
                    call_instance.output(name.clone()).into(),
                    call_range.to(output_range),
                )
                .with_remaining(rest)),
                [other, ..] => Err(unsupported(other)),
            }
        }
        [TraversalStep::Attr {
            name,
            range: output_range,
        }, rest @ ..] => Ok(Reference::new(
            call.instance(InstanceKey::NoKey).output(name.clone()).into(),
            call_range.to(output_range),
        )
        .with_remaining(rest)),
        [other, ..] => Err(unsupported(other)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::addrs::{
        ModuleCallInstance, ModuleCallInstanceOutput, ProviderFunction, ResourceInstance,
    };
    use pretty_assertions::assert_eq;

    fn subject(src: &str) -> Referenceable {
        parse_ref_str(src).unwrap().subject
    }

    fn error(src: &str) -> String {
        parse_ref_str(src).unwrap_err().err().unwrap().to_string()
    }

    #[test]
    fn single_attribute_objects() {
        assert_eq!(subject("var.region"), InputVariable::new("region").into());
        assert_eq!(subject("local.x"), LocalValue::new("x").into());
        assert_eq!(subject("path.module"), PathAttr::new("module").into());
        assert_eq!(subject("count.index"), CountAttr::new("index").into());
        assert_eq!(subject("each.value"), ForEachAttr::new("value").into());
        assert_eq!(
            subject("tofu.workspace"),
            TerraformAttr::new(TerraformIdent::Tofu, "workspace").into()
        );

        let reference = parse_ref_str("var.list[0].name").unwrap();
        assert_eq!(reference.remaining.to_string(), "[0].name");
        assert_eq!(reference.display_string(), "var.list[0].name");
    }

    #[test]
    fn resources() {
        let web = Resource::new(ResourceMode::Managed, "aws_instance", "web");
        assert_eq!(subject("aws_instance.web"), web.clone().into());
        assert_eq!(
            subject("aws_instance.web[0]"),
            web.instance(InstanceKey::Int(0)).into()
        );

        let reference = parse_ref_str("aws_instance.web.id").unwrap();
        assert_eq!(reference.subject, web.instance(InstanceKey::NoKey).into());
        assert_eq!(reference.remaining.to_string(), ".id");

        assert_eq!(
            subject("resource.template.foo"),
            Resource::new(ResourceMode::Managed, "template", "foo").into()
        );
        assert_eq!(
            subject(r#"data.aws_ami.ubuntu["x"]"#),
            Referenceable::ResourceInstance(ResourceInstance {
                resource: Resource::new(ResourceMode::Data, "aws_ami", "ubuntu"),
                key: InstanceKey::from("x"),
            })
        );
        assert_eq!(
            subject("ephemeral.random_password.db"),
            Resource::new(ResourceMode::Ephemeral, "random_password", "db").into()
        );
    }

    #[test]
    fn modules() {
        let call = ModuleCall::new("foo");
        assert_eq!(subject("module.foo"), call.clone().into());
        assert_eq!(
            subject("module.foo[1]"),
            Referenceable::ModuleCallInstance(ModuleCallInstance {
                call: call.clone(),
                key: InstanceKey::Int(1),
            })
        );
        assert_eq!(
            subject("module.foo.out"),
            Referenceable::ModuleCallInstanceOutput(ModuleCallInstanceOutput {
                call: call.instance(InstanceKey::NoKey),
                name: "out".to_string(),
            })
        );

        let reference = parse_ref_str(r#"module.foo["a"].out.attr"#).unwrap();
        assert_eq!(
            reference.subject,
            call.instance(InstanceKey::from("a")).output("out").into()
        );
        assert_eq!(reference.remaining.to_string(), ".attr");
    }

    #[test]
    fn self_and_provider_functions() {
        let reference = parse_ref_str("self.id").unwrap();
        assert_eq!(reference.subject, Referenceable::SelfRef);
        assert_eq!(reference.remaining.to_string(), ".id");

        assert_eq!(
            subject("provider::aws::arn_parse"),
            Referenceable::ProviderFunction(ProviderFunction {
                provider_name: "aws".to_string(),
                provider_alias: String::new(),
                function: "arn_parse".to_string(),
            })
        );
    }

    #[test]
    fn errors() {
        assert_eq!(
            error("data.foo"),
            "Invalid reference: The \"data\" object must be followed by two attribute names: the \
             data source type and the resource name."
        );
        assert_eq!(
            error("ephemeral.foo"),
            "Invalid reference: The \"ephemeral\" object must be followed by two attribute \
             names: the ephemeral resource type and its name."
        );
        assert_eq!(
            error("resource.foo"),
            "Invalid reference: The \"resource\" object must be followed by two attribute names: \
             the resource type and the resource name."
        );
        assert_eq!(
            error("var"),
            "Invalid reference: The \"var\" object cannot be accessed directly. Instead, access \
             one of its attributes."
        );
        assert_eq!(
            error("var[0]"),
            "Invalid reference: The \"var\" object does not support this operation."
        );
        assert_eq!(
            error("aws_instance"),
            "Invalid reference: A reference to a resource type must be followed by at least one \
             attribute access, specifying the resource name."
        );
        assert_eq!(
            error("data.aws_ami[0]"),
            "Invalid reference: A reference to a data source must be followed by at least one \
             attribute access, specifying the resource name."
        );
        assert_eq!(
            error("aws_instance.web[1.5]"),
            "Invalid index key: Invalid index for resource instance: value must be a whole \
             number, between -9223372036854775808 and 9223372036854775807."
        );
        assert_eq!(
            error("module.foo[0][1]"),
            "Invalid reference: Module instance objects do not support this operation."
        );
        assert_eq!(
            error("lazy.foo"),
            "Reserved symbol name: The symbol name \"lazy\" is reserved for use in a future \
             version. If you are using a provider that already uses this as a resource \
             type name, add the prefix \"resource.\" to force interpretation as a resource type \
             name."
        );
    }

    #[test]
    #[should_panic(expected = "root_name called on a relative traversal")]
    fn relative_traversal() {
        let _ = parse_ref(&Traversal(vec![TraversalStep::Attr {
            name: "id".into(),
            range: SourceRange::default(),
        }]));
    }

    #[test]
    fn testing_scope() {
        assert_eq!(
            parse_ref_str_from_testing_scope("output.id").unwrap().subject,
            OutputValue::new("id").into()
        );
        assert_eq!(
            parse_ref_str_from_testing_scope("check.health").unwrap().subject,
            Check::new("health").into()
        );
        assert_eq!(
            parse_ref_str_from_testing_scope("var.x").unwrap().subject,
            InputVariable::new("x").into()
        );

        // outside of tests these are plain resource types
        assert_eq!(
            subject("output.id"),
            Resource::new(ResourceMode::Managed, "output", "id").into()
        );
    }

    #[test]
    fn source_ranges() {
        let traversal = parse_traversal_abs("aws_instance.web[0].id", "main.tf").unwrap();
        let reference = parse_ref(&traversal).unwrap();
        assert_eq!(reference.source_range.filename, "main.tf");
        assert_eq!(reference.source_range.start, 0);
        assert!(reference.source_range.end < traversal.source_range().end);
    }
}
