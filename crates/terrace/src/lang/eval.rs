use super::functions::func_name;
use super::references::{called_functions, references_in_body, references_in_expr, static_traversals};
use super::scope::{normalize_ref_value, EvalContext};
use super::Scope;
use crate::addrs::{
    parse_function, Reference, Referenceable, FUNCTION_NAMESPACES, FUNCTION_NAMESPACE_CORE,
    FUNCTION_NAMESPACE_PROVIDER,
};
use crate::diagnostics::{Diagnostic, DiagnosticExtra, Diagnostics, SourceRange};
use crate::instances::RepetitionData;
use crate::traversal::parse_traversal_abs;
use crate::value::{Type, Value};
use hcl::eval::Evaluate;
use indexmap::IndexMap;

impl Scope<'_> {
    /// Evaluates an expression and converts the result to `want`
    ///
    /// The result always has the wanted type. It is unknown when there were errors, when
    /// anything the expression depends on is unknown, or when it calls an unpredictable function.
    pub fn eval_expr(&self, expr: &hcl::Expression, want: &Type) -> (Value, Diagnostics) {
        let (refs, mut diags) = references_in_expr(self.parse_ref, expr);
        let (ctx, ctx_diags) = self.eval_context(&refs);
        diags.extend(ctx_diags);
        if diags.has_errors() {
            tracing::debug!("reference errors, skipping evaluation");
            return (Value::Unknown(want.clone()), diags);
        }

        let (value, eval_diags) = evaluate(&ctx, expr);
        diags.extend(eval_diags);
        let value = convert_result(value, want, None, &mut diags);
        (value, diags)
    }

    /// Evaluates every attribute of a body into an object
    ///
    /// Nested blocks become tuples of objects under the block type name.
    pub fn eval_block(&self, body: &hcl::Body) -> (Value, Diagnostics) {
        let (refs, mut diags) = references_in_body(self.parse_ref, body);
        let (ctx, ctx_diags) = self.eval_context(&refs);
        diags.extend(ctx_diags);
        if diags.has_errors() {
            tracing::debug!("reference errors, skipping evaluation");
            return (Value::dynamic(), diags);
        }

        let value = evaluate_body(&ctx, body, &mut diags);
        (value, diags)
    }

    /// Evaluates a body that may only refer to `self`, `count`, `each`, `path` and
    /// `terraform`/`tofu`
    ///
    /// `self` is bound to `self_value` and the repetition attributes come from `repetition`,
    /// [Data] is only asked for `path` and `terraform` attributes.
    ///
    /// [Data]: super::Data
    pub fn eval_self_block(
        &self,
        body: &hcl::Body,
        self_value: Value,
        repetition: &RepetitionData,
    ) -> (Value, Diagnostics) {
        let mut ctx = EvalContext::new();
        for (name, function) in self.functions() {
            ctx.declare_func(name.clone(), function.clone());
        }

        ctx.declare_var("self", self_value);
        if let Some(index) = &repetition.count_index {
            ctx.declare_var("count", Value::object([("index", index.clone())]));
        }
        if let Some(key) = &repetition.each_key {
            ctx.declare_var("each", Value::object([("key", key.clone())]));
        }

        let (refs, mut diags) = references_in_body(self.parse_ref, body);
        let mut path_attrs = IndexMap::new();
        let mut terraform_attrs = IndexMap::new();
        for reference in &refs {
            let range = &reference.source_range;
            match &reference.subject {
                Referenceable::SelfRef
                | Referenceable::CountAttr(_)
                | Referenceable::ForEachAttr(_) => {}
                Referenceable::PathAttr(addr) => {
                    let (value, value_diags) =
                        normalize_ref_value(self.data.get_path_attr(addr, range));
                    diags.extend(value_diags);
                    path_attrs.insert(addr.name.clone(), value);
                }
                Referenceable::TerraformAttr(addr) => {
                    let (value, value_diags) =
                        normalize_ref_value(self.data.get_terraform_attr(addr, range));
                    diags.extend(value_diags);
                    terraform_attrs.insert(addr.name.clone(), value);
                }
                other => diags.push(
                    Diagnostic::error(
                        "Invalid reference",
                        format!("The reference to \"{other}\" is not valid in this context"),
                    )
                    .with_subject(range.clone()),
                ),
            }
        }
        ctx.declare_var("path", Value::Object(path_attrs));
        ctx.declare_var("terraform", Value::Object(terraform_attrs.clone()));
        ctx.declare_var("tofu", Value::Object(terraform_attrs));

        let value = evaluate_body(&ctx, body, &mut diags);
        (value, diags)
    }

    /// Value of a single reference, including its remaining steps, converted to `want`
    pub fn eval_reference(&self, reference: &Reference, want: &Type) -> (Value, Diagnostics) {
        let (ctx, mut diags) = self.eval_context(std::slice::from_ref(reference));
        let range = &reference.source_range;

        let value = match &reference.subject {
            Referenceable::ProviderFunction(function) => {
                diags.push(
                    Diagnostic::error(
                        "Invalid reference",
                        format!("The function {function} can only be called, it has no value."),
                    )
                    .with_subject(range.clone()),
                );
                Value::dynamic()
            }
            _ => match parse_traversal_abs(&reference.display_string(), &range.filename) {
                Ok(traversal) => match ctx.variable(traversal.root_name()) {
                    Some(root) => traversal.apply(root).unwrap_or_else(|diag| {
                        diags.push(diag.with_subject(range.clone()));
                        Value::dynamic()
                    }),
                    None => Value::dynamic(),
                },
                Err(parse_diags) => {
                    diags.extend(parse_diags);
                    Value::dynamic()
                }
            },
        };

        let value = convert_result(value, want, Some(range.clone()), &mut diags);
        (value, diags)
    }
}

fn convert_result(
    value: Value,
    want: &Type,
    subject: Option<SourceRange>,
    diags: &mut Diagnostics,
) -> Value {
    match value.convert(want) {
        Ok(value) => value,
        Err(err) => {
            diags.push(
                Diagnostic::error(
                    "Incorrect value type",
                    format!("Invalid expression value: {err}."),
                )
                .with_subject(subject),
            );
            Value::Unknown(want.clone())
        }
    }
}

fn evaluate_body(ctx: &EvalContext<'_>, body: &hcl::Body, diags: &mut Diagnostics) -> Value {
    let mut object: IndexMap<String, Value> = IndexMap::new();
    for structure in body {
        match structure {
            hcl::Structure::Attribute(attribute) => {
                let (value, eval_diags) = evaluate(ctx, &attribute.expr);
                diags.extend(eval_diags);
                object.insert(attribute.key.as_str().to_owned(), value);
            }
            hcl::Structure::Block(block) => {
                let value = evaluate_body(ctx, &block.body, diags);
                let entry = object
                    .entry(block.identifier.as_str().to_owned())
                    .or_insert_with(|| Value::Tuple(vec![]));
                if let Value::Tuple(items) = entry {
                    items.push(value);
                }
            }
        }
    }
    Value::Object(object)
}

/// Evaluates an expression against a context without converting the result
fn evaluate(ctx: &EvalContext<'_>, expr: &hcl::Expression) -> (Value, Diagnostics) {
    let mut diags = Diagnostics::new();
    let mut unpredictable = false;

    for name in called_functions(expr) {
        match ctx.function(&name) {
            None => {
                let function = parse_function(&name);
                let namespace: String =
                    function.namespaces.iter().map(|ns| format!("{ns}::")).collect();
                diags.push(
                    Diagnostic::error(
                        "Call to unknown function",
                        format!("There is no function named {:?}.", function.name),
                    )
                    .with_extra(DiagnosticExtra::FunctionCallUnknown {
                        namespace,
                        name: function.name,
                    }),
                );
            }
            Some(function) => unpredictable |= function.is_unpredictable(),
        }
    }
    if diags.has_errors() {
        return (Value::dynamic(), enhance_function_diags(diags));
    }
    if unpredictable {
        tracing::trace!("expression calls an unpredictable function");
        return (Value::dynamic(), diags);
    }

    for traversal in static_traversals(expr) {
        let Some(root) = ctx.variable(traversal.root_name()) else {
            continue;
        };
        if let Ok(value) = traversal.apply(root) {
            if !value.is_wholly_known() {
                tracing::trace!(%traversal, "expression depends on an unknown value");
                return (Value::dynamic(), diags);
            }
        }
    }

    match expr.evaluate(&lower_context(ctx)) {
        Ok(value) => (Value::from(value), diags),
        Err(errors) => {
            diags.push(Diagnostic::error("Invalid expression", errors.to_string()));
            (Value::dynamic(), diags)
        }
    }
}

fn lower_context(ctx: &EvalContext<'_>) -> hcl::eval::Context<'static> {
    let mut lowered = hcl::eval::Context::new();
    for layer in ctx.layers() {
        for (name, value) in layer.variables() {
            lowered.declare_var(hcl::Identifier::unchecked(name.as_str()), lower_value(value));
        }
        for (name, function) in layer.own_functions() {
            lowered.declare_func(func_name(name), function.def().clone());
        }
    }
    lowered
}

/// Unknown parts become null. Only used after checking that the expression does not depend on
/// any of them.
fn lower_value(value: &Value) -> hcl::Value {
    match value {
        Value::Null | Value::Unknown(_) => hcl::Value::Null,
        Value::Bool(b) => hcl::Value::Bool(*b),
        Value::Number(n) => hcl::Value::Number(n.clone()),
        Value::String(s) => hcl::Value::String(s.clone()),
        Value::Tuple(items) => hcl::Value::Array(items.iter().map(lower_value).collect()),
        Value::Object(items) => hcl::Value::Object(
            items
                .iter()
                .map(|(k, v)| (k.clone(), lower_value(v)))
                .collect(),
        ),
    }
}

/// Makes "unknown function" diagnostics for namespaced calls more specific
pub fn enhance_function_diags(mut diags: Diagnostics) -> Diagnostics {
    for diag in diags.iter_mut() {
        let Some(DiagnosticExtra::FunctionCallUnknown { namespace, name }) = &diag.extra else {
            continue;
        };
        if namespace.is_empty() {
            continue;
        }

        let function = parse_function(&format!("{namespace}{name}"));
        if function.is_namespace(FUNCTION_NAMESPACE_CORE) {
            diag.summary = "Call to unknown function".to_string();
            diag.detail = format!(
                "There is no builtin ({FUNCTION_NAMESPACE_CORE}::) function named {name:?}."
            );
        } else if function.is_namespace(FUNCTION_NAMESPACE_PROVIDER) {
            if let Err(err) = function.as_provider_function() {
                diag.summary = "Invalid function format".to_string();
                diag.detail = err.to_string();
            }
            // an unknown but well formed provider function was already reported by the resolver
        } else {
            diag.summary = "Unknown function namespace".to_string();
            diag.detail = format!(
                "Function {:?} does not exist within a valid namespace ({})",
                function.to_string(),
                FUNCTION_NAMESPACES.join(",")
            );
        }
    }
    diags
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::addrs::{parse_ref_str, InstanceKey, Resource, ResourceMode};
    use crate::lang::testing::{sample_data, EchoProvider};
    use crate::lang::ScopeOptions;
    use pretty_assertions::assert_eq;

    fn expr(src: &str) -> hcl::Expression {
        src.parse::<hcl_edit::expr::Expression>()
            .expect("valid expression")
            .into()
    }

    fn body(src: &str) -> hcl::Body {
        hcl::from_str(src).expect("valid body")
    }

    #[test]
    fn expressions() {
        let data = sample_data();
        let scope = Scope::new(&data);
        let eval = |src: &str| {
            let (value, diags) = scope.eval_expr(&expr(src), &Type::Dynamic);
            assert!(diags.is_empty(), "{src}: {diags:?}");
            value
        };

        assert_eq!(eval("12"), Value::from(12));
        assert_eq!(eval("upper(local.foo)"), Value::from("BAR"));
        assert_eq!(eval("null_resource.multi[1].attr"), Value::from("multi1"));
        assert_eq!(eval(r#"resource.null_resource.each["each0"].attr"#), Value::from("each0"));
        assert_eq!(eval("module.foo.output0"), Value::from("bar0"));
        assert_eq!(eval("tofu.workspace == terraform.workspace"), Value::from(true));
        assert_eq!(
            eval("[for v in local.list : upper(v)]"),
            Value::from(vec!["A", "B"])
        );
        assert_eq!(eval(r#""${var.baz}-${count.index}""#), Value::from("boop-0"));
    }

    #[test]
    fn conversion() {
        let data = sample_data();
        let scope = Scope::new(&data);

        let (value, diags) = scope.eval_expr(&expr("count.index"), &Type::String);
        assert!(diags.is_empty());
        assert_eq!(value, Value::from("0"));

        let (value, diags) = scope.eval_expr(&expr("null_resource.foo"), &Type::Number);
        assert_eq!(value, Value::Unknown(Type::Number));
        insta::assert_snapshot!(diags.err().unwrap(), @"Incorrect value type: Invalid expression value: number required.");
    }

    #[test]
    fn unknown_inputs_make_unknown_results() {
        let data = sample_data();
        let scope = Scope::new(&data);

        let (value, diags) = scope.eval_expr(&expr("upper(local.pending)"), &Type::String);
        assert!(diags.is_empty());
        assert_eq!(value, Value::Unknown(Type::String));

        // only the parts that are used matter
        let (value, _) = scope.eval_expr(&expr("local.foo"), &Type::String);
        assert_eq!(value, Value::from("bar"));
    }

    #[test]
    fn reference_errors_skip_evaluation() {
        let data = sample_data();
        let scope = Scope::new(&data);
        let (value, diags) = scope.eval_expr(&expr("upper(var.nope)"), &Type::String);
        assert_eq!(value, Value::Unknown(Type::String));
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags.iter().next().map(|d| d.summary.as_str()),
            Some("Reference to undeclared input variable")
        );
    }

    #[test]
    fn impure_functions() {
        let data = sample_data();
        let (value, diags) = Scope::new(&data).eval_expr(&expr("uuid()"), &Type::String);
        assert!(diags.is_empty());
        assert!(matches!(value, Value::String(_)));

        let pure = Scope::new(&data).with_options(ScopeOptions {
            pure_only: true,
            ..Default::default()
        });
        let (value, diags) = pure.eval_expr(&expr("upper(uuid())"), &Type::String);
        assert!(diags.is_empty());
        assert_eq!(value, Value::Unknown(Type::String));
    }

    #[test]
    fn console_functions() {
        let data = sample_data();
        let (_, diags) = Scope::new(&data).eval_expr(&expr("type(local.foo)"), &Type::Dynamic);
        assert!(diags.has_errors());

        let console = Scope::new(&data).with_options(ScopeOptions {
            console_mode: true,
            ..Default::default()
        });
        let (value, diags) = console.eval_expr(&expr("type(local.foo)"), &Type::Dynamic);
        assert!(diags.is_empty());
        assert_eq!(value, Value::from("string"));
    }

    #[test]
    fn unknown_function() {
        let data = sample_data();
        let (value, diags) =
            Scope::new(&data).eval_expr(&expr("missing_function(54)"), &Type::String);
        assert_eq!(value, Value::Unknown(Type::String));
        insta::assert_snapshot!(diags.err().unwrap(), @r#"Call to unknown function: There is no function named "missing_function"."#);
        assert_eq!(
            diags.iter().next().and_then(|d| d.extra.clone()),
            Some(DiagnosticExtra::FunctionCallUnknown {
                namespace: String::new(),
                name: "missing_function".to_string(),
            })
        );
    }

    #[test]
    fn enhanced_function_diagnostics() {
        let cases = [
            (
                "",
                "missing_function",
                "Call to unknown function",
                "There is no function named \"missing_function\".",
            ),
            (
                "core::",
                "missing_function",
                "Call to unknown function",
                "There is no builtin (core::) function named \"missing_function\".",
            ),
            (
                "magic::",
                "missing_function",
                "Unknown function namespace",
                "Function \"magic::missing_function\" does not exist within a valid namespace \
                 (provider,core)",
            ),
            (
                "provider::foo::bar::extra::extra2::",
                "missing_function",
                "Invalid function format",
                "invalid provider function \
                 \"provider::foo::bar::extra::extra2::missing_function\": expected \
                 provider::<name>::<function> or provider::<name>::<alias>::<function>",
            ),
        ];

        for (namespace, name, summary, detail) in cases {
            let diags = Diagnostics::from(
                Diagnostic::error(
                    "Call to unknown function",
                    format!("There is no function named {name:?}."),
                )
                .with_extra(DiagnosticExtra::FunctionCallUnknown {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                }),
            );
            let enhanced = enhance_function_diags(diags);
            let diag = enhanced.iter().next().expect("one diagnostic");
            assert_eq!((diag.summary.as_str(), diag.detail.as_str()), (summary, detail));
        }
    }

    #[test]
    fn namespaced_functions() {
        let data = sample_data();
        let scope = Scope::new(&data);

        let (value, diags) = scope.eval_expr(&expr(r#"core::upper("x")"#), &Type::String);
        assert!(diags.is_empty(), "{diags:?}");
        assert_eq!(value, Value::from("X"));

        let (value, diags) =
            scope.eval_expr(&expr("core::join(\"-\", local.list)"), &Type::String);
        assert!(diags.is_empty(), "{diags:?}");
        assert_eq!(value, Value::from("a-b"));

        let (value, diags) = scope.eval_expr(&expr("core::missing_function(1)"), &Type::String);
        assert_eq!(value, Value::Unknown(Type::String));
        insta::assert_snapshot!(diags.err().unwrap(), @r#"Call to unknown function: There is no builtin (core::) function named "missing_function"."#);

        let (_, diags) = scope.eval_expr(&expr("magic::missing_function(1)"), &Type::String);
        insta::assert_snapshot!(diags.err().unwrap(), @r#"Unknown function namespace: Function "magic::missing_function" does not exist within a valid namespace (provider,core)"#);
    }

    #[test]
    fn provider_functions() {
        let data = sample_data();
        let scope = Scope::new(&data).with_provider_functions(&EchoProvider);

        let (value, diags) =
            scope.eval_expr(&expr("provider::test::echo(local.foo)"), &Type::String);
        assert!(diags.is_empty(), "{diags:?}");
        assert_eq!(value, Value::from("bar"));

        let (value, diags) = scope.eval_expr(
            &expr(r#"upper(provider::test::east::echo("x"))"#),
            &Type::String,
        );
        assert!(diags.is_empty(), "{diags:?}");
        assert_eq!(value, Value::from("X"));

        let (value, diags) = scope.eval_expr(&expr("provider::test::nope(1)"), &Type::String);
        assert_eq!(value, Value::Unknown(Type::String));
        insta::assert_snapshot!(diags.err().unwrap(), @"Unknown provider function: provider::test::nope");

        // without a resolver no provider function can be called
        let (value, diags) = Scope::new(&data)
            .eval_expr(&expr("provider::test::echo(local.foo)"), &Type::String);
        assert_eq!(value, Value::Unknown(Type::String));
        assert!(diags.has_errors());
    }

    #[test]
    fn blocks() {
        let data = sample_data();
        let (value, diags) = Scope::new(&data).eval_block(&body(
            r#"
            name = local.foo
            tags {
              index = count.index
            }
            tags {
              key = each.key
            }
            "#,
        ));
        assert!(diags.is_empty());
        assert_eq!(
            value,
            Value::object([
                ("name", Value::from("bar")),
                (
                    "tags",
                    Value::Tuple(vec![
                        Value::object([("index", Value::from(0))]),
                        Value::object([("key", Value::from("a"))]),
                    ])
                ),
            ])
        );
    }

    #[test]
    fn self_blocks() {
        let data = sample_data();
        let scope = Scope::new(&data);
        let cases = [
            (
                "attr = self.foo",
                Value::object([("foo", Value::from("bar"))]),
                RepetitionData {
                    count_index: Some(Value::from(0)),
                    ..Default::default()
                },
                Value::from("bar"),
            ),
            (
                "attr = count.index",
                Value::Null,
                RepetitionData {
                    count_index: Some(Value::from(0)),
                    ..Default::default()
                },
                Value::from(0),
            ),
            (
                "attr = each.key",
                Value::Null,
                RepetitionData {
                    each_key: Some(Value::from("a")),
                    ..Default::default()
                },
                Value::from("a"),
            ),
            ("attr = path.cwd", Value::Null, RepetitionData::default(), Value::from("/home/foo/bar")),
            ("attr = path.module", Value::Null, RepetitionData::default(), Value::from("foo/bar")),
            ("attr = path.root", Value::Null, RepetitionData::default(), Value::from("/home/foo")),
            (
                "attr = terraform.workspace",
                Value::Null,
                RepetitionData::default(),
                Value::from("default"),
            ),
            (
                "attr = tofu.workspace",
                Value::Null,
                RepetitionData::default(),
                Value::from("default"),
            ),
        ];

        for (src, self_value, repetition, want) in cases {
            let (value, diags) = scope.eval_self_block(&body(src), self_value, &repetition);
            assert!(diags.is_empty(), "{src}: {diags:?}");
            assert_eq!(value, Value::object([("attr", want)]), "{src}");
        }
    }

    #[test]
    fn self_blocks_reject_other_references() {
        let data = sample_data();
        let (_, diags) = Scope::new(&data).eval_self_block(
            &body("attr = local.foo"),
            Value::Null,
            &RepetitionData::default(),
        );
        insta::assert_snapshot!(diags.err().unwrap(), @r#"Invalid reference: The reference to "local.foo" is not valid in this context"#);
    }

    #[test]
    fn references() {
        let data = sample_data();
        let scope = Scope::new(&data);

        let reference = parse_ref_str("null_resource.multi[1].attr").expect("valid reference");
        let (value, diags) = scope.eval_reference(&reference, &Type::String);
        assert!(diags.is_empty());
        assert_eq!(value, Value::from("multi1"));

        let each = Resource::new(ResourceMode::Managed, "null_resource", "each");
        let scope = Scope::new(&data).with_self(each.instance(InstanceKey::from("each1")));
        let reference = parse_ref_str("self.attr").expect("valid reference");
        let (value, diags) = scope.eval_reference(&reference, &Type::Dynamic);
        assert!(diags.is_empty());
        assert_eq!(value, Value::from("each1"));

        let reference = parse_ref_str("local.foo").expect("valid reference");
        let (value, diags) = scope.eval_reference(&reference, &Type::Number);
        assert_eq!(value, Value::Unknown(Type::Number));
        assert!(diags.has_errors());
    }
}
