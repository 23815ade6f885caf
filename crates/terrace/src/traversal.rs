//! static traversals (`a.b["c"][0]`)
//!
//! A [Traversal] is a root name followed by attribute and index steps, each carrying the
//! [SourceRange] it was parsed from. Address parsers consume traversals step by step and point
//! their diagnostics at the offending step.
//!
//! Traversals are produced either by [parse_traversal_abs] (with source ranges, via [hcl_edit]) or
//! from expressions that were already parsed by [hcl] (without source ranges).
use crate::diagnostics::{Diagnostic, Diagnostics, SourceRange};
use crate::value::{number_from_f64, Value};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TraversalStep {
    Root { name: String, range: SourceRange },
    Attr { name: String, range: SourceRange },
    Index { key: Value, range: SourceRange },
}

impl TraversalStep {
    pub fn source_range(&self) -> &SourceRange {
        match self {
            TraversalStep::Root { range, .. }
            | TraversalStep::Attr { range, .. }
            | TraversalStep::Index { range, .. } => range,
        }
    }

    /// Name of a root or attribute step
    pub fn name(&self) -> Option<&str> {
        match self {
            TraversalStep::Root { name, .. } | TraversalStep::Attr { name, .. } => Some(name),
            TraversalStep::Index { .. } => None,
        }
    }

    pub fn index_key(&self) -> Option<&Value> {
        match self {
            TraversalStep::Index { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Same step, but as a root step if it was an attribute step
    pub(crate) fn into_root(self) -> TraversalStep {
        match self {
            TraversalStep::Attr { name, range } => TraversalStep::Root { name, range },
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Traversal(pub Vec<TraversalStep>);

impl Traversal {
    /// Start building a traversal without source ranges
    pub fn root(name: impl Into<String>) -> Self {
        Traversal(vec![TraversalStep::Root {
            name: name.into(),
            range: SourceRange::default(),
        }])
    }

    pub fn attr(mut self, name: impl Into<String>) -> Self {
        self.0.push(TraversalStep::Attr {
            name: name.into(),
            range: SourceRange::default(),
        });
        self
    }

    pub fn index(mut self, key: impl Into<Value>) -> Self {
        self.0.push(TraversalStep::Index {
            key: key.into(),
            range: SourceRange::default(),
        });
        self
    }

    pub fn steps(&self) -> &[TraversalStep] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A relative traversal does not start with a root step
    pub fn is_relative(&self) -> bool {
        !matches!(self.0.first(), Some(TraversalStep::Root { .. }))
    }

    /// # Panic
    /// Panics when the traversal is relative
    pub fn root_name(&self) -> &str {
        match self.0.first() {
            Some(TraversalStep::Root { name, .. }) => name,
            _ => panic!("root_name called on a relative traversal"),
        }
    }

    /// Range covering all steps
    pub fn source_range(&self) -> SourceRange {
        match (self.0.first(), self.0.last()) {
            (Some(first), Some(last)) => first.source_range().to(last.source_range()),
            _ => SourceRange::default(),
        }
    }

    /// Apply the traversal to a value. The root step, if any, is skipped.
    pub fn apply(&self, value: &Value) -> Result<Value, Diagnostic> {
        let mut current = value.clone();
        for step in &self.0 {
            current = match step {
                TraversalStep::Root { .. } => continue,
                TraversalStep::Attr { name, .. } => current.get_attr(name),
                TraversalStep::Index { key, .. } => current.index(key),
            }
            .map_err(|detail| {
                Diagnostic::error("Invalid reference", detail)
                    .with_subject(step.source_range().clone())
            })?;
        }
        Ok(current)
    }

    /// Static traversal of an [hcl::Traversal].
    ///
    /// Stops at the first step that is not static (splat or computed index). Returns `None` when
    /// the traversal does not start at a variable.
    pub fn from_hcl(traversal: &hcl::Traversal) -> Option<Traversal> {
        use hcl::{Expression, TraversalOperator};

        let hcl::Expression::Variable(variable) = &traversal.expr else {
            return None;
        };
        let mut steps = vec![TraversalStep::Root {
            name: variable.as_str().to_owned(),
            range: SourceRange::default(),
        }];

        for operator in &traversal.operators {
            let key = match operator {
                TraversalOperator::GetAttr(ident) => {
                    steps.push(TraversalStep::Attr {
                        name: ident.as_str().to_owned(),
                        range: SourceRange::default(),
                    });
                    continue;
                }
                TraversalOperator::LegacyIndex(index) => Value::from(*index as usize),
                TraversalOperator::Index(Expression::Number(n)) => Value::Number(n.clone()),
                TraversalOperator::Index(Expression::String(s)) => Value::String(s.clone()),
                _ => break,
            };
            steps.push(TraversalStep::Index {
                key,
                range: SourceRange::default(),
            });
        }

        Some(Traversal(steps))
    }
}

impl From<Vec<TraversalStep>> for Traversal {
    fn from(value: Vec<TraversalStep>) -> Self {
        Traversal(value)
    }
}

impl fmt::Display for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.0 {
            match step {
                TraversalStep::Root { name, .. } => f.write_str(name)?,
                TraversalStep::Attr { name, .. } => write!(f, ".{name}")?,
                TraversalStep::Index { key, .. } => write!(f, "[{key}]")?,
            }
        }
        Ok(())
    }
}

/// Parse an absolute traversal such as `module.foo[0].aws_instance.web`
///
/// Only variables, attribute access and literal indexes are accepted.
pub fn parse_traversal_abs(src: &str, filename: &str) -> Result<Traversal, Diagnostics> {
    let expr = hcl_edit::parser::parse_expr(src).map_err(|err| {
        Diagnostics::from(
            Diagnostic::error("Invalid syntax", err.to_string())
                .with_subject(SourceRange::new(filename, 0..src.len())),
        )
    })?;

    traversal_from_edit(&expr, filename).map_err(Diagnostics::from)
}

fn traversal_from_edit(
    expr: &hcl_edit::expr::Expression,
    filename: &str,
) -> Result<Traversal, Diagnostic> {
    use hcl_edit::expr::{Expression, TraversalOperator};
    use hcl_edit::Span;

    let range = |span: Option<std::ops::Range<usize>>| {
        SourceRange::new(filename, span.unwrap_or_default())
    };
    let not_static = |span| {
        Diagnostic::error(
            "Invalid expression",
            "A single static variable reference is required: only attribute access and indexing \
             with constant keys. No calculations, function calls, template expressions, etc are \
             allowed here.",
        )
        .with_subject(range(span))
    };

    let (root, operators) = match expr {
        Expression::Variable(variable) => (variable, &[][..]),
        Expression::Traversal(traversal) => match &traversal.expr {
            Expression::Variable(variable) => (variable, &traversal.operators[..]),
            other => return Err(not_static(other.span())),
        },
        other => return Err(not_static(other.span())),
    };

    let mut steps = vec![TraversalStep::Root {
        name: root.value().as_str().to_owned(),
        range: range(root.span()),
    }];

    for operator in operators {
        let step_range = range(operator.span());
        let step = match operator.value() {
            TraversalOperator::GetAttr(ident) => TraversalStep::Attr {
                name: ident.value().as_str().to_owned(),
                range: step_range,
            },
            TraversalOperator::LegacyIndex(index) => TraversalStep::Index {
                key: Value::from(*index.value() as usize),
                range: step_range,
            },
            TraversalOperator::Index(Expression::Number(number)) => {
                let number = number.value();
                let key = match number.as_i64() {
                    Some(int) => Value::from(int),
                    None => number
                        .as_f64()
                        .and_then(number_from_f64)
                        .map(Value::Number)
                        .ok_or_else(|| not_static(operator.span()))?,
                };
                TraversalStep::Index {
                    key,
                    range: step_range,
                }
            }
            TraversalOperator::Index(Expression::String(string)) => TraversalStep::Index {
                key: Value::String(string.value().clone()),
                range: step_range,
            },
            _ => return Err(not_static(operator.span())),
        };
        steps.push(step);
    }

    Ok(Traversal(steps))
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_with_ranges() {
        let traversal =
            parse_traversal_abs(r#"module.foo["a"].aws_instance.web[0]"#, "t.tf").unwrap();
        assert_eq!(traversal.root_name(), "module");
        assert_eq!(traversal.len(), 6);
        assert_eq!(traversal.steps()[2].index_key(), Some(&Value::from("a")));
        assert_eq!(traversal.steps()[2].source_range().filename, "t.tf");
        assert_eq!(traversal.to_string(), r#"module.foo["a"].aws_instance.web[0]"#);
        assert_eq!(traversal.source_range().start, 0);
    }

    #[test]
    fn rejects_dynamic_expressions() {
        for src in ["a[b]", "f(x)", "a.*.b", "1 + 2", r#""${a}""#] {
            let diags = parse_traversal_abs(src, "").unwrap_err();
            assert!(diags.has_errors(), "{src} should be rejected");
        }
    }

    #[test]
    fn from_hcl_stops_at_splat() {
        let expr: hcl::Expression = "aws_instance.web[*].id"
            .parse::<hcl_edit::expr::Expression>()
            .unwrap()
            .into();
        let hcl::Expression::Traversal(traversal) = expr else {
            panic!("expected a traversal")
        };
        assert_eq!(
            Traversal::from_hcl(&traversal),
            Some(Traversal::root("aws_instance").attr("web"))
        );
    }

    #[test]
    #[should_panic(expected = "root_name called on a relative traversal")]
    fn relative_traversals_have_no_root() {
        Traversal(vec![TraversalStep::Attr {
            name: "id".into(),
            range: SourceRange::default(),
        }])
        .root_name();
    }

    #[test]
    fn apply_skips_root() {
        let value = Value::object([("id", Value::from(vec!["x", "y"]))]);
        let traversal = Traversal::root("self").attr("id").index(1);
        assert_eq!(traversal.apply(&value), Ok(Value::from("y")));
        assert!(Traversal::root("self").attr("nope").apply(&value).is_err());
    }
}
