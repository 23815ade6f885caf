use super::{display_unique_key, ModuleCall};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::traversal::{Traversal, TraversalStep};
use std::fmt;

/// Static path of a module in the configuration tree, without instance keys
///
/// The root module is the empty path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Module(Vec<String>);

impl Module {
    pub fn root() -> Self {
        Module(vec![])
    }

    pub fn new<S: Into<String>>(steps: impl IntoIterator<Item = S>) -> Self {
        Module(steps.into_iter().map(Into::into).collect())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn steps(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn child(&self, name: impl Into<String>) -> Module {
        let mut steps = self.0.clone();
        steps.push(name.into());
        Module(steps)
    }

    /// The calling module, root for root
    pub fn parent(&self) -> Module {
        match self.0.split_last() {
            Some((_, parent)) => Module(parent.to_vec()),
            None => Module::root(),
        }
    }

    /// The calling module and the call that instantiates this module
    ///
    /// # Panic
    /// Panics for the root module, which has no call.
    pub fn call(&self) -> (Module, ModuleCall) {
        match self.0.split_last() {
            Some((name, parent)) => (Module(parent.to_vec()), ModuleCall::new(name.clone())),
            None => panic!("root module has no call"),
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "module.{step}")?;
        }
        Ok(())
    }
}

display_unique_key!(Module => Module);

/// Parses a leading `module.a.module.b` prefix
///
/// Instance keys are rejected. The remainder is returned with its first step turned into a root.
pub(crate) fn parse_module_prefix(steps: &[TraversalStep]) -> (Module, Traversal, Diagnostics) {
    let mut diags = Diagnostics::new();
    let mut module = Module::root();
    let mut remain = steps;

    while let Some(first) = remain.first() {
        let Some(next) = first.name() else {
            diags.push(
                Diagnostic::error(
                    "Invalid address operator",
                    "Module address prefix must be followed by dot and then a name.",
                )
                .with_subject(first.source_range().clone()),
            );
            break;
        };
        if next != "module" {
            break;
        }

        let keyword_range = first.source_range().clone();
        remain = &remain[1..];
        let module_name = match remain.first() {
            Some(TraversalStep::Attr { name, .. }) => name.clone(),
            other => {
                let subject = other.map_or(keyword_range, |s| s.source_range().clone());
                diags.push(
                    Diagnostic::error(
                        "Invalid address operator",
                        "Prefix \"module.\" must be followed by a module name.",
                    )
                    .with_subject(subject),
                );
                break;
            }
        };
        remain = &remain[1..];

        if let Some(index @ TraversalStep::Index { .. }) = remain.first() {
            diags.push(
                Diagnostic::error(
                    "Module instance address with keys is not allowed",
                    "Module address cannot be a module instance (e.g. \"module.a[0]\"), it must \
                     be a module instead (e.g. \"module.a\").",
                )
                .with_subject(index.source_range().clone()),
            );
            break;
        }

        module = module.child(module_name);
    }

    (module, normalize_remain(remain), diags)
}

pub(crate) fn normalize_remain(remain: &[TraversalStep]) -> Traversal {
    let mut steps = remain.to_vec();
    if let Some(first) = steps.first_mut() {
        *first = first.clone().into_root();
    }
    Traversal(steps)
}
