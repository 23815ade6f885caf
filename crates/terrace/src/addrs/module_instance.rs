use super::{
    display_unique_key, module::normalize_remain, parse_instance_key, AbsModuleCall,
    AbsResource, AbsResourceInstance, InstanceKey, Module, ModuleCall, ModuleCallInstance,
    Resource, ResourceMode,
};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::traversal::{parse_traversal_abs, Traversal, TraversalStep};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleInstanceStep {
    pub name: String,
    pub instance_key: InstanceKey,
}

impl ModuleInstanceStep {
    pub fn new(name: impl Into<String>, instance_key: InstanceKey) -> Self {
        Self {
            name: name.into(),
            instance_key,
        }
    }
}

impl fmt::Display for ModuleInstanceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module.{}{}", self.name, self.instance_key)
    }
}

/// Dynamic path of a module instance: module call names with their instance keys
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ModuleInstance(Vec<ModuleInstanceStep>);

impl ModuleInstance {
    pub fn root() -> Self {
        ModuleInstance(vec![])
    }

    pub fn new(steps: Vec<ModuleInstanceStep>) -> Self {
        ModuleInstance(steps)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn steps(&self) -> &[ModuleInstanceStep] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn child(&self, name: impl Into<String>, key: InstanceKey) -> ModuleInstance {
        let mut steps = self.0.clone();
        steps.push(ModuleInstanceStep::new(name, key));
        ModuleInstance(steps)
    }

    /// The calling module instance, root for root
    pub fn parent(&self) -> ModuleInstance {
        self.prefix(self.0.len().saturating_sub(1))
    }

    /// The first `len` steps
    pub fn prefix(&self, len: usize) -> ModuleInstance {
        ModuleInstance(self.0[..len.min(self.0.len())].to_vec())
    }

    /// Static module this is an instance of
    pub fn module(&self) -> Module {
        Module::new(self.0.iter().map(|step| step.name.clone()))
    }

    /// `true` if this is an instance of `module`
    pub fn is_for_module(&self, module: &Module) -> bool {
        self.0.len() == module.len()
            && self
                .0
                .iter()
                .zip(module.steps())
                .all(|(step, name)| &step.name == name)
    }

    /// `true` if both are instances of the same static module
    pub fn has_same_module(&self, other: &ModuleInstance) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().zip(&other.0).all(|(a, b)| a.name == b.name)
    }

    /// The calling module instance and the call that produced this instance
    ///
    /// # Panic
    /// Panics for the root module instance.
    pub fn call_instance(&self) -> (ModuleInstance, ModuleCallInstance) {
        match self.0.split_last() {
            Some((last, parent)) => (
                ModuleInstance(parent.to_vec()),
                ModuleCall::new(last.name.clone()).instance(last.instance_key.clone()),
            ),
            None => panic!("root module instance has no call"),
        }
    }

    /// The calling module instance and the call that produced this instance, ignoring its key
    ///
    /// # Panic
    /// Panics for the root module instance.
    pub fn call(&self) -> (ModuleInstance, ModuleCall) {
        let (parent, call_instance) = self.call_instance();
        (parent, call_instance.call)
    }

    pub fn module_call(&self, name: impl Into<String>) -> AbsModuleCall {
        ModuleCall::new(name).absolute(self.clone())
    }

    pub fn resource(
        &self,
        mode: ResourceMode,
        type_name: impl Into<String>,
        name: impl Into<String>,
    ) -> AbsResource {
        Resource::new(mode, type_name, name).absolute(self.clone())
    }

    pub fn resource_instance(
        &self,
        mode: ResourceMode,
        type_name: impl Into<String>,
        name: impl Into<String>,
        key: InstanceKey,
    ) -> AbsResourceInstance {
        self.resource(mode, type_name, name).instance(key)
    }
}

impl fmt::Display for ModuleInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

impl Ord for ModuleInstance {
    fn cmp(&self, other: &Self) -> Ordering {
        // shorter paths first, then step by step
        self.0.len().cmp(&other.0.len()).then_with(|| {
            for (a, b) in self.0.iter().zip(&other.0) {
                let ordering = a
                    .name
                    .cmp(&b.name)
                    .then_with(|| a.instance_key.cmp(&b.instance_key));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        })
    }
}

impl PartialOrd for ModuleInstance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<Vec<ModuleInstanceStep>> for ModuleInstance {
    fn from(value: Vec<ModuleInstanceStep>) -> Self {
        ModuleInstance(value)
    }
}

display_unique_key!(ModuleInstance => ModuleInstance);

/// Parses a leading `module.a[0].module.b` prefix and returns what follows it
///
/// The remainder's first step is turned into a root step.
pub fn parse_module_instance_prefix(
    steps: &[TraversalStep],
) -> (ModuleInstance, Traversal, Diagnostics) {
    let mut diags = Diagnostics::new();
    let mut module_instance = vec![];
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

        let mut step = ModuleInstanceStep::new(module_name, InstanceKey::NoKey);
        if let Some(TraversalStep::Index { key, range }) = remain.first() {
            remain = &remain[1..];
            match parse_instance_key(key) {
                Ok(instance_key) => step.instance_key = instance_key,
                Err(err) => diags.push(
                    Diagnostic::error(
                        "Invalid address operator",
                        format!("Invalid module index: {err}."),
                    )
                    .with_subject(range.clone()),
                ),
            }
        }
        module_instance.push(step);
    }

    (
        ModuleInstance(module_instance),
        normalize_remain(remain),
        diags,
    )
}

/// Parses a traversal that consists only of a module instance path
pub fn parse_module_instance(traversal: &Traversal) -> Result<ModuleInstance, Diagnostics> {
    let (module_instance, remain, mut diags) = parse_module_instance_prefix(traversal.steps());
    if !remain.is_empty() {
        let detail = if remain.len() == traversal.len() {
            "A module instance address must begin with \"module.\"."
        } else {
            "The module instance address is followed by additional invalid content."
        };
        diags.push(
            Diagnostic::error("Invalid module instance address", detail)
                .with_subject(remain.source_range()),
        );
    }

    if diags.has_errors() {
        Err(diags)
    } else {
        Ok(module_instance)
    }
}

/// Like [parse_module_instance], starting from source text. The empty string is the root module.
pub fn parse_module_instance_str(src: &str) -> Result<ModuleInstance, Diagnostics> {
    if src.is_empty() {
        return Ok(ModuleInstance::root());
    }
    parse_module_instance(&parse_traversal_abs(src, "")?)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mi(src: &str) -> ModuleInstance {
        parse_module_instance_str(src).unwrap()
    }

    #[test]
    fn parse_and_display() {
        for src in ["", "module.a", r#"module.a["x"].module.b[2]"#] {
            assert_eq!(mi(src).to_string(), src);
        }
        assert_eq!(
            mi("module.a[1].module.b"),
            ModuleInstance::root()
                .child("a", InstanceKey::Int(1))
                .child("b", InstanceKey::NoKey)
        );
    }

    #[test]
    fn parse_errors() {
        let err = |src| parse_module_instance_str(src).unwrap_err().err().unwrap().to_string();
        assert_eq!(
            err("foo.bar"),
            "Invalid module instance address: A module instance address must begin with \"module.\"."
        );
        assert_eq!(
            err("module.a.foo"),
            "Invalid module instance address: The module instance address is followed by \
             additional invalid content."
        );
        assert_eq!(
            err("module.a[1.5]"),
            "Invalid address operator: Invalid module index: value must be a whole number, \
             between -9223372036854775808 and 9223372036854775807."
        );
    }

    #[test]
    fn ordering() {
        let mut instances = vec![
            mi("module.b"),
            mi("module.a[1].module.c"),
            mi("module.a[\"x\"]"),
            mi(""),
            mi("module.a[1]"),
            mi("module.a"),
        ];
        instances.sort();
        assert_eq!(
            instances.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec![
                "",
                "module.a",
                "module.a[1]",
                "module.a[\"x\"]",
                "module.b",
                "module.a[1].module.c",
            ]
        );
    }

    #[test]
    fn relationships() {
        let instance = mi("module.a[0].module.b[\"k\"]");
        assert_eq!(instance.parent(), mi("module.a[0]"));
        assert_eq!(instance.module(), Module::new(["a", "b"]));
        assert!(instance.is_for_module(&Module::new(["a", "b"])));
        assert!(!instance.is_for_module(&Module::new(["a"])));
        assert!(instance.has_same_module(&mi("module.a[3].module.b")));

        let (parent, call) = instance.call_instance();
        assert_eq!(parent, mi("module.a[0]"));
        assert_eq!(call.to_string(), "module.b[\"k\"]");
        assert_eq!(call.module_instance(&parent), instance);
    }

    #[test]
    #[should_panic(expected = "root module instance has no call")]
    fn root_has_no_call() {
        ModuleInstance::root().call();
    }
}
