//! static module tree read from an HCL file
//!
//! Understands just enough of a configuration to exercise an [Expander]:
//! ```hcl
//! resource "test" "single" {}
//! data "test" "lookup" { count = 2 }
//!
//! module "net" {
//!   for_each = { a = 1, b = 2 }
//!
//!   resource "test" "subnet" { count = 3 }
//!   module "inner" { enabled = false }
//! }
//! ```
//! A `module` block declares a module call and, in its body, the contents of the called module.
//! Repetition arguments are evaluated with [hcl::eval] without any variables, so they have to
//! be constant.
use super::{Expander, Expansion};
use crate::addrs::{
    AbsResourceInstance, ConfigResource, Module, ModuleCall, ModuleInstance, Resource,
    ResourceMode, Set, UniqueKey, UniqueKeyer,
};
use crate::diagnostics::{Diagnostic, Diagnostics, DiagnosticsError, SourceRange};
use crate::value::Value;
use hcl::eval::Evaluate;
use hcl_edit::structure::{Block, Body, Structure};
use hcl_edit::Span;
use indexmap::IndexMap;
use std::path::Path;

/// Largest accepted constant `count`
const MAX_COUNT: u64 = 100_000;

#[derive(Debug, Default)]
pub struct ConfigTree {
    root: ConfigModule,
}

/// Declarations of one static module
#[derive(Debug, Default)]
struct ConfigModule {
    resources: Vec<Declaration<Resource>>,
    module_calls: Vec<(Declaration<ModuleCall>, ConfigModule)>,
}

#[derive(Debug)]
struct Declaration<T> {
    addr: T,
    repetition: Repetition,
    range: SourceRange,
}

#[derive(Debug)]
enum Repetition {
    Single,
    Count(hcl::Expression, SourceRange),
    ForEach(hcl::Expression, SourceRange),
    Enabled(hcl::Expression, SourceRange),
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unable to parse hcl file")]
    HclParseFailed(#[from] hcl_edit::parser::Error),
    #[error("Invalid configuration")]
    InvalidConfig(#[from] DiagnosticsError),
}

/// Every instance of every declared module and resource
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Instances {
    pub modules: Vec<ModuleInstance>,
    pub resources: Vec<AbsResourceInstance>,
}

impl ConfigTree {
    pub fn load_file(file_path: &Path) -> Result<ConfigTree, LoadError> {
        let file_path = file_path.canonicalize()?;
        tracing::info!(path=%file_path.display(), "loading file");

        let file_contents = std::fs::read_to_string(&file_path)?;
        Self::parse(&file_contents, &file_path.display().to_string())
    }

    pub fn parse(src: &str, filename: &str) -> Result<ConfigTree, LoadError> {
        let body = hcl_edit::parser::parse_body(src)?;
        let mut diags = Diagnostics::new();
        let root = ConfigModule::from_body(&body, filename, &mut diags);
        if let Some(err) = diags.err() {
            return Err(err.into());
        }
        Ok(ConfigTree { root })
    }

    /// Every static module, the root first, then depth first in declaration order
    pub fn modules(&self) -> Set<Module> {
        let mut modules = Set::new();
        self.root.walk(&Module::root(), &mut |module, _| {
            modules.add(module.clone());
        });
        modules
    }

    /// Every resource of every static module
    pub fn resources(&self) -> Set<ConfigResource> {
        let mut resources = Set::new();
        self.root.walk(&Module::root(), &mut |module, config| {
            for declaration in &config.resources {
                resources.add(declaration.addr.in_module(module.clone()));
            }
        });
        resources
    }

    /// Evaluates all repetition arguments and registers them top-down
    ///
    /// Objects whose argument is invalid are reported and left unregistered, together with
    /// everything inside them.
    pub fn register(&self, expander: &Expander) -> Diagnostics {
        let mut diags = Diagnostics::new();
        self.root
            .register(expander, &ModuleInstance::root(), &mut diags);
        diags
    }

    /// All instances known to an expander that this tree was registered with, sorted
    pub fn instances(&self, expander: &Expander) -> Instances {
        let known = expander.all_instances();
        let mut instances = Instances::default();

        for module in self.modules() {
            instances.modules.extend(known.instances_for_module(&module));
        }
        instances.modules.sort();

        for resource in self.resources() {
            for module_instance in known.instances_for_module(&resource.module) {
                let abs = resource.resource.absolute(module_instance);
                if known.has_resource(&abs) {
                    instances.resources.extend(expander.expand_resource(&abs));
                }
            }
        }
        instances.resources.sort();

        instances
    }
}

impl ConfigModule {
    fn from_body(body: &Body, filename: &str, diags: &mut Diagnostics) -> ConfigModule {
        let mut module = ConfigModule::default();
        let mut declared: IndexMap<UniqueKey, SourceRange> = IndexMap::new();

        for structure in body.iter() {
            let Structure::Block(block) = structure else {
                continue;
            };
            let range = SourceRange::new(filename, block.span().unwrap_or_default());
            let labels: Vec<&str> = block.labels.iter().map(|label| label.as_str()).collect();
            let keyword = block.ident.value().as_str();

            let mode = match keyword {
                "module" => {
                    let [name] = labels.as_slice() else {
                        diags.push(
                            Diagnostic::error(
                                "Invalid module block",
                                "A module block needs exactly one label: the name of the call.",
                            )
                            .with_subject(range),
                        );
                        continue;
                    };
                    let addr = ModuleCall::new(*name);
                    if let Some(first) = declared.get(&addr.unique_key()) {
                        diags.push(
                            Diagnostic::error(
                                "Duplicate module call",
                                format!(
                                    "A module call named {name:?} was already defined at \
                                     {first}. Module calls must have unique names within a \
                                     module."
                                ),
                            )
                            .with_subject(range),
                        );
                        continue;
                    }
                    declared.insert(addr.unique_key(), range.clone());
                    let declaration = Declaration {
                        addr,
                        repetition: Repetition::from_block(block, filename, diags),
                        range,
                    };
                    let child = ConfigModule::from_body(&block.body, filename, diags);
                    module.module_calls.push((declaration, child));
                    continue;
                }
                "resource" => ResourceMode::Managed,
                "data" => ResourceMode::Data,
                "ephemeral" => ResourceMode::Ephemeral,
                other => {
                    tracing::debug!(block = other, "ignoring unsupported block");
                    continue;
                }
            };

            let [type_name, name] = labels.as_slice() else {
                diags.push(
                    Diagnostic::error(
                        format!("Invalid {keyword} block"),
                        "A resource block needs exactly two labels: the resource type and name.",
                    )
                    .with_subject(range),
                );
                continue;
            };
            let addr = Resource::new(mode, *type_name, *name);
            if let Some(first) = declared.get(&addr.unique_key()) {
                diags.push(
                    Diagnostic::error(
                        format!("Duplicate {keyword} {type_name:?} configuration"),
                        format!(
                            "{addr} was already declared at {first}. Resource names must be \
                             unique per type in each module."
                        ),
                    )
                    .with_subject(range),
                );
                continue;
            }
            declared.insert(addr.unique_key(), range.clone());
            module.resources.push(Declaration {
                addr,
                repetition: Repetition::from_block(block, filename, diags),
                range,
            });
        }

        module
    }

    fn walk<'a>(&'a self, module: &Module, visit: &mut dyn FnMut(&Module, &'a ConfigModule)) {
        visit(module, self);
        for (call, child) in &self.module_calls {
            child.walk(&module.child(call.addr.name.clone()), visit);
        }
    }

    fn register(&self, expander: &Expander, module: &ModuleInstance, diags: &mut Diagnostics) {
        for declaration in &self.resources {
            let Some(expansion) = declaration.repetition.evaluate(diags) else {
                continue;
            };
            tracing::trace!(%module, resource = %declaration.addr, range = %declaration.range, "registering");
            match expansion {
                Expansion::Single => expander.set_resource_single(module, &declaration.addr),
                Expansion::Count(count) => {
                    expander.set_resource_count(module, &declaration.addr, count)
                }
                Expansion::ForEach(mapping) => {
                    expander.set_resource_for_each(module, &declaration.addr, mapping)
                }
                Expansion::Enabled(enabled) => {
                    expander.set_resource_enabled(module, &declaration.addr, enabled)
                }
            }
        }

        for (declaration, child) in &self.module_calls {
            let Some(expansion) = declaration.repetition.evaluate(diags) else {
                continue;
            };
            let call = &declaration.addr;
            let keys = expansion.instance_keys();
            match expansion {
                Expansion::Single => expander.set_module_single(module, call),
                Expansion::Count(count) => expander.set_module_count(module, call, count),
                Expansion::ForEach(mapping) => expander.set_module_for_each(module, call, mapping),
                Expansion::Enabled(enabled) => expander.set_module_enabled(module, call, enabled),
            }
            for key in keys {
                child.register(expander, &module.child(call.name.clone(), key), diags);
            }
        }
    }
}

impl Repetition {
    fn from_block(block: &Block, filename: &str, diags: &mut Diagnostics) -> Repetition {
        let mut found = vec![];
        for attribute in block.body.attributes() {
            let name = attribute.key.value().as_str();
            if !matches!(name, "count" | "for_each" | "enabled") {
                continue;
            }
            let range = SourceRange::new(filename, attribute.span().unwrap_or_default());
            let expr: hcl::Expression = attribute.value.clone().into();
            found.push(match name {
                "count" => Repetition::Count(expr, range),
                "for_each" => Repetition::ForEach(expr, range),
                _ => Repetition::Enabled(expr, range),
            });
        }

        match found.len() {
            0 => Repetition::Single,
            1 => found.remove(0),
            _ => {
                diags.push(
                    Diagnostic::error(
                        "Invalid combination of repetition arguments",
                        "Only one of \"count\", \"for_each\" and \"enabled\" may be set.",
                    )
                    .with_subject(SourceRange::new(filename, block.span().unwrap_or_default())),
                );
                Repetition::Single
            }
        }
    }

    /// `None` when the argument is invalid; the problem is recorded in `diags`
    fn evaluate(&self, diags: &mut Diagnostics) -> Option<Expansion> {
        let (argument, expr, range) = match self {
            Repetition::Single => return Some(Expansion::Single),
            Repetition::Count(expr, range) => ("count", expr, range),
            Repetition::ForEach(expr, range) => ("for_each", expr, range),
            Repetition::Enabled(expr, range) => ("enabled", expr, range),
        };

        let invalid = |detail: String| {
            Diagnostic::error(format!("Invalid {argument} argument"), detail)
                .with_subject(range.clone())
        };

        let value = match expr.evaluate(&hcl::eval::Context::new()) {
            Ok(value) => Value::from(value),
            Err(err) => {
                diags.push(invalid(format!(
                    "The \"{argument}\" value can not be evaluated: {err}"
                )));
                return None;
            }
        };

        let expansion = match (argument, value) {
            ("count", Value::Number(n)) => match n.as_u64() {
                Some(count) if count > MAX_COUNT => {
                    diags.push(invalid(format!(
                        "The given \"count\" argument value is unsuitable: at most {MAX_COUNT} \
                         instances are supported, but {count} were requested."
                    )));
                    return None;
                }
                Some(count) => match usize::try_from(count) {
                    Ok(count) => Expansion::Count(count),
                    Err(err) => {
                        diags.push(invalid(format!(
                            "The given \"count\" argument value is unsuitable: {err}."
                        )));
                        return None;
                    }
                },
                None => {
                    diags.push(invalid(
                        "The given \"count\" argument value is unsuitable: must be a whole \
                         number, greater than or equal to zero."
                            .into(),
                    ));
                    return None;
                }
            },
            ("for_each", Value::Object(mapping)) => Expansion::ForEach(mapping),
            ("for_each", Value::Tuple(items)) => {
                let mut mapping = IndexMap::new();
                for item in items {
                    let Value::String(key) = item else {
                        diags.push(invalid(
                            "The given \"for_each\" argument value is unsuitable: a set used in \
                             \"for_each\" must only contain strings."
                                .into(),
                        ));
                        return None;
                    };
                    mapping.insert(key.clone(), Value::String(key));
                }
                Expansion::ForEach(mapping)
            }
            ("enabled", Value::Bool(enabled)) => Expansion::Enabled(enabled),
            (argument, value) => {
                let required = match argument {
                    "count" => "a number",
                    "for_each" => "a map, or set of strings",
                    _ => "a bool",
                };
                diags.push(invalid(format!(
                    "The given \"{argument}\" argument value is unsuitable: {required} is \
                     required, but the given value is {}.",
                    value.ty().friendly_name()
                )));
                return None;
            }
        };
        Some(expansion)
    }
}
