use super::{
    display_unique_key, module::parse_module_prefix, parse_instance_key,
    parse_module_instance_prefix, InstanceKey, Module, ModuleInstance,
};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::traversal::{parse_traversal_abs, Traversal, TraversalStep};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceMode {
    Managed,
    Data,
    Ephemeral,
}

impl ResourceMode {
    fn precedence(self) -> u8 {
        match self {
            ResourceMode::Ephemeral => 0,
            ResourceMode::Data => 1,
            ResourceMode::Managed => 2,
        }
    }
}

impl Ord for ResourceMode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.precedence().cmp(&other.precedence())
    }
}

impl PartialOrd for ResourceMode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A resource block, relative to its module
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resource {
    pub mode: ResourceMode,
    pub type_name: String,
    pub name: String,
}

impl Resource {
    pub fn new(mode: ResourceMode, type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            mode,
            type_name: type_name.into(),
            name: name.into(),
        }
    }

    pub fn instance(&self, key: InstanceKey) -> ResourceInstance {
        ResourceInstance {
            resource: self.clone(),
            key,
        }
    }

    pub fn absolute(&self, module: ModuleInstance) -> AbsResource {
        AbsResource {
            module,
            resource: self.clone(),
        }
    }

    pub fn in_module(&self, module: Module) -> ConfigResource {
        ConfigResource {
            module,
            resource: self.clone(),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            ResourceMode::Managed => write!(f, "{}.{}", self.type_name, self.name),
            ResourceMode::Data => write!(f, "data.{}.{}", self.type_name, self.name),
            ResourceMode::Ephemeral => write!(f, "ephemeral.{}.{}", self.type_name, self.name),
        }
    }
}

impl Ord for Resource {
    fn cmp(&self, other: &Self) -> Ordering {
        self.mode
            .cmp(&other.mode)
            .then_with(|| self.type_name.cmp(&other.type_name))
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for Resource {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceInstance {
    pub resource: Resource,
    pub key: InstanceKey,
}

impl ResourceInstance {
    pub fn containing_resource(&self) -> &Resource {
        &self.resource
    }

    pub fn absolute(&self, module: ModuleInstance) -> AbsResourceInstance {
        AbsResourceInstance {
            module,
            resource: self.clone(),
        }
    }
}

impl fmt::Display for ResourceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.resource, self.key)
    }
}

/// A resource within a particular module instance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AbsResource {
    pub module: ModuleInstance,
    pub resource: Resource,
}

impl AbsResource {
    pub fn instance(&self, key: InstanceKey) -> AbsResourceInstance {
        self.resource.instance(key).absolute(self.module.clone())
    }

    pub fn config(&self) -> ConfigResource {
        self.resource.in_module(self.module.module())
    }
}

impl fmt::Display for AbsResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.module.is_root() {
            write!(f, "{}", self.resource)
        } else {
            write!(f, "{}.{}", self.module, self.resource)
        }
    }
}

impl Ord for AbsResource {
    fn cmp(&self, other: &Self) -> Ordering {
        self.module
            .cmp(&other.module)
            .then_with(|| self.resource.cmp(&other.resource))
    }
}

impl PartialOrd for AbsResource {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A resource instance within a particular module instance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AbsResourceInstance {
    pub module: ModuleInstance,
    pub resource: ResourceInstance,
}

impl AbsResourceInstance {
    pub fn containing_resource(&self) -> AbsResource {
        self.resource.resource.absolute(self.module.clone())
    }
}

impl fmt::Display for AbsResourceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.module.is_root() {
            write!(f, "{}", self.resource)
        } else {
            write!(f, "{}.{}", self.module, self.resource)
        }
    }
}

impl Ord for AbsResourceInstance {
    fn cmp(&self, other: &Self) -> Ordering {
        self.module
            .cmp(&other.module)
            .then_with(|| self.resource.cmp(&other.resource))
    }
}

impl PartialOrd for AbsResourceInstance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A resource within a static module path, i.e. across all instances of that module
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigResource {
    pub module: Module,
    pub resource: Resource,
}

impl ConfigResource {
    pub fn absolute(&self, module: ModuleInstance) -> AbsResource {
        self.resource.absolute(module)
    }
}

impl fmt::Display for ConfigResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.module.is_root() {
            write!(f, "{}", self.resource)
        } else {
            write!(f, "{}.{}", self.module, self.resource)
        }
    }
}

display_unique_key!(
    Resource => Resource,
    ResourceInstance => ResourceInstance,
    AbsResource => AbsResource,
    AbsResourceInstance => AbsResourceInstance,
    ConfigResource => ConfigResource,
);

fn invalid_address(detail: impl Into<String>, step: &TraversalStep) -> Diagnostics {
    Diagnostics::from(
        Diagnostic::error("Invalid address", detail).with_subject(step.source_range().clone()),
    )
}

/// Reads `[data.|ephemeral.]type.name` off the front of `remain`
fn parse_resource_head(remain: &Traversal) -> Result<(Resource, &[TraversalStep]), Diagnostics> {
    let mut steps = remain.steps();
    let mode = match steps.first().and_then(TraversalStep::name) {
        Some("data") => ResourceMode::Data,
        Some("ephemeral") => ResourceMode::Ephemeral,
        _ => ResourceMode::Managed,
    };
    if mode != ResourceMode::Managed {
        steps = &steps[1..];
    }

    if steps.len() < 2 {
        return Err(Diagnostics::from(
            Diagnostic::error(
                "Invalid address",
                "Resource specification must include a resource type and name.",
            )
            .with_subject(remain.source_range()),
        ));
    }

    let Some(type_name) = steps[0].name() else {
        let detail = match mode {
            ResourceMode::Managed => "A resource type name is required.",
            ResourceMode::Data => "A data source name is required.",
            ResourceMode::Ephemeral => "An ephemeral resource type name is required.",
        };
        return Err(invalid_address(detail, &steps[0]));
    };
    let TraversalStep::Attr { name, .. } = &steps[1] else {
        return Err(invalid_address("A resource name is required.", &steps[1]));
    };

    Ok((Resource::new(mode, type_name, name.clone()), &steps[2..]))
}

/// Parses `[module.a[0].]type.name[key]`
pub fn parse_abs_resource_instance(
    traversal: &Traversal,
) -> Result<AbsResourceInstance, Diagnostics> {
    let (module, remain, diags) = parse_module_instance_prefix(traversal.steps());
    if diags.has_errors() {
        return Err(diags);
    }

    if remain.is_relative() {
        return Err(Diagnostics::from(
            Diagnostic::error(
                "Invalid address",
                "Module path must be followed by a resource instance address.",
            )
            .with_subject(traversal.source_range()),
        ));
    }

    let (resource, rest) = parse_resource_head(&remain)?;
    let key = match rest {
        [] => InstanceKey::NoKey,
        [TraversalStep::Index { key, .. }] => parse_instance_key(key).map_err(|err| {
            invalid_address(format!("Invalid resource instance key: {err}."), &rest[0])
        })?,
        [other] => {
            return Err(invalid_address(
                "Resource instance key must be given in square brackets.",
                other,
            ))
        }
        [_, extra, ..] => {
            return Err(invalid_address(
                "Unexpected extra operators after address.",
                extra,
            ))
        }
    };

    Ok(resource.instance(key).absolute(module))
}

pub fn parse_abs_resource_instance_str(src: &str) -> Result<AbsResourceInstance, Diagnostics> {
    parse_abs_resource_instance(&parse_traversal_abs(src, "")?)
}

/// Reads a resource (not instance) address below an already parsed static module path
pub(crate) fn parse_resource_under_module(
    module: Module,
    remain: &Traversal,
) -> Result<ConfigResource, Diagnostics> {
    let (resource, rest) = parse_resource_head(remain)?;
    match rest.first() {
        None => Ok(resource.in_module(module)),
        Some(index @ TraversalStep::Index { .. }) => Err(Diagnostics::from(
            Diagnostic::error(
                "Resource instance address with keys is not allowed",
                "Resource address cannot be a resource instance (e.g. \"null_resource.a[0]\"), \
                 it must be a resource instead (e.g. \"null_resource.a\").",
            )
            .with_subject(index.source_range().clone()),
        )),
        Some(other) => Err(invalid_address(
            "Unexpected extra operators after address.",
            other,
        )),
    }
}

/// Parses `[module.a.]type.name`, a resource across all instances of a static module
pub fn parse_config_resource(traversal: &Traversal) -> Result<ConfigResource, Diagnostics> {
    let (module, remain, diags) = parse_module_prefix(traversal.steps());
    if diags.has_errors() {
        return Err(diags);
    }

    if remain.is_empty() {
        return Err(Diagnostics::from(
            Diagnostic::error(
                "Module address is not allowed",
                "Expected reference to either resource or data block. Provided reference appears \
                 to be a module.",
            )
            .with_subject(traversal.source_range()),
        ));
    }

    parse_resource_under_module(module, &remain)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn error_of<T: fmt::Debug>(result: Result<T, Diagnostics>) -> String {
        result.unwrap_err().err().unwrap().to_string()
    }

    #[test]
    fn ordering_by_mode_type_name() {
        let mut resources = vec![
            Resource::new(ResourceMode::Managed, "b", "a"),
            Resource::new(ResourceMode::Data, "z", "z"),
            Resource::new(ResourceMode::Managed, "a", "b"),
            Resource::new(ResourceMode::Ephemeral, "z", "z"),
            Resource::new(ResourceMode::Managed, "a", "a"),
        ];
        resources.sort();
        assert_eq!(
            resources.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["ephemeral.z.z", "data.z.z", "a.a", "a.b", "b.a"]
        );
    }

    #[test]
    fn parse_abs_resource_instances() {
        for src in [
            "test.a",
            "test.a[0]",
            r#"data.test.a["k"]"#,
            "ephemeral.test.a",
            r#"module.x[1].module.y.test.a["k"]"#,
        ] {
            assert_eq!(parse_abs_resource_instance_str(src).unwrap().to_string(), src);
        }

        let parsed = parse_abs_resource_instance_str("module.x.data.t.n[2]").unwrap();
        assert_eq!(parsed.resource.resource.mode, ResourceMode::Data);
        assert_eq!(parsed.resource.key, InstanceKey::Int(2));
        assert_eq!(parsed.containing_resource().to_string(), "module.x.data.t.n");
        assert_eq!(parsed.containing_resource().config().to_string(), "module.x.data.t.n");
    }

    #[test]
    fn parse_abs_resource_instance_errors() {
        assert_eq!(
            error_of(parse_abs_resource_instance_str("test")),
            "Invalid address: Resource specification must include a resource type and name."
        );
        assert_eq!(
            error_of(parse_abs_resource_instance_str("test.a[0].b")),
            "Invalid address: Unexpected extra operators after address."
        );
        assert_eq!(
            error_of(parse_abs_resource_instance_str("test.a.b")),
            "Invalid address: Resource instance key must be given in square brackets."
        );
        assert_eq!(
            error_of(parse_abs_resource_instance_str("data.test[0]")),
            "Invalid address: A resource name is required."
        );
    }

    #[test]
    fn parse_config_resources() {
        let parse = |src| parse_config_resource(&parse_traversal_abs(src, "").unwrap());
        assert_eq!(
            parse("module.a.module.b.c.d").unwrap().to_string(),
            "module.a.module.b.c.d"
        );
        assert_eq!(
            error_of(parse("module.a.module.b")),
            "Module address is not allowed: Expected reference to either resource or data block. \
             Provided reference appears to be a module."
        );
        assert_eq!(
            error_of(parse("module")),
            "Invalid address operator: Prefix \"module.\" must be followed by a module name."
        );
        assert_eq!(
            error_of(parse("module.a.module.b.c")),
            "Invalid address: Resource specification must include a resource type and name."
        );
        assert_eq!(
            error_of(parse("module.a.module.b.c.d[0]")),
            "Resource instance address with keys is not allowed: Resource address cannot be a \
             resource instance (e.g. \"null_resource.a[0]\"), it must be a resource instead \
             (e.g. \"null_resource.a\")."
        );
    }
}
