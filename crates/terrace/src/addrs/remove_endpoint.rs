//! targets of `removed` blocks
use super::{parse_module_prefix, parse_resource_under_module, ConfigResource, Module, ResourceMode};
use crate::diagnostics::{Diagnostic, Diagnostics, SourceRange};
use crate::traversal::Traversal;
use std::fmt;

/// What a `removed` block can forget: a whole module or a whole resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RemoveTarget {
    Module(Module),
    Resource(ConfigResource),
}

impl fmt::Display for RemoveTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoveTarget::Module(module) => fmt::Display::fmt(module, f),
            RemoveTarget::Resource(resource) => fmt::Display::fmt(resource, f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveEndpoint {
    /// relative to the module the `removed` block is declared in
    pub rel_subject: RemoveTarget,
    pub source_range: SourceRange,
}

pub fn parse_remove_endpoint(traversal: &Traversal) -> Result<RemoveEndpoint, Diagnostics> {
    let source_range = traversal.source_range();
    let (module, remain, diags) = parse_module_prefix(traversal.steps());
    if diags.has_errors() {
        return Err(diags);
    }

    if remain.is_empty() {
        return Ok(RemoveEndpoint {
            rel_subject: RemoveTarget::Module(module),
            source_range,
        });
    }

    let resource = parse_resource_under_module(module, &remain)?;
    let rejected = match resource.resource.mode {
        ResourceMode::Managed => None,
        ResourceMode::Data => Some((
            "Data source address is not allowed",
            "Data sources cannot be destroyed, and therefore, 'removed' blocks are not allowed to \
             target them. To remove data sources from the state, you should remove the data \
             source block from the configuration.",
        )),
        ResourceMode::Ephemeral => Some((
            "Ephemeral resource address is not allowed",
            "Ephemeral resources cannot be destroyed, and therefore, 'removed' blocks are not \
             allowed to target them. To remove ephemeral resources from the state, you should \
             remove the ephemeral resource block from the configuration.",
        )),
    };
    if let Some((summary, detail)) = rejected {
        return Err(Diagnostics::from(
            Diagnostic::error(summary, detail).with_subject(source_range),
        ));
    }

    Ok(RemoveEndpoint {
        rel_subject: RemoveTarget::Resource(resource),
        source_range,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::addrs::Resource;
    use crate::traversal::parse_traversal_abs;
    use pretty_assertions::assert_eq;

    fn parse(src: &str) -> Result<RemoveTarget, String> {
        let traversal = parse_traversal_abs(src, "").unwrap();
        parse_remove_endpoint(&traversal)
            .map(|endpoint| endpoint.rel_subject)
            .map_err(|diags| diags.err().unwrap().to_string())
    }

    #[test]
    fn targets() {
        assert_eq!(
            parse("foo.bar"),
            Ok(RemoveTarget::Resource(
                Resource::new(ResourceMode::Managed, "foo", "bar").in_module(Module::root())
            ))
        );
        assert_eq!(
            parse("module.foo.module.bar"),
            Ok(RemoveTarget::Module(Module::new(["foo", "bar"])))
        );
        assert_eq!(
            parse("module.boop.module.bip.foo.bar").unwrap().to_string(),
            "module.boop.module.bip.foo.bar"
        );
    }

    #[test]
    fn rejections() {
        const RESOURCE_KEYS: &str = "Resource instance address with keys is not allowed: \
            Resource address cannot be a resource instance (e.g. \"null_resource.a[0]\"), it \
            must be a resource instead (e.g. \"null_resource.a\").";
        const MODULE_KEYS: &str = "Module instance address with keys is not allowed: Module \
            address cannot be a module instance (e.g. \"module.a[0]\"), it must be a module \
            instead (e.g. \"module.a\").";

        let cases = [
            ("foo.bar[0]", RESOURCE_KEYS),
            (r#"module.boop.foo.bar["a"]"#, RESOURCE_KEYS),
            ("data.foo.bar[0]", RESOURCE_KEYS),
            (r#"ephemeral.foo.bar["a"]"#, RESOURCE_KEYS),
            ("module.foo[0]", MODULE_KEYS),
            ("module.foo.module.bar[1]", MODULE_KEYS),
            (
                "module",
                "Invalid address operator: Prefix \"module.\" must be followed by a module name.",
            ),
            (
                "module[0]",
                "Invalid address operator: Prefix \"module.\" must be followed by a module name.",
            ),
            (
                "module.foo.data.bar",
                "Invalid address: Resource specification must include a resource type and name.",
            ),
            (
                "module.foo.ephemeral[0]",
                "Invalid address: Resource specification must include a resource type and name.",
            ),
            ("module.foo.bar[0]", "Invalid address: A resource name is required."),
        ];
        for (src, want) in cases {
            assert_eq!(parse(src), Err(want.to_string()), "{src}");
        }
    }

    #[test]
    fn data_and_ephemeral_are_not_removable() {
        insta::assert_snapshot!(parse("data.foo.bar").unwrap_err(), @"Data source address is not allowed: Data sources cannot be destroyed, and therefore, 'removed' blocks are not allowed to target them. To remove data sources from the state, you should remove the data source block from the configuration.");
        insta::assert_snapshot!(parse("ephemeral.foo.bar").unwrap_err(), @"Ephemeral resource address is not allowed: Ephemeral resources cannot be destroyed, and therefore, 'removed' blocks are not allowed to target them. To remove ephemeral resources from the state, you should remove the ephemeral resource block from the configuration.");
    }
}
