//! provider configuration addresses
//!
//! `provider["registry.opentofu.org/hashicorp/aws"].east` names the `east` configuration of the aws
//! provider in the root module. Provider configurations live in static modules: they can not be
//! declared inside a module instance that uses `count` or `for_each`.
use super::{
    display_unique_key, parse_instance_key, parse_module_instance_prefix,
    parse_provider_source_string, to_hcl_quoted_string, InstanceKey, Module, Provider,
};
use crate::diagnostics::{Diagnostic, Diagnostics, SourceRange};
use crate::traversal::{parse_traversal_abs, Traversal, TraversalStep};
use std::fmt;

/// A provider configuration as seen from inside its module, `provider.<local name>[.<alias>]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalProviderInstance {
    pub local_name: String,
    pub alias: String,
}

impl LocalProviderInstance {
    pub fn new(local_name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            alias: alias.into(),
        }
    }

    /// Like the [fmt::Display] form, without the `provider.` prefix
    pub fn string_compact(&self) -> String {
        if self.alias.is_empty() {
            self.local_name.clone()
        } else {
            format!("{}.{}", self.local_name, self.alias)
        }
    }
}

impl fmt::Display for LocalProviderInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "provider.{}", self.string_compact())
    }
}

/// A provider configuration in a particular static module
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AbsProviderInstance {
    pub module: Module,
    pub provider: Provider,
    /// empty for the default configuration
    pub alias: String,
}

impl AbsProviderInstance {
    pub fn new(module: Module, provider: Provider, alias: impl Into<String>) -> Self {
        Self {
            module,
            provider,
            alias: alias.into(),
        }
    }

    /// The configuration this one would inherit from the parent module, if it can inherit at all
    ///
    /// Only default (unaliased) configurations of non-root modules inherit.
    pub fn inherited(&self) -> Option<AbsProviderInstance> {
        if self.module.is_root() || !self.alias.is_empty() {
            return None;
        }
        Some(AbsProviderInstance::new(
            self.module.parent(),
            self.provider.clone(),
            "",
        ))
    }

    /// `[module.a.]provider.<type>[.<alias>]` form used by old state files
    ///
    /// # Panic
    /// Panics if the provider is neither legacy nor builtin.
    pub fn legacy_string(&self) -> String {
        let mut parts = vec![];
        if !self.module.is_root() {
            parts.push(self.module.to_string());
        }
        parts.push("provider".to_string());
        parts.push(self.provider.legacy_string().to_string());
        if !self.alias.is_empty() {
            parts.push(self.alias.clone());
        }
        parts.join(".")
    }

    /// Address of one instance of this configuration
    pub fn instance_string(&self, key: &InstanceKey) -> String {
        format!("{self}{key}")
    }
}

impl fmt::Display for AbsProviderInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.module.is_root() {
            write!(f, "{}.", self.module)?;
        }
        write!(
            f,
            "provider[{}]",
            to_hcl_quoted_string(&self.provider.to_string())
        )?;
        if !self.alias.is_empty() {
            write!(f, ".{}", self.alias)?;
        }
        Ok(())
    }
}

display_unique_key!(AbsProviderInstance => AbsProviderInstance);

fn invalid_provider_address(detail: impl Into<String>, subject: SourceRange) -> Diagnostics {
    Diagnostics::from(
        Diagnostic::error("Invalid provider configuration address", detail).with_subject(subject),
    )
}

/// Reads the static module prefix; provider configurations can not live in module instances
fn parse_provider_module(traversal: &Traversal) -> Result<(Module, Traversal), Diagnostics> {
    let (module_instance, remain, diags) = parse_module_instance_prefix(traversal.steps());
    if diags.has_errors() {
        return Err(diags);
    }
    if module_instance
        .steps()
        .iter()
        .any(|step| !step.instance_key.is_no_key())
    {
        return Err(invalid_provider_address(
            "Provider address cannot contain module indexes",
            traversal.source_range(),
        ));
    }

    if remain.len() < 2 || remain.root_name() != "provider" {
        return Err(invalid_provider_address(
            "Provider address must begin with \"provider.\", followed by a provider type name.",
            remain.source_range(),
        ));
    }

    Ok((module_instance.module(), remain))
}

/// Parses `[module.a.]provider["<source>"][.<alias>][[<key>]]`
///
/// Returns the configuration and the instance key, [InstanceKey::NoKey] if there was none.
pub fn parse_keyed_abs_provider_instance(
    traversal: &Traversal,
) -> Result<(AbsProviderInstance, InstanceKey), Diagnostics> {
    let (module, remain) = parse_provider_module(traversal)?;
    let steps = remain.steps();

    if steps.len() > 4 {
        return Err(invalid_provider_address(
            "Extraneous operators after provider configuration reference.",
            Traversal(steps[4..].to_vec()).source_range(),
        ));
    }

    let provider = match &steps[1] {
        TraversalStep::Index {
            key: crate::value::Value::String(source),
            range,
        } => parse_provider_source_string(source).map_err(|err| {
            Diagnostics::from(
                Diagnostic::error("Invalid provider source string", err.to_string())
                    .with_subject(range.clone()),
            )
        })?,
        other => {
            return Err(invalid_provider_address(
                "The prefix \"provider.\" must be followed by a provider type name.",
                other.source_range().clone(),
            ))
        }
    };

    let parse_key = |key: &crate::value::Value, range: &SourceRange| {
        parse_instance_key(key).map_err(|err| {
            invalid_provider_address(
                format!("Invalid provider instance key: {err}."),
                range.clone(),
            )
        })
    };

    let (alias, key) = match &steps[2..] {
        [] => (String::new(), InstanceKey::NoKey),
        [TraversalStep::Attr { name, .. }] => (name.clone(), InstanceKey::NoKey),
        [TraversalStep::Attr { name, .. }, TraversalStep::Index { key, range }] => {
            (name.clone(), parse_key(key, range)?)
        }
        [TraversalStep::Attr { .. }, other] => {
            return Err(invalid_provider_address(
                "A provider configuration alias can be followed only by an instance key in \
                 brackets.",
                other.source_range().clone(),
            ))
        }
        [other, ..] => {
            return Err(invalid_provider_address(
                "Provider type name must be followed by a configuration alias name.",
                other.source_range().clone(),
            ))
        }
    };

    Ok((AbsProviderInstance::new(module, provider, alias), key))
}

/// Parses `[module.a.]provider["<source>"][.<alias>]`
pub fn parse_abs_provider_instance(
    traversal: &Traversal,
) -> Result<AbsProviderInstance, Diagnostics> {
    let (provider_instance, key) = parse_keyed_abs_provider_instance(traversal)?;
    if !key.is_no_key() {
        return Err(invalid_provider_address(
            "A provider address must not include an instance key.",
            traversal.source_range(),
        ));
    }
    Ok(provider_instance)
}

pub fn parse_abs_provider_instance_str(src: &str) -> Result<AbsProviderInstance, Diagnostics> {
    parse_abs_provider_instance(&parse_traversal_abs(src, "")?)
}

/// Parses the legacy `[module.a.]provider.<type>[.<alias>]` form
///
/// The type `terraform` is the builtin provider, everything else is a legacy provider.
pub fn parse_legacy_abs_provider_instance(
    traversal: &Traversal,
) -> Result<AbsProviderInstance, Diagnostics> {
    let (module, remain) = parse_provider_module(traversal)?;
    let steps = remain.steps();

    if steps.len() > 3 {
        return Err(invalid_provider_address(
            "Extraneous operators after provider configuration alias.",
            Traversal(steps[3..].to_vec()).source_range(),
        ));
    }

    let provider = match &steps[1] {
        TraversalStep::Attr { name, .. } if name == "terraform" => Provider::new_builtin(name),
        TraversalStep::Attr { name, .. } => Provider::new_legacy(name),
        other => {
            return Err(invalid_provider_address(
                "The prefix \"provider.\" must be followed by a provider type name.",
                other.source_range().clone(),
            ))
        }
    };

    let alias = match steps.get(2) {
        None => String::new(),
        Some(TraversalStep::Attr { name, .. }) => name.clone(),
        Some(other) => {
            return Err(invalid_provider_address(
                "Provider type name must be followed by a configuration alias name.",
                other.source_range().clone(),
            ))
        }
    };

    Ok(AbsProviderInstance::new(module, provider, alias))
}

pub fn parse_legacy_abs_provider_instance_str(
    src: &str,
) -> Result<AbsProviderInstance, Diagnostics> {
    parse_legacy_abs_provider_instance(&parse_traversal_abs(src, "")?)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn error_of<T: fmt::Debug>(result: Result<T, Diagnostics>) -> String {
        result.unwrap_err().err().unwrap().to_string()
    }

    #[test]
    fn parse_with_alias() {
        let parsed =
            parse_abs_provider_instance_str(r#"provider["registry.opentofu.org/hashicorp/aws"].foo"#)
                .unwrap();
        assert_eq!(
            parsed,
            AbsProviderInstance::new(
                Module::root(),
                Provider::new("registry.opentofu.org", "hashicorp", "aws"),
                "foo"
            )
        );
        assert_eq!(
            parsed.to_string(),
            r#"provider["registry.opentofu.org/hashicorp/aws"].foo"#
        );
    }

    #[test]
    fn parse_in_module() {
        let parsed = parse_abs_provider_instance_str(r#"module.baz.provider["hashicorp/aws"]"#)
            .unwrap();
        assert_eq!(parsed.module, Module::new(["baz"]));
        assert_eq!(
            parsed.to_string(),
            r#"module.baz.provider["registry.opentofu.org/hashicorp/aws"]"#
        );
        assert_eq!(
            parsed.inherited(),
            Some(AbsProviderInstance::new(
                Module::root(),
                Provider::new_default("aws"),
                ""
            ))
        );
        assert_eq!(
            parse_abs_provider_instance_str(r#"module.baz.provider["aws"].x"#)
                .unwrap()
                .inherited(),
            None
        );
    }

    #[test]
    fn module_indexes_are_rejected() {
        assert_eq!(
            error_of(parse_abs_provider_instance_str(
                r#"module.baz["foo"].provider["registry.opentofu.org/hashicorp/aws"]"#
            )),
            "Invalid provider configuration address: Provider address cannot contain module \
             indexes"
        );
        assert_eq!(
            error_of(parse_legacy_abs_provider_instance_str(
                "module.baz[1].provider.aws"
            )),
            "Invalid provider configuration address: Provider address cannot contain module \
             indexes"
        );
    }

    #[test]
    fn keyed() {
        let (provider_instance, key) = parse_keyed_abs_provider_instance(
            &parse_traversal_abs(r#"provider["hashicorp/aws"].east["a"]"#, "").unwrap(),
        )
        .unwrap();
        assert_eq!(provider_instance.alias, "east");
        assert_eq!(key, InstanceKey::from("a"));
        assert_eq!(
            provider_instance.instance_string(&key),
            r#"provider["registry.opentofu.org/hashicorp/aws"].east["a"]"#
        );

        let (_, key) = parse_keyed_abs_provider_instance(
            &parse_traversal_abs(r#"provider["hashicorp/aws"].east[0]"#, "").unwrap(),
        )
        .unwrap();
        assert_eq!(key, InstanceKey::Int(0));

        // instances only exist for aliased configurations
        assert_eq!(
            error_of(parse_keyed_abs_provider_instance(
                &parse_traversal_abs(r#"provider["hashicorp/aws"][0]"#, "").unwrap(),
            )),
            "Invalid provider configuration address: Provider type name must be followed by a \
             configuration alias name."
        );
        assert_eq!(
            error_of(parse_abs_provider_instance_str(r#"provider["hashicorp/aws"].east[0]"#)),
            "Invalid provider configuration address: A provider address must not include an \
             instance key."
        );
        assert_eq!(
            error_of(parse_abs_provider_instance_str(r#"provider["hashicorp/aws"].a.b"#)),
            "Invalid provider configuration address: A provider configuration alias can be \
             followed only by an instance key in brackets."
        );
        assert_eq!(
            error_of(parse_abs_provider_instance_str(r#"provider["aws"].a[0].b.c"#)),
            "Invalid provider configuration address: Extraneous operators after provider \
             configuration reference."
        );
    }

    #[test]
    fn other_errors() {
        assert_eq!(
            error_of(parse_abs_provider_instance_str("aws.foo")),
            "Invalid provider configuration address: Provider address must begin with \
             \"provider.\", followed by a provider type name."
        );
        assert_eq!(
            error_of(parse_abs_provider_instance_str("provider.aws")),
            "Invalid provider configuration address: The prefix \"provider.\" must be followed \
             by a provider type name."
        );
        assert_eq!(
            error_of(parse_abs_provider_instance_str(r#"provider["a/b/c/d"]"#)),
            "Invalid provider source string: a provider source must be in the format \
             \"[hostname/][namespace/]name\""
        );
    }

    #[test]
    fn legacy() {
        let builtin = parse_legacy_abs_provider_instance_str("provider.terraform").unwrap();
        assert_eq!(builtin.provider, Provider::new_builtin("terraform"));

        let legacy = parse_legacy_abs_provider_instance_str("module.a.provider.aws.west").unwrap();
        assert_eq!(legacy.provider, Provider::new_legacy("aws"));
        assert_eq!(legacy.alias, "west");
        assert_eq!(legacy.legacy_string(), "module.a.provider.aws.west");
        assert_eq!(
            legacy.to_string(),
            r#"module.a.provider["registry.opentofu.org/-/aws"].west"#
        );

        assert_eq!(
            error_of(parse_legacy_abs_provider_instance_str("provider.aws.west.x")),
            "Invalid provider configuration address: Extraneous operators after provider \
             configuration alias."
        );
    }

    #[test]
    fn local_provider_instance() {
        let local = LocalProviderInstance::new("aws", "east");
        assert_eq!(local.to_string(), "provider.aws.east");
        assert_eq!(local.string_compact(), "aws.east");
        assert_eq!(LocalProviderInstance::new("aws", "").string_compact(), "aws");
    }
}
