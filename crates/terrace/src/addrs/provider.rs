use std::fmt;

pub const DEFAULT_PROVIDER_REGISTRY_HOST: &str = "registry.opentofu.org";
pub const DEFAULT_PROVIDER_NAMESPACE: &str = "hashicorp";
pub const BUILTIN_PROVIDER_HOST: &str = "terraform.io";
pub const BUILTIN_PROVIDER_NAMESPACE: &str = "builtin";
/// Namespace of providers from state written before providers had namespaces
pub const LEGACY_PROVIDER_NAMESPACE: &str = "-";

/// Fully qualified provider type, `hostname/namespace/type`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Provider {
    pub hostname: String,
    pub namespace: String,
    pub type_name: String,
}

impl Provider {
    pub fn new(
        hostname: impl Into<String>,
        namespace: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            namespace: namespace.into(),
            type_name: type_name.into(),
        }
    }

    /// `registry.opentofu.org/hashicorp/<type>`
    pub fn new_default(type_name: impl Into<String>) -> Self {
        Self::new(
            DEFAULT_PROVIDER_REGISTRY_HOST,
            DEFAULT_PROVIDER_NAMESPACE,
            type_name,
        )
    }

    /// `terraform.io/builtin/<type>`
    pub fn new_builtin(type_name: impl Into<String>) -> Self {
        Self::new(BUILTIN_PROVIDER_HOST, BUILTIN_PROVIDER_NAMESPACE, type_name)
    }

    /// `registry.opentofu.org/-/<type>`
    pub fn new_legacy(type_name: impl Into<String>) -> Self {
        Self::new(
            DEFAULT_PROVIDER_REGISTRY_HOST,
            LEGACY_PROVIDER_NAMESPACE,
            type_name,
        )
    }

    pub fn is_builtin(&self) -> bool {
        self.hostname == BUILTIN_PROVIDER_HOST && self.namespace == BUILTIN_PROVIDER_NAMESPACE
    }

    pub fn is_legacy(&self) -> bool {
        self.hostname == DEFAULT_PROVIDER_REGISTRY_HOST
            && self.namespace == LEGACY_PROVIDER_NAMESPACE
    }

    /// Short form, omitting the default registry host
    pub fn for_display(&self) -> String {
        if self.hostname == DEFAULT_PROVIDER_REGISTRY_HOST {
            format!("{}/{}", self.namespace, self.type_name)
        } else {
            self.to_string()
        }
    }

    /// Bare type name, as written by versions that had no provider namespaces
    ///
    /// # Panic
    /// Panics for providers that are neither legacy nor builtin.
    pub fn legacy_string(&self) -> &str {
        if !self.is_legacy() && !self.is_builtin() {
            panic!("cannot produce a legacy string for non-legacy provider {self}");
        }
        &self.type_name
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.hostname, self.namespace, self.type_name)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderSourceError {
    #[error("a provider source must be in the format \"[hostname/][namespace/]name\"")]
    InvalidFormat,
    #[error("invalid provider {part} {value:?}: {reason}")]
    InvalidPart {
        part: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Parses `[hostname/][namespace/]type`
///
/// A bare type name belongs to the default namespace on the default registry.
pub fn parse_provider_source_string(src: &str) -> Result<Provider, ProviderSourceError> {
    let parts: Vec<&str> = src.split('/').collect();
    let (hostname, namespace, type_name) = match parts.as_slice() {
        [type_name] => (
            DEFAULT_PROVIDER_REGISTRY_HOST.to_string(),
            DEFAULT_PROVIDER_NAMESPACE.to_string(),
            type_name,
        ),
        [namespace, type_name] => (
            DEFAULT_PROVIDER_REGISTRY_HOST.to_string(),
            parse_namespace(namespace)?,
            type_name,
        ),
        [hostname, namespace, type_name] => (
            parse_hostname(hostname)?,
            parse_namespace(namespace)?,
            type_name,
        ),
        _ => return Err(ProviderSourceError::InvalidFormat),
    };
    let type_name = parse_provider_part("type", type_name)?;

    Ok(Provider {
        hostname,
        namespace,
        type_name,
    })
}

fn parse_namespace(given: &str) -> Result<String, ProviderSourceError> {
    if given == LEGACY_PROVIDER_NAMESPACE {
        return Ok(given.to_string());
    }
    parse_provider_part("namespace", given)
}

fn parse_provider_part(part: &'static str, given: &str) -> Result<String, ProviderSourceError> {
    let invalid = |reason| ProviderSourceError::InvalidPart {
        part,
        value: given.to_string(),
        reason,
    };

    if given.is_empty() {
        return Err(invalid("must have at least one character"));
    }
    if !given.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
        return Err(invalid(
            "must contain only letters, digits, dashes, and underscores",
        ));
    }
    if given.starts_with('-') || given.ends_with('-') {
        return Err(invalid("may not start or end with a dash"));
    }
    if given.contains("--") {
        return Err(invalid("cannot use multiple consecutive dashes"));
    }
    Ok(given.to_lowercase())
}

fn parse_hostname(given: &str) -> Result<String, ProviderSourceError> {
    let valid = !given.is_empty()
        && given
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | ':'));
    if !valid {
        return Err(ProviderSourceError::InvalidPart {
            part: "hostname",
            value: given.to_string(),
            reason: "must be a valid hostname",
        });
    }
    Ok(given.to_lowercase())
}
