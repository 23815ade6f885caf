use super::display_unique_key;
use std::fmt;

pub const FUNCTION_NAMESPACE_PROVIDER: &str = "provider";
pub const FUNCTION_NAMESPACE_CORE: &str = "core";
pub const FUNCTION_NAMESPACES: [&str; 2] = [FUNCTION_NAMESPACE_PROVIDER, FUNCTION_NAMESPACE_CORE];

/// A possibly namespaced function name such as `provider::aws::arn_parse`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Function {
    pub namespaces: Vec<String>,
    pub name: String,
}

/// Splits a function name on `::`
pub fn parse_function(input: &str) -> Function {
    let mut parts: Vec<String> = input.split("::").map(str::to_owned).collect();
    let name = parts.pop().unwrap_or_default();
    Function {
        namespaces: parts,
        name,
    }
}

impl Function {
    pub fn is_namespace(&self, namespace: &str) -> bool {
        self.namespaces.first().map(String::as_str) == Some(namespace)
    }

    /// # Panic
    /// Panics if the function is not in the `provider` namespace.
    pub fn as_provider_function(&self) -> Result<ProviderFunction, ProviderFunctionError> {
        if !self.is_namespace(FUNCTION_NAMESPACE_PROVIDER) {
            panic!("non-provider function {self}");
        }

        let (provider_name, provider_alias) = match self.namespaces.as_slice() {
            [_, name] => (name.clone(), String::new()),
            [_, name, alias] => (name.clone(), alias.clone()),
            _ => return Err(ProviderFunctionError::InvalidFormat(self.to_string())),
        };

        Ok(ProviderFunction {
            provider_name,
            provider_alias,
            function: self.name.clone(),
        })
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for namespace in &self.namespaces {
            write!(f, "{namespace}::")?;
        }
        f.write_str(&self.name)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderFunctionError {
    #[error(
        "invalid provider function {0:?}: expected provider::<name>::<function> or \
         provider::<name>::<alias>::<function>"
    )]
    InvalidFormat(String),
}

/// `provider::<name>[::<alias>]::<function>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderFunction {
    pub provider_name: String,
    /// empty when the default provider configuration is meant
    pub provider_alias: String,
    pub function: String,
}

impl fmt::Display for ProviderFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.provider_alias.is_empty() {
            write!(f, "provider::{}::{}", self.provider_name, self.function)
        } else {
            write!(
                f,
                "provider::{}::{}::{}",
                self.provider_name, self.provider_alias, self.function
            )
        }
    }
}

display_unique_key!(ProviderFunction => ProviderFunction);
