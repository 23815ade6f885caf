//! addresses of everything a configuration can declare or refer to
//!
//! Addresses are immutable values. Each kind renders to the string form users see in
//! diagnostics, and that form parses back to the same address. Within a kind, two addresses are
//! the same exactly when their [UniqueKey]s are equal, which is what [Set] is keyed by.
mod deposed_key;
mod function;
mod instance_key;
mod module;
mod module_call;
mod module_instance;
mod module_source;
mod parse_ref;
mod provider;
mod provider_config;
mod referenceable;
mod remove_endpoint;
mod resource;
mod set;
mod unique_key;

pub use deposed_key::{
    new_deposed_key, new_deposed_key_avoiding, parse_deposed_key, DeposedKey, DeposedKeyError,
};
pub use function::{
    parse_function, Function, ProviderFunction, ProviderFunctionError, FUNCTION_NAMESPACES,
    FUNCTION_NAMESPACE_CORE, FUNCTION_NAMESPACE_PROVIDER,
};
pub use instance_key::{
    instance_key_less, parse_instance_key, to_hcl_quoted_string, InstanceKey, InstanceKeyError,
    InstanceKeyType,
};
pub use module::Module;
pub(crate) use module::parse_module_prefix;
pub use module_call::{AbsModuleCall, ModuleCall, ModuleCallInstance, ModuleCallInstanceOutput};
pub use module_instance::{
    parse_module_instance, parse_module_instance_prefix, parse_module_instance_str,
    ModuleInstance, ModuleInstanceStep,
};
pub use module_source::{
    parse_module_source, resolve_relative_module_source, ModuleSource, ModuleSourceError,
};
pub use parse_ref::{
    parse_ref, parse_ref_from_testing_scope, parse_ref_str, parse_ref_str_from_testing_scope,
    RefParser, Reference,
};
pub use provider::{
    parse_provider_source_string, Provider, ProviderSourceError, BUILTIN_PROVIDER_HOST,
    BUILTIN_PROVIDER_NAMESPACE, DEFAULT_PROVIDER_NAMESPACE, DEFAULT_PROVIDER_REGISTRY_HOST,
    LEGACY_PROVIDER_NAMESPACE,
};
pub use provider_config::{
    parse_abs_provider_instance, parse_abs_provider_instance_str,
    parse_keyed_abs_provider_instance, parse_legacy_abs_provider_instance,
    parse_legacy_abs_provider_instance_str, AbsProviderInstance, LocalProviderInstance,
};
pub use referenceable::{
    Check, CountAttr, ForEachAttr, InputVariable, LocalValue, OutputValue, PathAttr,
    Referenceable, TerraformAttr, TerraformIdent,
};
pub use remove_endpoint::{parse_remove_endpoint, RemoveEndpoint, RemoveTarget};
pub use resource::{
    parse_abs_resource_instance, parse_abs_resource_instance_str, parse_config_resource,
    AbsResource, AbsResourceInstance, ConfigResource, Resource, ResourceInstance, ResourceMode,
};
pub(crate) use resource::parse_resource_under_module;
pub use set::Set;
pub(crate) use unique_key::display_unique_key;
pub use unique_key::{UniqueKey, UniqueKeyKind, UniqueKeyer};
