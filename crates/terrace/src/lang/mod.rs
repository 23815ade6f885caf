//! expression evaluation
//!
//! A [Scope] turns the references in an expression into variable bindings by asking a [Data]
//! implementation for their values, then evaluates the expression with [hcl::eval].
//!
//! Bindings mirror the reference syntax: every `local.X` reference ends up in one `local`
//! object, managed resources are bound under their type name (and again under `resource`), and
//! so on. A reference to one instance (`aws_instance.web[0]`) binds the whole resource, the
//! index is applied by the expression itself.
//!
//! ```
//! # use terrace::lang::*;
//! # use terrace::addrs::*;
//! # use terrace::diagnostics::{Diagnostics, SourceRange};
//! # use terrace::value::{Type, Value};
//! struct Locals;
//!
//! impl Data for Locals {
//!     fn static_validate_references(&self, _: &[Reference], _: Option<&Referenceable>, _: Option<&Referenceable>) -> Diagnostics {
//!         Diagnostics::new()
//!     }
//!     fn get_local_value(&self, addr: &LocalValue, _: &SourceRange) -> (Value, Diagnostics) {
//!         (Value::from(format!("value of {}", addr.name)), Diagnostics::new())
//!     }
//! #   fn get_count_attr(&self, _: &CountAttr, _: &SourceRange) -> (Value, Diagnostics) { unimplemented!() }
//! #   fn get_for_each_attr(&self, _: &ForEachAttr, _: &SourceRange) -> (Value, Diagnostics) { unimplemented!() }
//! #   fn get_resource(&self, _: &Resource, _: &SourceRange) -> (Value, Diagnostics) { unimplemented!() }
//! #   fn get_module(&self, _: &ModuleCall, _: &SourceRange) -> (Value, Diagnostics) { unimplemented!() }
//! #   fn get_path_attr(&self, _: &PathAttr, _: &SourceRange) -> (Value, Diagnostics) { unimplemented!() }
//! #   fn get_terraform_attr(&self, _: &TerraformAttr, _: &SourceRange) -> (Value, Diagnostics) { unimplemented!() }
//! #   fn get_input_variable(&self, _: &InputVariable, _: &SourceRange) -> (Value, Diagnostics) { unimplemented!() }
//! #   fn get_output(&self, _: &OutputValue, _: &SourceRange) -> (Value, Diagnostics) { unimplemented!() }
//! #   fn get_check_block(&self, _: &Check, _: &SourceRange) -> (Value, Diagnostics) { unimplemented!() }
//! }
//!
//! let expr: hcl::Expression = "upper(local.name)".parse::<hcl_edit::expr::Expression>()?.into();
//! let (value, diags) = Scope::new(&Locals).eval_expr(&expr, &Type::String);
//! assert!(diags.is_empty());
//! assert_eq!(value, Value::from("VALUE OF NAME"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
mod data;
mod eval;
mod functions;
mod references;
mod scope;
#[cfg(test)]
pub(crate) mod testing;

pub use data::Data;
pub use eval::enhance_function_diags;
pub use functions::{Function, Functions};
pub use references::{references_in_body, references_in_expr};
pub use scope::{EvalContext, ProviderFunctions, Scope, ScopeOptions};
