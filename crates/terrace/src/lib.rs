//! # terrace - addresses, instances and scopes for infrastructure configuration
//!
//! `terrace` is the core an infrastructure-as-code engine needs between "parsed configuration" and
//! "evaluated values": what the things in a configuration are called, which of them exist once
//! `count`, `for_each` and `enabled` are taken into account, and what an expression referring to
//! them evaluates to.
//!
//! ## Introduction for developers
//!
//! ### Addresses
//!
//! Everything that can be declared or referred to has an address type in [addrs]. A few examples:
//!
//! | address                                     | type                                  |
//! |---------------------------------------------|---------------------------------------|
//! | `module.net`                                | [addrs::Module] (static)              |
//! | `module.net["a"]`                           | [addrs::ModuleInstance]               |
//! | `aws_instance.web`                          | [addrs::Resource]                     |
//! | `module.net["a"].aws_instance.web[0]`       | [addrs::AbsResourceInstance]          |
//! | `provider["registry.opentofu.org/hashicorp/aws"].east` | [addrs::AbsProviderInstance] |
//!
//! Addresses render to exactly the strings users write and parse back from them. They are
//! parsed from a [traversal::Traversal], the `a.b[0].c` shape of HCL, and anything that goes
//! wrong is reported as [diagnostics::Diagnostics] pointing at the offending step.
//!
//! [addrs::parse_ref] is the entry point for expressions: it turns `aws_instance.web[0].id` into a
//! [addrs::Reference] whose subject is the instance and whose remaining steps are `.id`.
//!
//! ### Expansion
//!
//! [instances::Expander] records, top-down, how each module call and resource repeats. Once a
//! parent is registered its children can be, and queries answer which instances exist. The
//! registration order is a contract: breaking it panics, because it means the caller walked
//! the configuration in the wrong order.
//!
//! ### Evaluation
//!
//! A [lang::Scope] evaluates expressions. It collects the references of an expression, asks a
//! [lang::Data] implementation for their values and binds those the way the reference syntax
//! reads (`local.a` and `local.b` end up in one `local` object). Values may be unknown
//! ([value::Value::Unknown]); anything computed from an unknown value is unknown as well.
//!
//! ### Request graph failures
//!
//! [grapheval] turns the failures of the request graph that drives evaluation into diagnostics.
pub mod addrs;
pub mod diagnostics;
pub mod grapheval;
pub mod instances;
pub mod lang;
pub mod traversal;
pub mod value;
mod visit;
