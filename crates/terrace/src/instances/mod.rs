//! expanding `count`, `for_each` and `enabled` into instances
//!
//! The [Expander] is filled while walking the configuration top-down, then answers which module
//! and resource instances exist. [config_tree] builds and fills one from an HCL file.
pub mod config_tree;
mod expander;
mod expansion;
mod set;

pub use expander::Expander;
pub use expansion::{Expansion, RepetitionData};
pub use set::Set;
