//! Load balancer spec builder
//!
//! Turns the annotations of an Ingress group into one [`LoadBalancerSpec`]:
//!
//! - [`merge`] combines each field across group members
//! - [`name`] derives the load balancer name
//! - [`resolver`] turns subnet and security group names into IDs
//! - [`selection`] picks explicit references or a fallback
//! - [`ModelBuilder`] runs all of the above for a group
//!
//! [`LoadBalancerSpec`]: crate::model::LoadBalancerSpec

mod assembler;
#[cfg(test)]
pub(crate) mod fakes;
pub mod merge;
pub mod name;
pub mod resolver;
#[cfg(test)]
mod resolver_test;
pub mod selection;
mod upstream;

pub use assembler::ModelBuilder;
pub use merge::{FieldDescriptor, MergePolicy, MergedValue};
pub use name::build_load_balancer_name;
pub use resolver::{ReferenceResolver, ReferenceToken};
pub use selection::{Selection, SelectionPolicy, MIN_DISCOVERED_ZONES};
