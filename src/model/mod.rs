//! Load balancer model handed to the stack layer
//!
//! Everything in here is plain data. The builder produces it once per group
//! and never mutates it afterwards.

mod load_balancer;

pub use load_balancer::*;
