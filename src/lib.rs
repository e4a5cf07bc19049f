//! lb-spec-builder: desired load balancer specs for Ingress groups
//!
//! This crate merges the annotations of grouped Kubernetes Ingresses into one
//! fully-resolved application load balancer spec. It resolves subnet and
//! security group references through pluggable provider collaborators and
//! never mutates provider state itself.

pub mod annotations;
pub mod builder;
pub mod cloud;
pub mod config;
pub mod error;
pub mod ingress;
pub mod model;

pub use crate::builder::ModelBuilder;
pub use crate::config::BuildConfig;
pub use crate::error::{Error, Result};
