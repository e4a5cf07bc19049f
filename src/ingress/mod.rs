//! Ingress groups and the configuration sources they carry

mod group;
mod manifest;

pub use group::{
    group_ingresses, ConfigurationSource, GroupIdentity, IngressGroup, MAX_GROUP_NAME_LENGTH,
    MAX_GROUP_ORDER, MIN_GROUP_ORDER,
};
pub use manifest::load_ingresses_from_yaml;
