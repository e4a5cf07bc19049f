//! Build configuration
//!
//! Process-wide settings injected into every build. Loaded from TOML, with
//! CLI flags taking precedence.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::annotations::keys::DEFAULT_ANNOTATION_PREFIX;
use crate::error::{Error, Result};
use crate::model::{IpAddressType, LoadBalancerScheme};

fn default_lookup_timeout_secs() -> u64 {
    30
}

fn default_annotation_prefix() -> String {
    DEFAULT_ANNOTATION_PREFIX.to_string()
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct BuildConfig {
    /// Name of the Kubernetes cluster, mixed into load balancer names
    #[serde(default)]
    pub cluster_name: String,

    /// VPC that name-tag lookups are scoped to
    #[serde(default)]
    pub vpc_id: String,

    /// Scheme used when no group member sets one
    #[serde(default)]
    pub default_scheme: LoadBalancerScheme,

    /// Address type used when no group member sets one
    #[serde(default)]
    pub default_ip_address_type: IpAddressType,

    #[serde(default = "default_annotation_prefix")]
    pub annotation_prefix: String,

    /// Upper bound for each provider call
    #[serde(default = "default_lookup_timeout_secs")]
    pub lookup_timeout_secs: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            cluster_name: String::new(),
            vpc_id: String::new(),
            default_scheme: LoadBalancerScheme::default(),
            default_ip_address_type: IpAddressType::default(),
            annotation_prefix: default_annotation_prefix(),
            lookup_timeout_secs: default_lookup_timeout_secs(),
        }
    }
}

impl BuildConfig {
    pub fn new(cluster_name: impl Into<String>, vpc_id: impl Into<String>) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            vpc_id: vpc_id.into(),
            ..Default::default()
        }
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::ParseError(format!("invalid config: {e}")))
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cluster_name.trim().is_empty() {
            return Err(Error::ConfigError("cluster_name must not be empty".to_string()));
        }
        if self.vpc_id.trim().is_empty() {
            return Err(Error::ConfigError("vpc_id must not be empty".to_string()));
        }
        if self.annotation_prefix.trim().is_empty() {
            return Err(Error::ConfigError(
                "annotation_prefix must not be empty".to_string(),
            ));
        }
        if self.lookup_timeout_secs == 0 {
            return Err(Error::ConfigError(
                "lookup_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
