//! Cloud provider collaborators
//!
//! The builder never talks to the provider API directly. It goes through the
//! traits below, which are implemented by a real EC2-backed client in the
//! surrounding controller, by [`StaticInventory`] for offline rendering, and
//! by fakes in tests.

mod inventory;

pub use inventory::{InventorySecurityGroup, InventorySubnet, StaticInventory};

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{IpAddressType, ListenPortConfig, LoadBalancerScheme};

/// Tag holding the human-readable name of a provider resource
pub const NAME_TAG: &str = "Name";

/// Kind of provider resource a reference token points at
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    Subnet,
    SecurityGroup,
}

impl ReferenceKind {
    /// Prefix shared by every canonical ID of this kind
    pub fn id_prefix(&self) -> &'static str {
        match self {
            ReferenceKind::Subnet => "subnet-",
            ReferenceKind::SecurityGroup => "sg-",
        }
    }
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceKind::Subnet => write!(f, "subnet"),
            ReferenceKind::SecurityGroup => write!(f, "securityGroup"),
        }
    }
}

/// One resource returned by a provider lookup
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderEntry {
    pub id: String,

    /// Failure domain of the resource, when the provider reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,

    /// Value of the resource's `Name` tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ProviderEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            availability_zone: None,
            name: None,
        }
    }

    pub fn in_zone(id: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            availability_zone: Some(zone.into()),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Batched describe calls against the provider
#[async_trait]
pub trait ReferenceLookup: Send + Sync {
    /// Describe resources by canonical ID. IDs that do not exist are absent
    /// from the result. Entries carry their `Name` tag when they have one.
    async fn describe_by_ids(
        &self,
        kind: ReferenceKind,
        vpc_id: &str,
        ids: &[String],
    ) -> anyhow::Result<Vec<ProviderEntry>>;

    /// Describe resources in `vpc_id` whose `Name` tag equals any of `names`.
    /// Every entry carries the `Name` tag it matched on.
    async fn describe_by_name_tags(
        &self,
        kind: ReferenceKind,
        vpc_id: &str,
        names: &[String],
    ) -> anyhow::Result<Vec<ProviderEntry>>;
}

/// Automatic subnet selection used when no member names subnets
#[async_trait]
pub trait SubnetDiscovery: Send + Sync {
    /// Candidate subnets in `vpc_id` for a load balancer of `scheme`
    async fn discover(
        &self,
        vpc_id: &str,
        scheme: LoadBalancerScheme,
    ) -> anyhow::Result<Vec<ProviderEntry>>;
}

/// Create-or-reuse of the security group managed on behalf of the load balancer
#[async_trait]
pub trait SecurityGroupProvisioner: Send + Sync {
    /// Returns the reference the load balancer should attach
    async fn ensure(
        &self,
        listen_ports: &BTreeMap<u16, ListenPortConfig>,
        ip_address_type: IpAddressType,
    ) -> anyhow::Result<String>;
}
