//! In-memory VPC snapshot
//!
//! Lets the builder run without provider credentials, e.g. to render the
//! desired load balancers of a set of manifests in CI.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::anyhow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{
    ProviderEntry, ReferenceKind, ReferenceLookup, SecurityGroupProvisioner, SubnetDiscovery,
    NAME_TAG,
};
use crate::error::{Error, Result};
use crate::model::{IpAddressType, ListenPortConfig, LoadBalancerScheme};

/// Role tag marking subnets usable by internet-facing load balancers
pub const TAG_ROLE_ELB: &str = "kubernetes.io/role/elb";
/// Role tag marking subnets usable by internal load balancers
pub const TAG_ROLE_INTERNAL_ELB: &str = "kubernetes.io/role/internal-elb";
/// Prefix of the tag that ties a subnet to specific clusters
pub const TAG_CLUSTER_PREFIX: &str = "kubernetes.io/cluster/";

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventorySubnet {
    pub id: String,
    pub vpc_id: String,
    pub availability_zone: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventorySecurityGroup {
    pub id: String,
    pub vpc_id: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// Static snapshot of one VPC
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaticInventory {
    /// VPC the snapshot was taken from; builds default to it when the
    /// configuration names none
    pub vpc_id: String,

    /// Cluster the snapshot is evaluated for; discovery skips subnets tagged
    /// for other clusters only
    #[serde(default)]
    pub cluster_name: String,

    #[serde(default)]
    pub subnets: Vec<InventorySubnet>,

    #[serde(default)]
    pub security_groups: Vec<InventorySecurityGroup>,

    /// ID handed out when the load balancer needs a managed security group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_security_group: Option<String>,
}

impl StaticInventory {
    /// Load a snapshot from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw)
            .map_err(|e| Error::ParseError(format!("invalid inventory: {e}")))
    }

    pub fn with_cluster_name(mut self, cluster_name: impl Into<String>) -> Self {
        self.cluster_name = cluster_name.into();
        self
    }

    fn entries(&self, kind: ReferenceKind, vpc_id: &str) -> Vec<(ProviderEntry, &BTreeMap<String, String>)> {
        match kind {
            ReferenceKind::Subnet => self
                .subnets
                .iter()
                .filter(|s| s.vpc_id == vpc_id)
                .map(|s| {
                    (
                        named(ProviderEntry::in_zone(&s.id, &s.availability_zone), &s.tags),
                        &s.tags,
                    )
                })
                .collect(),
            ReferenceKind::SecurityGroup => self
                .security_groups
                .iter()
                .filter(|sg| sg.vpc_id == vpc_id)
                .map(|sg| (named(ProviderEntry::new(&sg.id), &sg.tags), &sg.tags))
                .collect(),
        }
    }

    fn usable_by_cluster(&self, subnet: &InventorySubnet) -> bool {
        let own_tag = format!("{TAG_CLUSTER_PREFIX}{}", self.cluster_name);
        let mut cluster_tags = subnet
            .tags
            .keys()
            .filter(|key| key.starts_with(TAG_CLUSTER_PREFIX))
            .peekable();
        cluster_tags.peek().is_none() || cluster_tags.any(|key| *key == own_tag)
    }
}

fn named(entry: ProviderEntry, tags: &BTreeMap<String, String>) -> ProviderEntry {
    match tags.get(NAME_TAG) {
        Some(name) => entry.with_name(name),
        None => entry,
    }
}

#[async_trait]
impl ReferenceLookup for StaticInventory {
    async fn describe_by_ids(
        &self,
        kind: ReferenceKind,
        vpc_id: &str,
        ids: &[String],
    ) -> anyhow::Result<Vec<ProviderEntry>> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        Ok(self
            .entries(kind, vpc_id)
            .into_iter()
            .filter(|(entry, _)| wanted.contains(entry.id.as_str()))
            .map(|(entry, _)| entry)
            .collect())
    }

    async fn describe_by_name_tags(
        &self,
        kind: ReferenceKind,
        vpc_id: &str,
        names: &[String],
    ) -> anyhow::Result<Vec<ProviderEntry>> {
        let wanted: HashSet<&str> = names.iter().map(String::as_str).collect();
        Ok(self
            .entries(kind, vpc_id)
            .into_iter()
            .filter(|(_, tags)| {
                tags.get(NAME_TAG)
                    .is_some_and(|name| wanted.contains(name.as_str()))
            })
            .map(|(entry, _)| entry)
            .collect())
    }
}

#[async_trait]
impl SubnetDiscovery for StaticInventory {
    async fn discover(
        &self,
        vpc_id: &str,
        scheme: LoadBalancerScheme,
    ) -> anyhow::Result<Vec<ProviderEntry>> {
        let role_tag = match scheme {
            LoadBalancerScheme::InternetFacing => TAG_ROLE_ELB,
            LoadBalancerScheme::Internal => TAG_ROLE_INTERNAL_ELB,
        };

        // One subnet per zone, smallest ID wins.
        let mut by_zone: BTreeMap<&str, &str> = BTreeMap::new();
        for subnet in &self.subnets {
            if subnet.vpc_id != vpc_id
                || !subnet.tags.contains_key(role_tag)
                || !self.usable_by_cluster(subnet)
            {
                continue;
            }
            by_zone
                .entry(subnet.availability_zone.as_str())
                .and_modify(|chosen| {
                    if subnet.id.as_str() < *chosen {
                        *chosen = subnet.id.as_str();
                    }
                })
                .or_insert(subnet.id.as_str());
        }

        debug!(%scheme, vpc_id, zones = by_zone.len(), "Discovered subnets from inventory");
        Ok(by_zone
            .into_iter()
            .map(|(zone, id)| ProviderEntry::in_zone(id, zone))
            .collect())
    }
}

#[async_trait]
impl SecurityGroupProvisioner for StaticInventory {
    async fn ensure(
        &self,
        listen_ports: &BTreeMap<u16, ListenPortConfig>,
        ip_address_type: IpAddressType,
    ) -> anyhow::Result<String> {
        let sg = self
            .managed_security_group
            .clone()
            .ok_or_else(|| anyhow!("inventory has no managedSecurityGroup"))?;
        info!(
            security_group = %sg,
            ports = ?listen_ports.keys().collect::<Vec<_>>(),
            %ip_address_type,
            "Using managed security group from inventory"
        );
        Ok(sg)
    }
}
