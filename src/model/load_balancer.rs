use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Stack resource ID of the load balancer built for a group
pub const RESOURCE_ID_LOAD_BALANCER: &str = "LoadBalancer";

/// Whether the load balancer is reachable from the internet
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadBalancerScheme {
    #[serde(rename = "internet-facing")]
    InternetFacing,
    #[default]
    #[serde(rename = "internal")]
    Internal,
}

impl LoadBalancerScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadBalancerScheme::InternetFacing => "internet-facing",
            LoadBalancerScheme::Internal => "internal",
        }
    }
}

impl std::fmt::Display for LoadBalancerScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadBalancerScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "internet-facing" => Ok(LoadBalancerScheme::InternetFacing),
            "internal" => Ok(LoadBalancerScheme::Internal),
            other => Err(other.to_string()),
        }
    }
}

/// Address families the load balancer listens on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpAddressType {
    #[default]
    #[serde(rename = "ipv4")]
    Ipv4,
    #[serde(rename = "dualstack")]
    DualStack,
}

impl IpAddressType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IpAddressType::Ipv4 => "ipv4",
            IpAddressType::DualStack => "dualstack",
        }
    }
}

impl std::fmt::Display for IpAddressType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IpAddressType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ipv4" => Ok(IpAddressType::Ipv4),
            "dualstack" => Ok(IpAddressType::DualStack),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadBalancerType {
    #[default]
    #[serde(rename = "application")]
    Application,
}

/// Placement of the load balancer in one subnet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetMapping {
    pub subnet_id: String,

    /// Availability zone reported by the provider for the subnet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerAttribute {
    pub key: String,
    pub value: String,
}

/// Fully-resolved desired state of the load balancer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: LoadBalancerType,
    pub scheme: LoadBalancerScheme,
    pub ip_address_type: IpAddressType,
    pub subnet_mappings: Vec<SubnetMapping>,
    pub security_groups: Vec<String>,
    /// Sorted by key
    pub load_balancer_attributes: Vec<LoadBalancerAttribute>,
    pub tags: BTreeMap<String, String>,
}

/// Where a reference field of the spec came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionSource {
    /// Listed explicitly by at least one group member
    Explicit,
    /// Picked by subnet auto-discovery
    Discovered,
    /// The security group managed on behalf of the load balancer
    Managed,
}

impl std::fmt::Display for SelectionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionSource::Explicit => write!(f, "Explicit"),
            SelectionSource::Discovered => write!(f, "Discovered"),
            SelectionSource::Managed => write!(f, "Managed"),
        }
    }
}

/// Load balancer resource as registered in the stack
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancer {
    pub resource_id: String,
    pub spec: LoadBalancerSpec,
    pub subnet_source: SelectionSource,
    pub security_group_source: SelectionSource,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    #[default]
    #[serde(rename = "HTTP")]
    Http,
    #[serde(rename = "HTTPS")]
    Https,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Http => write!(f, "HTTP"),
            Protocol::Https => write!(f, "HTTPS"),
        }
    }
}

/// Listener settings for one port, consumed by the managed security group
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenPortConfig {
    #[serde(default)]
    pub protocol: Protocol,
    #[serde(default)]
    pub inbound_cidrs_v4: Vec<String>,
    #[serde(default)]
    pub inbound_cidrs_v6: Vec<String>,
}

/// Single HTTP listener on port 80 open to the world
pub fn default_listen_ports() -> BTreeMap<u16, ListenPortConfig> {
    let mut ports = BTreeMap::new();
    ports.insert(
        80,
        ListenPortConfig {
            protocol: Protocol::Http,
            inbound_cidrs_v4: vec!["0.0.0.0/0".to_string()],
            inbound_cidrs_v6: vec!["::/0".to_string()],
        },
    );
    ports
}
