//! Explicit configuration vs fallback, per reference field
//!
//! A reference field is either fully explicit (every member that sets it
//! agrees on a list, which is resolved) or fully derived (subnet discovery,
//! managed security group). The two are never mixed.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use tracing::{info, instrument, warn};

use super::resolver::ReferenceResolver;
use super::upstream::call_upstream;
use crate::cloud::{
    ReferenceKind, ReferenceLookup, SecurityGroupProvisioner, SubnetDiscovery,
};
use crate::error::{Error, Result};
use crate::model::{
    IpAddressType, ListenPortConfig, LoadBalancerScheme, SelectionSource, SubnetMapping,
};

/// Fallback placement needs this many distinct availability zones
pub const MIN_DISCOVERED_ZONES: usize = 2;

/// A resolved reference field together with where it came from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection<T> {
    /// Resolved from the tokens the group members listed
    Explicit { tokens: Vec<String>, value: T },
    /// Produced by a fallback collaborator
    Derived { source: SelectionSource, value: T },
}

impl<T> Selection<T> {
    pub fn value(&self) -> &T {
        match self {
            Selection::Explicit { value, .. } | Selection::Derived { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Selection::Explicit { value, .. } | Selection::Derived { value, .. } => value,
        }
    }

    pub fn source(&self) -> SelectionSource {
        match self {
            Selection::Explicit { .. } => SelectionSource::Explicit,
            Selection::Derived { source, .. } => *source,
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, Selection::Explicit { .. })
    }
}

/// Chooses subnets and security groups for one build
pub struct SelectionPolicy<'a> {
    resolver: ReferenceResolver<'a>,
    discovery: &'a dyn SubnetDiscovery,
    provisioner: &'a dyn SecurityGroupProvisioner,
    vpc_id: &'a str,
    timeout: Duration,
}

impl<'a> SelectionPolicy<'a> {
    pub fn new(
        lookup: &'a dyn ReferenceLookup,
        discovery: &'a dyn SubnetDiscovery,
        provisioner: &'a dyn SecurityGroupProvisioner,
        vpc_id: &'a str,
        timeout: Duration,
    ) -> Self {
        Self {
            resolver: ReferenceResolver::new(lookup, vpc_id, timeout),
            discovery,
            provisioner,
            vpc_id,
            timeout,
        }
    }

    /// Subnets from the merged `subnets` list, or discovery when unset
    #[instrument(skip(self, explicit), fields(explicit = explicit.is_some()))]
    pub async fn select_subnets(
        &self,
        explicit: Option<Vec<String>>,
        scheme: LoadBalancerScheme,
    ) -> Result<Selection<Vec<SubnetMapping>>> {
        if let Some(tokens) = explicit {
            require_tokens("subnets", &tokens)?;
            let resolved = self.resolver.resolve(ReferenceKind::Subnet, &tokens).await?;
            let value = resolved
                .into_iter()
                .map(|entry| SubnetMapping {
                    subnet_id: entry.id,
                    availability_zone: entry.availability_zone,
                })
                .collect();
            return Ok(Selection::Explicit { tokens, value });
        }

        let discovered = call_upstream(
            "discover subnets",
            self.timeout,
            self.discovery.discover(self.vpc_id, scheme),
        )
        .await?;

        let mut zones = HashSet::new();
        let mut value = Vec::new();
        for entry in &discovered {
            let Some(zone) = entry.availability_zone.as_deref() else {
                warn!(subnet = %entry.id, "Discovered subnet has no availability zone, skipping");
                continue;
            };
            if zones.insert(zone) {
                value.push(SubnetMapping {
                    subnet_id: entry.id.clone(),
                    availability_zone: Some(zone.to_string()),
                });
            }
        }

        if value.len() < MIN_DISCOVERED_ZONES {
            return Err(Error::InsufficientPlacement {
                found: discovered.into_iter().map(|entry| entry.id).collect(),
            });
        }

        info!(
            subnets = ?value.iter().map(|m| m.subnet_id.as_str()).collect::<Vec<_>>(),
            "Using discovered subnets"
        );
        Ok(Selection::Derived {
            source: SelectionSource::Discovered,
            value,
        })
    }

    /// Security groups from the merged list, or the managed group when unset
    #[instrument(skip(self, explicit, listen_ports), fields(explicit = explicit.is_some()))]
    pub async fn select_security_groups(
        &self,
        explicit: Option<Vec<String>>,
        listen_ports: &BTreeMap<u16, ListenPortConfig>,
        ip_address_type: IpAddressType,
    ) -> Result<Selection<Vec<String>>> {
        if let Some(tokens) = explicit {
            require_tokens("securityGroups", &tokens)?;
            let resolved = self
                .resolver
                .resolve(ReferenceKind::SecurityGroup, &tokens)
                .await?;
            let value = resolved.into_iter().map(|entry| entry.id).collect();
            return Ok(Selection::Explicit { tokens, value });
        }

        let managed = call_upstream(
            "ensure managed security group",
            self.timeout,
            self.provisioner.ensure(listen_ports, ip_address_type),
        )
        .await?;

        info!(security_group = %managed, "Using managed security group");
        Ok(Selection::Derived {
            source: SelectionSource::Managed,
            value: vec![managed],
        })
    }
}

/// An annotation that is present but lists nothing is not a usable selection
fn require_tokens(field: &str, tokens: &[String]) -> Result<()> {
    if tokens.is_empty() {
        return Err(Error::Validation {
            field: field.to_string(),
            value: String::new(),
        });
    }
    Ok(())
}
