//! Recording fake for the provider collaborators

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;

use crate::cloud::{
    ProviderEntry, ReferenceKind, ReferenceLookup, SecurityGroupProvisioner, SubnetDiscovery,
};
use crate::model::{IpAddressType, ListenPortConfig, LoadBalancerScheme};

/// One recorded collaborator call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    DescribeByIds(ReferenceKind, String, Vec<String>),
    DescribeByNameTags(ReferenceKind, String, Vec<String>),
    Discover(String, LoadBalancerScheme),
    Ensure(Vec<u16>, IpAddressType),
}

#[derive(Default)]
pub struct FakeCloud {
    /// (kind, id, name tag, zone)
    resources: Vec<(ReferenceKind, String, Option<String>, Option<String>)>,
    discovered: Vec<ProviderEntry>,
    managed_security_group: String,
    fail_lookups: bool,
    delay: Option<Duration>,
    calls: Mutex<Vec<Call>>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self {
            managed_security_group: "sg-managed".to_string(),
            ..Default::default()
        }
    }

    pub fn with_subnet(mut self, id: &str, name: Option<&str>, zone: &str) -> Self {
        self.resources.push((
            ReferenceKind::Subnet,
            id.to_string(),
            name.map(str::to_string),
            Some(zone.to_string()),
        ));
        self
    }

    pub fn with_security_group(mut self, id: &str, name: Option<&str>) -> Self {
        self.resources.push((
            ReferenceKind::SecurityGroup,
            id.to_string(),
            name.map(str::to_string),
            None,
        ));
        self
    }

    pub fn with_discovered(mut self, entries: Vec<ProviderEntry>) -> Self {
        self.discovered = entries;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_lookups = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn discover_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Discover(..)))
            .count()
    }

    pub fn ensure_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Ensure(..)))
            .count()
    }

    async fn respond<T>(&self, call: Call, value: T) -> anyhow::Result<T> {
        self.calls.lock().unwrap().push(call);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_lookups {
            return Err(anyhow!("UnauthorizedOperation: not allowed"));
        }
        Ok(value)
    }

    fn entry(&self, id: &str, name: &Option<String>, zone: &Option<String>) -> ProviderEntry {
        ProviderEntry {
            id: id.to_string(),
            availability_zone: zone.clone(),
            name: name.clone(),
        }
    }
}

#[async_trait]
impl ReferenceLookup for FakeCloud {
    async fn describe_by_ids(
        &self,
        kind: ReferenceKind,
        vpc_id: &str,
        ids: &[String],
    ) -> anyhow::Result<Vec<ProviderEntry>> {
        let found = self
            .resources
            .iter()
            .filter(|(k, id, _, _)| *k == kind && ids.contains(id))
            .map(|(_, id, name, zone)| self.entry(id, name, zone))
            .collect();
        self.respond(Call::DescribeByIds(kind, vpc_id.to_string(), ids.to_vec()), found)
            .await
    }

    async fn describe_by_name_tags(
        &self,
        kind: ReferenceKind,
        vpc_id: &str,
        names: &[String],
    ) -> anyhow::Result<Vec<ProviderEntry>> {
        let found = self
            .resources
            .iter()
            .filter(|(k, _, name, _)| {
                *k == kind && name.as_ref().is_some_and(|name| names.contains(name))
            })
            .map(|(_, id, name, zone)| self.entry(id, name, zone))
            .collect();
        self.respond(
            Call::DescribeByNameTags(kind, vpc_id.to_string(), names.to_vec()),
            found,
        )
        .await
    }
}

#[async_trait]
impl SubnetDiscovery for FakeCloud {
    async fn discover(
        &self,
        vpc_id: &str,
        scheme: LoadBalancerScheme,
    ) -> anyhow::Result<Vec<ProviderEntry>> {
        self.respond(
            Call::Discover(vpc_id.to_string(), scheme),
            self.discovered.clone(),
        )
        .await
    }
}

#[async_trait]
impl SecurityGroupProvisioner for FakeCloud {
    async fn ensure(
        &self,
        listen_ports: &BTreeMap<u16, ListenPortConfig>,
        ip_address_type: IpAddressType,
    ) -> anyhow::Result<String> {
        self.respond(
            Call::Ensure(listen_ports.keys().copied().collect(), ip_address_type),
            self.managed_security_group.clone(),
        )
        .await
    }
}
