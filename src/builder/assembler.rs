use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, instrument};

use super::merge::{
    merge_enum, merge_string_map, merge_token_list, IP_ADDRESS_TYPE, LOAD_BALANCER_ATTRIBUTES,
    SCHEME, SECURITY_GROUPS, SUBNETS, TAGS,
};
use super::name::build_load_balancer_name;
use super::selection::{Selection, SelectionPolicy};
use crate::annotations::AnnotationParser;
use crate::cloud::{ReferenceLookup, SecurityGroupProvisioner, SubnetDiscovery};
use crate::config::BuildConfig;
use crate::error::Result;
use crate::ingress::{ConfigurationSource, IngressGroup};
use crate::model::{
    IpAddressType, ListenPortConfig, LoadBalancer, LoadBalancerAttribute, LoadBalancerScheme,
    LoadBalancerSpec, LoadBalancerType, SubnetMapping, RESOURCE_ID_LOAD_BALANCER,
};

/// Builds the load balancer of an Ingress group
///
/// Holds the injected configuration and provider collaborators; a single
/// builder can be shared across concurrent builds.
#[derive(Clone)]
pub struct ModelBuilder {
    config: BuildConfig,
    parser: AnnotationParser,
    lookup: Arc<dyn ReferenceLookup>,
    discovery: Arc<dyn SubnetDiscovery>,
    provisioner: Arc<dyn SecurityGroupProvisioner>,
}

impl ModelBuilder {
    pub fn new(
        config: BuildConfig,
        lookup: Arc<dyn ReferenceLookup>,
        discovery: Arc<dyn SubnetDiscovery>,
        provisioner: Arc<dyn SecurityGroupProvisioner>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            parser: AnnotationParser::new(config.annotation_prefix.clone()),
            config,
            lookup,
            discovery,
            provisioner,
        })
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn parser(&self) -> &AnnotationParser {
        &self.parser
    }

    /// Build the load balancer resource, including where its references came from
    #[instrument(skip_all, fields(group = %group.id, members = group.members.len()))]
    pub async fn build_load_balancer(
        &self,
        group: &IngressGroup,
        listen_ports: &BTreeMap<u16, ListenPortConfig>,
    ) -> Result<LoadBalancer> {
        let sources = group.members.as_slice();
        let parser = &self.parser;

        let scheme = merge_enum(&SCHEME, parser, sources, self.config.default_scheme)?;
        let ip_address_type = merge_enum(
            &IP_ADDRESS_TYPE,
            parser,
            sources,
            self.config.default_ip_address_type,
        )?;

        let policy = SelectionPolicy::new(
            self.lookup.as_ref(),
            self.discovery.as_ref(),
            self.provisioner.as_ref(),
            &self.config.vpc_id,
            self.config.lookup_timeout(),
        );
        // Placement and security only depend on scheme and address type.
        let (subnets, security_groups) = tokio::try_join!(
            self.build_subnet_mappings(&policy, sources, scheme),
            self.build_security_groups(&policy, sources, listen_ports, ip_address_type),
        )?;

        let load_balancer_attributes =
            merge_string_map(&LOAD_BALANCER_ATTRIBUTES, parser, sources)?
                .into_iter()
                .map(|(key, value)| LoadBalancerAttribute { key, value })
                .collect();
        let tags = merge_string_map(&TAGS, parser, sources)?;

        let name = build_load_balancer_name(&self.config.cluster_name, &group.id, scheme);

        let subnet_source = subnets.source();
        let security_group_source = security_groups.source();
        let spec = LoadBalancerSpec {
            name,
            type_: LoadBalancerType::Application,
            scheme,
            ip_address_type,
            subnet_mappings: subnets.into_value(),
            security_groups: security_groups.into_value(),
            load_balancer_attributes,
            tags,
        };

        info!(
            name = %spec.name,
            %scheme,
            %ip_address_type,
            %subnet_source,
            %security_group_source,
            "Built load balancer spec"
        );

        Ok(LoadBalancer {
            resource_id: RESOURCE_ID_LOAD_BALANCER.to_string(),
            spec,
            subnet_source,
            security_group_source,
        })
    }

    async fn build_subnet_mappings(
        &self,
        policy: &SelectionPolicy<'_>,
        sources: &[ConfigurationSource],
        scheme: LoadBalancerScheme,
    ) -> Result<Selection<Vec<SubnetMapping>>> {
        let explicit = merge_token_list(&SUBNETS, &self.parser, sources)?;
        policy.select_subnets(explicit, scheme).await
    }

    async fn build_security_groups(
        &self,
        policy: &SelectionPolicy<'_>,
        sources: &[ConfigurationSource],
        listen_ports: &BTreeMap<u16, ListenPortConfig>,
        ip_address_type: IpAddressType,
    ) -> Result<Selection<Vec<String>>> {
        let explicit = merge_token_list(&SECURITY_GROUPS, &self.parser, sources)?;
        policy
            .select_security_groups(explicit, listen_ports, ip_address_type)
            .await
    }

    /// Build only the spec
    pub async fn build_load_balancer_spec(
        &self,
        group: &IngressGroup,
        listen_ports: &BTreeMap<u16, ListenPortConfig>,
    ) -> Result<LoadBalancerSpec> {
        Ok(self.build_load_balancer(group, listen_ports).await?.spec)
    }
}
