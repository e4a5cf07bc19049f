use std::collections::BTreeMap;

use k8s_openapi::api::networking::v1::Ingress;
use kube::ResourceExt;
use tracing::debug;

use crate::annotations::{keys, AnnotationParser};
use crate::error::{Error, Result};

pub const MIN_GROUP_ORDER: i64 = -1000;
pub const MAX_GROUP_ORDER: i64 = 1000;
pub const MAX_GROUP_NAME_LENGTH: usize = 63;

/// Stable identity of an Ingress group
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupIdentity {
    /// Named through the `group.name` annotation, may span namespaces
    Explicit { name: String },
    /// A single Ingress that joined no named group
    Implicit { namespace: String, name: String },
}

impl GroupIdentity {
    pub fn explicit(name: impl Into<String>) -> Self {
        GroupIdentity::Explicit { name: name.into() }
    }

    pub fn implicit(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        GroupIdentity::Implicit {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, GroupIdentity::Explicit { .. })
    }
}

/// Canonical form: `name` for explicit groups, `namespace/name` otherwise
impl std::fmt::Display for GroupIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupIdentity::Explicit { name } => write!(f, "{name}"),
            GroupIdentity::Implicit { namespace, name } => write!(f, "{namespace}/{name}"),
        }
    }
}

/// Annotations of one group member
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigurationSource {
    /// `namespace/name` of the member, used in error messages
    pub name: String,
    pub annotations: BTreeMap<String, String>,
}

impl ConfigurationSource {
    pub fn new(name: impl Into<String>, annotations: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            annotations,
        }
    }
}

impl From<&Ingress> for ConfigurationSource {
    fn from(ingress: &Ingress) -> Self {
        let namespace = ingress.namespace().unwrap_or_else(|| "default".to_string());
        Self {
            name: format!("{}/{}", namespace, ingress.name_any()),
            annotations: ingress.annotations().clone(),
        }
    }
}

/// Ingresses whose annotations merge into one load balancer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngressGroup {
    pub id: GroupIdentity,
    /// Ordered by `group.order`, then `namespace/name`
    pub members: Vec<ConfigurationSource>,
}

/// Partition Ingresses into groups
///
/// Ingresses with a `group.name` annotation join the explicit group of that
/// name across namespaces. Every other Ingress forms its own implicit group.
/// Groups are returned sorted by their canonical identity.
pub fn group_ingresses(ingresses: &[Ingress], parser: &AnnotationParser) -> Result<Vec<IngressGroup>> {
    let mut grouped: BTreeMap<GroupIdentity, Vec<(i64, ConfigurationSource)>> = BTreeMap::new();

    for ingress in ingresses {
        let source = ConfigurationSource::from(ingress);
        let id = match parser.parse_string(keys::SUFFIX_GROUP_NAME, &source.annotations) {
            Some(name) => {
                validate_group_name(&name)?;
                GroupIdentity::explicit(name)
            }
            None => GroupIdentity::implicit(
                ingress.namespace().unwrap_or_else(|| "default".to_string()),
                ingress.name_any(),
            ),
        };
        let order = group_order(parser, &source)?;

        debug!(ingress = %source.name, group = %id, order, "Assigned ingress to group");
        grouped.entry(id).or_default().push((order, source));
    }

    let mut groups: Vec<IngressGroup> = grouped
        .into_iter()
        .map(|(id, mut members)| {
            members.sort_by(|(a_order, a), (b_order, b)| {
                a_order.cmp(b_order).then_with(|| a.name.cmp(&b.name))
            });
            IngressGroup {
                id,
                members: members.into_iter().map(|(_, source)| source).collect(),
            }
        })
        .collect();
    groups.sort_by_cached_key(|group| group.id.to_string());

    Ok(groups)
}

fn validate_group_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_GROUP_NAME_LENGTH {
        return Err(Error::Validation {
            field: "group.name".to_string(),
            value: name.to_string(),
        });
    }
    Ok(())
}

fn group_order(parser: &AnnotationParser, source: &ConfigurationSource) -> Result<i64> {
    let Some(raw) = parser.parse_string(keys::SUFFIX_GROUP_ORDER, &source.annotations) else {
        return Ok(0);
    };

    match raw.trim().parse::<i64>() {
        Ok(order) if (MIN_GROUP_ORDER..=MAX_GROUP_ORDER).contains(&order) => Ok(order),
        _ => Err(Error::Validation {
            field: "group.order".to_string(),
            value: raw,
        }),
    }
}
