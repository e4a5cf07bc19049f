//! Annotation suffixes read from Ingress resources
//!
//! Each suffix is appended to the configured prefix, e.g.
//! `alb.ingress.kubernetes.io/scheme`.

pub const DEFAULT_ANNOTATION_PREFIX: &str = "alb.ingress.kubernetes.io";

// Load balancer fields
pub const SUFFIX_SCHEME: &str = "scheme";
pub const SUFFIX_IP_ADDRESS_TYPE: &str = "ip-address-type";
pub const SUFFIX_SUBNETS: &str = "subnets";
pub const SUFFIX_SECURITY_GROUPS: &str = "security-groups";
pub const SUFFIX_LOAD_BALANCER_ATTRIBUTES: &str = "load-balancer-attributes";
pub const SUFFIX_TAGS: &str = "tags";

// Grouping
pub const SUFFIX_GROUP_NAME: &str = "group.name";
pub const SUFFIX_GROUP_ORDER: &str = "group.order";
