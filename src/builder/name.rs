//! Deterministic load balancer names
//!
//! Names are at most 32 characters and only contain `[A-Za-z0-9-]`. The hash
//! suffix keeps names of different groups, clusters and schemes apart; it is
//! an identifier, not a secret.

use sha2::{Digest, Sha256};

use crate::ingress::GroupIdentity;
use crate::model::LoadBalancerScheme;

pub const LOAD_BALANCER_NAME_PREFIX: &str = "k8s-";

const EXPLICIT_NAME_LENGTH: usize = 17;
const NAMESPACE_LENGTH: usize = 8;
const NAME_LENGTH: usize = 8;
const HASH_LENGTH: usize = 10;

/// Build the load balancer name for a group
pub fn build_load_balancer_name(
    cluster_name: &str,
    group: &GroupIdentity,
    scheme: LoadBalancerScheme,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(cluster_name.as_bytes());
    hasher.update(group.to_string().as_bytes());
    hasher.update(scheme.as_str().as_bytes());
    let digest = hex::encode(hasher.finalize());
    let hash = truncate(&digest, HASH_LENGTH);

    match group {
        GroupIdentity::Explicit { name } => {
            let payload = sanitize(name);
            format!(
                "{LOAD_BALANCER_NAME_PREFIX}{}-{hash}",
                truncate(&payload, EXPLICIT_NAME_LENGTH)
            )
        }
        GroupIdentity::Implicit { namespace, name } => {
            let namespace = sanitize(namespace);
            let name = sanitize(name);
            format!(
                "{LOAD_BALANCER_NAME_PREFIX}{}-{}-{hash}",
                truncate(&namespace, NAMESPACE_LENGTH),
                truncate(&name, NAME_LENGTH)
            )
        }
    }
}

/// Drop every character that is not ASCII alphanumeric
fn sanitize(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Byte-length truncation; callers only pass ASCII
fn truncate(s: &str, max: usize) -> &str {
    &s[..s.len().min(max)]
}
