//! Name-or-ID reference resolution
//!
//! Users may refer to subnets and security groups either by canonical ID or
//! by the value of their `Name` tag. Tokens are split by ID prefix, each
//! bucket is looked up with one batched call, and every requested token must
//! be matched by exactly one returned entry. Output order follows the
//! lookups, not the input.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, instrument};

use super::upstream::call_upstream;
use crate::cloud::{ProviderEntry, ReferenceKind, ReferenceLookup};
use crate::error::{Error, Result};

/// A user-supplied reference, classified without any lookup
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceToken<'a> {
    CanonicalId(&'a str),
    SymbolicName(&'a str),
}

impl<'a> ReferenceToken<'a> {
    pub fn classify(kind: ReferenceKind, token: &'a str) -> Self {
        if token.starts_with(kind.id_prefix()) {
            ReferenceToken::CanonicalId(token)
        } else {
            ReferenceToken::SymbolicName(token)
        }
    }
}

/// Resolves reference tokens of one kind inside one VPC
pub struct ReferenceResolver<'a> {
    lookup: &'a dyn ReferenceLookup,
    vpc_id: &'a str,
    timeout: Duration,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(lookup: &'a dyn ReferenceLookup, vpc_id: &'a str, timeout: Duration) -> Self {
        Self {
            lookup,
            vpc_id,
            timeout,
        }
    }

    /// Resolve every token or fail
    ///
    /// Repeated tokens are requested once. Fails with
    /// [`Error::Resolution`] when a token matches nothing, matches more than
    /// one resource, or the provider returns entries nobody asked for.
    #[instrument(skip(self), fields(vpc_id = %self.vpc_id))]
    pub async fn resolve(
        &self,
        kind: ReferenceKind,
        tokens: &[String],
    ) -> Result<Vec<ProviderEntry>> {
        let requested = dedup_tokens(tokens);

        let mut ids = Vec::new();
        let mut names = Vec::new();
        for token in &requested {
            match ReferenceToken::classify(kind, token) {
                ReferenceToken::CanonicalId(id) => ids.push(id.to_string()),
                ReferenceToken::SymbolicName(name) => names.push(name.to_string()),
            }
        }

        let mut resolved = Vec::with_capacity(requested.len());
        let mut complete = true;
        if !ids.is_empty() {
            let found = call_upstream(
                &format!("describe {kind}s by ID"),
                self.timeout,
                self.lookup.describe_by_ids(kind, self.vpc_id, &ids),
            )
            .await?;
            debug!(requested = ids.len(), found = found.len(), "Looked up {kind}s by ID");
            complete &= matched_once(&ids, &found, entry_id);
            resolved.extend(found);
        }
        if !names.is_empty() {
            let found = call_upstream(
                &format!("describe {kind}s by Name tag"),
                self.timeout,
                self.lookup.describe_by_name_tags(kind, self.vpc_id, &names),
            )
            .await?;
            debug!(requested = names.len(), found = found.len(), "Looked up {kind}s by Name tag");
            complete &= matched_once(&names, &found, entry_name);
            resolved.extend(found);
        }

        if !complete {
            return Err(Error::Resolution {
                kind,
                requested,
                found: resolved.into_iter().map(|entry| entry.id).collect(),
            });
        }

        Ok(resolved)
    }
}

/// True when each token is matched by exactly one entry and no entry is left
/// over
fn matched_once(
    tokens: &[String],
    entries: &[ProviderEntry],
    key: fn(&ProviderEntry) -> Option<&str>,
) -> bool {
    entries.len() == tokens.len()
        && tokens.iter().all(|token| {
            entries
                .iter()
                .filter(|&entry| key(entry) == Some(token.as_str()))
                .count()
                == 1
        })
}

fn entry_id(entry: &ProviderEntry) -> Option<&str> {
    Some(entry.id.as_str())
}

fn entry_name(entry: &ProviderEntry) -> Option<&str> {
    entry.name.as_deref()
}

/// Drop repeated tokens, keeping the first occurrence
fn dedup_tokens(tokens: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens
        .iter()
        .filter(|token| seen.insert(token.as_str()))
        .cloned()
        .collect()
}
