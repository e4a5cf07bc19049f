//! Field merge engine
//!
//! Merges one annotation across every member of a group. A field is driven by
//! a [`FieldDescriptor`] whose [`MergePolicy`] decides how values from
//! different members combine and what counts as a conflict. The merge is a
//! pure function of its inputs; conflict errors list every distinct value
//! seen (for maps, every conflicting key), sorted, so the error does not
//! depend on member order.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use crate::annotations::{keys, AnnotationParser};
use crate::error::{ConflictingValues, Error, Result};
use crate::ingress::ConfigurationSource;

/// How values of one field from different members combine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergePolicy {
    /// All members that set the field must set the same string
    SingleValue,
    /// All members that set the field must list the same set of entries
    UnorderedSet,
    /// Key-by-key union; a key with two different values is a conflict
    KeyMapUnion,
}

/// A mergeable load balancer field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Name used in errors
    pub name: &'static str,
    /// Annotation suffix the field is read from
    pub suffix: &'static str,
    pub policy: MergePolicy,
}

pub const SCHEME: FieldDescriptor = FieldDescriptor {
    name: "scheme",
    suffix: keys::SUFFIX_SCHEME,
    policy: MergePolicy::SingleValue,
};

pub const IP_ADDRESS_TYPE: FieldDescriptor = FieldDescriptor {
    name: "IPAddressType",
    suffix: keys::SUFFIX_IP_ADDRESS_TYPE,
    policy: MergePolicy::SingleValue,
};

pub const SUBNETS: FieldDescriptor = FieldDescriptor {
    name: "subnets",
    suffix: keys::SUFFIX_SUBNETS,
    policy: MergePolicy::UnorderedSet,
};

pub const SECURITY_GROUPS: FieldDescriptor = FieldDescriptor {
    name: "securityGroups",
    suffix: keys::SUFFIX_SECURITY_GROUPS,
    policy: MergePolicy::UnorderedSet,
};

pub const LOAD_BALANCER_ATTRIBUTES: FieldDescriptor = FieldDescriptor {
    name: "loadBalancerAttribute",
    suffix: keys::SUFFIX_LOAD_BALANCER_ATTRIBUTES,
    policy: MergePolicy::KeyMapUnion,
};

pub const TAGS: FieldDescriptor = FieldDescriptor {
    name: "tag",
    suffix: keys::SUFFIX_TAGS,
    policy: MergePolicy::KeyMapUnion,
};

/// Outcome of merging one field across a group
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergedValue {
    /// No member set the field
    Unset,
    Single(String),
    /// Entries in the order of the first member that set the field
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

/// Merge one field across `sources` according to its policy
pub fn merge_field(
    field: &FieldDescriptor,
    parser: &AnnotationParser,
    sources: &[ConfigurationSource],
) -> Result<MergedValue> {
    match field.policy {
        MergePolicy::SingleValue => merge_single_value(field, parser, sources),
        MergePolicy::UnorderedSet => merge_unordered_set(field, parser, sources),
        MergePolicy::KeyMapUnion => merge_key_map(field, parser, sources),
    }
}

/// Merge a single-valued field and parse it into its enumeration
///
/// Returns `default` when no member sets the field.
pub fn merge_enum<T: FromStr>(
    field: &FieldDescriptor,
    parser: &AnnotationParser,
    sources: &[ConfigurationSource],
    default: T,
) -> Result<T> {
    match merge_field(field, parser, sources)? {
        MergedValue::Unset => Ok(default),
        MergedValue::Single(raw) => raw.parse::<T>().map_err(|_| Error::Validation {
            field: field.name.to_string(),
            value: raw,
        }),
        _ => Err(policy_mismatch(field, MergePolicy::SingleValue)),
    }
}

/// Merge a list field; `None` means no member set it
pub fn merge_token_list(
    field: &FieldDescriptor,
    parser: &AnnotationParser,
    sources: &[ConfigurationSource],
) -> Result<Option<Vec<String>>> {
    match merge_field(field, parser, sources)? {
        MergedValue::Unset => Ok(None),
        MergedValue::List(tokens) => Ok(Some(tokens)),
        _ => Err(policy_mismatch(field, MergePolicy::UnorderedSet)),
    }
}

/// Merge a map field; members that do not set it contribute nothing
pub fn merge_string_map(
    field: &FieldDescriptor,
    parser: &AnnotationParser,
    sources: &[ConfigurationSource],
) -> Result<BTreeMap<String, String>> {
    match merge_field(field, parser, sources)? {
        MergedValue::Unset => Ok(BTreeMap::new()),
        MergedValue::Map(map) => Ok(map),
        _ => Err(policy_mismatch(field, MergePolicy::KeyMapUnion)),
    }
}

fn merge_single_value(
    field: &FieldDescriptor,
    parser: &AnnotationParser,
    sources: &[ConfigurationSource],
) -> Result<MergedValue> {
    let distinct: BTreeSet<String> = sources
        .iter()
        .filter_map(|source| parser.parse_string(field.suffix, &source.annotations))
        .collect();

    if distinct.len() > 1 {
        return Err(Error::MergeConflict {
            field: field.name.to_string(),
            conflicts: vec![ConflictingValues::unkeyed(distinct.into_iter().collect())],
        });
    }

    Ok(distinct
        .into_iter()
        .next()
        .map_or(MergedValue::Unset, MergedValue::Single))
}

fn merge_unordered_set(
    field: &FieldDescriptor,
    parser: &AnnotationParser,
    sources: &[ConfigurationSource],
) -> Result<MergedValue> {
    let lists: Vec<Vec<String>> = sources
        .iter()
        .filter_map(|source| parser.parse_string_list(field.suffix, &source.annotations))
        .collect();

    let Some(first) = lists.first() else {
        return Ok(MergedValue::Unset);
    };

    // Order and duplicates are irrelevant for agreement.
    let distinct: BTreeSet<BTreeSet<&str>> = lists
        .iter()
        .map(|list| list.iter().map(String::as_str).collect())
        .collect();

    if distinct.len() > 1 {
        return Err(Error::MergeConflict {
            field: field.name.to_string(),
            conflicts: vec![ConflictingValues::unkeyed(
                distinct
                    .iter()
                    .map(|set| format!("[{}]", set.iter().copied().collect::<Vec<_>>().join(",")))
                    .collect(),
            )],
        });
    }

    Ok(MergedValue::List(first.clone()))
}

fn merge_key_map(
    field: &FieldDescriptor,
    parser: &AnnotationParser,
    sources: &[ConfigurationSource],
) -> Result<MergedValue> {
    let mut seen: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut any_set = false;

    for source in sources {
        let raw = parser
            .parse_string_map(field.suffix, &source.annotations)
            .map_err(|message| Error::Annotation {
                field: field.name.to_string(),
                source_name: source.name.clone(),
                message,
            })?;
        let Some(raw) = raw else {
            continue;
        };

        any_set = true;
        for (key, value) in raw {
            seen.entry(key).or_default().insert(value);
        }
    }

    if !any_set {
        return Ok(MergedValue::Unset);
    }

    let conflicts: Vec<ConflictingValues> = seen
        .iter()
        .filter(|(_, values)| values.len() > 1)
        .map(|(key, values)| ConflictingValues::keyed(key, values.iter().cloned().collect()))
        .collect();
    if !conflicts.is_empty() {
        return Err(Error::MergeConflict {
            field: field.name.to_string(),
            conflicts,
        });
    }

    Ok(MergedValue::Map(
        seen.into_iter()
            .filter_map(|(key, values)| values.into_iter().next().map(|value| (key, value)))
            .collect(),
    ))
}

fn policy_mismatch(field: &FieldDescriptor, expected: MergePolicy) -> Error {
    Error::ConfigError(format!(
        "field {} uses {:?} but was merged as {:?}",
        field.name, field.policy, expected
    ))
}
