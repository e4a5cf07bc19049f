//! Error types for load balancer spec building
//!
//! Every variant aborts the whole build. Variants carry the field or
//! operation they belong to so a caller can report exactly what went wrong.

use thiserror::Error;

use crate::cloud::ReferenceKind;

#[derive(Error, Debug)]
pub enum Error {
    /// Two or more group members disagree on a field that must agree
    #[error("conflicting {}{}", .field, describe_conflicts(.conflicts))]
    MergeConflict {
        field: String,
        /// Sorted by key; single-valued and list fields have one unkeyed entry
        conflicts: Vec<ConflictingValues>,
    },

    /// A merged value is not part of the field's fixed enumeration
    #[error("unknown {field}: {value}")]
    Validation { field: String, value: String },

    /// An annotation could not be decoded for a group member
    #[error("invalid {field} annotation on {source_name}: {message}")]
    Annotation {
        field: String,
        source_name: String,
        message: String,
    },

    /// Explicit references did not resolve one-to-one
    #[error("couldn't resolve all {kind}s, nameOrIDs: {requested:?}, found: {found:?}")]
    Resolution {
        kind: ReferenceKind,
        requested: Vec<String>,
        found: Vec<String>,
    },

    /// Subnet discovery returned too few availability zones
    #[error(
        "cannot find at least two subnets from different Availability Zones, discovered subnetIDs: {found:?}"
    )]
    InsufficientPlacement { found: Vec<String> },

    /// A cloud collaborator failed
    #[error("{operation} failed: {source:#}")]
    Upstream {
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    /// A cloud collaborator did not answer within the lookup timeout
    #[error("{operation} timed out")]
    Timeout { operation: String },

    /// Some groups of a batch could not be built; each failure was logged
    #[error("{failed} of {total} groups failed to build")]
    BuildFailed { failed: usize, total: usize },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Distinct values seen for one field, or for one key of a map field
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConflictingValues {
    pub key: Option<String>,
    pub values: Vec<String>,
}

impl ConflictingValues {
    pub fn unkeyed(values: Vec<String>) -> Self {
        Self { key: None, values }
    }

    pub fn keyed(key: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            key: Some(key.into()),
            values,
        }
    }
}

fn describe_conflicts(conflicts: &[ConflictingValues]) -> String {
    conflicts
        .iter()
        .map(|conflict| match &conflict.key {
            Some(key) => format!(" {key}: {}", conflict.values.join(" | ")),
            None => format!(": {}", conflict.values.join(" | ")),
        })
        .collect::<Vec<_>>()
        .join(";")
}

impl Error {
    /// Field or operation the error is attributed to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::MergeConflict { field, .. }
            | Error::Validation { field, .. }
            | Error::Annotation { field, .. } => Some(field.as_str()),
            Error::Upstream { operation, .. } | Error::Timeout { operation } => {
                Some(operation.as_str())
            }
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
