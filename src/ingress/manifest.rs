use k8s_openapi::api::networking::v1::Ingress;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Read every `Ingress` from a multi-document YAML stream
///
/// Documents of other kinds and empty documents are skipped.
pub fn load_ingresses_from_yaml(raw: &str) -> Result<Vec<Ingress>> {
    let mut ingresses = Vec::new();

    for (index, document) in serde_yaml::Deserializer::from_str(raw).enumerate() {
        let value = serde_yaml::Value::deserialize(document)
            .map_err(|e| Error::ParseError(format!("document {index}: {e}")))?;
        if value.is_null() {
            continue;
        }

        let kind = value.get("kind").and_then(|k| k.as_str()).unwrap_or_default();
        if kind != "Ingress" {
            debug!(index, kind, "Skipping non-Ingress document");
            continue;
        }

        let ingress: Ingress = serde_yaml::from_value(value)
            .map_err(|e| Error::ParseError(format!("document {index}: {e}")))?;
        ingresses.push(ingress);
    }

    Ok(ingresses)
}
