use std::collections::BTreeMap;

use super::keys::DEFAULT_ANNOTATION_PREFIX;

/// Typed access to prefixed annotations
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotationParser {
    prefix: String,
}

impl Default for AnnotationParser {
    fn default() -> Self {
        Self::new(DEFAULT_ANNOTATION_PREFIX)
    }
}

impl AnnotationParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Full annotation key for a suffix
    pub fn key(&self, suffix: &str) -> String {
        format!("{}/{}", self.prefix, suffix)
    }

    pub fn parse_string(
        &self,
        suffix: &str,
        annotations: &BTreeMap<String, String>,
    ) -> Option<String> {
        annotations.get(&self.key(suffix)).cloned()
    }

    /// Comma-separated list; entries are trimmed and empty entries dropped
    pub fn parse_string_list(
        &self,
        suffix: &str,
        annotations: &BTreeMap<String, String>,
    ) -> Option<Vec<String>> {
        let raw = annotations.get(&self.key(suffix))?;
        Some(split_comma_separated(raw))
    }

    /// Comma-separated `key=value` pairs
    ///
    /// Returns `Err` with a description when an entry has no `=` or an empty
    /// key.
    pub fn parse_string_map(
        &self,
        suffix: &str,
        annotations: &BTreeMap<String, String>,
    ) -> Result<Option<BTreeMap<String, String>>, String> {
        let Some(raw) = annotations.get(&self.key(suffix)) else {
            return Ok(None);
        };

        let malformed = || {
            format!(
                "failed to parse stringMap annotation, {}: {}",
                self.key(suffix),
                raw
            )
        };

        let mut parsed = BTreeMap::new();
        for entry in split_comma_separated(raw) {
            let (key, value) = entry.split_once('=').ok_or_else(malformed)?;
            let key = key.trim();
            if key.is_empty() {
                return Err(malformed());
            }
            parsed.insert(key.to_string(), value.trim().to_string());
        }
        Ok(Some(parsed))
    }
}

fn split_comma_separated(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotations(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_string_uses_prefix() {
        let parser = AnnotationParser::default();
        let anns = annotations(&[("alb.ingress.kubernetes.io/scheme", "internal")]);

        assert_eq!(parser.parse_string("scheme", &anns), Some("internal".to_string()));
        assert_eq!(parser.parse_string("ip-address-type", &anns), None);
    }

    #[test]
    fn test_custom_prefix() {
        let parser = AnnotationParser::new("lb.example.com");
        let anns = annotations(&[
            ("alb.ingress.kubernetes.io/scheme", "internal"),
            ("lb.example.com/scheme", "internet-facing"),
        ]);

        assert_eq!(
            parser.parse_string("scheme", &anns),
            Some("internet-facing".to_string())
        );
    }

    #[test]
    fn test_parse_string_list_trims_and_drops_empty() {
        let parser = AnnotationParser::default();
        let anns = annotations(&[("alb.ingress.kubernetes.io/subnets", " subnet-a, ,my-subnet ,")]);

        assert_eq!(
            parser.parse_string_list("subnets", &anns),
            Some(vec!["subnet-a".to_string(), "my-subnet".to_string()])
        );
    }

    #[test]
    fn test_parse_string_list_present_but_empty() {
        let parser = AnnotationParser::default();
        let anns = annotations(&[("alb.ingress.kubernetes.io/subnets", "")]);

        assert_eq!(parser.parse_string_list("subnets", &anns), Some(vec![]));
    }

    #[test]
    fn test_parse_string_map() {
        let parser = AnnotationParser::default();
        let anns = annotations(&[(
            "alb.ingress.kubernetes.io/tags",
            "Environment=dev, Team = payments,empty=",
        )]);

        let tags = parser.parse_string_map("tags", &anns).unwrap().unwrap();
        assert_eq!(tags.get("Environment").map(String::as_str), Some("dev"));
        assert_eq!(tags.get("Team").map(String::as_str), Some("payments"));
        assert_eq!(tags.get("empty").map(String::as_str), Some(""));
    }

    #[test]
    fn test_parse_string_map_absent() {
        let parser = AnnotationParser::default();
        assert_eq!(parser.parse_string_map("tags", &BTreeMap::new()), Ok(None));
    }

    #[test]
    fn test_parse_string_map_rejects_entry_without_separator() {
        let parser = AnnotationParser::default();
        let anns = annotations(&[("alb.ingress.kubernetes.io/tags", "a=1,broken")]);

        let err = parser.parse_string_map("tags", &anns).unwrap_err();
        assert!(err.contains("alb.ingress.kubernetes.io/tags"));
    }

    #[test]
    fn test_parse_string_map_rejects_empty_key() {
        let parser = AnnotationParser::default();
        let anns = annotations(&[("alb.ingress.kubernetes.io/tags", "=value")]);

        assert!(parser.parse_string_map("tags", &anns).is_err());
    }
}
