//! Unit tests for name-or-ID reference resolution
//!
//! Covers: token classification, batching into at most one call per bucket,
//! the completeness check, and upstream failure handling.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_test::assert_ok;

    use crate::builder::fakes::{Call, FakeCloud};
    use crate::builder::resolver::{ReferenceResolver, ReferenceToken};
    use crate::cloud::ReferenceKind;
    use crate::error::Error;

    const VPC: &str = "vpc-0abc";
    const TIMEOUT: Duration = Duration::from_secs(5);

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn cloud() -> FakeCloud {
        FakeCloud::new()
            .with_subnet("subnet-1", Some("public-a"), "us-west-2a")
            .with_subnet("subnet-2", Some("public-b"), "us-west-2b")
            .with_subnet("subnet-3", None, "us-west-2c")
            .with_security_group("sg-123", None)
            .with_security_group("sg-456", Some("my-sg"))
    }

    // -------------------------------------------------------------------------
    // Classification
    // -------------------------------------------------------------------------

    #[test]
    fn test_classify_by_prefix() {
        assert_eq!(
            ReferenceToken::classify(ReferenceKind::Subnet, "subnet-0a1b"),
            ReferenceToken::CanonicalId("subnet-0a1b")
        );
        assert_eq!(
            ReferenceToken::classify(ReferenceKind::Subnet, "sg-0a1b"),
            ReferenceToken::SymbolicName("sg-0a1b")
        );
        assert_eq!(
            ReferenceToken::classify(ReferenceKind::SecurityGroup, "sg-0a1b"),
            ReferenceToken::CanonicalId("sg-0a1b")
        );
        assert_eq!(
            ReferenceToken::classify(ReferenceKind::SecurityGroup, "my-sg"),
            ReferenceToken::SymbolicName("my-sg")
        );
    }

    // -------------------------------------------------------------------------
    // Resolution
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_ids_and_names_resolved_with_one_call_each() {
        let cloud = cloud();
        let resolver = ReferenceResolver::new(&cloud, VPC, TIMEOUT);

        let resolved = resolver
            .resolve(ReferenceKind::SecurityGroup, &strings(&["sg-123", "my-sg"]))
            .await
            .unwrap();

        let ids: Vec<&str> = resolved.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["sg-123", "sg-456"]);
        assert_eq!(
            cloud.calls(),
            vec![
                Call::DescribeByIds(
                    ReferenceKind::SecurityGroup,
                    VPC.to_string(),
                    strings(&["sg-123"])
                ),
                Call::DescribeByNameTags(
                    ReferenceKind::SecurityGroup,
                    VPC.to_string(),
                    strings(&["my-sg"])
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_only_ids_skips_name_lookup() {
        let cloud = cloud();
        let resolver = ReferenceResolver::new(&cloud, VPC, TIMEOUT);

        assert_ok!(
            resolver
                .resolve(ReferenceKind::Subnet, &strings(&["subnet-1", "subnet-3"]))
                .await
        );
        assert_eq!(cloud.calls().len(), 1);
        assert!(matches!(cloud.calls()[0], Call::DescribeByIds(..)));
    }

    #[tokio::test]
    async fn test_only_names_skips_id_lookup() {
        let cloud = cloud();
        let resolver = ReferenceResolver::new(&cloud, VPC, TIMEOUT);

        let resolved = resolver
            .resolve(ReferenceKind::Subnet, &strings(&["public-b", "public-a"]))
            .await
            .unwrap();

        assert_eq!(resolved.len(), 2);
        assert_eq!(cloud.calls().len(), 1);
        assert!(matches!(cloud.calls()[0], Call::DescribeByNameTags(..)));
    }

    #[tokio::test]
    async fn test_resolved_entries_keep_zone() {
        let cloud = cloud();
        let resolver = ReferenceResolver::new(&cloud, VPC, TIMEOUT);

        let resolved = resolver
            .resolve(ReferenceKind::Subnet, &strings(&["public-a"]))
            .await
            .unwrap();

        assert_eq!(resolved[0].availability_zone.as_deref(), Some("us-west-2a"));
    }

    #[tokio::test]
    async fn test_missing_token_reports_requested_and_found() {
        let cloud = cloud();
        let resolver = ReferenceResolver::new(&cloud, VPC, TIMEOUT);
        let requested = strings(&["subnet-1", "public-b", "subnet-404"]);

        let err = resolver
            .resolve(ReferenceKind::Subnet, &requested)
            .await
            .unwrap_err();

        match err {
            Error::Resolution {
                kind,
                requested: reported,
                found,
            } => {
                assert_eq!(kind, ReferenceKind::Subnet);
                assert_eq!(reported, requested);
                assert_eq!(found.len(), 2);
                assert!(found.contains(&"subnet-1".to_string()));
                assert!(found.contains(&"subnet-2".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ambiguous_name_is_an_error() {
        let cloud = cloud()
            .with_security_group("sg-777", Some("my-sg"));
        let resolver = ReferenceResolver::new(&cloud, VPC, TIMEOUT);

        let err = resolver
            .resolve(ReferenceKind::SecurityGroup, &strings(&["my-sg"]))
            .await
            .unwrap_err();

        match err {
            Error::Resolution { requested, found, .. } => {
                assert_eq!(requested, strings(&["my-sg"]));
                assert_eq!(found, strings(&["sg-456", "sg-777"]));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_extra_match_cannot_cover_missing_name() {
        let cloud = cloud().with_security_group("sg-777", Some("my-sg"));
        let resolver = ReferenceResolver::new(&cloud, VPC, TIMEOUT);
        let requested = strings(&["my-sg", "does-not-exist"]);

        let err = resolver
            .resolve(ReferenceKind::SecurityGroup, &requested)
            .await
            .unwrap_err();

        match err {
            Error::Resolution {
                requested: reported,
                found,
                ..
            } => {
                assert_eq!(reported, requested);
                assert_eq!(found, strings(&["sg-456", "sg-777"]));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_extra_match_cannot_cover_missing_id() {
        let cloud = cloud().with_subnet("subnet-7", Some("public-a"), "us-west-2c");
        let resolver = ReferenceResolver::new(&cloud, VPC, TIMEOUT);

        // public-a is shared by subnet-1 and subnet-7; subnet-404 does not exist.
        let err = resolver
            .resolve(ReferenceKind::Subnet, &strings(&["subnet-404", "public-a", "public-b"]))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Resolution { .. }));
    }

    #[tokio::test]
    async fn test_resolved_entries_carry_matched_name() {
        let cloud = cloud();
        let resolver = ReferenceResolver::new(&cloud, VPC, TIMEOUT);

        let resolved = resolver
            .resolve(ReferenceKind::SecurityGroup, &strings(&["my-sg"]))
            .await
            .unwrap();

        assert_eq!(resolved[0].name.as_deref(), Some("my-sg"));
    }

    #[tokio::test]
    async fn test_repeated_tokens_requested_once() {
        let cloud = cloud();
        let resolver = ReferenceResolver::new(&cloud, VPC, TIMEOUT);

        let resolved = resolver
            .resolve(
                ReferenceKind::SecurityGroup,
                &strings(&["sg-123", "sg-123", "my-sg"]),
            )
            .await
            .unwrap();

        assert_eq!(resolved.len(), 2);
        assert_eq!(
            cloud.calls()[0],
            Call::DescribeByIds(
                ReferenceKind::SecurityGroup,
                VPC.to_string(),
                strings(&["sg-123"])
            )
        );
    }

    #[tokio::test]
    async fn test_upstream_failure_is_wrapped() {
        let cloud = cloud().failing();
        let resolver = ReferenceResolver::new(&cloud, VPC, TIMEOUT);

        let err = resolver
            .resolve(ReferenceKind::Subnet, &strings(&["subnet-1"]))
            .await
            .unwrap_err();

        match &err {
            Error::Upstream { operation, source } => {
                assert_eq!(operation, "describe subnets by ID");
                assert!(source.to_string().contains("UnauthorizedOperation"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Not retried.
        assert_eq!(cloud.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_lookup_times_out() {
        let cloud = cloud().with_delay(Duration::from_secs(60));
        let resolver = ReferenceResolver::new(&cloud, VPC, TIMEOUT);

        let err = resolver
            .resolve(ReferenceKind::SecurityGroup, &strings(&["my-sg"]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Timeout { ref operation } if operation == "describe securityGroups by Name tag"
        ));
    }
}
