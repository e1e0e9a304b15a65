use crate::classify::AttachmentFrequency;
use crate::document::PolicyDocument;
use crate::limits::{DirectoryCounts, check_directory};
use crate::matcher::{AccessRequest, statement_applies};
use crate::pattern::wildcard_match;
use crate::policy::AttachmentLimits;
use proptest::prelude::*;
use scpguard_types::{MirrorPath, NodeKind};

fn token() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9:/_.-]{0,24}"
}

proptest! {
    #[test]
    fn star_matches_everything(text in token()) {
        prop_assert!(wildcard_match("*", &text));
    }

    #[test]
    fn literal_pattern_matches_itself_embedded(
        prefix in token(),
        literal in token(),
        suffix in token(),
    ) {
        let text = format!("{prefix}{literal}{suffix}");
        prop_assert!(wildcard_match(&literal, &literal));
        prop_assert!(wildcard_match(&literal, &text));
    }

    #[test]
    fn allow_statement_is_never_a_candidate(action in token(), resource in token()) {
        let doc = PolicyDocument::parse(
            "allow",
            r#"{"Statement":{"Effect":"Allow","Action":"*","Resource":"*"}}"#,
        ).unwrap();
        let request = AccessRequest {
            action,
            resource,
            ..AccessRequest::default()
        };
        for stmt in &doc.statements {
            prop_assert!(!statement_applies(stmt, &request, None));
        }
    }

    #[test]
    fn frequency_counts_sum_to_input_len(names in prop::collection::vec("[a-c]", 0..32)) {
        let freq = AttachmentFrequency::from_names(names.iter().cloned());
        let total: usize = freq.iter().map(|(_, n)| n).sum();
        prop_assert_eq!(total, names.len());
    }

    #[test]
    fn within_limits_never_rejected(custom in 0usize..=2, shared in 0usize..=2) {
        let counts = DirectoryCounts { custom, shared, guardrail: 0, baseline: 1 };
        let path = MirrorPath::new("m/ROOT/unit");
        prop_assert!(check_directory(
            &path,
            NodeKind::OrganizationalUnit,
            &counts,
            &AttachmentLimits::default(),
        ).is_ok());
    }
}
