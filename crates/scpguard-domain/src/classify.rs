use crate::policy::Classifier;
use scpguard_types::PolicyClass;
use std::collections::BTreeMap;

/// Organization-wide count of attachments per policy name.
///
/// Built once from a complete pre-pass over the whole tree and only read afterwards. A
/// partial count would classify a policy attached twice as custom until its second
/// attachment had been seen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttachmentFrequency {
    counts: BTreeMap<String, usize>,
}

impl AttachmentFrequency {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut counts = BTreeMap::new();
        for name in names {
            *counts.entry(name.into()).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn count(&self, policy: &str) -> usize {
        self.counts.get(policy).copied().unwrap_or(0)
    }

    pub fn is_shared(&self, policy: &str) -> bool {
        self.count(policy) > 1
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl Classifier {
    /// Classify one attachment. Baseline and guardrail names win over frequency.
    pub fn classify(&self, policy: &str, frequency: &AttachmentFrequency) -> PolicyClass {
        if self.is_baseline(policy) {
            PolicyClass::Baseline
        } else if self.is_guardrail(policy) {
            PolicyClass::Guardrail
        } else if frequency.is_shared(policy) {
            PolicyClass::Shared
        } else {
            PolicyClass::Custom
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_counts_every_attachment() {
        let freq = AttachmentFrequency::from_names(["A", "B", "A", "FullAWSAccess", "A"]);
        assert_eq!(freq.count("A"), 3);
        assert_eq!(freq.count("B"), 1);
        assert_eq!(freq.count("missing"), 0);
        assert!(freq.is_shared("A"));
        assert!(!freq.is_shared("B"));
    }

    #[test]
    fn classification_precedence() {
        let c = Classifier::default();
        let freq = AttachmentFrequency::from_names([
            "FullAWSAccess",
            "FullAWSAccess",
            "aws-guardrails-x",
            "aws-guardrails-x",
            "Shared",
            "Shared",
            "Custom",
        ]);
        assert_eq!(c.classify("FullAWSAccess", &freq), PolicyClass::Baseline);
        assert_eq!(c.classify("aws-guardrails-x", &freq), PolicyClass::Guardrail);
        assert_eq!(c.classify("Shared", &freq), PolicyClass::Shared);
        assert_eq!(c.classify("Custom", &freq), PolicyClass::Custom);
    }
}
