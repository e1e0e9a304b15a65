/// Match `text` against a policy pattern where `*` stands for any (possibly empty) substring.
///
/// The match is case-sensitive and unanchored: the literal segments between wildcards must
/// appear in order somewhere in `text`. `?`, classes and escapes carry no meaning. An empty
/// pattern matches everything.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let mut rest = text;
    for segment in pattern.split('*').filter(|s| !s.is_empty()) {
        match rest.find(segment) {
            Some(pos) => rest = &rest[pos + segment.len()..],
            None => return false,
        }
    }
    true
}

/// True if any pattern in `patterns` matches `text`.
pub fn matches_any(patterns: &[String], text: &str) -> bool {
    patterns.iter().any(|p| wildcard_match(p, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_wildcard_matches_action_family() {
        assert!(wildcard_match("s3:Get*", "s3:GetObject"));
        assert!(!wildcard_match("s3:Get*", "s3:PutObject"));
    }

    #[test]
    fn lone_star_matches_everything() {
        assert!(wildcard_match("*", "logs:PutLogEvents"));
        assert!(wildcard_match("*", ""));
    }

    #[test]
    fn match_is_case_sensitive() {
        assert!(!wildcard_match("s3:get*", "s3:GetObject"));
    }

    #[test]
    fn match_is_unanchored() {
        assert!(wildcard_match("Object", "s3:GetObject"));
        assert!(wildcard_match("arn:aws:iam::*:role/Admin*", "arn:aws:iam::111111111111:role/AdminRole"));
        assert!(!wildcard_match("arn:aws:iam::*:role/Admin*", "arn:aws:iam::111111111111:user/Admin"));
    }

    #[test]
    fn segments_must_appear_in_order() {
        assert!(wildcard_match("a*b*c", "xaybzc"));
        assert!(!wildcard_match("c*b*a", "abc"));
    }

    #[test]
    fn matches_any_over_list() {
        let patterns = vec!["iam:*".to_string(), "s3:Delete*".to_string()];
        assert!(matches_any(&patterns, "s3:DeleteBucket"));
        assert!(!matches_any(&patterns, "ec2:RunInstances"));
        assert!(!matches_any(&[], "ec2:RunInstances"));
    }
}
