use crate::condition::{RequestContext, evaluate_condition};
use crate::document::{ActionMatcher, Effect, PolicyStatement};
use crate::pattern::matches_any;
use scpguard_types::UnevaluatedCondition;

/// A hypothetical request to test against attached policies. Never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessRequest {
    /// Fully-qualified action (`service:Action`), no wildcards.
    pub action: String,
    /// Full resource identifier, no wildcards.
    pub resource: String,
    pub principal_arn: Option<String>,
    pub region: Option<String>,
    pub account: Option<String>,
}

impl AccessRequest {
    pub fn context<'a>(&'a self, org_id: Option<&'a str>) -> RequestContext<'a> {
        RequestContext {
            region: self.region.as_deref(),
            principal_arn: self.principal_arn.as_deref(),
            account: self.account.as_deref(),
            org_id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatementVerdict {
    /// Deny statement that may block the request.
    Candidate {
        unevaluated: Vec<UnevaluatedCondition>,
    },
    NotApplicable,
}

impl StatementVerdict {
    pub fn is_candidate(&self) -> bool {
        matches!(self, StatementVerdict::Candidate { .. })
    }
}

/// True if `statement` is a candidate blocker for `request`.
///
/// See [`evaluate_statement`].
pub fn statement_applies(
    statement: &PolicyStatement,
    request: &AccessRequest,
    org_id: Option<&str>,
) -> bool {
    evaluate_statement(statement, request, org_id).is_candidate()
}

/// Decide whether one statement could block one request.
///
/// A statement is a candidate iff it is a `Deny`, its action and resource elements match,
/// and its condition block (if any) applies. The condition check is partial; see
/// [`crate::condition`]. Allow statements are never candidates.
pub fn evaluate_statement(
    statement: &PolicyStatement,
    request: &AccessRequest,
    org_id: Option<&str>,
) -> StatementVerdict {
    if statement.effect != Effect::Deny {
        return StatementVerdict::NotApplicable;
    }
    if !action_matches(&statement.actions, &request.action) {
        return StatementVerdict::NotApplicable;
    }
    if !resource_matches(statement.resources.as_deref(), &request.resource) {
        return StatementVerdict::NotApplicable;
    }

    let Some(condition) = &statement.condition else {
        return StatementVerdict::Candidate {
            unevaluated: Vec::new(),
        };
    };

    let outcome = evaluate_condition(condition, &request.context(org_id));
    if outcome.applies {
        StatementVerdict::Candidate {
            unevaluated: outcome.unevaluated,
        }
    } else {
        StatementVerdict::NotApplicable
    }
}

fn action_matches(matcher: &ActionMatcher, action: &str) -> bool {
    match matcher {
        ActionMatcher::Actions(patterns) => matches_any(patterns, action),
        ActionMatcher::NotActions(patterns) => !matches_any(patterns, action),
        ActionMatcher::Unspecified => true,
    }
}

fn resource_matches(patterns: Option<&[String]>, resource: &str) -> bool {
    match patterns {
        Some(p) => matches_any(p, resource),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PolicyDocument;

    fn statement(json: &str) -> PolicyStatement {
        let doc = PolicyDocument::parse("test", &format!(r#"{{"Statement":[{json}]}}"#))
            .expect("parse statement");
        doc.statements.into_iter().next().expect("one statement")
    }

    fn request(action: &str, resource: &str) -> AccessRequest {
        AccessRequest {
            action: action.to_string(),
            resource: resource.to_string(),
            ..AccessRequest::default()
        }
    }

    #[test]
    fn allow_is_never_a_candidate() {
        let st = statement(r#"{"Effect":"Allow","Action":"*","Resource":"*"}"#);
        assert!(!statement_applies(&st, &request("s3:GetObject", "arn:aws:s3:::b/k"), None));
    }

    #[test]
    fn action_wildcards() {
        let st = statement(r#"{"Effect":"Deny","Action":["s3:Get*"],"Resource":"*"}"#);
        assert!(statement_applies(&st, &request("s3:GetObject", "arn:aws:s3:::b/k"), None));
        assert!(!statement_applies(&st, &request("s3:PutObject", "arn:aws:s3:::b/k"), None));
    }

    #[test]
    fn not_action_presumes_match_until_excluded() {
        let st = statement(r#"{"Effect":"Deny","NotAction":["iam:*","sts:*"],"Resource":"*"}"#);
        assert!(statement_applies(&st, &request("ec2:RunInstances", "*"), None));
        assert!(!statement_applies(&st, &request("iam:CreateRole", "*"), None));
    }

    #[test]
    fn resource_must_match() {
        let st = statement(
            r#"{"Effect":"Deny","Action":"s3:*","Resource":["arn:aws:s3:::audit-logs*"]}"#,
        );
        assert!(statement_applies(
            &st,
            &request("s3:DeleteObject", "arn:aws:s3:::audit-logs/2024/01.gz"),
            None
        ));
        assert!(!statement_applies(
            &st,
            &request("s3:DeleteObject", "arn:aws:s3:::scratch/tmp"),
            None
        ));
    }

    #[test]
    fn condition_gates_the_candidate() {
        let st = statement(
            r#"{"Effect":"Deny","Action":"*","Resource":"*",
                "Condition":{"StringNotEquals":{"aws:RequestedRegion":["us-east-1"]}}}"#,
        );
        let mut req = request("logs:PutLogEvents", "arn:aws:logs:us-west-2:111111111111:log-group:app");
        req.region = Some("us-west-2".to_string());
        assert!(statement_applies(&st, &req, None));

        req.region = Some("us-east-1".to_string());
        assert!(!statement_applies(&st, &req, None));
    }

    #[test]
    fn org_id_comes_from_evaluation_context() {
        let st = statement(
            r#"{"Effect":"Deny","Action":"s3:*","Resource":"*",
                "Condition":{"StringNotEquals":{"aws:PrincipalOrgID":"o-abc123"}}}"#,
        );
        let req = request("s3:GetObject", "arn:aws:s3:::b/k");
        assert!(!statement_applies(&st, &req, Some("o-abc123")));
        assert!(statement_applies(&st, &req, Some("o-other")));
    }

    #[test]
    fn candidate_carries_unevaluated_conditions() {
        let st = statement(
            r#"{"Effect":"Deny","Action":"*","Resource":"*",
                "Condition":{"IpAddress":{"aws:SourceIp":["10.0.0.0/8"]}}}"#,
        );
        let verdict = evaluate_statement(&st, &request("s3:GetObject", "*"), None);
        match verdict {
            StatementVerdict::Candidate { unevaluated } => {
                assert_eq!(unevaluated.len(), 1);
                assert_eq!(unevaluated[0].operator, "IpAddress");
            }
            StatementVerdict::NotApplicable => panic!("expected candidate"),
        }
    }
}
