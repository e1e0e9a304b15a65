//! A small interpreter for statement `Condition` blocks.
//!
//! Only five operator/key combinations are understood, all of them common allowlist shapes
//! in service control policies:
//!
//! | operator          | key                    | effect when the context value is listed |
//! |-------------------|------------------------|-----------------------------------------|
//! | `StringNotEquals` | `aws:RequestedRegion`  | region allowlisted: does not apply      |
//! | `ArnNotLike`      | `aws:PrincipalARN`     | principal exempted: does not apply      |
//! | `ArnLike`         | `aws:PrincipalARN`     | applies only to listed principals       |
//! | `StringNotEquals` | `aws:PrincipalAccount` | account allowlisted: does not apply     |
//! | `StringNotEquals` | `aws:PrincipalOrgID`   | org allowlisted: does not apply         |
//!
//! Every other operator or key is skipped and reported back as unevaluated. A skipped entry
//! never makes a statement stop applying. A check is also skipped when the request does not
//! carry the context value it needs.

use crate::document::ConditionBlock;
use crate::pattern::matches_any;
use scpguard_types::UnevaluatedCondition;
use scpguard_types::ids::{
    KEY_PRINCIPAL_ACCOUNT, KEY_PRINCIPAL_ARN, KEY_PRINCIPAL_ORG_ID, KEY_REQUESTED_REGION,
    OP_ARN_LIKE, OP_ARN_NOT_LIKE, OP_STRING_NOT_EQUALS,
};

const SUPPORTED: [(&str, &str); 5] = [
    (OP_STRING_NOT_EQUALS, KEY_REQUESTED_REGION),
    (OP_ARN_NOT_LIKE, KEY_PRINCIPAL_ARN),
    (OP_ARN_LIKE, KEY_PRINCIPAL_ARN),
    (OP_STRING_NOT_EQUALS, KEY_PRINCIPAL_ACCOUNT),
    (OP_STRING_NOT_EQUALS, KEY_PRINCIPAL_ORG_ID),
];

/// Request-side values a condition can be checked against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequestContext<'a> {
    pub region: Option<&'a str>,
    pub principal_arn: Option<&'a str>,
    pub account: Option<&'a str>,
    pub org_id: Option<&'a str>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConditionOutcome {
    pub applies: bool,
    /// Entries that were not interpreted and need a manual look.
    pub unevaluated: Vec<UnevaluatedCondition>,
}

/// Whether the condition block applies to the request context.
pub fn condition_applies(block: &ConditionBlock, ctx: &RequestContext<'_>) -> bool {
    evaluate_condition(block, ctx).applies
}

pub fn evaluate_condition(block: &ConditionBlock, ctx: &RequestContext<'_>) -> ConditionOutcome {
    ConditionOutcome {
        applies: supported_checks_apply(block, ctx),
        unevaluated: unevaluated_entries(block),
    }
}

fn supported_checks_apply(block: &ConditionBlock, ctx: &RequestContext<'_>) -> bool {
    if let (Some(region), Some(allowed)) =
        (ctx.region, block.values(OP_STRING_NOT_EQUALS, KEY_REQUESTED_REGION))
        && allowed.iter().any(|r| r == region)
    {
        return false;
    }

    if let (Some(principal), Some(exempt)) =
        (ctx.principal_arn, block.values(OP_ARN_NOT_LIKE, KEY_PRINCIPAL_ARN))
        && matches_any(exempt, principal)
    {
        return false;
    }

    if let (Some(principal), Some(targeted)) =
        (ctx.principal_arn, block.values(OP_ARN_LIKE, KEY_PRINCIPAL_ARN))
        && !matches_any(targeted, principal)
    {
        return false;
    }

    if let (Some(account), Some(allowed)) =
        (ctx.account, block.values(OP_STRING_NOT_EQUALS, KEY_PRINCIPAL_ACCOUNT))
        && allowed.iter().any(|a| a == account)
    {
        return false;
    }

    if let (Some(org_id), Some(allowed)) =
        (ctx.org_id, block.values(OP_STRING_NOT_EQUALS, KEY_PRINCIPAL_ORG_ID))
        && allowed.iter().any(|o| o == org_id)
    {
        return false;
    }

    true
}

fn unevaluated_entries(block: &ConditionBlock) -> Vec<UnevaluatedCondition> {
    block
        .pairs()
        .filter(|(op, key)| {
            !SUPPORTED
                .iter()
                .any(|(sop, skey)| sop == op && skey.eq_ignore_ascii_case(key))
        })
        .map(|(op, key)| UnevaluatedCondition {
            operator: op.to_string(),
            key: key.to_string(),
        })
        .collect()
}
