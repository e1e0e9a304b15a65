//! The `find-blocking` use case.
//!
//! This is a recall-oriented diagnostic aid, not an authorization verdict. Every Deny statement
//! that could apply to the request is reported; nothing is ranked or ruled out by precedence,
//! and conditions outside the five supported checks are assumed to apply.

use anyhow::Context;
use scpguard_domain::{AccessRequest, PolicyDocument, ScpError, StatementVerdict, evaluate_statement};
use scpguard_org::{HierarchyWalker, OrgDirectory};
use scpguard_types::{
    AccessQuery, BlockingCandidate, BlockingData, BlockingReport, SCHEMA_BLOCKING_REPORT_V1,
    ToolMeta,
};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

pub struct FindBlockingInput<'a> {
    pub directory: &'a dyn OrgDirectory,
    pub query: AccessQuery,
}

/// Walk from `query.target` up to the root and collect every Deny statement that may block
/// the request, in ancestor order, then policy order, then statement order.
pub fn find_blocking_statements<D: OrgDirectory + ?Sized>(
    walker: &HierarchyWalker<'_, D>,
    query: &AccessQuery,
) -> Result<(Vec<BlockingCandidate>, BlockingData), ScpError> {
    let org_id = walker.organization_id()?;
    let request = AccessRequest {
        action: query.action.clone(),
        resource: query.resource.clone(),
        principal_arn: query.principal_arn.clone(),
        region: query.region.clone(),
        account: query.account.clone(),
    };

    let ancestors = walker.ancestors_of(&query.target)?;
    let mut data = BlockingData {
        ancestors: ancestors.iter().map(|n| n.id.clone()).collect(),
        ..BlockingData::default()
    };
    let mut candidates = Vec::new();

    for (depth, node) in ancestors.iter().enumerate() {
        info!(node = %node.id, name = %node.name, "scanning attached policies");
        for policy in walker.policies_for(&node.id)? {
            data.policies_inspected += 1;
            let detail = walker.directory().describe_policy(&policy.id)?;
            debug!(policy = %policy.name, content = %detail.content, "policy content");
            let document = PolicyDocument::parse(&policy.name, &detail.content)?;

            for (index, statement) in document.statements.iter().enumerate() {
                data.statements_inspected += 1;
                let StatementVerdict::Candidate { unevaluated } =
                    evaluate_statement(statement, &request, Some(org_id.as_str()))
                else {
                    continue;
                };
                warn!(
                    policy = %policy.name,
                    node = %node.id,
                    statement = index,
                    "Found a possibly-blocking SCP in policy {}",
                    policy.name
                );
                candidates.push(BlockingCandidate {
                    policy_id: policy.id.clone(),
                    policy_name: policy.name.clone(),
                    policy_arn: policy.arn.clone(),
                    attached_to: node.id.clone(),
                    depth: depth as u32,
                    statement_index: index as u32,
                    statement: statement.raw.clone(),
                    unevaluated_conditions: unevaluated,
                });
            }
        }
    }
    Ok((candidates, data))
}

/// Run the diagnostic and wrap the result in a report envelope.
///
/// Zero candidates is a successful outcome.
pub fn run_find_blocking(input: FindBlockingInput<'_>) -> anyhow::Result<BlockingReport> {
    let started_at = OffsetDateTime::now_utc();
    let walker = HierarchyWalker::new(input.directory);

    let (candidates, data) = find_blocking_statements(&walker, &input.query)
        .with_context(|| format!("find blocking statements for {}", input.query.target))?;

    if candidates.is_empty() {
        info!(node = %input.query.target, "no possibly-blocking statements found");
    }

    Ok(BlockingReport {
        schema: SCHEMA_BLOCKING_REPORT_V1.to_string(),
        tool: ToolMeta {
            name: "scpguard".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        started_at,
        finished_at: OffsetDateTime::now_utc(),
        query: input.query,
        candidates,
        data,
    })
}
