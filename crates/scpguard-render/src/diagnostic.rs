use scpguard_types::{BlockingCandidate, BlockingReport};

const RECALL_NOTE: &str = "Candidates may block the request; none is guaranteed to. \
Only five condition checks are evaluated, unevaluated ones are listed per statement.";

fn query_line(report: &BlockingReport) -> String {
    let q = &report.query;
    let mut line = format!("{} on {} at {}", q.action, q.resource, q.target);
    if let Some(region) = &q.region {
        line.push_str(&format!(" in {region}"));
    }
    if let Some(principal) = &q.principal_arn {
        line.push_str(&format!(" as {principal}"));
    }
    if let Some(account) = &q.account {
        line.push_str(&format!(" (account {account})"));
    }
    line
}

fn statement_json(candidate: &BlockingCandidate) -> String {
    serde_json::to_string_pretty(&candidate.statement)
        .unwrap_or_else(|_| candidate.statement.to_string())
}

/// Plain-text rendering for terminals.
pub fn render_blocking_text(report: &BlockingReport) -> String {
    let mut out = String::new();
    let data = &report.data;

    if report.candidates.is_empty() {
        out.push_str(&format!(
            "No possibly-blocking statements for {}\n",
            query_line(report)
        ));
    } else {
        out.push_str(&format!(
            "Found {} possibly-blocking statement(s) for {}\n",
            report.candidates.len(),
            query_line(report)
        ));
    }
    out.push_str(&format!(
        "Inspected {} node(s), {} policy attachment(s), {} statement(s)\n",
        data.ancestors.len(),
        data.policies_inspected,
        data.statements_inspected
    ));

    for (i, c) in report.candidates.iter().enumerate() {
        out.push_str(&format!(
            "\n[{}] {} ({}) attached to {} (depth {}), statement {}\n",
            i + 1,
            c.policy_name,
            c.policy_id,
            c.attached_to,
            c.depth,
            c.statement_index
        ));
        if let Some(arn) = &c.policy_arn {
            out.push_str(&format!("    arn: {arn}\n"));
        }
        for u in &c.unevaluated_conditions {
            out.push_str(&format!("    not evaluated: {} {}\n", u.operator, u.key));
        }
        for line in statement_json(c).lines() {
            out.push_str("    ");
            out.push_str(line);
            out.push('\n');
        }
    }

    if !report.candidates.is_empty() {
        out.push_str(&format!("\n{RECALL_NOTE}\n"));
    }
    out
}

/// Markdown rendering for pull-request comments and tickets.
pub fn render_blocking_markdown(report: &BlockingReport) -> String {
    let mut out = String::new();
    out.push_str("# Possibly-blocking service control policies\n\n");
    out.push_str(&format!("- Query: `{}`\n", query_line(report)));
    out.push_str(&format!(
        "- Path: {}\n",
        report
            .data
            .ancestors
            .iter()
            .map(|a| format!("`{a}`"))
            .collect::<Vec<_>>()
            .join(" → ")
    ));
    out.push_str(&format!("- Candidates: {}\n\n", report.candidates.len()));

    if report.candidates.is_empty() {
        out.push_str("No candidates.\n");
        return out;
    }

    out.push_str(&format!("> {RECALL_NOTE}\n\n"));
    for c in &report.candidates {
        out.push_str(&format!(
            "## {} (`{}`), statement {}\n\n",
            c.policy_name, c.policy_id, c.statement_index
        ));
        out.push_str(&format!(
            "Attached to `{}` (depth {}).\n\n",
            c.attached_to, c.depth
        ));
        if !c.unevaluated_conditions.is_empty() {
            out.push_str("Not evaluated:\n\n");
            for u in &c.unevaluated_conditions {
                out.push_str(&format!("- `{}` on `{}`\n", u.operator, u.key));
            }
            out.push('\n');
        }
        out.push_str("```json\n");
        out.push_str(&statement_json(c));
        out.push_str("\n```\n\n");
    }
    out
}
