//! Fuzz target for policy document parsing and statement evaluation.
//!
//! Goal: parsing arbitrary content and evaluating every Deny statement against an arbitrary
//! request should **never panic**. Malformed documents must come back as errors.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_policy_document
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use scpguard_domain::{AccessRequest, PolicyDocument, evaluate_statement};

#[derive(Arbitrary, Debug)]
struct DocumentInput {
    content: String,
    action: String,
    resource: String,
    principal_arn: Option<String>,
    region: Option<String>,
    account: Option<String>,
    org_id: Option<String>,
}

fuzz_target!(|input: DocumentInput| {
    if input.content.len() > 16 * 1024 {
        return;
    }

    let Ok(document) = PolicyDocument::parse("fuzz", &input.content) else {
        return;
    };

    let request = AccessRequest {
        action: input.action,
        resource: input.resource,
        principal_arn: input.principal_arn,
        region: input.region,
        account: input.account,
    };

    for (_, statement) in document.deny_statements() {
        let _ = evaluate_statement(statement, &request, input.org_id.as_deref());
    }
});
