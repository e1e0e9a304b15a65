//! Pure policy evaluation and attachment rules (no IO).
//!
//! Input: parsed policy documents, hypothetical requests, directory counts.
//! Output: candidate verdicts, classifications, invariant violations.

#![forbid(unsafe_code)]

pub mod classify;
pub mod condition;
pub mod document;
pub mod error;
pub mod fingerprint;
pub mod limits;
pub mod matcher;
pub mod pattern;
pub mod policy;

#[cfg(test)]
mod properties;

pub use classify::AttachmentFrequency;
pub use condition::{ConditionOutcome, RequestContext, condition_applies, evaluate_condition};
pub use document::{ActionMatcher, ConditionBlock, Effect, PolicyDocument, PolicyStatement};
pub use error::{DirectoryError, MaxCustom, ScpError};
pub use fingerprint::structure_digest;
pub use limits::{DirectoryCounts, check_directory};
pub use matcher::{AccessRequest, StatementVerdict, evaluate_statement, statement_applies};
pub use pattern::wildcard_match;
pub use policy::{AttachmentLimits, Classifier, EffectiveConfig, MirrorLayout, OutputPaths};
