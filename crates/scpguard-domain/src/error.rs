use scpguard_types::{MirrorPath, NodeId};
use thiserror::Error;

/// Failure reported by the directory/policy-store collaborator.
///
/// Collaborator failures are never retried; they abort the run.
#[derive(Debug, Error)]
#[error("{operation} failed: {message}")]
pub struct DirectoryError {
    pub operation: String,
    pub message: String,
}

impl DirectoryError {
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScpError {
    /// The live hierarchy is malformed: cycles, orphans, zero or several roots.
    #[error("hierarchy integrity error: {0}")]
    Integrity(String),

    /// The mirror has no directory for a node that exists in the live hierarchy.
    #[error(
        "mirror has no directory for {kind} {id} (expected {expected}); re-run `scpguard sync` before resolving"
    )]
    MissingMirror {
        id: NodeId,
        kind: &'static str,
        expected: MirrorPath,
    },

    /// A directory exceeds the attachment limits.
    #[error(
        "attachment limit exceeded in {path}: {total} attachments (max {max_total}), {custom} custom (max {max_custom})"
    )]
    StructuralViolation {
        path: MirrorPath,
        total: usize,
        custom: usize,
        max_total: usize,
        /// Unset for root and account directories, which only have the total cap.
        max_custom: MaxCustom,
    },

    #[error("policy {policy} is attached to {target} more than once")]
    DuplicateTarget { policy: String, target: NodeId },

    #[error("policy {policy} is defined in both {first} and {second}; move it to the shared directory")]
    ConflictingSource {
        policy: String,
        first: MirrorPath,
        second: MirrorPath,
    },

    #[error("shared policy {policy} has no canonical definition at {expected}")]
    MissingSharedDefinition {
        policy: String,
        expected: MirrorPath,
    },

    #[error("unsupported mirror snapshot schema {found:?} (expected {expected:?})")]
    UnsupportedMirror { found: String, expected: String },

    #[error(transparent)]
    Collaborator(#[from] DirectoryError),

    #[error("policy {policy} is not valid JSON policy language")]
    PolicyParse {
        policy: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("policy {policy} is malformed: {reason}")]
    PolicyShape { policy: String, reason: String },

    #[error("io error at {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ScpError {
    pub fn io(path: impl std::fmt::Display, source: std::io::Error) -> Self {
        ScpError::Io {
            path: path.to_string(),
            source,
        }
    }
}

/// Display helper for the optional custom-attachment cap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaxCustom(pub Option<usize>);

impl std::fmt::Display for MaxCustom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(n) => write!(f, "{n}"),
            None => f.write_str("n/a"),
        }
    }
}
