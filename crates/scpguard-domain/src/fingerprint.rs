use scpguard_types::{MirrorPath, NodeId};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Compute a stable SHA-256 digest of a mirror's structure.
///
/// Identity fields, one line per node in id order:
/// - node id
/// - mirror-relative directory path
///
/// File contents are not part of the digest: policy definitions are edited by hand between
/// runs, the node layout is not.
pub fn structure_digest(nodes: &BTreeMap<NodeId, MirrorPath>) -> String {
    let canonical = nodes
        .iter()
        .map(|(id, path)| format!("{}|{}", id.as_str(), path.as_str()))
        .collect::<Vec<_>>()
        .join("\n");

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}
