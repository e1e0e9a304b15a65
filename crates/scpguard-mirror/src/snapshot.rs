use crate::fs::write_atomic;
use camino::Utf8Path;
use schemars::JsonSchema;
use scpguard_domain::{ScpError, structure_digest};
use scpguard_types::ids::{MIRROR_SNAPSHOT_FILE, SCHEMA_MIRROR_V1};
use scpguard_types::{MirrorPath, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata written next to the mirror by every sync and checked by every resolve.
///
/// No timestamps: syncing an unchanged organization reproduces the file byte for byte.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MirrorSnapshot {
    pub schema: String,
    pub root_id: NodeId,
    /// Mirror directory of every live node at sync time.
    pub nodes: BTreeMap<NodeId, MirrorPath>,
    /// SHA-256 of `nodes`.
    pub structure_digest: String,
}

impl MirrorSnapshot {
    pub fn new(root_id: NodeId, nodes: BTreeMap<NodeId, MirrorPath>) -> Self {
        let structure_digest = structure_digest(&nodes);
        Self {
            schema: SCHEMA_MIRROR_V1.to_string(),
            root_id,
            nodes,
            structure_digest,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ScpError> {
        let mut bytes = serde_json::to_vec_pretty(self).map_err(|source| ScpError::PolicyParse {
            policy: MIRROR_SNAPSHOT_FILE.to_string(),
            source,
        })?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Write into the directory `mirror_dir`.
    pub(crate) fn write(&self, mirror_dir: &Utf8Path) -> Result<(), ScpError> {
        write_atomic(&mirror_dir.join(MIRROR_SNAPSHOT_FILE), &self.to_bytes()?)
    }
}

/// Read the snapshot from the directory `mirror_dir`. A missing file is `Ok(None)`.
pub fn read_snapshot(mirror_dir: &Utf8Path) -> Result<Option<MirrorSnapshot>, ScpError> {
    let path = mirror_dir.join(MIRROR_SNAPSHOT_FILE);
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ScpError::io(&path, e)),
    };

    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|source| ScpError::PolicyParse {
            policy: path.to_string(),
            source,
        })?;
    let found = value
        .get("schema")
        .and_then(|s| s.as_str())
        .unwrap_or_default();
    if found != SCHEMA_MIRROR_V1 {
        return Err(ScpError::UnsupportedMirror {
            found: found.to_string(),
            expected: SCHEMA_MIRROR_V1.to_string(),
        });
    }

    let snapshot = serde_json::from_value(value).map_err(|source| ScpError::PolicyParse {
        policy: path.to_string(),
        source,
    })?;
    Ok(Some(snapshot))
}
