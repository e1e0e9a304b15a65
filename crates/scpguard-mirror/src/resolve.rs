//! Attachment resolver: read the mirror back into per-policy attachment records.

use crate::definition::read_definition;
use crate::snapshot::{MirrorSnapshot, read_snapshot};
use camino::Utf8Path;
use scpguard_domain::{DirectoryCounts, EffectiveConfig, ScpError, check_directory};
use scpguard_org::{HierarchyWalker, OrgDirectory};
use scpguard_types::ids::{EXT_DEFINITION, EXT_GUARDRAIL, EXT_PLACEHOLDER, EXT_SHARED};
use scpguard_types::{HierarchyNode, MirrorPath, NodeId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Where a policy is defined and which nodes it is attached to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentRecord {
    /// Canonical definition file, relative to the mirror root.
    pub path: MirrorPath,
    /// Distinct targets in traversal order.
    pub targets: Vec<NodeId>,
}

/// Attachment records ordered by policy name.
pub type AttachmentMap = BTreeMap<String, AttachmentRecord>;

/// Files of one node directory that carry attachments, sorted by name.
#[derive(Debug, Default)]
struct DirectoryScan {
    definitions: Vec<String>,
    shared: Vec<String>,
    counts: DirectoryCounts,
}

/// Walk the mirror under `mirror_root` in lockstep with the live hierarchy.
///
/// A live node without a mirror directory fails with [`ScpError::MissingMirror`]. Each
/// directory is checked against the attachment limits before its children are visited.
/// Mirror directories with no live counterpart are ignored.
pub fn resolve<D: OrgDirectory + ?Sized>(
    directory: &D,
    mirror_root: &Utf8Path,
    config: &EffectiveConfig,
) -> Result<AttachmentMap, ScpError> {
    let layout = &config.layout;
    let snapshot = read_snapshot(&mirror_root.join(&layout.mirror_dir))?;
    if snapshot.is_none() {
        info!("mirror has no snapshot file; skipping drift check");
    }

    let walker = HierarchyWalker::new(directory);
    let root = walker.root()?;
    if let Some(snapshot) = &snapshot
        && snapshot.root_id != root.id
    {
        warn!(recorded = %snapshot.root_id, live = %root.id, "mirror was synced from a different root");
    }

    let resolver = Resolver {
        walker,
        mirror_root,
        config,
        snapshot: snapshot.as_ref(),
    };
    let mut records = AttachmentMap::new();
    let mut visited = BTreeSet::new();
    resolver.visit(&root, &layout.root_path(), &mut records, &mut visited)?;
    Ok(records)
}

struct Resolver<'a, D: OrgDirectory + ?Sized> {
    walker: HierarchyWalker<'a, D>,
    mirror_root: &'a Utf8Path,
    config: &'a EffectiveConfig,
    snapshot: Option<&'a MirrorSnapshot>,
}

impl<D: OrgDirectory + ?Sized> Resolver<'_, D> {
    fn visit(
        &self,
        node: &HierarchyNode,
        path: &MirrorPath,
        records: &mut AttachmentMap,
        visited: &mut BTreeSet<NodeId>,
    ) -> Result<(), ScpError> {
        if !visited.insert(node.id.clone()) {
            return Err(ScpError::Integrity(format!(
                "cycle detected: {} reached twice while resolving",
                node.id
            )));
        }
        let dir = self.mirror_root.join(path.as_str());
        if !dir.is_dir() {
            return Err(ScpError::MissingMirror {
                id: node.id.clone(),
                kind: node.kind.as_str(),
                expected: path.clone(),
            });
        }
        self.check_drift(node, path);

        info!(path = %path, "scanning for attachments");
        let scan = scan_directory(&dir)?;
        check_directory(path, node.kind, &scan.counts, &self.config.limits)?;

        for name in &scan.definitions {
            let definition = path.join(&format!("{name}.{EXT_DEFINITION}"));
            self.attach(records, name, definition, &node.id)?;
        }
        for name in &scan.shared {
            let definition = self.config.layout.shared_definition(name);
            if !self.mirror_root.join(definition.as_str()).is_file() {
                return Err(ScpError::MissingSharedDefinition {
                    policy: name.clone(),
                    expected: definition,
                });
            }
            self.attach(records, name, definition, &node.id)?;
        }

        let children = self
            .config
            .layout
            .child_paths(path, self.walker.children_of(node)?)?;
        for (child, child_path) in &children {
            self.visit(child, child_path, records, visited)?;
        }
        Ok(())
    }

    fn attach(
        &self,
        records: &mut AttachmentMap,
        policy: &str,
        definition: MirrorPath,
        target: &NodeId,
    ) -> Result<(), ScpError> {
        match records.get_mut(policy) {
            Some(record) if record.path != definition => Err(ScpError::ConflictingSource {
                policy: policy.to_string(),
                first: record.path.clone(),
                second: definition,
            }),
            Some(record) if record.targets.contains(target) => Err(ScpError::DuplicateTarget {
                policy: policy.to_string(),
                target: target.clone(),
            }),
            Some(record) => {
                record.targets.push(target.clone());
                Ok(())
            }
            None => {
                read_definition(self.mirror_root, &definition)?;
                records.insert(
                    policy.to_string(),
                    AttachmentRecord {
                        path: definition,
                        targets: vec![target.clone()],
                    },
                );
                Ok(())
            }
        }
    }

    fn check_drift(&self, node: &HierarchyNode, path: &MirrorPath) {
        let Some(snapshot) = self.snapshot else {
            return;
        };
        match snapshot.nodes.get(&node.id) {
            Some(recorded) if recorded != path => warn!(
                node = %node.id,
                recorded = %recorded,
                live = %path,
                "mirror drift: node directory moved since last sync"
            ),
            None => warn!(node = %node.id, live = %path, "mirror drift: node not in last sync"),
            Some(_) => {}
        }
    }
}

fn scan_directory(dir: &Utf8Path) -> Result<DirectoryScan, ScpError> {
    let mut scan = DirectoryScan::default();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| ScpError::io(dir, e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(file) = Utf8Path::from_path(entry.path()) else {
            warn!(path = %entry.path().display(), "skipping non-UTF-8 file name");
            continue;
        };
        let (Some(stem), Some(ext)) = (file.file_stem(), file.extension()) else {
            continue;
        };
        match ext {
            EXT_DEFINITION => {
                scan.counts.custom += 1;
                scan.definitions.push(stem.to_string());
            }
            EXT_SHARED => {
                scan.counts.shared += 1;
                scan.shared.push(stem.to_string());
            }
            EXT_GUARDRAIL => scan.counts.guardrail += 1,
            EXT_PLACEHOLDER => scan.counts.baseline += 1,
            _ => {}
        }
    }
    Ok(scan)
}
