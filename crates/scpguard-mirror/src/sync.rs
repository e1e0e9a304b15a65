//! Structure synchronizer: mirror the live hierarchy and its attachments on disk.

use crate::definition::render_definition;
use crate::fs::{PreparedFile, Staging, write_atomic};
use crate::snapshot::MirrorSnapshot;
use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use scpguard_domain::{AttachmentFrequency, EffectiveConfig, ScpError};
use scpguard_org::{HierarchyWalker, OrgDirectory};
use scpguard_types::ids::{EXT_DEFINITION, EXT_GUARDRAIL, EXT_PLACEHOLDER, EXT_SHARED};
use scpguard_types::{HierarchyNode, MirrorPath, NodeId, PolicyClass, PolicySummary};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Leave custom and shared policy files alone; only refresh directories, baseline and
    /// guardrail markers.
    pub skip_custom_refresh: bool,
    /// Do not plan import blocks.
    pub skip_imports: bool,
}

/// One customer-managed policy materialized by a sync.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncedPolicy {
    pub id: String,
    pub description: String,
    pub class: PolicyClass,
    /// Canonical definition file.
    pub path: MirrorPath,
    /// Attachment targets in traversal order.
    pub targets: Vec<NodeId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentImport {
    pub policy_name: String,
    pub policy_id: String,
    pub target: NodeId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyImport {
    pub policy_name: String,
    pub policy_id: String,
}

impl PolicyImport {
    /// Terraform module name: the policy name with spaces replaced by underscores.
    pub fn module_name(&self) -> String {
        self.policy_name.replace(' ', "_")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportPlan {
    pub attachments: Vec<AttachmentImport>,
    pub policies: Vec<PolicyImport>,
}

#[derive(Clone, Debug)]
pub struct SyncOutcome {
    /// Customer-managed policies by name.
    pub summary: BTreeMap<String, SyncedPolicy>,
    /// `None` when imports were skipped.
    pub imports: Option<ImportPlan>,
    pub snapshot: MirrorSnapshot,
    pub frequency: AttachmentFrequency,
    /// Absolute directory the mirror was written to.
    pub mirror_dir: Utf8PathBuf,
}

/// Mirrors the organization under `<mirror_root>/<mirror_dir>`.
pub struct Synchronizer<'a, D: OrgDirectory + ?Sized> {
    walker: HierarchyWalker<'a, D>,
    config: &'a EffectiveConfig,
    options: SyncOptions,
}

/// One attachment written while visiting a node.
#[derive(Clone, Debug)]
struct Attached {
    summary: PolicySummary,
    class: PolicyClass,
    path: MirrorPath,
    target: NodeId,
}

/// Per-subtree result, merged by the parent in child order.
#[derive(Debug, Default)]
struct SubtreeSync {
    attached: Vec<Attached>,
    nodes: Vec<(NodeId, MirrorPath)>,
}

/// Where mirror paths land while the run is staged.
struct StageTarget<'s> {
    dir: &'s Utf8Path,
    prefix: MirrorPath,
}

impl StageTarget<'_> {
    fn resolve(&self, path: &MirrorPath) -> Utf8PathBuf {
        let rest = path
            .as_str()
            .strip_prefix(self.prefix.as_str())
            .map(|r| r.trim_start_matches('/'))
            .unwrap_or(path.as_str());
        if rest.is_empty() {
            self.dir.to_path_buf()
        } else {
            self.dir.join(rest)
        }
    }
}

impl<'a, D: OrgDirectory + ?Sized> Synchronizer<'a, D> {
    pub fn new(directory: &'a D, config: &'a EffectiveConfig, options: SyncOptions) -> Self {
        Self {
            walker: HierarchyWalker::new(directory),
            config,
            options,
        }
    }

    /// Run a full sync into `mirror_root` and commit it.
    pub fn run(&self, mirror_root: &Utf8Path) -> Result<SyncOutcome, ScpError> {
        self.stage(mirror_root)?.commit()
    }

    /// Build the mirror for `mirror_root` without touching the destination.
    ///
    /// The organization-wide attachment count is completed before anything is classified.
    /// The mirror is built in a staging directory seeded with the current mirror and swapped
    /// into place by [`StagedSync::commit`].
    pub fn stage(&self, mirror_root: &Utf8Path) -> Result<StagedSync, ScpError> {
        let layout = &self.config.layout;
        let root = self.walker.root()?;
        let frequency = self.attachment_frequency(&root)?;

        let mirror_dir = mirror_root.join(&layout.mirror_dir);
        let staging = Staging::seeded(&mirror_dir)?;
        let target = StageTarget {
            dir: staging.dir(),
            prefix: layout.mirror_path(),
        };
        let shared_dir = target.resolve(&layout.shared_path());
        std::fs::create_dir_all(&shared_dir).map_err(|e| ScpError::io(&shared_dir, e))?;

        let seen = Mutex::new(BTreeSet::new());
        let subtree = self.sync_node(&root, &layout.root_path(), &frequency, &target, &seen)?;

        let summary = merge_summary(&subtree.attached)?;
        let snapshot = MirrorSnapshot::new(root.id.clone(), subtree.nodes.into_iter().collect());
        snapshot.write(staging.dir())?;

        let imports = if self.options.skip_imports {
            None
        } else {
            Some(self.import_plan(&subtree.attached)?)
        };

        Ok(StagedSync {
            outcome: SyncOutcome {
                summary,
                imports,
                snapshot,
                frequency,
                mirror_dir,
            },
            staging,
            files: Vec::new(),
        })
    }

    /// Pre-pass: count every attachment of every policy across the whole tree.
    fn attachment_frequency(&self, root: &HierarchyNode) -> Result<AttachmentFrequency, ScpError> {
        let mut names = Vec::new();
        for node in std::iter::once(Ok(root.clone())).chain(self.walker.descendants_of(root)) {
            let node = node?;
            names.extend(
                self.walker
                    .policies_for(&node.id)?
                    .into_iter()
                    .map(|p| p.name),
            );
        }
        Ok(AttachmentFrequency::from_names(names))
    }

    fn sync_node(
        &self,
        node: &HierarchyNode,
        path: &MirrorPath,
        frequency: &AttachmentFrequency,
        target: &StageTarget<'_>,
        seen: &Mutex<BTreeSet<NodeId>>,
    ) -> Result<SubtreeSync, ScpError> {
        let first_visit = seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(node.id.clone());
        if !first_visit {
            return Err(ScpError::Integrity(format!(
                "cycle detected: {} reached twice while mirroring",
                node.id
            )));
        }
        let dir = target.resolve(path);
        std::fs::create_dir_all(&dir).map_err(|e| ScpError::io(&dir, e))?;
        info!(node = %node.id, path = %path, "mirroring node");

        let mut out = SubtreeSync::default();
        out.nodes.push((node.id.clone(), path.clone()));

        for policy in self.walker.policies_for(&node.id)? {
            if let Some(attached) = self.sync_attachment(node, path, policy, frequency, target)? {
                out.attached.push(attached);
            }
        }

        let children = self
            .config
            .layout
            .child_paths(path, self.walker.children_of(node)?)?;
        let subtrees = children
            .par_iter()
            .map(|(child, child_path)| self.sync_node(child, child_path, frequency, target, seen))
            .collect::<Result<Vec<_>, _>>()?;

        for subtree in subtrees {
            out.attached.extend(subtree.attached);
            out.nodes.extend(subtree.nodes);
        }
        Ok(out)
    }

    fn sync_attachment(
        &self,
        node: &HierarchyNode,
        path: &MirrorPath,
        policy: PolicySummary,
        frequency: &AttachmentFrequency,
        target: &StageTarget<'_>,
    ) -> Result<Option<Attached>, ScpError> {
        let layout = &self.config.layout;
        let class = self.config.classifier.classify(&policy.name, frequency);

        let definition = match class {
            PolicyClass::Baseline => {
                let marker = path.join(&format!("{}.{EXT_PLACEHOLDER}", policy.name));
                debug!(path = %marker, "baseline placeholder");
                write_atomic(&target.resolve(&marker), b"")?;
                return Ok(None);
            }
            PolicyClass::Guardrail => {
                let marker = path.join(&format!("{}.{EXT_GUARDRAIL}", policy.name));
                debug!(path = %marker, "guardrail placeholder");
                write_atomic(&target.resolve(&marker), b"")?;
                return Ok(None);
            }
            _ if self.options.skip_custom_refresh => {
                debug!(policy = %policy.name, node = %node.id, "custom refresh skipped");
                return Ok(None);
            }
            PolicyClass::Shared => {
                let marker = path.join(&format!("{}.{EXT_SHARED}", policy.name));
                debug!(path = %marker, "shared placeholder");
                write_atomic(&target.resolve(&marker), b"")?;
                layout.shared_definition(&policy.name)
            }
            PolicyClass::Custom => path.join(&format!("{}.{EXT_DEFINITION}", policy.name)),
        };

        let detail = self.walker.directory().describe_policy(&policy.id)?;
        debug!(policy = %policy.name, content = %detail.content, "policy content");

        let description = if policy.description.trim().is_empty() {
            policy.name.clone()
        } else {
            policy.description.clone()
        };
        let bytes = render_definition(&policy.name, &detail.content, &description)?;
        info!(policy = %policy.name, path = %definition, "writing policy definition");
        write_atomic(&target.resolve(&definition), &bytes)?;

        Ok(Some(Attached {
            summary: PolicySummary {
                description,
                ..policy
            },
            class,
            path: definition,
            target: node.id.clone(),
        }))
    }

    fn import_plan(&self, attached: &[Attached]) -> Result<ImportPlan, ScpError> {
        let attachments = attached
            .iter()
            .map(|a| AttachmentImport {
                policy_name: a.summary.name.clone(),
                policy_id: a.summary.id.clone(),
                target: a.target.clone(),
            })
            .collect();

        let policies = self
            .walker
            .all_policies()?
            .into_iter()
            .filter(|p| self.config.classifier.is_customer_managed(&p.name))
            .map(|p| PolicyImport {
                policy_name: p.name,
                policy_id: p.id,
            })
            .collect();

        Ok(ImportPlan {
            attachments,
            policies,
        })
    }
}

/// A sync built in staging. Nothing is visible at the destination until [`StagedSync::commit`].
pub struct StagedSync {
    outcome: SyncOutcome,
    staging: Staging,
    files: Vec<PreparedFile>,
}

impl StagedSync {
    pub fn outcome(&self) -> &SyncOutcome {
        &self.outcome
    }

    /// Write a file outside the mirror now; rename it into place on commit.
    pub fn stage_file(&mut self, path: &Utf8Path, contents: &[u8]) -> Result<(), ScpError> {
        self.files.push(PreparedFile::new(path, contents)?);
        Ok(())
    }

    /// Swap the mirror into place, then rename every staged file in the order it was staged.
    pub fn commit(self) -> Result<SyncOutcome, ScpError> {
        let StagedSync {
            outcome,
            staging,
            files,
        } = self;
        staging.commit()?;
        for file in files {
            debug!(path = %file.path(), "committing staged file");
            file.persist()?;
        }

        info!(
            path = %outcome.mirror_dir,
            policies = outcome.summary.len(),
            nodes = outcome.snapshot.nodes.len(),
            "organization structure and policies saved"
        );
        for (name, policy) in &outcome.summary {
            info!(
                policy = %name,
                description = %policy.description,
                path = %policy.path,
                targets = ?policy.targets,
                "synced policy"
            );
        }
        Ok(outcome)
    }
}

fn merge_summary(attached: &[Attached]) -> Result<BTreeMap<String, SyncedPolicy>, ScpError> {
    let mut summary: BTreeMap<String, SyncedPolicy> = BTreeMap::new();
    for a in attached {
        match summary.get_mut(&a.summary.name) {
            Some(entry) => {
                if entry.targets.contains(&a.target) {
                    return Err(ScpError::DuplicateTarget {
                        policy: a.summary.name.clone(),
                        target: a.target.clone(),
                    });
                }
                entry.targets.push(a.target.clone());
            }
            None => {
                summary.insert(
                    a.summary.name.clone(),
                    SyncedPolicy {
                        id: a.summary.id.clone(),
                        description: a.summary.description.clone(),
                        class: a.class,
                        path: a.path.clone(),
                        targets: vec![a.target.clone()],
                    },
                );
            }
        }
    }
    Ok(summary)
}
