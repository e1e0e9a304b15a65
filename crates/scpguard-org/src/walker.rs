use crate::directory::{ChildKind, OrgDirectory, drain};
use scpguard_domain::ScpError;
use scpguard_types::ids;
use scpguard_types::{HierarchyNode, NodeId, NodeKind, PolicySummary};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Resolves the live hierarchy through the directory collaborator.
///
/// Nothing is cached: every call is answered from the collaborator.
pub struct HierarchyWalker<'a, D: OrgDirectory + ?Sized> {
    directory: &'a D,
}

impl<D: OrgDirectory + ?Sized> Clone for HierarchyWalker<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: OrgDirectory + ?Sized> Copy for HierarchyWalker<'_, D> {}

impl<'a, D: OrgDirectory + ?Sized> HierarchyWalker<'a, D> {
    pub fn new(directory: &'a D) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &'a D {
        self.directory
    }

    /// The single root of the organization.
    pub fn root(&self) -> Result<HierarchyNode, ScpError> {
        let roots = self.directory.list_roots()?;
        match roots.as_slice() {
            [id] if id.is_root() => Ok(root_node(id.clone())),
            [id] => Err(ScpError::Integrity(format!(
                "root {id} does not carry a root identity"
            ))),
            [] => Err(ScpError::Integrity("organization has no root".to_string())),
            many => Err(ScpError::Integrity(format!(
                "organization has {} roots, expected exactly one",
                many.len()
            ))),
        }
    }

    pub fn organization_id(&self) -> Result<String, ScpError> {
        Ok(self.directory.describe_organization()?.id)
    }

    /// Resolve one node: its display name and its parent.
    ///
    /// A root identity must be the organization's root.
    pub fn node(&self, id: &NodeId) -> Result<HierarchyNode, ScpError> {
        let kind = id.kind();
        if kind == NodeKind::Root {
            let root = self.root()?;
            if root.id != *id {
                return Err(ScpError::Integrity(format!(
                    "{id} is not the organization root ({})",
                    root.id
                )));
            }
            return Ok(root);
        }
        let name = self.display_name(id, kind)?;
        let parent = self.parent_of(id)?;
        Ok(HierarchyNode {
            id: id.clone(),
            kind,
            name,
            parent: Some(parent),
        })
    }

    /// Ordered chain from `target` (first) to the root (last).
    ///
    /// Fails with [`ScpError::Integrity`] if a node is seen twice or a parent cannot be
    /// resolved before the root is reached.
    pub fn ancestors_of(&self, target: &NodeId) -> Result<Vec<HierarchyNode>, ScpError> {
        let mut visited = BTreeSet::new();
        let mut chain = Vec::new();
        let mut current = self.node(target)?;

        loop {
            if !visited.insert(current.id.clone()) {
                return Err(ScpError::Integrity(format!(
                    "cycle detected: {} reached twice while walking up from {target}",
                    current.id
                )));
            }
            debug!(node = %current.id, name = %current.name, "resolved ancestor");

            if current.kind == NodeKind::Root {
                chain.push(current);
                return Ok(chain);
            }

            let Some(parent) = current.parent.clone() else {
                return Err(ScpError::Integrity(format!(
                    "{} has no parent and is not a root",
                    current.id
                )));
            };
            chain.push(current);
            current = self.node(&parent)?;
        }
    }

    /// Direct children of `node`: units first, then accounts, each in collaborator order.
    pub fn children_of(&self, node: &HierarchyNode) -> Result<Vec<HierarchyNode>, ScpError> {
        if node.is_leaf() {
            return Ok(Vec::new());
        }
        info!(node = %node.id, name = %node.name, "scanning children");

        let mut children = Vec::new();
        for (child_kind, kind) in [
            (ChildKind::OrganizationalUnit, NodeKind::OrganizationalUnit),
            (ChildKind::Account, NodeKind::Account),
        ] {
            let ids = drain("list_children", |token| {
                self.directory.list_children(&node.id, child_kind, token)
            })?;
            for id in ids {
                let name = self.display_name(&id, kind)?;
                children.push(HierarchyNode {
                    id,
                    kind,
                    name,
                    parent: Some(node.id.clone()),
                });
            }
        }
        Ok(children)
    }

    /// Depth-first, pre-order iterator over everything below `node`.
    ///
    /// Children of a node are listed only when that node is reached. A node reached twice
    /// yields [`ScpError::Integrity`] and ends the iteration.
    pub fn descendants_of(&self, node: &HierarchyNode) -> Descendants<'a, D> {
        Descendants {
            walker: *self,
            stack: Vec::new(),
            pending: Some(node.clone()),
            visited: BTreeSet::from([node.id.clone()]),
        }
    }

    /// Policies attached directly to `target`, fully drained.
    pub fn policies_for(&self, target: &NodeId) -> Result<Vec<PolicySummary>, ScpError> {
        Ok(drain("list_policies_for_target", |token| {
            self.directory.list_policies_for_target(target, token)
        })?)
    }

    /// Every service control policy in the organization, fully drained.
    pub fn all_policies(&self) -> Result<Vec<PolicySummary>, ScpError> {
        Ok(drain("list_policies", |token| {
            self.directory.list_policies(token)
        })?)
    }

    fn display_name(&self, id: &NodeId, kind: NodeKind) -> Result<String, ScpError> {
        let name = match kind {
            NodeKind::Root => ids::DEFAULT_ROOT_DIR.to_string(),
            NodeKind::OrganizationalUnit => self.directory.describe_unit(id)?,
            NodeKind::Account => self.directory.describe_account(id)?,
        };
        Ok(name)
    }

    fn parent_of(&self, id: &NodeId) -> Result<NodeId, ScpError> {
        let mut parents = self.directory.list_parents(id)?;
        match parents.len() {
            1 => Ok(parents.remove(0)),
            0 => Err(ScpError::Integrity(format!(
                "{id} has no resolvable parent"
            ))),
            n => Err(ScpError::Integrity(format!("{id} has {n} parents"))),
        }
    }
}

fn root_node(id: NodeId) -> HierarchyNode {
    HierarchyNode {
        id,
        kind: NodeKind::Root,
        name: ids::DEFAULT_ROOT_DIR.to_string(),
        parent: None,
    }
}

/// Lazy pre-order traversal returned by [`HierarchyWalker::descendants_of`].
///
/// The first error ends the iteration.
pub struct Descendants<'a, D: OrgDirectory + ?Sized> {
    walker: HierarchyWalker<'a, D>,
    stack: Vec<HierarchyNode>,
    pending: Option<HierarchyNode>,
    visited: BTreeSet<NodeId>,
}

impl<D: OrgDirectory + ?Sized> Iterator for Descendants<'_, D> {
    type Item = Result<HierarchyNode, ScpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(parent) = self.pending.take() {
            match self.walker.children_of(&parent) {
                Ok(children) => self.stack.extend(children.into_iter().rev()),
                Err(err) => {
                    self.stack.clear();
                    return Some(Err(err));
                }
            }
        }
        let next = self.stack.pop()?;
        if !self.visited.insert(next.id.clone()) {
            self.stack.clear();
            return Some(Err(ScpError::Integrity(format!(
                "cycle detected: {} reached twice while walking down",
                next.id
            ))));
        }
        self.pending = Some(next.clone());
        Some(Ok(next))
    }
}
