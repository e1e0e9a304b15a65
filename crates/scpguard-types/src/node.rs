use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identity of a node in the organization tree (`r-...`, `ou-...`, or a 12-digit account id).
#[derive(
    Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new<S: Into<String>>(s: S) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Kind implied by the identity format.
    pub fn kind(&self) -> NodeKind {
        NodeKind::of(self.as_str())
    }

    pub fn is_root(&self) -> bool {
        self.kind() == NodeKind::Root
    }

    pub fn is_account(&self) -> bool {
        self.kind() == NodeKind::Account
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        NodeId::new(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    OrganizationalUnit,
    Account,
}

impl NodeKind {
    /// Classify an identity string: `r-` prefix is the root, twelve leading digits an account,
    /// everything else an organizational unit.
    pub fn of(id: &str) -> Self {
        if id.starts_with("r-") {
            return NodeKind::Root;
        }
        let bytes = id.as_bytes();
        if bytes.len() >= 12 && bytes[..12].iter().all(u8::is_ascii_digit) {
            return NodeKind::Account;
        }
        NodeKind::OrganizationalUnit
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::OrganizationalUnit => "organizational_unit",
            NodeKind::Account => "account",
        }
    }
}

/// One resolved node of the live hierarchy.
///
/// `parent` is a back-reference by id only; children are never owned here and are listed
/// on demand from the directory service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HierarchyNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
}

impl HierarchyNode {
    pub fn is_leaf(&self) -> bool {
        self.kind == NodeKind::Account
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_identity_format() {
        assert_eq!(NodeKind::of("r-ab12"), NodeKind::Root);
        assert_eq!(NodeKind::of("111111111111"), NodeKind::Account);
        assert_eq!(NodeKind::of("ou-ab12-34cd56ef"), NodeKind::OrganizationalUnit);
        assert_eq!(NodeKind::of("12345"), NodeKind::OrganizationalUnit);
    }
}
