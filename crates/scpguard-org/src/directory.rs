use scpguard_domain::DirectoryError;
use scpguard_types::{NodeId, PolicyDetail, PolicySummary};

/// Which children to list under a parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChildKind {
    OrganizationalUnit,
    Account,
}

impl ChildKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChildKind::OrganizationalUnit => "organizational_unit",
            ChildKind::Account => "account",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Organization {
    pub id: String,
}

/// One page of a paginated listing. `next_token` is `None` on the last page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }
}

/// Directory and policy-store collaborator.
///
/// Every call is a blocking round trip. Implementations must not retry; a failure aborts the
/// run that issued it.
pub trait OrgDirectory: Send + Sync {
    fn list_roots(&self) -> Result<Vec<NodeId>, DirectoryError>;

    fn describe_organization(&self) -> Result<Organization, DirectoryError>;

    fn list_parents(&self, child: &NodeId) -> Result<Vec<NodeId>, DirectoryError>;

    fn list_children(
        &self,
        parent: &NodeId,
        kind: ChildKind,
        token: Option<&str>,
    ) -> Result<Page<NodeId>, DirectoryError>;

    /// Display name of an organizational unit.
    fn describe_unit(&self, id: &NodeId) -> Result<String, DirectoryError>;

    /// Display name of an account.
    fn describe_account(&self, id: &NodeId) -> Result<String, DirectoryError>;

    fn list_policies_for_target(
        &self,
        target: &NodeId,
        token: Option<&str>,
    ) -> Result<Page<PolicySummary>, DirectoryError>;

    fn list_policies(&self, token: Option<&str>) -> Result<Page<PolicySummary>, DirectoryError>;

    fn describe_policy(&self, policy_id: &str) -> Result<PolicyDetail, DirectoryError>;
}

/// Follow continuation tokens until the listing is exhausted.
///
/// A token repeated back-to-back would never terminate and is reported as an error.
pub fn drain<T, F>(operation: &str, mut fetch: F) -> Result<Vec<T>, DirectoryError>
where
    F: FnMut(Option<&str>) -> Result<Page<T>, DirectoryError>,
{
    let mut items = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let page = fetch(token.as_deref())?;
        items.extend(page.items);
        match page.next_token {
            None => return Ok(items),
            Some(next) if token.as_deref() == Some(next.as_str()) => {
                return Err(DirectoryError::new(
                    operation,
                    format!("continuation token {next:?} returned twice in a row"),
                ));
            }
            Some(next) => token = Some(next),
        }
    }
}
