use camino::{Utf8Path, Utf8PathBuf};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Canonical path relative to the directory the mirror lives in.
///
/// Normalization rules are intentionally simple and deterministic:
/// - always forward slashes (`/`)
/// - no leading `./`
///
/// These strings end up verbatim in generated Terraform, so they must not depend on the
/// platform the tool runs on.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct MirrorPath(String);

impl Default for MirrorPath {
    fn default() -> Self {
        MirrorPath::new(".")
    }
}

impl MirrorPath {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        let mut v = s.as_ref().replace('\\', "/");
        while v.starts_with("./") {
            v = v.trim_start_matches("./").to_string();
        }
        if v.is_empty() {
            v = ".".to_string();
        }
        Self(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_utf8_pathbuf(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(self.0.clone())
    }

    pub fn join(&self, segment: &str) -> MirrorPath {
        if self.0 == "." {
            return MirrorPath::new(segment);
        }
        let base = Utf8Path::new(self.as_str());
        MirrorPath::new(base.join(segment).as_str())
    }

    /// Final path component (the node directory or file name).
    pub fn file_name(&self) -> &str {
        Utf8Path::new(self.as_str()).file_name().unwrap_or(self.as_str())
    }
}

impl std::fmt::Display for MirrorPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Utf8Path> for MirrorPath {
    fn from(value: &Utf8Path) -> Self {
        MirrorPath::new(value.as_str())
    }
}

impl From<Utf8PathBuf> for MirrorPath {
    fn from(value: Utf8PathBuf) -> Self {
        MirrorPath::new(value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_separators_and_leading_dot() {
        let p = MirrorPath::new(".\\service_control_policies\\ROOT");
        assert_eq!(p.as_str(), "service_control_policies/ROOT");
    }

    #[test]
    fn join_from_default_does_not_keep_dot() {
        let p = MirrorPath::default().join("service_control_policies");
        assert_eq!(p.as_str(), "service_control_policies");
        assert_eq!(p.join("ROOT").file_name(), "ROOT");
    }
}
