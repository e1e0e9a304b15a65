use camino::Utf8Path;
use scpguard_domain::ScpError;
use scpguard_types::MirrorPath;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Contents of a policy definition file in the mirror.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DefinitionFile {
    pub policy: JsonValue,
    pub description: String,
}

/// Render a definition file: the parsed policy document plus its description, pretty-printed
/// with four-space indentation.
pub fn render_definition(
    policy_name: &str,
    content: &str,
    description: &str,
) -> Result<Vec<u8>, ScpError> {
    let parse_err = |source| ScpError::PolicyParse {
        policy: policy_name.to_string(),
        source,
    };
    let policy: JsonValue = serde_json::from_str(content).map_err(parse_err)?;
    let file = DefinitionFile {
        policy,
        description: description.to_string(),
    };

    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    file.serialize(&mut ser).map_err(parse_err)?;
    out.push(b'\n');
    Ok(out)
}

/// Read and validate a definition file at `path` (relative to `mirror_root`).
pub fn read_definition(
    mirror_root: &Utf8Path,
    path: &MirrorPath,
) -> Result<DefinitionFile, ScpError> {
    let abs = mirror_root.join(path.as_str());
    let text = std::fs::read_to_string(&abs).map_err(|e| ScpError::io(&abs, e))?;
    serde_json::from_str(&text).map_err(|source| ScpError::PolicyParse {
        policy: path.to_string(),
        source,
    })
}
