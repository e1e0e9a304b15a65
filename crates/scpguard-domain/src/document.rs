//! Policy language documents as far as the evaluator needs them.

use crate::error::ScpError;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// Which actions a statement covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionMatcher {
    /// `Action`: the request must match one of the patterns.
    Actions(Vec<String>),
    /// `NotAction`: the request matches unless it hits one of the patterns.
    NotActions(Vec<String>),
    /// Neither element present. Treated as matching every action.
    Unspecified,
}

/// `Condition` element: operator -> condition key -> values.
///
/// Scalar values are normalized to one-element lists; booleans and numbers keep their JSON
/// text form (`true`, `42`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConditionBlock {
    entries: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl ConditionBlock {
    pub fn from_entries(entries: BTreeMap<String, BTreeMap<String, Vec<String>>>) -> Self {
        Self { entries }
    }

    /// Values for `operator` (case-sensitive) and `key` (case-insensitive, like the policy
    /// language treats condition keys).
    pub fn values(&self, operator: &str, key: &str) -> Option<&[String]> {
        self.entries
            .get(operator)?
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_slice())
    }

    /// Every `(operator, key)` pair in document order of the normalized map.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(op, keys)| keys.keys().map(move |k| (op.as_str(), k.as_str())))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(BTreeMap::is_empty)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PolicyStatement {
    pub sid: Option<String>,
    pub effect: Effect,
    pub actions: ActionMatcher,
    /// `None` when the statement has no `Resource` element.
    pub resources: Option<Vec<String>>,
    pub condition: Option<ConditionBlock>,
    /// The statement exactly as it appeared in the document.
    pub raw: JsonValue,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PolicyDocument {
    pub version: Option<String>,
    pub statements: Vec<PolicyStatement>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawStatement {
    #[serde(default)]
    sid: Option<String>,
    effect: Effect,
    #[serde(default)]
    action: Option<OneOrMany>,
    #[serde(default)]
    not_action: Option<OneOrMany>,
    #[serde(default)]
    resource: Option<OneOrMany>,
    #[serde(default)]
    condition: Option<BTreeMap<String, BTreeMap<String, JsonValue>>>,
}

impl PolicyDocument {
    /// Parse the raw policy content returned by the directory service.
    ///
    /// `policy` names the document in error messages.
    pub fn parse(policy: &str, content: &str) -> Result<Self, ScpError> {
        let value: JsonValue =
            serde_json::from_str(content).map_err(|source| ScpError::PolicyParse {
                policy: policy.to_string(),
                source,
            })?;
        Self::from_value(policy, value)
    }

    pub fn from_value(policy: &str, value: JsonValue) -> Result<Self, ScpError> {
        let version = value
            .get("Version")
            .and_then(JsonValue::as_str)
            .map(str::to_string);

        let raw_statements = match value.get("Statement") {
            Some(JsonValue::Array(items)) => items.clone(),
            Some(single @ JsonValue::Object(_)) => vec![single.clone()],
            Some(_) => {
                return Err(ScpError::PolicyShape {
                    policy: policy.to_string(),
                    reason: "`Statement` must be an object or an array".to_string(),
                });
            }
            None => {
                return Err(ScpError::PolicyShape {
                    policy: policy.to_string(),
                    reason: "missing `Statement`".to_string(),
                });
            }
        };

        let statements = raw_statements
            .into_iter()
            .map(|raw| parse_statement(policy, raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            version,
            statements,
        })
    }

    /// Deny statements in document order, with their index in the document.
    pub fn deny_statements(&self) -> impl Iterator<Item = (usize, &PolicyStatement)> {
        self.statements
            .iter()
            .enumerate()
            .filter(|(_, s)| s.effect == Effect::Deny)
    }
}

fn parse_statement(policy: &str, raw: JsonValue) -> Result<PolicyStatement, ScpError> {
    let parsed: RawStatement =
        serde_json::from_value(raw.clone()).map_err(|source| ScpError::PolicyParse {
            policy: policy.to_string(),
            source,
        })?;

    let actions = match (parsed.action, parsed.not_action) {
        (Some(a), _) => ActionMatcher::Actions(a.into_vec()),
        (None, Some(na)) => ActionMatcher::NotActions(na.into_vec()),
        (None, None) => ActionMatcher::Unspecified,
    };

    let condition = parsed.condition.map(|ops| {
        let entries = ops
            .into_iter()
            .map(|(op, keys)| {
                let keys = keys
                    .into_iter()
                    .map(|(k, v)| (k, condition_values(v)))
                    .collect();
                (op, keys)
            })
            .collect();
        ConditionBlock::from_entries(entries)
    });

    Ok(PolicyStatement {
        sid: parsed.sid,
        effect: parsed.effect,
        actions,
        resources: parsed.resource.map(OneOrMany::into_vec),
        condition,
        raw,
    })
}

fn condition_values(value: JsonValue) -> Vec<String> {
    match value {
        JsonValue::Array(items) => items.into_iter().map(scalar_text).collect(),
        other => vec![scalar_text(other)],
    }
}

fn scalar_text(value: JsonValue) -> String {
    match value {
        JsonValue::String(s) => s,
        other => other.to_string(),
    }
}
