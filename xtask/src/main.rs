//! Developer tasks (schema generation, fixture conformance).
//!
//! Keeping this separate avoids bloating the end-user CLI.

use anyhow::{Context, bail};
use schemars::schema_for;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the project root (parent of xtask directory).
fn project_root() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::current_dir().expect("Cannot determine current directory"));

    if manifest_dir.ends_with("xtask") {
        manifest_dir
            .parent()
            .expect("xtask has no parent")
            .to_path_buf()
    } else {
        manifest_dir
    }
}

fn schemas_dir() -> PathBuf {
    project_root().join("schemas")
}

fn fixtures_dir() -> PathBuf {
    project_root().join("tests").join("fixtures")
}

/// Schema definition with its target filename.
struct SchemaSpec {
    filename: &'static str,
    generate: fn() -> schemars::Schema,
}

fn schema_specs() -> Vec<SchemaSpec> {
    vec![
        SchemaSpec {
            filename: "scpguard.config.v1.json",
            generate: || schema_for!(scpguard_settings::ScpguardConfigV1),
        },
        SchemaSpec {
            filename: "scpguard.org-snapshot.v1.json",
            generate: || schema_for!(scpguard_org::OrgSnapshot),
        },
        SchemaSpec {
            filename: "scpguard.blocking.v1.json",
            generate: || schema_for!(scpguard_types::BlockingReport),
        },
        SchemaSpec {
            filename: "scpguard.mirror.v1.json",
            generate: || schema_for!(scpguard_mirror::MirrorSnapshot),
        },
    ]
}

fn spec_for(filename: &str) -> anyhow::Result<SchemaSpec> {
    schema_specs()
        .into_iter()
        .find(|s| s.filename == filename)
        .with_context(|| format!("no schema named {filename}"))
}

/// Serialize a schema to pretty-printed JSON with trailing newline.
fn serialize_schema(schema: &schemars::Schema) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(schema).context("Failed to serialize schema")?;
    json.push('\n');
    Ok(json)
}

fn compile(spec: &SchemaSpec) -> anyhow::Result<jsonschema::Validator> {
    let value = serde_json::to_value((spec.generate)()).context("Failed to serialize schema")?;
    jsonschema::validator_for(&value)
        .map_err(|e| anyhow::anyhow!("Failed to compile {}: {}", spec.filename, e))
}

fn emit_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir();
    fs::create_dir_all(&dir).context("Failed to create schemas directory")?;

    for spec in schema_specs() {
        let json = serialize_schema(&(spec.generate)())?;
        let path = dir.join(spec.filename);
        fs::write(&path, &json)
            .with_context(|| format!("Failed to write schema to {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    println!("\nSchemas emitted successfully.");
    Ok(())
}

/// Keywords that describe a schema without changing what it accepts.
const ANNOTATIONS: &[&str] = &["$schema", "title", "description", "default", "examples"];

/// Reduce a schema to what it accepts.
///
/// Local `$ref`s are inlined, annotations dropped, `required` and `type` lists sorted, and a
/// schema left with no keywords becomes `true`. Doc-comment edits and `$ref` placement do
/// not change the result.
fn validation_contract(schema: &Value) -> anyhow::Result<Value> {
    let defs = schema
        .get("$defs")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    contract_of(schema, &defs, 0)
}

fn contract_of(value: &Value, defs: &Map<String, Value>, depth: usize) -> anyhow::Result<Value> {
    if depth > 64 {
        bail!("schema nests deeper than 64 levels; recursive $ref?");
    }
    let map = match value {
        Value::Object(map) => map,
        Value::Array(items) => {
            return items
                .iter()
                .map(|item| contract_of(item, defs, depth + 1))
                .collect::<anyhow::Result<Vec<_>>>()
                .map(Value::Array);
        }
        other => return Ok(other.clone()),
    };

    let mut out = Map::new();
    for (key, sub) in map {
        let key = key.as_str();
        if ANNOTATIONS.contains(&key) || key == "$defs" || key == "$ref" {
            continue;
        }
        let reduced = match (key, sub) {
            ("properties" | "patternProperties", Value::Object(props)) => {
                let mut reduced = Map::new();
                for (name, prop) in props {
                    reduced.insert(name.clone(), contract_of(prop, defs, depth + 1)?);
                }
                Value::Object(reduced)
            }
            ("required" | "type", Value::Array(items)) => {
                let mut items = items.clone();
                items.sort_by_key(|item| item.to_string());
                if key == "required" && items.is_empty() {
                    continue;
                }
                Value::Array(items)
            }
            _ => contract_of(sub, defs, depth + 1)?,
        };
        out.insert(key.to_string(), reduced);
    }

    if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
        let name = reference
            .strip_prefix("#/$defs/")
            .with_context(|| format!("unsupported $ref {reference}"))?;
        let target = defs
            .get(name)
            .with_context(|| format!("$ref {reference} has no definition"))?;
        if let Value::Object(resolved) = contract_of(target, defs, depth + 1)? {
            for (key, sub) in resolved {
                out.entry(key).or_insert(sub);
            }
        }
    }

    if out.is_empty() {
        return Ok(Value::Bool(true));
    }
    Ok(Value::Object(out))
}

/// Compare every committed schema with the generated one.
///
/// Returns the filenames that are missing and those whose validation contract differs.
fn schema_drift() -> anyhow::Result<(Vec<&'static str>, Vec<&'static str>)> {
    let dir = schemas_dir();
    let mut missing = Vec::new();
    let mut mismatched = Vec::new();

    for spec in schema_specs() {
        let path = dir.join(spec.filename);
        if !path.exists() {
            missing.push(spec.filename);
            continue;
        }
        let generated =
            serde_json::to_value((spec.generate)()).context("Failed to serialize schema")?;
        let committed = read_json(&path)?;
        if validation_contract(&generated)? != validation_contract(&committed)? {
            mismatched.push(spec.filename);
        }
    }
    Ok((missing, mismatched))
}

/// Validate that schemas in the repo accept what the generated schemas accept.
fn validate_schemas() -> anyhow::Result<()> {
    let (missing, mismatched) = schema_drift()?;

    if missing.is_empty() && mismatched.is_empty() {
        println!("All schemas are up to date.");
        return Ok(());
    }
    if !missing.is_empty() {
        eprintln!("Missing schemas:");
        for name in &missing {
            eprintln!("  - {}", name);
        }
    }
    if !mismatched.is_empty() {
        eprintln!("Schemas out of date:");
        for name in &mismatched {
            eprintln!("  - {}", name);
        }
    }
    eprintln!("\nRun `cargo xtask emit-schemas` to regenerate.");
    bail!("Schema validation failed")
}

fn print_help() {
    eprintln!("xtask commands:");
    eprintln!("  help              Show this message");
    eprintln!("  emit-schemas      Generate JSON schemas from Rust types to schemas/");
    eprintln!("  validate-schemas  Check schemas/ accepts what the generated schemas accept (for CI)");
    eprintln!("  print-schema-ids  Print known schema IDs");
    eprintln!("  conform           Validate fixture organization exports and configs");
    eprintln!("  conform-full      conform + run the scpguard binary on fixtures with a query");
}

/// Check that a path is clean: no absolute paths, no `../`, forward slashes only.
fn is_clean_path(path: &str) -> bool {
    !(path.starts_with('/')
        || path.starts_with('\\')
        || path.contains("..")
        || path.contains('\\')
        || (path.len() >= 2 && path.as_bytes()[1] == b':'))
}

fn fixture_dirs() -> anyhow::Result<Vec<PathBuf>> {
    let root = fixtures_dir();
    let mut dirs = Vec::new();
    for entry in fs::read_dir(&root).context("Failed to read tests/fixtures/")? {
        let path = entry?.path();
        if path.is_dir() && path.join("org.json").exists() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn fixture_name(dir: &Path) -> String {
    dir.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Validate every fixture organization export and config.
///
/// This checks:
/// 1. `org.json` validates against the org snapshot schema and loads as a directory
/// 2. `scpguard.toml`, when present, parses and resolves
/// 3. `expected.report.json`, when present, validates against the report schema
fn conform() -> anyhow::Result<()> {
    let org_schema = compile(&spec_for("scpguard.org-snapshot.v1.json")?)?;
    let report_schema = compile(&spec_for("scpguard.blocking.v1.json")?)?;
    println!("✓ schemas compile");

    let mut errors = Vec::new();
    let dirs = fixture_dirs()?;
    if dirs.is_empty() {
        bail!("No fixtures with org.json found in {}", fixtures_dir().display());
    }

    for dir in &dirs {
        let name = fixture_name(dir);

        let org = read_json(&dir.join("org.json"))?;
        for err in org_schema.iter_errors(&org) {
            errors.push(format!("{}: org.json schema validation: {}", name, err));
        }
        let text = serde_json::to_string(&org)?;
        if let Err(err) = scpguard_org::SnapshotDirectory::parse(&text, 1) {
            errors.push(format!("{}: org.json does not load: {}", name, err));
        }

        let config_path = dir.join("scpguard.toml");
        if config_path.exists() {
            let text = fs::read_to_string(&config_path)?;
            let resolved = scpguard_settings::parse_config_toml(&text).and_then(|cfg| {
                scpguard_settings::resolve_config(cfg, scpguard_settings::Overrides::default())
            });
            if let Err(err) = resolved {
                errors.push(format!("{}: scpguard.toml: {:#}", name, err));
            }
        }

        let expected_path = dir.join("expected.report.json");
        if expected_path.exists() {
            let expected = read_json(&expected_path)?;
            for err in report_schema.iter_errors(&expected) {
                errors.push(format!(
                    "{}: expected.report.json schema validation: {}",
                    name, err
                ));
            }
        }

        println!("  ✓ {} checked", name);
    }

    if !errors.is_empty() {
        eprintln!("\nConformance errors:");
        for err in &errors {
            eprintln!("  - {}", err);
        }
        bail!("Conformance validation failed with {} errors", errors.len());
    }

    println!("\n✓ All {} fixtures pass conformance checks!", dirs.len());
    Ok(())
}

/// Query a fixture runs `find-blocking` with.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureQuery {
    target: String,
    action: String,
    resource: String,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    principal_arn: Option<String>,
    #[serde(default)]
    account: Option<String>,
}

impl FixtureQuery {
    fn args(&self) -> Vec<String> {
        let mut args = vec![
            "find-blocking".to_string(),
            "--target".to_string(),
            self.target.clone(),
            "--action".to_string(),
            self.action.clone(),
            "--resource".to_string(),
            self.resource.clone(),
        ];
        let optional = [
            ("--region", &self.region),
            ("--principal-arn", &self.principal_arn),
            ("--account", &self.account),
        ];
        for (flag, value) in optional {
            if let Some(value) = value {
                args.push(flag.to_string());
                args.push(value.clone());
            }
        }
        args
    }
}

/// Full conformance: fixture checks + scpguard binary output.
///
/// For each fixture with a `query.json`, runs the built binary, validates the report against
/// the blocking report schema, and compares it to `expected.report.json` when present.
fn conform_full() -> anyhow::Result<()> {
    conform()?;

    println!("\n--- Full conformance: scpguard binary output ---\n");

    let report_schema = compile(&spec_for("scpguard.blocking.v1.json")?)?;

    let bin = project_root().join("target").join("debug").join("scpguard");
    #[cfg(target_os = "windows")]
    let bin = bin.with_extension("exe");

    if !bin.exists() {
        bail!(
            "scpguard binary not found at {}.\n\
            Run `cargo build -p scpguard-cli` first.",
            bin.display()
        );
    }

    let mut errors = Vec::new();
    for dir in fixture_dirs()? {
        let name = fixture_name(&dir);
        let query_path = dir.join("query.json");
        if !query_path.exists() {
            continue;
        }
        let query: FixtureQuery = serde_json::from_value(read_json(&query_path)?)
            .with_context(|| format!("Failed to parse query for fixture '{}'", name))?;

        let temp_dir = tempfile::tempdir().context("Failed to create temp dir")?;
        let report_out = temp_dir.path().join("report.json");

        let output = std::process::Command::new(&bin)
            .current_dir(&dir)
            .arg("--org-snapshot")
            .arg(dir.join("org.json"))
            .args(query.args())
            .arg("--report-out")
            .arg(&report_out)
            .output()
            .with_context(|| format!("Failed to run scpguard on fixture '{}'", name))?;

        if !output.status.success() {
            errors.push(format!(
                "fixture '{}': scpguard exited with {:?}: {}",
                name,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            ));
            continue;
        }

        let report = read_json(&report_out)?;
        for err in report_schema.iter_errors(&report) {
            errors.push(format!("fixture '{}': schema validation: {}", name, err));
        }

        if let Some(candidates) = report.get("candidates").and_then(|v| v.as_array()) {
            for (i, candidate) in candidates.iter().enumerate() {
                if candidate.get("depth").and_then(|v| v.as_u64()).is_none() {
                    errors.push(format!("fixture '{}': candidates[{}] has no depth", name, i));
                }
            }
        }

        let golden_path = dir.join("expected.report.json");
        if golden_path.exists() {
            let golden = read_json(&golden_path)?;
            let normalized_report = scpguard_test_util::normalize_nondeterministic(report);
            let normalized_golden = scpguard_test_util::normalize_nondeterministic(golden);
            if normalized_report != normalized_golden {
                errors.push(format!(
                    "fixture '{}': output differs from expected.report.json",
                    name
                ));
            } else {
                println!("  ✓ fixture '{}' matches golden report", name);
            }
        } else {
            println!("  ✓ fixture '{}' produces a valid report (no golden file)", name);
        }
    }

    if !errors.is_empty() {
        eprintln!("\nFull conformance errors:");
        for err in &errors {
            eprintln!("  - {}", err);
        }
        bail!(
            "Full conformance validation failed with {} errors",
            errors.len()
        );
    }

    println!("\n✓ Full conformance checks passed!");
    Ok(())
}

/// Check the mirror paths recorded in a mirror snapshot are relative and forward-slashed.
fn mirror_path_findings(snapshot: &serde_json::Value) -> Vec<String> {
    snapshot
        .get("nodes")
        .and_then(|v| v.as_object())
        .map(|nodes| {
            nodes
                .iter()
                .filter_map(|(id, path)| {
                    let path = path.as_str()?;
                    (!is_clean_path(path)).then(|| format!("nodes.{id} '{path}' is not clean"))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Validate a `.scpguard-mirror.json` written by `scpguard sync`.
fn check_mirror(path: &str) -> anyhow::Result<()> {
    let schema = compile(&spec_for("scpguard.mirror.v1.json")?)?;
    let value = read_json(Path::new(path))?;
    let mut errors: Vec<String> = schema.iter_errors(&value).map(|e| e.to_string()).collect();
    errors.extend(mirror_path_findings(&value));
    if !errors.is_empty() {
        for err in &errors {
            eprintln!("  - {}", err);
        }
        bail!("{} fails with {} errors", path, errors.len());
    }
    println!("✓ {} is a valid mirror snapshot", path);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "emit-schemas" => emit_schemas(),
        "validate-schemas" => validate_schemas(),
        "conform" => conform(),
        "conform-full" => conform_full(),
        "check-mirror" => match args.get(2) {
            Some(path) => check_mirror(path),
            None => bail!("usage: cargo xtask check-mirror <path/to/.scpguard-mirror.json>"),
        },
        "print-schema-ids" => {
            for spec in schema_specs() {
                println!("{}", spec.filename.trim_end_matches(".json"));
            }
            Ok(())
        }
        other => bail!("unknown xtask command: {other}\n\nRun `cargo xtask help` for usage."),
    }
    .context("xtask failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_paths() {
        assert!(is_clean_path("SCP/ROOT/Security/DenyRegion.json"));
        assert!(!is_clean_path("/abs/path"));
        assert!(!is_clean_path("SCP/../escape"));
        assert!(!is_clean_path("SCP\\ROOT"));
        assert!(!is_clean_path("C:/SCP"));
    }

    #[test]
    fn every_schema_compiles() {
        for spec in schema_specs() {
            compile(&spec).unwrap_or_else(|e| panic!("{}: {e}", spec.filename));
        }
    }

    #[test]
    fn sample_org_validates_against_snapshot_schema() {
        let validator = compile(&spec_for("scpguard.org-snapshot.v1.json").unwrap()).unwrap();
        let errors: Vec<String> = validator
            .iter_errors(&scpguard_test_util::sample_org_json())
            .map(|e| e.to_string())
            .collect();
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn contract_ignores_annotations_and_ref_placement() {
        let generated = serde_json::json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "title": "Outer",
            "type": "object",
            "properties": {
                "description": {"type": "string", "default": ""},
                "inner": {"$ref": "#/$defs/Inner", "description": "Nested."}
            },
            "required": ["inner", "description"],
            "$defs": {
                "Inner": {"type": ["string", "null"], "description": "Doc."}
            }
        });
        let committed = serde_json::json!({
            "type": "object",
            "properties": {
                "description": {"type": "string"},
                "inner": {"type": ["null", "string"]}
            },
            "required": ["description", "inner"]
        });
        assert_eq!(
            validation_contract(&generated).unwrap(),
            validation_contract(&committed).unwrap()
        );

        let loosened = serde_json::json!({
            "type": "object",
            "properties": {"description": {"type": "string"}, "inner": true},
            "required": ["description", "inner"]
        });
        assert_ne!(
            validation_contract(&generated).unwrap(),
            validation_contract(&loosened).unwrap()
        );
    }

    #[test]
    fn committed_schemas_are_up_to_date() {
        let (missing, mismatched) = schema_drift().unwrap();
        assert!(missing.is_empty(), "missing: {missing:?}");
        assert!(mismatched.is_empty(), "out of date: {mismatched:?}");
    }

    #[test]
    fn committed_org_schema_accepts_every_fixture() {
        let committed = read_json(&schemas_dir().join("scpguard.org-snapshot.v1.json")).unwrap();
        let validator = jsonschema::validator_for(&committed).unwrap();
        for dir in fixture_dirs().unwrap() {
            let org = read_json(&dir.join("org.json")).unwrap();
            let errors: Vec<String> = validator.iter_errors(&org).map(|e| e.to_string()).collect();
            assert!(errors.is_empty(), "{}: {errors:?}", dir.display());
        }
    }

    #[test]
    fn fixture_query_builds_flags() {
        let query = FixtureQuery {
            target: "222222222222".into(),
            action: "s3:GetObject".into(),
            resource: "*".into(),
            region: Some("us-west-2".into()),
            principal_arn: None,
            account: None,
        };
        assert_eq!(
            query.args(),
            vec![
                "find-blocking",
                "--target",
                "222222222222",
                "--action",
                "s3:GetObject",
                "--resource",
                "*",
                "--region",
                "us-west-2",
            ]
        );
    }

    #[test]
    fn mirror_paths_flagged_when_absolute() {
        let value = serde_json::json!({
            "nodes": {"r-1": "SCP/ROOT", "ou-1": "/tmp/SCP/ROOT/x"}
        });
        assert_eq!(mirror_path_findings(&value), vec!["nodes.ou-1 '/tmp/SCP/ROOT/x' is not clean"]);
    }
}
