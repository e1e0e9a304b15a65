use camino::Utf8PathBuf;
use scpguard_app::{
    FindBlockingInput, ResolveInput, SyncInput, load_config, run_find_blocking, run_resolve,
    run_sync,
};
use scpguard_settings::Overrides;
use scpguard_test_util::{
    APP_ACCOUNT, LOG_ARCHIVE, ROOT_ID, SECURITY_OU, WORKLOADS_OU, sample_directory,
};
use scpguard_types::{AccessQuery, NodeId};
use tempfile::TempDir;

fn utf8_root(tmp: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 path")
}

fn query(target: &str, action: &str, region: Option<&str>) -> AccessQuery {
    AccessQuery {
        target: NodeId::new(target),
        action: action.to_string(),
        resource: "arn:aws:s3:::example-bucket/key".to_string(),
        region: region.map(str::to_string),
        principal_arn: None,
        account: None,
    }
}

#[test]
fn deny_region_blocks_outside_us_east_1() {
    let dir = sample_directory(1);
    let report = run_find_blocking(FindBlockingInput {
        directory: &dir,
        query: query(LOG_ARCHIVE, "s3:GetObject", Some("us-west-2")),
    })
    .expect("find blocking");

    assert_eq!(report.candidates.len(), 1);
    let candidate = &report.candidates[0];
    assert_eq!(candidate.policy_name, "DenyRegion");
    assert_eq!(candidate.attached_to.as_str(), SECURITY_OU);
    assert_eq!(candidate.depth, 1);
    assert_eq!(candidate.statement["Sid"], "DenyOutsideUsEast1");
    assert_eq!(
        report.data.ancestors,
        vec![
            NodeId::new(LOG_ARCHIVE),
            NodeId::new(SECURITY_OU),
            NodeId::new(ROOT_ID)
        ]
    );
}

#[test]
fn deny_region_does_not_block_us_east_1() {
    let dir = sample_directory(1);
    let report = run_find_blocking(FindBlockingInput {
        directory: &dir,
        query: query(LOG_ARCHIVE, "s3:GetObject", Some("us-east-1")),
    })
    .expect("find blocking");
    assert!(report.candidates.is_empty());
    assert!(report.data.statements_inspected > 0);
}

#[test]
fn candidates_follow_ancestor_then_policy_order() {
    let dir = sample_directory(2);
    let report = run_find_blocking(FindBlockingInput {
        directory: &dir,
        query: query(APP_ACCOUNT, "organizations:LeaveOrganization", None),
    })
    .expect("find blocking");

    let found: Vec<(&str, u32)> = report
        .candidates
        .iter()
        .map(|c| (c.policy_name.as_str(), c.depth))
        .collect();
    // DenyRootUser applies because no principal was given; DenyLeaveOrg matches the action.
    assert_eq!(found, vec![("DenyRootUser", 0), ("DenyLeaveOrg", 1)]);
}

#[test]
fn unknown_condition_is_reported_not_evaluated() {
    let dir = sample_directory(10);
    let mut q = query(WORKLOADS_OU, "ec2:RunInstances", None);
    q.resource = "arn:aws:ec2:us-east-1:222222222222:instance/i-1".to_string();
    let report = run_find_blocking(FindBlockingInput {
        directory: &dir,
        query: q,
    })
    .expect("find blocking");

    let imds = report
        .candidates
        .iter()
        .find(|c| c.policy_name == "RequireImdsV2")
        .expect("imds candidate");
    assert_eq!(imds.unevaluated_conditions.len(), 1);
    assert_eq!(imds.unevaluated_conditions[0].key, "ec2:MetadataHttpTokens");
}

#[test]
fn unknown_target_is_an_error() {
    let dir = sample_directory(10);
    let err = run_find_blocking(FindBlockingInput {
        directory: &dir,
        query: query("ou-ab12-missing", "s3:GetObject", None),
    })
    .unwrap_err();
    assert!(format!("{err:#}").contains("ou-ab12-missing"));
}

fn default_config() -> scpguard_settings::ResolvedConfig {
    load_config("", Overrides::default()).expect("config")
}

#[test]
fn sync_then_resolve_writes_all_artifacts() {
    let tmp = TempDir::new().expect("temp dir");
    let root = utf8_root(&tmp);
    let dir = sample_directory(1);
    let config = default_config();

    let synced = run_sync(SyncInput {
        directory: &dir,
        mirror_root: &root,
        config: &config,
    })
    .expect("sync");
    assert_eq!(synced.written.len(), 2);

    let attachments =
        std::fs::read_to_string(root.join("import_policy_attachments.tf")).expect("imports");
    assert!(attachments.starts_with("# This file was automatically generated by scpguard"));
    assert_eq!(attachments.matches("import {").count(), 5);

    let resolved = run_resolve(ResolveInput {
        directory: &dir,
        mirror_root: &root,
        config: &config,
        manifest_out: None,
    })
    .expect("resolve");
    assert_eq!(resolved.manifest_path, root.join("scp_define_attach_auto.tf"));
    assert_eq!(resolved.manifest.matches("module \"").count(), 4);
    assert!(resolved.manifest.contains(&format!(
        "scp_target_list = [\"{SECURITY_OU}\", \"{WORKLOADS_OU}\"]"
    )));
    assert_eq!(
        std::fs::read_to_string(&resolved.manifest_path).expect("manifest"),
        resolved.manifest
    );
}

#[test]
fn syncing_twice_keeps_each_import_once() {
    let tmp = TempDir::new().expect("temp dir");
    let root = utf8_root(&tmp);
    let dir = sample_directory(3);
    let config = default_config();

    for _ in 0..2 {
        run_sync(SyncInput {
            directory: &dir,
            mirror_root: &root,
            config: &config,
        })
        .expect("sync");
    }
    let policies = std::fs::read_to_string(root.join("import_policies.tf")).expect("imports");
    assert_eq!(policies.matches("id = \"p-region01\"").count(), 1);
    assert_eq!(policies.matches("import {").count(), 5);
}

#[test]
fn skip_imports_writes_no_import_files() {
    let tmp = TempDir::new().expect("temp dir");
    let root = utf8_root(&tmp);
    let dir = sample_directory(3);
    let config = load_config(
        "",
        Overrides {
            skip_imports: Some(true),
            ..Overrides::default()
        },
    )
    .expect("config");

    let out = run_sync(SyncInput {
        directory: &dir,
        mirror_root: &root,
        config: &config,
    })
    .expect("sync");
    assert!(out.written.is_empty());
    assert!(!root.join("import_policy_attachments.tf").exists());
    assert!(!root.join("import_policies.tf").exists());
}

#[test]
fn failed_resolve_writes_no_manifest() {
    let tmp = TempDir::new().expect("temp dir");
    let root = utf8_root(&tmp);
    let dir = sample_directory(3);
    let config = default_config();

    let err = run_resolve(ResolveInput {
        directory: &dir,
        mirror_root: &root,
        config: &config,
        manifest_out: None,
    })
    .unwrap_err();
    assert!(format!("{err:#}").contains("mirror has no directory"));
    assert!(!root.join("scp_define_attach_auto.tf").exists());
}

#[test]
fn unwritable_import_file_leaves_mirror_and_imports_untouched() {
    let tmp = TempDir::new().expect("temp dir");
    let root = utf8_root(&tmp);
    std::fs::write(root.join("blocker"), "not a directory").expect("write blocker");
    let dir = sample_directory(3);
    let mut config = default_config();
    config.effective.outputs.policy_imports = "blocker/import_policies.tf".to_string();

    let err = run_sync(SyncInput {
        directory: &dir,
        mirror_root: &root,
        config: &config,
    })
    .unwrap_err();
    assert!(format!("{err:#}").contains("blocker/import_policies.tf"));
    assert!(!root.join("service_control_policies").exists());
    assert!(!root.join("import_policy_attachments.tf").exists());

    let leftovers: Vec<String> = std::fs::read_dir(&root)
        .expect("read dir")
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(leftovers, vec!["blocker".to_string()]);
}
