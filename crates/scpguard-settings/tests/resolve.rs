use scpguard_settings::{Overrides, ScpguardConfigV1, parse_config_toml, resolve_config};

#[test]
fn empty_config_resolves_to_defaults() {
    let resolved = resolve_config(ScpguardConfigV1::default(), Overrides::default()).unwrap();
    let eff = &resolved.effective;
    assert_eq!(eff.layout.mirror_dir, "service_control_policies");
    assert_eq!(eff.layout.root_dir, "ROOT");
    assert_eq!(eff.layout.shared_dir, "SHARED");
    assert_eq!(eff.layout.account_suffix, "_ACCOUNT");
    assert_eq!(eff.classifier.baseline_name, "FullAWSAccess");
    assert_eq!(eff.classifier.guardrail_prefix, "aws-guardrails");
    assert_eq!(eff.limits.max_attachments, 4);
    assert_eq!(eff.limits.max_custom_per_unit, 2);
    assert_eq!(eff.outputs.manifest, "scp_define_attach_auto.tf");
    assert_eq!(eff.outputs.module_source, "./scp_module");
    assert_eq!(resolved.page_size, 20);
    assert!(!resolved.skip_custom_refresh);
    assert!(!resolved.skip_imports);
}

#[test]
fn file_values_apply() {
    let cfg = parse_config_toml(
        r#"
schema = "scpguard.config.v1"
page_size = 5

[mirror]
dir = "scps"
account_suffix = "_ACCT"

[limits]
max_attachments = 5
max_custom_per_unit = 3

[outputs]
module_source = "../modules/scp"

[sync]
skip_imports = true
"#,
    )
    .unwrap();
    let resolved = resolve_config(cfg, Overrides::default()).unwrap();
    assert_eq!(resolved.page_size, 5);
    assert_eq!(resolved.effective.layout.mirror_dir, "scps");
    assert_eq!(resolved.effective.layout.account_suffix, "_ACCT");
    assert_eq!(resolved.effective.limits.max_attachments, 5);
    assert_eq!(resolved.effective.limits.max_custom_per_unit, 3);
    assert_eq!(resolved.effective.outputs.module_source, "../modules/scp");
    assert!(resolved.skip_imports);
}

#[test]
fn overrides_win_over_file() {
    let cfg = parse_config_toml("page_size = 5\n[sync]\nskip_imports = true\n").unwrap();
    let resolved = resolve_config(
        cfg,
        Overrides {
            page_size: Some(1),
            skip_custom_refresh: Some(true),
            skip_imports: Some(false),
        },
    )
    .unwrap();
    assert_eq!(resolved.page_size, 1);
    assert!(resolved.skip_custom_refresh);
    assert!(!resolved.skip_imports);
}

#[test]
fn unknown_keys_are_rejected() {
    assert!(parse_config_toml("[mirror]\nroot = \"X\"\n").is_err());
}

#[test]
fn invalid_values_are_rejected() {
    let bad = [
        "schema = \"scpguard.config.v9\"",
        "page_size = 0",
        "[limits]\nmax_attachments = 0",
        "[limits]\nmax_attachments = 2\nmax_custom_per_unit = 3",
        "[mirror]\naccount_suffix = \"\"",
        "[mirror]\nroot_dir = \"SHARED\"",
    ];
    for text in bad {
        let cfg = parse_config_toml(text).unwrap();
        assert!(
            resolve_config(cfg, Overrides::default()).is_err(),
            "accepted: {text}"
        );
    }
}
