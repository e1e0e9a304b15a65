use crate::model::ScpguardConfigV1;
use anyhow::Context;
use scpguard_domain::EffectiveConfig;
use scpguard_types::ids;

/// Command-line values that win over the config file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub page_size: Option<usize>,
    pub skip_custom_refresh: Option<bool>,
    pub skip_imports: Option<bool>,
}

#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub effective: EffectiveConfig,
    pub page_size: usize,
    pub skip_custom_refresh: bool,
    pub skip_imports: bool,
}

pub fn resolve_config(
    cfg: ScpguardConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    if let Some(schema) = cfg.schema.as_deref()
        && schema != ids::SCHEMA_CONFIG_V1
    {
        anyhow::bail!(
            "unsupported config schema: {schema} (expected {})",
            ids::SCHEMA_CONFIG_V1
        );
    }

    let mut effective = EffectiveConfig::default();

    // Layout
    let layout = &mut effective.layout;
    set_name(&mut layout.mirror_dir, cfg.mirror.dir, "mirror.dir")?;
    set_name(&mut layout.root_dir, cfg.mirror.root_dir, "mirror.root_dir")?;
    set_name(&mut layout.shared_dir, cfg.mirror.shared_dir, "mirror.shared_dir")?;
    set_name(
        &mut layout.account_suffix,
        cfg.mirror.account_suffix,
        "mirror.account_suffix",
    )?;
    if layout.root_dir == layout.shared_dir {
        anyhow::bail!(
            "mirror.root_dir and mirror.shared_dir must differ (both are {:?})",
            layout.root_dir
        );
    }

    // Classification
    let classifier = &mut effective.classifier;
    set_name(&mut classifier.baseline_name, cfg.classify.baseline, "classify.baseline")?;
    set_name(
        &mut classifier.guardrail_prefix,
        cfg.classify.guardrail_prefix,
        "classify.guardrail_prefix",
    )?;

    // Limits
    let limits = &mut effective.limits;
    if let Some(max) = cfg.limits.max_attachments {
        limits.max_attachments = max;
    }
    if let Some(max) = cfg.limits.max_custom_per_unit {
        limits.max_custom_per_unit = max;
    }
    if limits.max_attachments == 0 {
        anyhow::bail!("limits.max_attachments must be at least 1");
    }
    if limits.max_custom_per_unit > limits.max_attachments {
        anyhow::bail!(
            "limits.max_custom_per_unit ({}) exceeds limits.max_attachments ({})",
            limits.max_custom_per_unit,
            limits.max_attachments
        );
    }

    // Outputs
    let outputs = &mut effective.outputs;
    set_name(&mut outputs.manifest, cfg.outputs.manifest, "outputs.manifest")?;
    set_name(
        &mut outputs.attachment_imports,
        cfg.outputs.attachment_imports,
        "outputs.attachment_imports",
    )?;
    set_name(
        &mut outputs.policy_imports,
        cfg.outputs.policy_imports,
        "outputs.policy_imports",
    )?;
    set_name(
        &mut outputs.module_source,
        cfg.outputs.module_source,
        "outputs.module_source",
    )?;

    let page_size = overrides
        .page_size
        .or(cfg.page_size)
        .unwrap_or(ids::DEFAULT_PAGE_SIZE);
    if page_size == 0 {
        anyhow::bail!("page_size must be at least 1");
    }

    Ok(ResolvedConfig {
        effective,
        page_size,
        skip_custom_refresh: overrides
            .skip_custom_refresh
            .or(cfg.sync.skip_custom_refresh)
            .unwrap_or(false),
        skip_imports: overrides
            .skip_imports
            .or(cfg.sync.skip_imports)
            .unwrap_or(false),
    })
}

fn set_name(slot: &mut String, value: Option<String>, key: &str) -> anyhow::Result<()> {
    if let Some(value) = value {
        validate_name(&value).with_context(|| format!("invalid {key}"))?;
        *slot = value;
    }
    Ok(())
}

fn validate_name(value: &str) -> anyhow::Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("value must not be empty");
    }
    if value.contains(['\n', '\r', '"']) {
        anyhow::bail!("value must not contain quotes or line breaks: {value:?}");
    }
    Ok(())
}
