use anyhow::Context;
use scpguard_settings::{Overrides, ResolvedConfig, ScpguardConfigV1};

/// Parse and resolve config text. Empty text (including a missing file) means defaults.
pub fn load_config(config_text: &str, overrides: Overrides) -> anyhow::Result<ResolvedConfig> {
    let cfg = if config_text.trim().is_empty() {
        ScpguardConfigV1::default()
    } else {
        scpguard_settings::parse_config_toml(config_text).context("parse config")?
    };
    scpguard_settings::resolve_config(cfg, overrides).context("resolve config")
}
