//! Config parsing and resolution.
//!
//! This crate is intentionally IO-free: it parses and resolves configuration provided as strings.

#![forbid(unsafe_code)]

mod model;
mod resolve;

pub use model::{
    ClassifyConfig, LimitsConfig, MirrorConfig, OutputsConfig, ScpguardConfigV1, SyncConfig,
};
pub use resolve::{Overrides, ResolvedConfig};

/// Parse `scpguard.toml` into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<ScpguardConfigV1> {
    let cfg: ScpguardConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve the effective config (defaults + file + overrides).
pub fn resolve_config(
    cfg: ScpguardConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}
