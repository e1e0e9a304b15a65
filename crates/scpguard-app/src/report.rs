use anyhow::Context;
use scpguard_types::{BlockingReport, SCHEMA_BLOCKING_REPORT_V1};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => anyhow::bail!("unknown format: {other} (expected text|json|markdown)"),
        }
    }
}

pub fn serialize_report(report: &BlockingReport) -> anyhow::Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(report).context("serialize blocking report")?;
    bytes.push(b'\n');
    Ok(bytes)
}

pub fn parse_report_json(text: &str) -> anyhow::Result<BlockingReport> {
    let value: serde_json::Value = serde_json::from_str(text).context("parse report json")?;
    let schema = value
        .get("schema")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    if schema != SCHEMA_BLOCKING_REPORT_V1 {
        anyhow::bail!("unknown report schema: {schema}");
    }
    serde_json::from_value(value).context("parse blocking report")
}

pub fn format_report(report: &BlockingReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => Ok(scpguard_render::render_blocking_text(report)),
        OutputFormat::Markdown => Ok(scpguard_render::render_blocking_markdown(report)),
        OutputFormat::Json => {
            let bytes = serialize_report(report)?;
            String::from_utf8(bytes).context("report json is not UTF-8")
        }
    }
}
