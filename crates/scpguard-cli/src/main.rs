//! CLI entry point for scpguard.
//!
//! This module is intentionally thin: it handles argument parsing, logging setup, file IO for
//! user-facing outputs, and exit codes. All business logic lives in the `scpguard-app` crate.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use scpguard_app::{
    FindBlockingInput, OutputFormat, ResolveInput, SyncInput, format_report, load_config,
    run_find_blocking, run_resolve, run_sync, serialize_report,
};
use scpguard_org::SnapshotDirectory;
use scpguard_settings::{Overrides, ResolvedConfig};
use scpguard_types::{AccessQuery, NodeId};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(
    name = "scpguard",
    version,
    about = "Service control policy diagnostics and organization mirror tooling"
)]
struct Cli {
    /// Path to scpguard config TOML (missing file means defaults).
    #[arg(long, default_value = "scpguard.toml")]
    config: Utf8PathBuf,

    /// Organization export to read the hierarchy and policies from.
    #[arg(long, default_value = "org.json")]
    org_snapshot: Utf8PathBuf,

    /// Override the listing page size.
    #[arg(long)]
    page_size: Option<usize>,

    /// Log filter (e.g. `info`, `scpguard_mirror=debug`).
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List Deny statements attached above a target that may block a request.
    FindBlocking {
        /// Account, organizational unit, or root id to start from.
        #[arg(long)]
        target: String,
        /// Fully-qualified action, e.g. `s3:GetObject`.
        #[arg(long)]
        action: String,
        /// Full resource identifier.
        #[arg(long)]
        resource: String,
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        principal_arn: Option<String>,
        #[arg(long)]
        account: Option<String>,
        /// Output format on stdout (text, json, or markdown).
        #[arg(long, default_value = "text")]
        format: String,
        /// Also write the JSON report to this path.
        #[arg(long)]
        report_out: Option<Utf8PathBuf>,
    },

    /// Mirror the organization and its policies on disk and write import manifests.
    Sync {
        /// Directory that holds the mirror and generated Terraform files.
        #[arg(long, default_value = ".")]
        mirror_root: Utf8PathBuf,
        /// Leave custom and shared policy files alone.
        #[arg(long)]
        skip_custom_refresh: bool,
        /// Do not write import manifests.
        #[arg(long)]
        skip_imports: bool,
    },

    /// Read attachments back from the mirror and write the provisioning manifest.
    Resolve {
        #[arg(long, default_value = ".")]
        mirror_root: Utf8PathBuf,
        /// Where to write the manifest (defaults to the configured file under the mirror root).
        #[arg(long)]
        manifest_out: Option<Utf8PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("scpguard error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.cmd {
        Commands::FindBlocking {
            ref target,
            ref action,
            ref resource,
            ref region,
            ref principal_arn,
            ref account,
            ref format,
            ref report_out,
        } => {
            let query = AccessQuery {
                target: NodeId::new(target.as_str()),
                action: action.clone(),
                resource: resource.clone(),
                region: region.clone(),
                principal_arn: principal_arn.clone(),
                account: account.clone(),
            };
            cmd_find_blocking(&cli, query, format, report_out.as_deref())
        }
        Commands::Sync {
            ref mirror_root,
            skip_custom_refresh,
            skip_imports,
        } => {
            let overrides = Overrides {
                page_size: cli.page_size,
                skip_custom_refresh: skip_custom_refresh.then_some(true),
                skip_imports: skip_imports.then_some(true),
            };
            cmd_sync(&cli, mirror_root, overrides)
        }
        Commands::Resolve {
            ref mirror_root,
            ref manifest_out,
        } => cmd_resolve(&cli, mirror_root, manifest_out.clone()),
    }
}

fn resolve_config(cli: &Cli, overrides: Overrides) -> anyhow::Result<ResolvedConfig> {
    let text = match std::fs::read_to_string(&cli.config) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %cli.config, "no config file, using defaults");
            String::new()
        }
        Err(e) => return Err(e).with_context(|| format!("read config: {}", cli.config)),
    };
    load_config(&text, overrides)
}

fn open_directory(cli: &Cli, config: &ResolvedConfig) -> anyhow::Result<SnapshotDirectory> {
    SnapshotDirectory::load(&cli.org_snapshot, config.page_size)
        .with_context(|| format!("load organization snapshot: {}", cli.org_snapshot))
}

fn cmd_find_blocking(
    cli: &Cli,
    query: AccessQuery,
    format: &str,
    report_out: Option<&Utf8Path>,
) -> anyhow::Result<()> {
    let format: OutputFormat = format.parse()?;
    let config = resolve_config(
        cli,
        Overrides {
            page_size: cli.page_size,
            ..Overrides::default()
        },
    )?;
    let directory = open_directory(cli, &config)?;

    let report = run_find_blocking(FindBlockingInput {
        directory: &directory,
        query,
    })?;

    if let Some(path) = report_out {
        write_file(path, &serialize_report(&report)?)?;
    }
    print!("{}", format_report(&report, format)?);
    Ok(())
}

fn cmd_sync(cli: &Cli, mirror_root: &Utf8Path, overrides: Overrides) -> anyhow::Result<()> {
    let config = resolve_config(cli, overrides)?;
    let directory = open_directory(cli, &config)?;

    let out = run_sync(SyncInput {
        directory: &directory,
        mirror_root,
        config: &config,
    })?;

    println!(
        "scpguard: mirrored {} node(s) into {}",
        out.outcome.snapshot.nodes.len(),
        out.outcome.mirror_dir
    );
    for (name, policy) in &out.outcome.summary {
        let targets: Vec<&str> = policy.targets.iter().map(NodeId::as_str).collect();
        println!(
            "  {name} ({}) -> {} [{}]",
            policy.class.as_str(),
            policy.path,
            targets.join(", ")
        );
    }
    for path in &out.written {
        println!("scpguard: wrote {path}");
    }
    Ok(())
}

fn cmd_resolve(
    cli: &Cli,
    mirror_root: &Utf8Path,
    manifest_out: Option<Utf8PathBuf>,
) -> anyhow::Result<()> {
    let config = resolve_config(
        cli,
        Overrides {
            page_size: cli.page_size,
            ..Overrides::default()
        },
    )?;
    let directory = open_directory(cli, &config)?;

    let out = run_resolve(ResolveInput {
        directory: &directory,
        mirror_root,
        config: &config,
        manifest_out,
    })?;
    println!(
        "scpguard: wrote {} ({} module(s))",
        out.manifest_path,
        out.records.len()
    );
    Ok(())
}

fn write_file(path: &Utf8Path, data: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {parent}"))?;
    }
    std::fs::write(path, data).with_context(|| format!("write file: {path}"))?;
    Ok(())
}
