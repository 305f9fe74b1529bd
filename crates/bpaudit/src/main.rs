//! bpaudit
//!
//! Blueprint audit engine with an editor-facing HTTP bridge. `serve` runs
//! the bridge (optionally re-auditing on file change); `audit` performs a
//! one-shot audit and writes per-asset report files.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use audit_rules::{RuleEngine, RuleRegistry};
use bpaudit::assets::{ASSET_ROOT, AssetIndex, AssetWatcher};
use bpaudit::audit::{Orchestrator, ReportStore, audit_asset};
use bpaudit::config::AuditConfig;
use bpaudit::server::{AuditContext, create_router, remove_marker, write_marker};

/// Blueprint Audit Engine
#[derive(Parser, Debug)]
#[command(name = "bpaudit")]
#[command(about = "Blueprint audit engine and editor bridge", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP bridge, watching the project for changes
    Serve {
        /// Path to the project directory
        #[arg(short, long, default_value = ".")]
        project: PathBuf,

        /// Server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// First port to try (overrides audit.toml)
        #[arg(long)]
        port: Option<u16>,

        /// Don't start the file watcher
        #[arg(long)]
        no_watch: bool,
    },

    /// Audit once and write report files
    Audit {
        /// Path to the project directory
        #[arg(short, long, default_value = ".")]
        project: PathBuf,

        /// Restrict the audit to these asset paths (repeatable)
        #[arg(long = "asset")]
        assets: Vec<String>,

        /// Output directory for report JSON files
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bpaudit=info,tower_http=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    match args.command {
        Command::Serve {
            project,
            host,
            port,
            no_watch,
        } => serve(&project, &host, port, no_watch).await,
        Command::Audit {
            project,
            assets,
            output,
        } => {
            let failed = audit_once(&project, assets, output)?;
            if failed > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

async fn serve(project: &Path, host: &str, port: Option<u16>, no_watch: bool) -> Result<()> {
    info!("Starting bpaudit v{}", env!("CARGO_PKG_VERSION"));

    let mut config = AuditConfig::load(project)?;
    if let Some(port) = port {
        config.server.port = port;
    }
    let config = Arc::new(config);

    let index = Arc::new(AssetIndex::scan(project)?);
    let store = Arc::new(ReportStore::new(config.run.retain_runs));
    let engine = Arc::new(RuleEngine::new(RuleRegistry::builtin()));
    let orchestrator = Orchestrator::new(
        Arc::clone(&index),
        Arc::clone(&store),
        engine,
        Arc::clone(&config),
    );

    if !no_watch {
        match AssetWatcher::new(project, Arc::clone(&index), orchestrator.clone()) {
            Ok(watcher) => {
                tokio::spawn(watcher.run());
                info!("File watcher started");
            }
            Err(e) => {
                error!("Failed to start file watcher: {}", e);
            }
        }
    }

    // Scan a small port range so several projects can run bridges side by
    // side; binding anywhere in the range is success
    let listener = bind_listener(host, &config).await?;
    let addr = listener.local_addr()?;

    let marker_path = match write_marker(project, addr.port()) {
        Ok(path) => Some(path),
        Err(e) => {
            warn!("Failed to write server marker: {}", e);
            None
        }
    };

    let ctx = AuditContext::new(index, store, orchestrator, addr.port());
    let app = create_router(ctx);

    info!("Bridge listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if marker_path.is_some() {
        remove_marker(project);
    }
    info!("Server shutdown complete");
    Ok(())
}

/// Bind the first free port in the configured range
async fn bind_listener(host: &str, config: &AuditConfig) -> Result<TcpListener> {
    let first = config.server.port;
    let attempts = config.server.port_attempts.max(1);

    for port in candidate_ports(first, attempts) {
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;
        match TcpListener::bind(addr).await {
            Ok(listener) => return Ok(listener),
            Err(e) => {
                warn!("Port {} unavailable: {}", port, e);
            }
        }
    }
    bail!(
        "no free port in {}..={}",
        first,
        first.saturating_add(attempts - 1)
    )
}

/// Candidate ports to try, clipped at the top of the u16 range
fn candidate_ports(first: u16, attempts: u16) -> Vec<u16> {
    (0..attempts)
        .filter_map(|offset| first.checked_add(offset))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_ports_stop_at_u16_max() {
        assert_eq!(
            candidate_ports(65530, 10),
            vec![65530, 65531, 65532, 65533, 65534, 65535]
        );
        assert_eq!(candidate_ports(19900, 3), vec![19900, 19901, 19902]);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}

/// One-shot audit over the scope, returning the number of failed assets
fn audit_once(project: &Path, assets: Vec<String>, output: Option<PathBuf>) -> Result<usize> {
    let config = AuditConfig::load(project)?;
    let index = AssetIndex::scan(project)?;
    let engine = RuleEngine::new(RuleRegistry::builtin());
    let output = output.unwrap_or_else(|| project.join("saved").join("audit"));

    let scope = if assets.is_empty() {
        index.list()
    } else {
        for asset in &assets {
            if !index.contains(asset) {
                bail!("unknown asset: {}", asset);
            }
        }
        assets
    };
    if scope.is_empty() {
        info!("No blueprint assets found under {}", project.display());
        return Ok(0);
    }

    let run_id = Uuid::new_v4();
    let mut failed = 0;
    let mut findings = 0;
    for asset in &scope {
        let report = audit_asset(&index, &engine, &config.rules, asset, run_id);
        if let Some(error) = &report.error {
            warn!("{}: audit failed: {}", asset, error);
            failed += 1;
        } else {
            findings += report.findings.len();
        }
        write_report(&output, &report)?;
    }

    info!(
        "Audited {} asset(s): {} finding(s), {} failure(s); reports in {}",
        scope.len(),
        findings,
        failed,
        output.display()
    );
    Ok(failed)
}

/// Write one report under `<output>/<relative asset path>.json`
fn write_report(output: &Path, report: &audit_graph::Report) -> Result<()> {
    let rel = report
        .asset_path
        .strip_prefix(ASSET_ROOT)
        .unwrap_or(&report.asset_path)
        .trim_start_matches('/');
    let path = output.join(format!("{}.json", rel));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
