// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::{error, info};

use meduusa_auditor::config::AuditConfig;
use meduusa_auditor::orchestrator::Orchestrator;
use meduusa_auditor::reporter;

/// Seconds between the scope summary and the first probe, so an operator
/// who pointed the tool at the wrong host can still abort.
const START_DELAY_SECS: u64 = 3;

#[derive(Parser, Debug)]
#[command(
    name = "meduusa-auditor",
    version,
    about = "Meduusa automated web application security audit engine"
)]
struct Cli {
    /// Target base URL (overrides AUDIT_TARGET_URL)
    #[arg(long)]
    target: Option<String>,

    /// API base URL (overrides AUDIT_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// JSON configuration file (same as AUDIT_CONFIG)
    #[arg(long)]
    config: Option<String>,

    /// Directory for the rendered reports
    #[arg(long)]
    output_dir: Option<String>,

    /// Enable destructive availability (DoS) testing
    #[arg(long)]
    enable_dos: bool,

    /// Double probe volumes
    #[arg(long)]
    aggressive: bool,

    /// Halve probe volumes and concurrency
    #[arg(long)]
    stealth: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    if let Some(path) = &cli.config {
        std::env::set_var("AUDIT_CONFIG", path);
    }

    let mut config = AuditConfig::load()?;
    if let Some(target) = cli.target {
        config.target_url = target;
    }
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }
    if cli.enable_dos {
        config.scope.test_dos = true;
    }
    if cli.aggressive {
        config.aggressive = true;
    }
    if cli.stealth {
        config.stealth = true;
    }

    print_banner();
    print_scope_summary(&config);

    eprintln!(
        "Starting in {}s - Ctrl-C to abort. Only audit systems you are authorized to test.",
        START_DELAY_SECS
    );
    std::thread::sleep(std::time::Duration::from_secs(START_DELAY_SECS));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get().min(config.threads.max(2)))
        .thread_name("meduusa-worker")
        .enable_all()
        .build()?;

    runtime.block_on(run_audit(config))
}

async fn run_audit(config: AuditConfig) -> Result<()> {
    let output_dir = config.output_dir.clone();
    let orchestrator = Orchestrator::new(config);

    // A failure out of the orchestrator itself is fatal; findings are not.
    let run = match orchestrator.execute().await {
        Ok(run) => run,
        Err(e) => {
            error!("[Fatal] Audit aborted: {:#}", e);
            return Err(e);
        }
    };

    let paths = reporter::write_reports(&run, Path::new(&output_dir))?;
    info!(
        "[Done] {} finding(s). Reports: {} / {} / {}",
        run.findings.len(),
        paths.json.display(),
        paths.markdown.display(),
        paths.csv.display()
    );

    // Findings are results, not process failure: exit 0 regardless.
    Ok(())
}

fn print_banner() {
    eprintln!();
    eprintln!("  __  __          _                         ");
    eprintln!(" |  \\/  | ___  __| |_   _ _   _ ___  __ _   ");
    eprintln!(" | |\\/| |/ _ \\/ _` | | | | | | / __|/ _` |  ");
    eprintln!(" | |  | |  __/ (_| | |_| | |_| \\__ \\ (_| |  ");
    eprintln!(" |_|  |_|\\___|\\__,_|\\__,_|\\__,_|___/\\__,_|  ");
    eprintln!();
    eprintln!("        Automated Security Audit Engine");
    eprintln!("        v{} - (c) 2026 Bountyy Oy", env!("CARGO_PKG_VERSION"));
    eprintln!();
}

fn print_scope_summary(config: &AuditConfig) {
    eprintln!("Target:        {}", config.target_url);
    eprintln!("API base:      {}", config.api_url);
    eprintln!("Roles:         {}", config.credentials.len());
    eprintln!(
        "Categories:    auth={} authz={} injection={} business-logic={} dos={}",
        config.scope.test_authentication,
        config.scope.test_authorization,
        config.scope.test_injections,
        config.scope.test_business_logic,
        config.scope.test_dos
    );
    eprintln!(
        "Budget:        {} threads, {}ms timeout, {} rps",
        config.threads, config.timeout_ms, config.rate_limit_rps
    );
    if !config.scope.include_paths.is_empty() {
        eprintln!("Include:       {}", config.scope.include_paths.join(", "));
    }
    if !config.scope.exclude_paths.is_empty() {
        eprintln!("Exclude:       {}", config.scope.exclude_paths.join(", "));
    }
    eprintln!();
}
