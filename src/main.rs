use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use merch_core::config::load_service_config;
use merch_core::logging::init_tracing;
use merch_rules::{
    load_rules, refresh_once, spawn_refresh, ApplyRequest, ApplyResponse, FileRuleSource,
    RuleApiBuilder, RuleManager, RuleServiceConfig, RuleSource, RuleStore,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "merchandising")]
#[command(about = "Rule-driven merchandising for product search results", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the rule manager HTTP service
    Serve(ServeArgs),
    /// Validate a rule file or directory and list what it defines
    Check {
        /// Rule file or directory of rule files
        path: PathBuf,
    },
    /// Apply rules to a candidate set and print the result as JSON
    Apply(ApplyArgs),
    /// Show version information
    Version,
}

#[derive(Args)]
struct ServeArgs {
    /// Address to bind, overrides MERCH_HTTP_BIND
    #[arg(long)]
    bind: Option<String>,
    /// Rule file or directory, overrides MERCH_RULES_PATH
    #[arg(long)]
    rules: Option<PathBuf>,
}

#[derive(Args)]
struct ApplyArgs {
    /// Rule file or directory of rule files
    #[arg(long)]
    rules: PathBuf,
    /// JSON document with `params` and `candidates`
    #[arg(long)]
    request: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve(args).await,
        Commands::Check { path } => {
            init_logging(None);
            check(path)
        }
        Commands::Apply(args) => {
            init_logging(Some("warn"));
            apply(args)
        }
        Commands::Version => {
            println!("merchandising v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_logging(level: Option<&str>) {
    if let Err(err) = init_tracing(level) {
        eprintln!("failed to initialise tracing: {err}");
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = load_service_config().context("failed to load service configuration")?;
    if let Some(bind) = args.bind {
        config.http_bind = bind;
    }
    if let Some(rules) = args.rules {
        config.rules_path = Some(rules);
    }
    init_logging(Some(&config.log_level));

    let store = RuleStore::new();
    match &config.rules_path {
        Some(path) => {
            let source: Arc<dyn RuleSource> = Arc::new(FileRuleSource::new(path));
            let version = refresh_once(&store, source.as_ref())
                .await
                .with_context(|| format!("failed to load rules from {}", path.display()))?;
            info!(version, rules = store.snapshot().len(), "loaded initial rule set");

            if let Some(interval) = config.refresh_interval {
                spawn_refresh(store.clone(), source, interval);
            }
        }
        None => warn!("no rules path configured, starting with an empty rule set"),
    }

    let shutdown = RuleApiBuilder::new(RuleManager::new(store))
        .serve(RuleServiceConfig {
            bind_address: config.http_bind.clone(),
        })
        .await
        .with_context(|| format!("failed to bind {}", config.http_bind))?;

    shutdown_signal().await;
    info!("shutting down rule manager service");
    let _ = shutdown.send(());
    Ok(())
}

fn check(path: PathBuf) -> anyhow::Result<()> {
    let rules = load_rules(&path)?;
    let mut malformed = 0usize;

    for rule in &rules {
        println!(
            "{:<32} priority={:<5} enabled={:<5} effects={}",
            rule.id,
            rule.priority,
            rule.enabled,
            rule.effects.len()
        );
        for (index, effect) in rule.effects.iter().enumerate() {
            if let Err(err) = effect.validate(&rule.id) {
                malformed += 1;
                println!("  effect #{index} ({}): {err}", effect.kind());
            }
        }
    }

    println!("{} rules loaded from {}", rules.len(), path.display());
    if malformed > 0 {
        anyhow::bail!("{malformed} malformed effects found");
    }
    Ok(())
}

fn apply(args: ApplyArgs) -> anyhow::Result<()> {
    let rules = load_rules(&args.rules)?;
    let raw = fs::read_to_string(&args.request)
        .with_context(|| format!("failed to read {}", args.request.display()))?;
    let request: ApplyRequest = serde_json::from_str(&raw)
        .with_context(|| format!("invalid request document {}", args.request.display()))?;

    let manager = RuleManager::new(RuleStore::with_rules(rules));
    let result = manager.process(&request.params, &request.candidates)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&ApplyResponse::from(result))?
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sigterm) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
