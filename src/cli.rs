use crate::{
    classifier::{Classifier, RuleClassifier},
    config::Config,
    poll::PollLoop,
    supervisor::{Shutdown, Supervisor},
    transport::HttpTransport,
};
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "ddc-client")]
#[command(about = "Fetch domains from a ddc server, check them for spam, report the verdicts")]
pub struct Args {
    /// Server IP or domain to connect to.
    #[arg(short = 's', long)]
    pub server: String,

    /// Network port to use to communicate with server.
    #[arg(short = 'p', long)]
    pub port: u16,

    /// Path to config TOML. If omitted, uses ./ddc-client.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg = match resolve_config_path(args.config.as_deref()) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    let _guard = init_logging(&args, &cfg)?;
    run(&args, &cfg)
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    let default = PathBuf::from("ddc-client.toml");
    default.exists().then_some(default)
}

fn init_logging(args: &Args, cfg: &Config) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if cfg.logging.write_to_file && !cfg.logging.file_path.is_empty() {
        let path = Path::new(&cfg.logging.file_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create_dir_all {}", parent.display()))?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn run(args: &Args, cfg: &Config) -> Result<()> {
    let transport = HttpTransport::from_config(cfg, &args.server, args.port)
        .with_context(|| format!("connecting to {}:{}", args.server, args.port))?;
    let classifier = RuleClassifier::new(cfg)?;

    info!(
        "ddc-client {} talking to {} (pc_version={})",
        env!("CARGO_PKG_VERSION"),
        transport.base_url(),
        classifier.version()
    );

    let poll_loop =
        PollLoop::new(transport, classifier).isolate_failures(cfg.classifier.isolate_failures);
    let shutdown = Shutdown::new();
    shutdown
        .trigger_on_signals()
        .context("installing signal handlers")?;
    let supervisor = Supervisor::new(poll_loop, cfg, shutdown.clone());

    supervisor.run(&shutdown).context("poll loop aborted")?;
    Ok(())
}
