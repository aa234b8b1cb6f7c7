//! CLI entry point for `mailpeek`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use mailpeek::SmtpServer;
use mailpeek::capture::{
    ArtifactStore, CaptureBackend, CapturePipeline, LogViewer, SystemViewer, Viewer,
};
use mailpeek::config::{Config, load_config};

#[derive(Parser)]
#[command(name = "mailpeek", version, about = "Capture outgoing mail and open it in the browser")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = "MAILPEEK_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Address to listen on [default: localhost:2028]
    #[arg(short, long, value_name = "ADDR")]
    listen: Option<String>,

    /// Server name announced to clients
    #[arg(long)]
    hostname: Option<String>,

    /// Directory for generated files [default: system temp dir]
    #[arg(long, value_name = "DIR")]
    artifact_dir: Option<PathBuf>,

    /// Write files but do not open them
    #[arg(long)]
    no_open: bool,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);

    let level = match cli.verbose {
        0 => config.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    setup_logging(level);
    if let Some(path) = &cli.config {
        tracing::info!(path = %path.display(), "Loaded config");
    }

    let viewer: Arc<dyn Viewer> = if config.capture.open_viewer {
        Arc::new(SystemViewer)
    } else {
        Arc::new(LogViewer)
    };
    let store = ArtifactStore::new(config.capture.artifact_dir());
    let backend = CaptureBackend::new(CapturePipeline::new(store, viewer));

    tracing::info!(
        artifact_dir = %config.capture.artifact_dir().display(),
        "Started mail server at {}",
        config.server.addr
    );
    SmtpServer::new(config.server, backend).start()?;
    Ok(())
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(addr) = &cli.listen {
        config.server.addr = addr.clone();
    }
    if let Some(hostname) = &cli.hostname {
        config.server.hostname = hostname.clone();
    }
    if let Some(dir) = &cli.artifact_dir {
        config.capture.artifact_dir = Some(dir.clone());
    }
    if cli.no_open {
        config.capture.open_viewer = false;
    }
}

/// Set up tracing with stderr output.
fn setup_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
