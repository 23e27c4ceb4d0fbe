//! `tunefill` - fill in missing lyrics and cover art for audio files

mod progress;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use bridge_traits::discovery::{DiscoveryRequest, DEFAULT_PATTERN};
use clap::{Args, Parser, Subcommand};
use core_metadata::{BatchOptions, BatchProgress, NoProgress};
use core_runtime::config::{CoreConfig, CoreConfigBuilder};
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use core_service::{bootstrap_desktop, CoreService};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use progress::BarProgress;

#[derive(Parser, Debug)]
#[command(name = "tunefill")]
#[command(about = "Fill in missing lyrics and cover art for audio files")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ~/.config/tunefill/config.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log output format: pretty, json or compact
    #[arg(long, global = true, value_name = "FORMAT", value_parser = parse_log_format)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve lyrics and/or artwork for every matching file in a directory
    Batch(BatchArgs),
    /// Resolve lyrics and/or artwork for a single file
    Fetch(FetchArgs),
}

/// What to resolve, shared by both commands
#[derive(Args, Debug, Clone, Copy)]
struct ContentArgs {
    /// Fetch lyrics
    #[arg(long)]
    lyrics: bool,

    /// Fetch cover artwork
    #[arg(long)]
    artwork: bool,

    /// Replace lyrics/artwork the file already has
    #[arg(long)]
    force: bool,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Directory containing the audio files
    #[arg(long, value_name = "DIR")]
    dir: PathBuf,

    /// File name pattern (`*`, `?` and `[...]` wildcards)
    #[arg(long, default_value = DEFAULT_PATTERN)]
    pattern: String,

    #[command(flatten)]
    content: ContentArgs,

    /// Descend into subdirectories
    #[arg(long)]
    recursive: bool,

    /// Concurrent workers, 1 to 20 [default: 5]
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// Audio file to update
    #[arg(value_name = "FILE")]
    file: PathBuf,

    #[command(flatten)]
    content: ContentArgs,

    /// Remove existing lyrics (kept if new lyrics are fetched)
    #[arg(long)]
    clear_lyrics: bool,

    /// Remove existing artwork (kept if new artwork is fetched)
    #[arg(long)]
    clear_artwork: bool,
}

impl FetchArgs {
    fn options(&self) -> BatchOptions {
        self.content
            .options(1)
            .with_clear_lyrics(self.clear_lyrics)
            .with_clear_artwork(self.clear_artwork)
    }
}

fn parse_log_format(s: &str) -> std::result::Result<LogFormat, String> {
    s.parse().map_err(|e: core_runtime::Error| e.to_string())
}

impl ContentArgs {
    fn options(&self, workers: usize) -> BatchOptions {
        BatchOptions::default()
            .with_lyrics(self.lyrics)
            .with_artwork(self.artwork)
            .with_force(self.force)
            .with_workers(workers)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    let mut logging = LoggingConfig::default()
        .with_format(cli.log_format.unwrap_or_default())
        .with_level(config.log_level);
    if let Ok(filter) = std::env::var("RUST_LOG") {
        logging = logging.with_filter(filter);
    }
    init_logging(logging).context("Failed to initialise logging")?;

    match cli.command {
        Command::Batch(args) => run_batch(config, args).await,
        Command::Fetch(args) => run_fetch(config, args).await,
    }
}

fn load_config(cli: &Cli) -> Result<CoreConfig> {
    let builder: CoreConfigBuilder = CoreConfig::load_builder(cli.config.as_deref())
        .context("Failed to load configuration")?;
    let builder = if cli.verbose {
        builder.log_level(LogLevel::Debug)
    } else {
        builder
    };
    let builder = match &cli.command {
        Command::Batch(BatchArgs {
            workers: Some(workers),
            ..
        }) => builder.batch_workers(*workers),
        _ => builder,
    };
    builder.build().context("Invalid configuration")
}

fn bootstrap(config: CoreConfig) -> Result<CoreService> {
    bootstrap_desktop(config).context("Failed to start the resolution core")
}

fn nothing_requested(options: &BatchOptions) -> bool {
    if !options.is_noop() {
        return false;
    }
    info!("Nothing to do: pass --lyrics and/or --artwork");
    true
}

async fn run_batch(config: CoreConfig, args: BatchArgs) -> Result<()> {
    let options = args.content.options(config.batch_workers);
    if nothing_requested(&options) {
        return Ok(());
    }
    let request = DiscoveryRequest::new(&args.dir)
        .with_pattern(args.pattern.as_str())
        .with_recursive(args.recursive);

    let core = bootstrap(config)?;

    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    let progress: Arc<dyn BatchProgress> = if args.no_progress {
        Arc::new(NoProgress)
    } else {
        Arc::new(BarProgress::new())
    };

    let summary = core
        .run_batch(&request, &options, progress, cancel)
        .await
        .with_context(|| format!("Batch over {} failed", args.dir.display()))?;

    info!("{}", summary);
    Ok(())
}

async fn run_fetch(config: CoreConfig, args: FetchArgs) -> Result<()> {
    let options = args.options();
    if nothing_requested(&options) {
        return Ok(());
    }

    let core = bootstrap(config)?;
    let result = core
        .fetch_file(&args.file, &options)
        .await
        .with_context(|| format!("Cannot process {}", args.file.display()))?;

    if let Some(error) = &result.error {
        warn!(file = %display_name(&args.file), error = %error, "Nothing written");
    }
    info!(
        "processed=1 updated={} skipped={} errors={}",
        usize::from(result.updated),
        usize::from(result.succeeded && !result.updated),
        usize::from(!result.succeeded)
    );
    Ok(())
}

/// Cancel the batch on the first Ctrl-C; in-flight files still finish
fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing files in progress");
            cancel.cancel();
        }
    });
}

fn display_name(path: &Path) -> String {
    core_runtime::logging::strip_path(&path.to_string_lossy()).to_string()
}
