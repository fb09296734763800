use clap::Parser;
use eyre::eyre;
use stamp::Commands;
use stamp_config::{ConfigLoader, EngineConfig, EngineConfigBuilder};
use stamp_task::ExecutionEngine;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stamp")]
#[command(about = "Up-to-date checks and build cache keys for declared tasks", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to $STAMP_CONFIG, then the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding execution history
    #[arg(long, global = true)]
    history_dir: Option<PathBuf>,

    /// Disable the build cache for this invocation
    #[arg(long, global = true)]
    no_build_cache: bool,

    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn engine_config(&self) -> eyre::Result<EngineConfig> {
        let mut loader = ConfigLoader::new();
        if let Some(path) = &self.config {
            loader = loader.config_file(path);
        }

        let mut builder = EngineConfigBuilder::from_config(loader.load()?);
        if let Some(dir) = &self.history_dir {
            builder = builder.history_dir(dir);
        }
        if self.no_build_cache {
            builder = builder.build_cache_enabled(false);
        }
        Ok(builder.build()?)
    }
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    stamp_utils::tracing::init(level).map_err(|e| eyre!("failed to initialize logging: {e}"))?;

    let engine = ExecutionEngine::with_file_history(cli.engine_config()?)?;
    let stdout = std::io::stdout();
    cli.command.execute(&engine, &mut stdout.lock())
}
