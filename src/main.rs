mod cache;
mod commands;
mod config;
mod logging;
mod tmdb;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::info;

use tmdb::cached_client::CachedCatalog;

#[derive(Parser, Debug)]
#[command(name = "marquee")]
#[command(about = "Movie and TV catalog browser with an offline-friendly cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/marquee/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Mirror logs to stderr
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: commands::Command,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;
  let _guard = logging::init(&config.log, args.verbose)?;
  info!(command = ?args.command, "Starting");

  let catalog = CachedCatalog::from_config(&config)?;
  let output = commands::run(args.command, &catalog).await?;
  println!("{}", output);

  Ok(())
}
