//! Notes server
//!
//! Serves the notes API over HTTP until SIGINT/SIGTERM.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use notes_core::Config;

#[derive(Parser)]
#[command(name = "notes-server")]
#[command(about = "HTTP API for notes backed by a JSON file")]
#[command(version)]
struct Cli {
    /// Interface to listen on (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on, 0 for any free port (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Notes file (overrides NOTES_DATA_FILE)
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Config file (overrides NOTES_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Apply command-line overrides on top of file and environment config
    fn apply(self, mut config: Config) -> Config {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(data_file) = self.data_file {
            config.data_file = data_file;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    let config = cli.apply(config);

    notes_server::run(config).await
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("notes_core=info,notes_server=info"));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}
