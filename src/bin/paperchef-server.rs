use anyhow::Result;
use clap::Parser;
use paperchef::{run, shutdown_signal};
use paperchef_metrics::TracingService;
use paperchef_models::Config;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "paperchef-server")]
#[command(about = "PDF summarizer and cooking assistant service")]
struct Args {
    /// TOML config file; environment variables override it
    #[arg(long, env = "PAPERCHEF_CONFIG")]
    config: Option<PathBuf>,

    /// Print the effective configuration with secrets masked and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = Config::load(args.config.as_deref())?;
    if args.print_config {
        print!("{}", config.redacted().to_toml()?);
        return Ok(());
    }

    TracingService::init(&config.logging)?;
    info!("Starting paperchef {}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded: {:?}", config.redacted());

    run(config, shutdown_signal()).await
}
