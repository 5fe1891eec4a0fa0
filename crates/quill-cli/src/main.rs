use clap::Parser;
use quill_cli::Cli;
use quill_core::Config;
use quill_infra::{init_telemetry, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_telemetry(LogFormat::from_env())?;
    let cli = Cli::parse();
    let config = Config::from_env()?;
    quill_cli::run(cli, config).await
}
