//! Relayer binary entry point.

use clap::Parser;
use eyre::Result;
use message_relayer::{service, Cli, RelayerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = RelayerConfig::from_cli(cli)?;
    service::run(config).await
}
