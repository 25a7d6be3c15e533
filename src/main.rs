use anyhow::Result;
use clap::Parser;
use labour_assist::cli::{handle_command, Cli};
use labour_assist::{logging, AppConfig};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    handle_command(cli, config).await
}
