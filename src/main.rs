mod cli;
mod config;
mod error;
mod graph;
mod jenkins;
mod output;
mod render;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting jenviz - Jenkins job graph visualizer");
    cli.execute().await?;

    Ok(())
}
