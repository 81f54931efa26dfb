//! Command line entry point.

use clap::Parser;
use pdfsmart_app::cli::{self, Cli};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::debug!("Starting pdfsmart");

    cli::run(Cli::parse()).await
}
