use clap::Parser;
use minutes::{cli, config, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    dotenvy::dotenv().ok();
    logging::init_tracing();
    let config = config::Config::from_env()?;
    cli::execute(args, config).await
}
