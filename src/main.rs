use clap::Parser;
use npmx_api::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => cli::serve::run(args).await,
        Command::Fetch(args) => cli::fetch::run(args).await,
        Command::Cache(args) => cli::cache::run(args).await,
    }
}
