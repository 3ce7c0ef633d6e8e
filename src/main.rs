use clap::Parser;
use pmp_geo_gateway::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => cli::serve::run(args).await,
        Command::Search(args) => cli::lookup::search(args).await,
        Command::Geocode(args) => cli::lookup::geocode(args).await,
    }
}
