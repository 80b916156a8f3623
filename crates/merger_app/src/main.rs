mod cli;
mod config;
mod logging;
mod run;
mod scan;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    logging::initialize(args.log.into(), args.level());
    run::run(args).await
}
