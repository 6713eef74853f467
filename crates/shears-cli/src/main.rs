//! shears — project linter for JavaScript/TypeScript monorepos.

use clap::Parser;
use miette::Result;

use shears_cli::{cli, logger, run};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);

    match run::execute(&args).await {
        Ok(code) => std::process::exit(code),
        // Fatal: one line naming the offending file, exit above 1.
        Err(err) => Err(miette::miette!("{err:#}")),
    }
}
