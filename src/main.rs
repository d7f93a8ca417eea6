use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = passbook::cli::Cli::parse();
    cli.run()
}
