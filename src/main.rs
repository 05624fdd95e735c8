use anyhow::Result;
use cvedirs::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
