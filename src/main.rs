use anyhow::Result;
use filemark::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
