use clap::Parser;
use training::score::{run_score, ScoreArgs};

fn main() -> anyhow::Result<()> {
    cli_support::init_tracing();
    let args = ScoreArgs::parse();
    print!("{}", run_score(args)?);
    Ok(())
}
