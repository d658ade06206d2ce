use clap::Parser;
use training::util::{run_prepare, PrepareArgs};

fn main() -> anyhow::Result<()> {
    cli_support::init_tracing();
    let args = PrepareArgs::parse();
    let summary = run_prepare(args)?;
    println!(
        "Labelled {} galaxies ({}); manifests in {}",
        summary.galaxies,
        summary.report.outcome.as_str(),
        summary.output_root.display()
    );
    if summary.crops_written > 0 {
        println!("Exported {} crops", summary.crops_written);
    }
    Ok(())
}
