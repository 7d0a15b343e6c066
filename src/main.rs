use anyhow::Result;
use clap::Parser;

use std::path::PathBuf;

use sales_report::generate_report;

/// Generate a formatted Excel sales report from a CSV file.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the input CSV file (e.g. data/sales_march.csv)
    #[arg(long)]
    input: PathBuf,

    /// Directory to save the Excel report
    #[arg(long = "output_dir", default_value = "reports")]
    output_dir: PathBuf,

    /// Path to a logo image to embed on the Summary sheet (optional)
    #[arg(long)]
    logo: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let workbook = generate_report(cli.input, cli.output_dir, cli.logo)?;
    println!("{}", workbook.display());
    Ok(())
}
