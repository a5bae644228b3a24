use std::path::{Path, PathBuf};

use clap::Parser;
use evtol_cli::{StudyArgs, init_tracing};
use evtol_sizing::export::{ResultRecord, append_rows, write_rows, writer_for_path};
use tracing::info;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Size or optimize over a grid of range, cruise speed and battery density"
)]
struct Cli {
    #[command(flatten)]
    study: StudyArgs,

    /// Optimize at each grid point using the problem manifest's optimization section
    #[arg(long, default_value_t = false)]
    optimize: bool,

    /// CSV output; `-` writes to stdout, a path is appended to
    #[arg(long, default_value = "-")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let study = cli.study.load()?;

    let rows = study.sweep(cli.optimize)?;
    let records: Vec<ResultRecord> = rows
        .iter()
        .map(|row| {
            ResultRecord::from_outputs(&row.outputs())
                .with_label("vehicle", study.vehicle.name.as_str())
                .with_label("message", row.message.as_str())
        })
        .collect();

    if cli.output == Path::new("-") {
        write_rows(writer_for_path(&cli.output)?, &records)?;
    } else {
        append_rows(&cli.output, &records)?;
        info!(path = %cli.output.display(), rows = records.len(), "sweep written");
    }
    Ok(())
}
