//! Pieces shared by the `evtol-size` and `evtol-sweep` binaries.

use std::path::PathBuf;

use clap::Args;
use evtol_sizing::Study;
use tracing_subscriber::EnvFilter;

/// Manifest paths describing one study.
#[derive(Args, Debug)]
pub struct StudyArgs {
    /// Vehicle manifest (TOML or YAML)
    #[arg(long)]
    pub vehicle: PathBuf,

    /// Mission manifest (TOML or YAML)
    #[arg(long)]
    pub mission: PathBuf,

    /// Fidelity manifest (TOML or YAML)
    #[arg(long)]
    pub fidelity: PathBuf,

    /// Problem manifest: weight type, solver, closure settings, optimization and sweep sections
    #[arg(long)]
    pub problem: Option<PathBuf>,
}

impl StudyArgs {
    pub fn load(&self) -> anyhow::Result<Study> {
        Ok(Study::load(
            &self.vehicle,
            &self.mission,
            &self.fidelity,
            self.problem.as_deref(),
        )?)
    }
}

/// Log to stderr, filtered by `RUST_LOG` and defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
