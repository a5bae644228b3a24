//! Configuration models and loaders for eVTOL sizing studies.
//!
//! Manifests are plain serde records: a vehicle, a mission, a fidelity
//! selection and an optional problem/sweep description. Each one converts
//! into the engine type it describes and is validated on the way.

mod fidelity;
mod mission;
mod problem;
mod vehicle;

use std::fs::File;
use std::path::{Path, PathBuf};

use evtol_core::units::{Unit, UnitError};
use evtol_design::DesignError;
use evtol_mission::MissionError;
use evtol_vehicle::VehicleError;
use evtol_weight::WeightError;
use serde::Deserialize;
use thiserror::Error;

pub use fidelity::{
    AerodynamicsConfig, BemtConfig, FidelityConfig, HoverModelKind, InducedDragKind,
    ParasiteDragKind, PowerModelConfig, StabilityConfig, WeightModelConfig,
};
pub use mission::{MissionConfig, SegmentConfig, SegmentKindConfig, StandardMissionConfig};
pub use problem::{
    ClosureConfig, ConstraintConfig, ObjectiveConfig, OptimizationConfig, ProblemConfig,
    SweepConfig, VariableConfig,
};
pub use vehicle::{RotorConfig, RpmConfig, VehicleConfig};

/// Errors that can occur while loading or converting manifests.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("`{field}`: {source}")]
    Unit {
        field: String,
        #[source]
        source: UnitError,
    },
    #[error("invalid mission manifest: {0}")]
    InvalidMission(&'static str),
    #[error("invalid problem manifest: {0}")]
    InvalidProblem(String),
    #[error(transparent)]
    Vehicle(#[from] VehicleError),
    #[error(transparent)]
    Mission(#[from] MissionError),
    #[error(transparent)]
    Weight(#[from] WeightError),
    #[error(transparent)]
    Design(#[from] DesignError),
}

pub(crate) fn parse_unit(field: &str, symbol: &str) -> Result<Unit, ConfigError> {
    Unit::parse(symbol).map_err(|source| ConfigError::Unit {
        field: field.to_string(),
        source,
    })
}

/// Load a vehicle manifest (TOML or YAML).
pub fn load_vehicle<P: AsRef<Path>>(path: P) -> Result<VehicleConfig, ConfigError> {
    load_record(path)
}

/// Load every vehicle in a catalog: a YAML list, one TOML file, or a directory of TOML files.
pub fn load_vehicle_configs<P: AsRef<Path>>(path: P) -> Result<Vec<VehicleConfig>, ConfigError> {
    load_records(path)
}

pub fn load_mission<P: AsRef<Path>>(path: P) -> Result<MissionConfig, ConfigError> {
    load_record(path)
}

pub fn load_fidelity<P: AsRef<Path>>(path: P) -> Result<FidelityConfig, ConfigError> {
    load_record(path)
}

pub fn load_problem<P: AsRef<Path>>(path: P) -> Result<ProblemConfig, ConfigError> {
    load_record(path)
}

fn is_toml(path: &Path) -> bool {
    path.extension().map(|ext| ext == "toml").unwrap_or(false)
}

/// Read a single record from a TOML or YAML file.
pub fn load_record<T, P>(path: P) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if is_toml(path) {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

/// Read a list of records from a YAML list, one TOML file, or a directory of TOML files.
pub fn load_records<T, P>(path: P) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.is_dir() {
        read_dir_records(path)
    } else if is_toml(path) {
        let contents = std::fs::read_to_string(path)?;
        let record: T = toml::from_str(&contents)?;
        Ok(vec![record])
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

fn read_dir_records<T>(dir: &Path) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let mut records = Vec::new();
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_toml(path))
        .collect();
    entries.sort();
    for path in entries {
        let contents = std::fs::read_to_string(&path)?;
        let record: T = toml::from_str(&contents)?;
        records.push(record);
    }
    Ok(records)
}
