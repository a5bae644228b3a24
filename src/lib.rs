//! eVTOL conceptual sizing and weight closure.
//!
//! The engine lives in the `evtol_*` member crates; this package re-exports
//! them under short names and adds [`study::Study`], the manifest-driven
//! entry point the command-line tools share.

pub use evtol_aero as aero;
pub use evtol_config as config;
pub use evtol_core::{atmosphere, constants, outputs, units};
pub use evtol_design as design;
pub use evtol_export as export;
pub use evtol_mission as mission;
pub use evtol_power as power;
pub use evtol_solver as solver;
pub use evtol_vehicle as vehicle;
pub use evtol_weight as weight;

pub mod study;

pub use study::{Study, StudyError};

/// Returns the version of the library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
