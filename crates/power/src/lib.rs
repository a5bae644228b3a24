//! Per-segment propulsion and power chain.
//!
//! For each mission segment the chain trims the airframe, splits thrust over
//! the active rotor group and evaluates shaft power under the selected hover
//! model. The sizing envelope (maximum thrust and power per component) is
//! collected from the segments that contribute to it, and mission energy is
//! the plain sum of power times duration.

pub mod bemt;
pub mod chain;
pub mod energy;
pub mod forward;
pub mod hover;
pub mod inflow;

use std::collections::BTreeMap;

use evtol_aero::{AeroError, ParasiteDragModel, TrimSolution, WettedAreas};
use evtol_mission::SegmentKind;
use serde::Serialize;
use thiserror::Error;

pub use bemt::BemtSettings;
pub use chain::evaluate_mission;
pub use energy::mission_energy_wh;
pub use forward::{ForwardPower, forward_flight_power};
pub use hover::{HoverModel, HoverPower};
pub use inflow::{Inflow, solve_inflow};

#[derive(Debug, Error, PartialEq)]
pub enum PowerError {
    #[error(transparent)]
    Aero(#[from] AeroError),
    #[error("takeoff weight must be positive and finite, got {0} kg")]
    InvalidWeight(f64),
    #[error("lift+cruise vehicle has no propeller")]
    MissingPropeller,
}

/// Model choices for the power chain, fixed for the lifetime of an analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSettings {
    pub hover: HoverModel,
    pub parasite: ParasiteDragModel,
    /// Externally supplied wetted areas for the component build-up.
    pub wetted: Option<WettedAreas>,
    /// Hover-segment rotor speeds (segment id → rpm) owned by an optimizer
    /// instead of the blade-element trim.
    pub hover_rpm: BTreeMap<usize, f64>,
}

impl PowerSettings {
    pub fn new(hover: HoverModel, parasite: ParasiteDragModel) -> Self {
        Self {
            hover,
            parasite,
            wetted: None,
            hover_rpm: BTreeMap::new(),
        }
    }
}

/// Thrust and power of one rotor group in one segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComponentPower {
    pub active: bool,
    pub thrust_each_n: f64,
    pub thrust_total_n: f64,
    /// Shaft power of the whole group (W).
    pub power_w: f64,
    pub induced_power_w: f64,
    pub profile_power_w: f64,
    pub rpm: f64,
    /// Advance ratio; zero in vertical flight.
    pub mu: f64,
    pub ct: f64,
    pub lambda: f64,
    /// Thrust per disk area (N/m²).
    pub disk_loading_n_m2: f64,
    /// Relative blade-element thrust mismatch when rotor speed is fixed externally.
    pub thrust_residual: f64,
    pub converged: bool,
}

impl ComponentPower {
    /// A group that does nothing in this segment: every field exactly zero.
    pub fn idle() -> Self {
        Self {
            active: false,
            thrust_each_n: 0.0,
            thrust_total_n: 0.0,
            power_w: 0.0,
            induced_power_w: 0.0,
            profile_power_w: 0.0,
            rpm: 0.0,
            mu: 0.0,
            ct: 0.0,
            lambda: 0.0,
            disk_loading_n_m2: 0.0,
            thrust_residual: 0.0,
            converged: true,
        }
    }
}

/// Power bookkeeping for one segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentPower {
    pub id: usize,
    pub name: String,
    pub kind: SegmentKind,
    pub duration_s: f64,
    pub lift_rotor: ComponentPower,
    pub propeller: ComponentPower,
    pub total_power_w: f64,
    pub energy_wh: f64,
    /// Force balance behind a forward-flight segment.
    pub trim: Option<TrimSolution>,
    pub converged: bool,
}

/// Elementwise maxima over the sizing segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SizingLoads {
    pub lift_rotor_thrust_each_n: f64,
    pub lift_rotor_power_w: f64,
    pub propeller_thrust_each_n: f64,
    pub propeller_power_w: f64,
    /// Largest total segment power (W).
    pub total_power_w: f64,
}

/// Power, energy and sizing loads for a whole mission at one takeoff weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissionPower {
    pub weight_kg: f64,
    pub segments: Vec<SegmentPower>,
    pub sizing: SizingLoads,
    pub energy_wh: f64,
    pub total_time_s: f64,
    /// `false` if any inner solve in any segment failed.
    pub converged: bool,
}

impl MissionPower {
    /// Segment by 1-based id.
    pub fn segment(&self, id: usize) -> Option<&SegmentPower> {
        id.checked_sub(1).and_then(|i| self.segments.get(i))
    }

    pub fn first_of_kind(&self, kind: SegmentKind) -> Option<&SegmentPower> {
        self.segments.iter().find(|s| s.kind == kind)
    }
}
