//! Airframe aerodynamics consumed by the power chain.
//!
//! Everything here is a closed-form function of geometry, weight, and flight
//! condition: parasite drag under a selectable model, finite-wing lift and
//! induced drag, and the two-dimensional force balance used to trim thrust.

pub mod parasite;
pub mod trim;
pub mod wetted;
pub mod wing;

use thiserror::Error;

pub use parasite::{DragBreakdown, ParasiteDragModel, parasite_drag, reference_area};
pub use trim::{TrimRequest, TrimSolution, trim_edgewise, trim_winged};
pub use wetted::WettedAreas;

#[derive(Debug, Error, PartialEq)]
pub enum AeroError {
    #[error("airspeed must be positive for forward-flight aerodynamics, got {0} m/s")]
    NonPositiveSpeed(f64),
    #[error("takeoff weight must be positive, got {0} kg")]
    NonPositiveWeight(f64),
    #[error("{0} requires a wing")]
    MissingWing(&'static str),
    #[error("parasite drag model `{model}` is not valid for a {configuration} vehicle")]
    ModelNotApplicable {
        model: &'static str,
        configuration: &'static str,
    },
}
