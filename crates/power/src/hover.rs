//! Hover, vertical climb and vertical descent power.

use evtol_core::atmosphere::Atmosphere;
use evtol_vehicle::Rotor;
use serde::Serialize;

use crate::bemt::{BemtSettings, evaluate_blade_elements, trim_rpm};

/// Induced power factor of the modified momentum theory.
pub const MODIFIED_MOMENTUM_KAPPA: f64 = 1.15;

/// Hover power model, selected once per analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum HoverModel {
    /// Ideal momentum theory scaled by the rotor figure of merit.
    MomentumTheory,
    /// Induced power with a constant factor plus explicit profile power.
    ModifiedMomentumTheory,
    /// Blade-element integration with rotor speed as the trim variable.
    BladeElementMomentumTheory(BemtSettings),
}

impl HoverModel {
    pub fn name(&self) -> &'static str {
        match self {
            HoverModel::MomentumTheory => "MomentumTheory",
            HoverModel::ModifiedMomentumTheory => "ModifiedMomentumTheory",
            HoverModel::BladeElementMomentumTheory(_) => "BladeElementMomentumTheory",
        }
    }

    /// Whether the model hides an implicit unknown (rotor speed) that a
    /// nested Newton closure cannot carry.
    pub fn has_inner_trim(&self) -> bool {
        matches!(self, HoverModel::BladeElementMomentumTheory(_))
    }

    /// Power of a rotor group carrying `thrust_each_n` per rotor at vertical speed
    /// `climb_speed_m_s` (positive up).
    ///
    /// `rpm` fixes the rotor speed instead of trimming it; the blade-element
    /// model then reports the thrust it actually produced as a residual.
    pub fn compute(
        &self,
        rotor: &Rotor,
        thrust_each_n: f64,
        climb_speed_m_s: f64,
        atmosphere: &Atmosphere,
        rpm: Option<f64>,
    ) -> HoverPower {
        let count = rotor.count as f64;
        let rho = atmosphere.density_kg_m3;
        let area = rotor.disk_area_each();
        let half_v = climb_speed_m_s / 2.0;
        let induced_velocity = -half_v + (half_v * half_v + thrust_each_n / (2.0 * rho * area)).sqrt();
        let rpm_hover = rpm.unwrap_or(rotor.rpm.hover);

        match self {
            HoverModel::MomentumTheory => {
                let total_thrust = thrust_each_n * count;
                let power = total_thrust / rotor.figure_of_merit
                    * (half_v + (half_v * half_v + total_thrust / (2.0 * rho * area * count)).sqrt());
                HoverPower {
                    thrust_each_n,
                    power_w: power.max(0.0),
                    rpm: rpm_hover,
                    induced_velocity_m_s: induced_velocity,
                    profile_power_w: 0.0,
                    thrust_residual: 0.0,
                    converged: true,
                }
            }
            HoverModel::ModifiedMomentumTheory => {
                let tip_speed = rotor.tip_speed(rpm_hover);
                let profile_each =
                    rho * area * tip_speed.powi(3) * rotor.solidity() * rotor.airfoil.cd0 / 8.0;
                let each = thrust_each_n
                    * (climb_speed_m_s + MODIFIED_MOMENTUM_KAPPA * induced_velocity)
                    + profile_each;
                HoverPower {
                    thrust_each_n,
                    power_w: (each * count).max(0.0),
                    rpm: rpm_hover,
                    induced_velocity_m_s: induced_velocity,
                    profile_power_w: profile_each * count,
                    thrust_residual: 0.0,
                    converged: true,
                }
            }
            HoverModel::BladeElementMomentumTheory(settings) => {
                let state = match rpm {
                    Some(rpm) => evaluate_blade_elements(
                        rotor,
                        rpm,
                        climb_speed_m_s,
                        atmosphere,
                        settings.annuli,
                    ),
                    None => trim_rpm(rotor, thrust_each_n, climb_speed_m_s, atmosphere, settings),
                };
                HoverPower {
                    thrust_each_n,
                    power_w: state.power_w * count,
                    rpm: state.rpm,
                    induced_velocity_m_s: induced_velocity,
                    profile_power_w: state.profile_power_w * count,
                    thrust_residual: (state.thrust_n - thrust_each_n) / thrust_each_n.abs().max(1.0),
                    converged: state.converged,
                }
            }
        }
    }
}

/// Power of a rotor group in vertical flight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HoverPower {
    pub thrust_each_n: f64,
    /// Shaft power of the whole group (W).
    pub power_w: f64,
    pub rpm: f64,
    pub induced_velocity_m_s: f64,
    pub profile_power_w: f64,
    /// `(T_produced - T_required) / T_required`; zero for the momentum models.
    pub thrust_residual: f64,
    pub converged: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use evtol_vehicle::Vehicle;

    #[test]
    fn momentum_theory_hover_is_ideal_over_figure_of_merit() {
        let rotor = Vehicle::reference_multirotor().lift_rotor;
        let atm = Atmosphere::sea_level();
        let hover = HoverModel::MomentumTheory.compute(&rotor, 3_000.0, 0.0, &atm, None);
        let ideal = 3_000.0 * (3_000.0 / (2.0 * atm.density_kg_m3 * rotor.disk_area_each())).sqrt();
        let expected = 6.0 * ideal / rotor.figure_of_merit;
        assert!((hover.power_w - expected).abs() < 1e-6 * expected);
    }

    #[test]
    fn climb_costs_more_than_descent() {
        let rotor = Vehicle::reference_multirotor().lift_rotor;
        let atm = Atmosphere::sea_level();
        for model in [HoverModel::MomentumTheory, HoverModel::ModifiedMomentumTheory] {
            let climb = model.compute(&rotor, 3_000.0, 2.5, &atm, None);
            let hover = model.compute(&rotor, 3_000.0, 0.0, &atm, None);
            let descent = model.compute(&rotor, 3_000.0, -2.5, &atm, None);
            assert!(climb.power_w > hover.power_w);
            assert!(hover.power_w > descent.power_w);
        }
    }
}
