//! Rotor and propeller power in forward flight.

use evtol_core::atmosphere::Atmosphere;
use evtol_vehicle::Rotor;
use serde::Serialize;

use crate::inflow::{Inflow, solve_inflow};

/// Bounds on the induced power factor recovered from the hover figure of merit.
pub const KAPPA_BOUNDS: (f64, f64) = (1.0, 2.0);
/// Advance-ratio growth of blade profile power, `P0 (1 + 4.65 μ²)`.
pub const PROFILE_MU_FACTOR: f64 = 4.65;

/// Forward-flight state of a rotor group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForwardPower {
    pub thrust_each_n: f64,
    /// Shaft power of the whole group (W).
    pub power_w: f64,
    pub induced_power_w: f64,
    pub profile_power_w: f64,
    pub propulsive_power_w: f64,
    pub rpm: f64,
    pub ct: f64,
    pub kappa: f64,
    pub induced_velocity_m_s: f64,
    pub inflow: Inflow,
}

/// Profile power of one rotor at zero advance ratio: `ρ A Vtip³ σ Cd0 / 8`.
pub fn hover_profile_power(rotor: &Rotor, rpm: f64, atmosphere: &Atmosphere) -> f64 {
    let tip_speed = rotor.tip_speed(rpm);
    atmosphere.density_kg_m3 * rotor.disk_area_each() * tip_speed.powi(3) * rotor.solidity()
        * rotor.airfoil.cd0
        / 8.0
}

/// Induced power factor that reproduces the rotor's figure of merit in hover
/// at the same thrust and speed.
pub fn induced_power_factor(rotor: &Rotor, thrust_each_n: f64, rpm: f64, atmosphere: &Atmosphere) -> f64 {
    if thrust_each_n <= 0.0 {
        return KAPPA_BOUNDS.0;
    }
    let v_h = (thrust_each_n / (2.0 * atmosphere.density_kg_m3 * rotor.disk_area_each())).sqrt();
    let ideal = thrust_each_n * v_h;
    let profile = hover_profile_power(rotor, rpm, atmosphere);
    (1.0 / rotor.figure_of_merit - profile / ideal).clamp(KAPPA_BOUNDS.0, KAPPA_BOUNDS.1)
}

/// Power of a rotor group sharing `thrust_total_n` at airspeed `speed_m_s`,
/// disk angle `disk_aoa_rad` and rotor speed `rpm`.
///
/// `P = T (V sin α + κ v_i) + P0 (1 + 4.65 μ²)` per rotor, clamped at zero.
/// Here `κ ≥ 1` multiplies the ideal induced velocity; it is the reciprocal of
/// the efficiency factor in the `T v_i / κ` form.
pub fn forward_flight_power(
    rotor: &Rotor,
    thrust_total_n: f64,
    speed_m_s: f64,
    disk_aoa_rad: f64,
    rpm: f64,
    atmosphere: &Atmosphere,
) -> ForwardPower {
    let count = rotor.count as f64;
    let thrust_each = thrust_total_n / count;
    let rho = atmosphere.density_kg_m3;
    let area = rotor.disk_area_each();
    let tip_speed = rotor.tip_speed(rpm);
    let ct = thrust_each / (rho * area * tip_speed * tip_speed);

    let inflow = solve_inflow(ct, speed_m_s, disk_aoa_rad, tip_speed);
    let freestream_normal = speed_m_s * disk_aoa_rad.sin();
    let induced_velocity = tip_speed * inflow.lambda - freestream_normal;
    let kappa = induced_power_factor(rotor, thrust_each, rpm, atmosphere);

    let induced = thrust_each * kappa * induced_velocity;
    let propulsive = thrust_each * freestream_normal;
    let profile = hover_profile_power(rotor, rpm, atmosphere)
        * (1.0 + PROFILE_MU_FACTOR * inflow.mu * inflow.mu);
    let each = (induced + propulsive + profile).max(0.0);

    ForwardPower {
        thrust_each_n: thrust_each,
        power_w: each * count,
        induced_power_w: induced * count,
        profile_power_w: profile * count,
        propulsive_power_w: propulsive * count,
        rpm,
        ct,
        kappa,
        induced_velocity_m_s: induced_velocity,
        inflow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evtol_vehicle::Vehicle;

    #[test]
    fn kappa_recovers_figure_of_merit_in_hover() {
        let rotor = Vehicle::reference_multirotor().lift_rotor;
        let atm = Atmosphere::sea_level();
        let thrust = 3_000.0;
        let rpm = rotor.rpm.hover;
        let power = forward_flight_power(&rotor, thrust * 6.0, 0.0, 0.0, rpm, &atm);
        let ideal = thrust * (thrust / (2.0 * atm.density_kg_m3 * rotor.disk_area_each())).sqrt();
        let fm = 6.0 * ideal / power.power_w;
        assert!(power.inflow.converged);
        if power.kappa > KAPPA_BOUNDS.0 && power.kappa < KAPPA_BOUNDS.1 {
            assert!((fm - rotor.figure_of_merit).abs() < 5e-3);
        }
    }

    #[test]
    fn zero_thrust_leaves_profile_power_only() {
        let rotor = Vehicle::reference_lift_plus_cruise().propeller.unwrap();
        let atm = Atmosphere::sea_level();
        let power = forward_flight_power(&rotor, 0.0, 60.0, std::f64::consts::FRAC_PI_2, 1_500.0, &atm);
        assert!(power.induced_power_w.abs() < 1e-6);
        assert!(power.power_w > 0.0);
    }

    #[test]
    fn induced_power_scales_ideal_velocity_by_kappa() {
        let rotor = Vehicle::reference_multirotor().lift_rotor;
        let atm = Atmosphere::sea_level();
        // aft-tilted disk in a descent
        let power = forward_flight_power(&rotor, 15_000.0, 40.0, -0.05, rotor.rpm.descent, &atm);
        assert!(power.inflow.converged);
        assert!(power.kappa >= KAPPA_BOUNDS.0);
        assert!(power.induced_velocity_m_s > 0.0);
        let expected = 6.0 * power.thrust_each_n * power.kappa * power.induced_velocity_m_s;
        assert!((power.induced_power_w - expected).abs() < 1e-6 * expected);
        assert!(power.propulsive_power_w < 0.0);
    }
}
