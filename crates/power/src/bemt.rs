//! Blade element momentum theory for a fixed-pitch rotor in axial flight.
//!
//! Constant chord, linear twist about the 75 % station, closed-form annulus
//! inflow (no tip loss) and the section's quadratic drag polar. Rotor speed
//! is the trim variable.

use evtol_core::atmosphere::Atmosphere;
use evtol_core::units::{rad_s_to_rpm, rpm_to_rad_s};
use evtol_solver::bisect;
use evtol_vehicle::Rotor;
use serde::Serialize;
use tracing::warn;

/// Discretization and trim limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BemtSettings {
    pub annuli: usize,
    pub min_rpm: f64,
    /// Tip Mach number bounding the trim bracket from above.
    pub max_tip_mach: f64,
    /// Relative thrust tolerance of the trim.
    pub thrust_tolerance: f64,
    pub max_iterations: usize,
}

impl Default for BemtSettings {
    fn default() -> Self {
        Self {
            annuli: 40,
            min_rpm: 50.0,
            max_tip_mach: 0.9,
            thrust_tolerance: 1e-6,
            max_iterations: 200,
        }
    }
}

/// Rotor state from one blade-element integration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BladeElementSolution {
    pub rpm: f64,
    pub thrust_n: f64,
    pub power_w: f64,
    pub ct: f64,
    pub cp: f64,
    pub induced_power_w: f64,
    pub profile_power_w: f64,
    /// Trim status; always `true` for a direct evaluation.
    pub converged: bool,
}

/// Integrate thrust and power of one rotor at `rpm`.
pub fn evaluate_blade_elements(
    rotor: &Rotor,
    rpm: f64,
    climb_speed_m_s: f64,
    atmosphere: &Atmosphere,
    annuli: usize,
) -> BladeElementSolution {
    let omega = rpm_to_rad_s(rpm);
    let tip_speed = omega * rotor.radius_m;
    let sigma = rotor.solidity();
    let a = rotor.airfoil.lift_slope_per_rad;
    let theta_75 = rotor.global_twist_deg.to_radians();
    let twist = rotor.twist_deg.to_radians();
    let lambda_c = if tip_speed > 0.0 {
        climb_speed_m_s / tip_speed
    } else {
        0.0
    };

    let root = (rotor.hub_radius_m / rotor.radius_m).clamp(0.0, 0.95);
    let n = annuli.max(4);
    let dr = (1.0 - root) / n as f64;
    let b = sigma * a / 16.0 - lambda_c / 2.0;

    let mut ct = 0.0;
    let mut cp_induced = 0.0;
    let mut cp_profile = 0.0;
    for k in 0..n {
        let r = root + (k as f64 + 0.5) * dr;
        let theta = theta_75 + twist * (r - 0.75);
        let lambda = (b * b + sigma * a * theta * r / 8.0).max(0.0).sqrt() - b;
        let alpha = theta - lambda / r;
        let dct = 0.5 * sigma * a * alpha * r * r * dr;
        ct += dct;
        cp_induced += lambda * dct;
        cp_profile += 0.5 * sigma * rotor.airfoil.drag_coefficient(alpha) * r.powi(3) * dr;
    }

    let area = rotor.disk_area_each();
    let rho = atmosphere.density_kg_m3;
    let thrust_scale = rho * area * tip_speed * tip_speed;
    let power_scale = thrust_scale * tip_speed;
    let cp = cp_induced + cp_profile;

    BladeElementSolution {
        rpm,
        thrust_n: ct * thrust_scale,
        power_w: (cp * power_scale).max(0.0),
        ct,
        cp,
        induced_power_w: cp_induced * power_scale,
        profile_power_w: cp_profile * power_scale,
        converged: true,
    }
}

/// Find the rotor speed at which one rotor produces `thrust_n`.
///
/// When the bracket `[min_rpm, tip-Mach limit]` contains no solution the
/// closest endpoint is returned with `converged = false`.
pub fn trim_rpm(
    rotor: &Rotor,
    thrust_n: f64,
    climb_speed_m_s: f64,
    atmosphere: &Atmosphere,
    settings: &BemtSettings,
) -> BladeElementSolution {
    let max_rpm = rad_s_to_rpm(settings.max_tip_mach * atmosphere.sound_speed_m_s / rotor.radius_m);
    let residual = |rpm: f64| {
        let state = evaluate_blade_elements(rotor, rpm, climb_speed_m_s, atmosphere, settings.annuli);
        (state.thrust_n - thrust_n) / thrust_n.abs().max(1.0)
    };

    let trimmed = bisect(
        residual,
        settings.min_rpm,
        max_rpm,
        1e-6,
        settings.thrust_tolerance,
        settings.max_iterations,
    );
    let (rpm, converged) = match trimmed {
        Ok(root) => (root.root, root.converged),
        Err(_) => (settings.min_rpm, false),
    };
    if !converged {
        warn!(thrust_n, rpm, "blade element rpm trim did not converge");
    }

    let mut state = evaluate_blade_elements(rotor, rpm, climb_speed_m_s, atmosphere, settings.annuli);
    state.converged = converged;
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use evtol_vehicle::Vehicle;

    #[test]
    fn thrust_grows_with_rpm() {
        let rotor = Vehicle::reference_multirotor().lift_rotor;
        let atm = Atmosphere::sea_level();
        let slow = evaluate_blade_elements(&rotor, 600.0, 0.0, &atm, 40);
        let fast = evaluate_blade_elements(&rotor, 1_200.0, 0.0, &atm, 40);
        assert!(fast.thrust_n > slow.thrust_n);
        assert!(fast.power_w > slow.power_w);
    }

    #[test]
    fn trim_hits_requested_thrust() {
        let rotor = Vehicle::reference_multirotor().lift_rotor;
        let atm = Atmosphere::sea_level();
        let state = trim_rpm(&rotor, 3_000.0, 0.0, &atm, &BemtSettings::default());
        assert!(state.converged);
        assert!((state.thrust_n - 3_000.0).abs() < 1.0);
        // ideal power bounds the blade-element power from below
        let ideal = 3_000.0 * (3_000.0 / (2.0 * atm.density_kg_m3 * rotor.disk_area_each())).sqrt();
        assert!(state.power_w > ideal);
    }

    #[test]
    fn unreachable_thrust_is_flagged() {
        let rotor = Vehicle::reference_multirotor().lift_rotor;
        let atm = Atmosphere::sea_level();
        let state = trim_rpm(&rotor, 5.0e6, 0.0, &atm, &BemtSettings::default());
        assert!(!state.converged);
    }
}
