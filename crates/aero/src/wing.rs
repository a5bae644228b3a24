//! Finite-wing lift and parabolic induced drag.

use std::f64::consts::PI;

use evtol_vehicle::Wing;

/// Wing lift coefficient at angle of attack `aoa_rad` (linear, clipped at `cl_max`).
pub fn lift_coefficient(wing: &Wing, aoa_rad: f64) -> f64 {
    let cl = wing.lift_slope_per_rad() * (aoa_rad - wing.zero_lift_aoa_deg.to_radians());
    cl.clamp(-wing.cl_max, wing.cl_max)
}

/// Angle of attack producing `cl` on the linear part of the lift curve (rad).
pub fn aoa_for_lift_coefficient(wing: &Wing, cl: f64) -> f64 {
    cl / wing.lift_slope_per_rad() + wing.zero_lift_aoa_deg.to_radians()
}

/// Induced drag coefficient `CL² / (π e AR)`.
pub fn induced_drag_coefficient(wing: &Wing, cl: f64) -> f64 {
    cl * cl / (PI * wing.oswald_efficiency * wing.aspect_ratio)
}

/// Lift and induced drag forces (N) at dynamic pressure `q`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WingForces {
    pub cl: f64,
    pub cdi: f64,
    pub lift_n: f64,
    pub induced_drag_n: f64,
}

pub fn wing_forces(wing: &Wing, cl: f64, dynamic_pressure: f64) -> WingForces {
    let cdi = induced_drag_coefficient(wing, cl);
    WingForces {
        cl,
        cdi,
        lift_n: dynamic_pressure * wing.area_m2 * cl,
        induced_drag_n: dynamic_pressure * wing.area_m2 * cdi,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evtol_vehicle::Vehicle;

    fn wing() -> Wing {
        Vehicle::reference_lift_plus_cruise().wing.unwrap()
    }

    #[test]
    fn lift_curve_inverts_on_linear_range() {
        let wing = wing();
        let aoa = 3f64.to_radians();
        let cl = lift_coefficient(&wing, aoa);
        assert!(cl > 0.0 && cl < wing.cl_max);
        assert!((aoa_for_lift_coefficient(&wing, cl) - aoa).abs() < 1e-12);
        assert!(lift_coefficient(&wing, wing.zero_lift_aoa_deg.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn lift_clips_at_stall() {
        let wing = wing();
        assert_eq!(lift_coefficient(&wing, 40f64.to_radians()), wing.cl_max);
    }

    #[test]
    fn induced_drag_is_parabolic() {
        let wing = wing();
        let forces = wing_forces(&wing, 0.6, 1_500.0);
        let expected = 0.36 / (PI * wing.oswald_efficiency * wing.aspect_ratio);
        assert!((forces.cdi - expected).abs() < 1e-12);
        assert!((forces.lift_n - 1_500.0 * wing.area_m2 * 0.6).abs() < 1e-9);
    }
}
