//! Two-dimensional force balance of weight, drag, lift and thrust.
//!
//! Multirotors tilt the whole thrust vector (`trim_edgewise`); lift+cruise
//! aircraft carry weight on the wing and push with the propeller
//! (`trim_winged`). Both return the thrust vector plus the rotor disk angle
//! of attack consumed by the inflow solve, with positive disk angle meaning
//! the freestream adds to the inflow.

use std::f64::consts::FRAC_PI_2;

use evtol_core::atmosphere::Atmosphere;
use evtol_vehicle::Vehicle;
use serde::Serialize;

use crate::AeroError;
use crate::parasite::{DragBreakdown, ParasiteDragModel, parasite_drag};
use crate::wetted::WettedAreas;
use crate::wing::{aoa_for_lift_coefficient, lift_coefficient, wing_forces};

/// Inputs for one forward-flight trim.
#[derive(Debug, Clone, Copy)]
pub struct TrimRequest<'a> {
    pub vehicle: &'a Vehicle,
    pub drag_model: ParasiteDragModel,
    pub wetted: Option<&'a WettedAreas>,
    pub atmosphere: &'a Atmosphere,
    pub weight_kg: f64,
    pub speed_m_s: f64,
    /// Flight path angle (rad), positive climbing.
    pub gamma_rad: f64,
    /// Prescribed wing angle of attack; `None` trims lift to weight.
    pub aoa_rad: Option<f64>,
}

/// Trimmed thrust vector and the aerodynamic state behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrimSolution {
    /// Total thrust over all active rotors (N).
    pub thrust_n: f64,
    /// Thrust component along the flight path (N).
    pub thrust_x_n: f64,
    /// Thrust component normal to the flight path (N).
    pub thrust_z_n: f64,
    /// Rotor disk angle of attack (rad).
    pub disk_aoa_rad: f64,
    /// Total drag, parasite plus induced (N).
    pub drag_n: f64,
    pub lift_n: f64,
    pub cl: f64,
    pub cdi: f64,
    /// Wing angle of attack (rad); `None` for wingless vehicles.
    pub aoa_rad: Option<f64>,
    pub parasite: DragBreakdown,
}

/// Edgewise trim for a vehicle with no wing: the rotors tilt forward until
/// the thrust vector balances weight and drag.
pub fn trim_edgewise(request: &TrimRequest<'_>) -> Result<TrimSolution, AeroError> {
    let speed = request.speed_m_s;
    if !(speed > 0.0) {
        return Err(AeroError::NonPositiveSpeed(speed));
    }
    let parasite = parasite_drag(
        request.drag_model,
        request.vehicle,
        request.weight_kg,
        request.atmosphere,
        speed,
        request.wetted,
    )?;
    let weight_n = request.weight_kg * request.atmosphere.gravity_m_s2;
    let (sin_g, cos_g) = request.gamma_rad.sin_cos();

    let thrust_x = parasite.drag_n + weight_n * sin_g;
    let thrust_z = weight_n * cos_g;
    let thrust = thrust_x.hypot(thrust_z);
    // tilt from the flight-path normal; forward tilt drives freestream into the disk
    let tilt = thrust_x.atan2(thrust_z);

    Ok(TrimSolution {
        thrust_n: thrust,
        thrust_x_n: thrust_x,
        thrust_z_n: thrust_z,
        disk_aoa_rad: tilt,
        drag_n: parasite.drag_n,
        lift_n: 0.0,
        cl: 0.0,
        cdi: 0.0,
        aoa_rad: None,
        parasite,
    })
}

/// Wing-borne trim: the wing carries `W cos γ`, the propeller makes up drag
/// and the along-path weight component.
pub fn trim_winged(request: &TrimRequest<'_>) -> Result<TrimSolution, AeroError> {
    let speed = request.speed_m_s;
    if !(speed > 0.0) {
        return Err(AeroError::NonPositiveSpeed(speed));
    }
    let wing = request
        .vehicle
        .wing
        .as_ref()
        .ok_or(AeroError::MissingWing("wing-borne trim"))?;
    let parasite = parasite_drag(
        request.drag_model,
        request.vehicle,
        request.weight_kg,
        request.atmosphere,
        speed,
        request.wetted,
    )?;
    let q = request.atmosphere.dynamic_pressure(speed);
    let weight_n = request.weight_kg * request.atmosphere.gravity_m_s2;
    let (sin_g, cos_g) = request.gamma_rad.sin_cos();

    let (cl, aoa) = match request.aoa_rad {
        Some(aoa) => (lift_coefficient(wing, aoa), aoa),
        None => {
            let cl = (weight_n * cos_g / (q * wing.area_m2)).min(wing.cl_max);
            (cl, aoa_for_lift_coefficient(wing, cl))
        }
    };
    let forces = wing_forces(wing, cl, q);
    let drag = parasite.drag_n + forces.induced_drag_n;

    let thrust_x = (drag + weight_n * sin_g).max(0.0);
    let thrust_z = weight_n * cos_g - forces.lift_n;
    let thrust = thrust_x.hypot(thrust_z);
    let tilt = if thrust > 0.0 {
        thrust_z.atan2(thrust_x)
    } else {
        0.0
    };

    Ok(TrimSolution {
        thrust_n: thrust,
        thrust_x_n: thrust_x,
        thrust_z_n: thrust_z,
        disk_aoa_rad: FRAC_PI_2 - tilt,
        drag_n: drag,
        lift_n: forces.lift_n,
        cl,
        cdi: forces.cdi,
        aoa_rad: Some(aoa),
        parasite,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(vehicle: &'a Vehicle, air: &'a Atmosphere, gamma_rad: f64) -> TrimRequest<'a> {
        TrimRequest {
            vehicle,
            drag_model: ParasiteDragModel::weight_based_for(vehicle.configuration),
            wetted: None,
            atmosphere: air,
            weight_kg: 1_500.0,
            speed_m_s: 50.0,
            gamma_rad,
            aoa_rad: None,
        }
    }

    #[test]
    fn edgewise_thrust_balances_weight_and_drag() {
        let vehicle = Vehicle::reference_multirotor();
        let air = Atmosphere::sea_level();
        let trim = trim_edgewise(&request(&vehicle, &air, 0.0)).unwrap();
        let weight_n = 1_500.0 * air.gravity_m_s2;
        assert!((trim.thrust_z_n - weight_n).abs() < 1e-9);
        assert!((trim.thrust_x_n - trim.drag_n).abs() < 1e-9);
        assert!(trim.disk_aoa_rad > 0.0);
    }

    #[test]
    fn level_wing_trim_carries_weight_on_the_wing() {
        let vehicle = Vehicle::reference_lift_plus_cruise();
        let air = Atmosphere::sea_level();
        let trim = trim_winged(&request(&vehicle, &air, 0.0)).unwrap();
        assert!(trim.thrust_z_n.abs() < 1e-6);
        assert!((trim.thrust_n - trim.drag_n).abs() < 1e-6);
        assert!(trim.cdi > 0.0);
        assert!(trim.aoa_rad.is_some());
    }

    #[test]
    fn zero_speed_is_rejected() {
        let vehicle = Vehicle::reference_multirotor();
        let air = Atmosphere::sea_level();
        let mut req = request(&vehicle, &air, 0.0);
        req.speed_m_s = 0.0;
        assert_eq!(trim_edgewise(&req), Err(AeroError::NonPositiveSpeed(0.0)));
    }
}
