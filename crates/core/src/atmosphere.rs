//! ISA standard atmosphere, restricted to the altitudes an eVTOL mission sees.

use serde::Serialize;

use crate::constants::{G0, GAMMA_AIR, R_AIR};

const T0: f64 = 288.15; // sea-level temperature, K
const P0: f64 = 101_325.0; // sea-level pressure, Pa
const LAPSE: f64 = -0.0065; // troposphere lapse rate, K/m
const TROPOPAUSE_M: f64 = 11_000.0;
const T_TROPOPAUSE: f64 = 216.65;
const SUTHERLAND_MU_REF: f64 = 1.716e-5; // Pa·s at T_REF
const SUTHERLAND_T_REF: f64 = 273.15;
const SUTHERLAND_S: f64 = 110.4;

/// Environmental constants shared by every segment of a mission.
///
/// Resolved once from the takeoff altitude and then treated as fixed; the
/// altitude changes inside a commuter mission are small enough for that.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Atmosphere {
    pub altitude_m: f64,
    pub density_kg_m3: f64,
    pub pressure_pa: f64,
    pub temperature_k: f64,
    pub dynamic_viscosity_pa_s: f64,
    pub sound_speed_m_s: f64,
    pub gravity_m_s2: f64,
}

impl Atmosphere {
    /// Sea-level standard day.
    pub fn sea_level() -> Self {
        standard_atmosphere(0.0)
    }

    /// Kinematic viscosity (m²/s).
    pub fn kinematic_viscosity(&self) -> f64 {
        self.dynamic_viscosity_pa_s / self.density_kg_m3
    }

    /// Dynamic pressure for a given airspeed (Pa).
    pub fn dynamic_pressure(&self, speed_m_s: f64) -> f64 {
        0.5 * self.density_kg_m3 * speed_m_s * speed_m_s
    }
}

/// ISA standard atmosphere (troposphere + isothermal tropopause layer).
///
/// Negative altitudes clamp to sea level. Above 20 km the isothermal layer is
/// extrapolated, which is far outside any eVTOL operating point.
pub fn standard_atmosphere(altitude_m: f64) -> Atmosphere {
    let h = altitude_m.max(0.0);
    let (temperature, pressure) = if h < TROPOPAUSE_M {
        let t = T0 + LAPSE * h;
        let p = P0 * (t / T0).powf(-G0 / (LAPSE * R_AIR));
        (t, p)
    } else {
        let p_base = P0 * (T_TROPOPAUSE / T0).powf(-G0 / (LAPSE * R_AIR));
        let p = p_base * (-G0 * (h - TROPOPAUSE_M) / (R_AIR * T_TROPOPAUSE)).exp();
        (T_TROPOPAUSE, p)
    };

    Atmosphere {
        altitude_m: h,
        density_kg_m3: pressure / (R_AIR * temperature),
        pressure_pa: pressure,
        temperature_k: temperature,
        dynamic_viscosity_pa_s: sutherland_viscosity(temperature),
        sound_speed_m_s: (GAMMA_AIR * R_AIR * temperature).sqrt(),
        gravity_m_s2: G0,
    }
}

fn sutherland_viscosity(temperature_k: f64) -> f64 {
    SUTHERLAND_MU_REF
        * (temperature_k / SUTHERLAND_T_REF).powf(1.5)
        * (SUTHERLAND_T_REF + SUTHERLAND_S)
        / (temperature_k + SUTHERLAND_S)
}
