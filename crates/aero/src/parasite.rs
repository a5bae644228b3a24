//! Parasite drag under three interchangeable models.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use evtol_core::atmosphere::Atmosphere;
use evtol_core::units::{ft2_to_m2, kg_to_lb};
use evtol_vehicle::{Configuration, Vehicle};
use serde::Serialize;

use crate::AeroError;
use crate::wetted::WettedAreas;

/// Exponent of the weight-based flat-plate regression `f = k · W^0.89` (W in lb, f in ft²).
const WEIGHT_REGRESSION_EXPONENT: f64 = 0.89;
/// Lift+cruise parasite drag coefficient (wing reference) from wind-tunnel data.
const BACCHINI_LPC_CD0: f64 = 0.0437;
/// Interference and excrescence allowance on the component sum.
const MISC_DRAG_FACTOR: f64 = 1.1;
const GEAR_STRUT_CD: f64 = 1.2;
const STOPPED_BLADE_CD: f64 = 0.02;

/// Parasite drag model selected by the aerodynamics fidelity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ParasiteDragModel {
    /// `f = k · W^0.89` with `W` in lb and `f` in ft².
    WeightBasedRegression { coefficient: f64 },
    /// Skin-friction + form-factor sum over wetted areas plus hub and gear flat plates.
    ComponentBuildUp,
    /// Fixed `CD0` referenced to the wing area; lift+cruise only.
    BacchiniExperimentalFixedValueForLPC,
}

impl ParasiteDragModel {
    /// Weight-regression coefficient appropriate for a configuration.
    pub fn weight_based_for(configuration: Configuration) -> Self {
        let coefficient = match configuration {
            Configuration::Multirotor => 0.0028,
            Configuration::LiftPlusCruise => 0.0020,
        };
        ParasiteDragModel::WeightBasedRegression { coefficient }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ParasiteDragModel::WeightBasedRegression { .. } => "WeightBasedRegression",
            ParasiteDragModel::ComponentBuildUp => "ComponentBuildUp",
            ParasiteDragModel::BacchiniExperimentalFixedValueForLPC => {
                "BacchiniExperimentalFixedValueForLPC"
            }
        }
    }
}

/// Airframe parasite drag at one flight condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DragBreakdown {
    /// Equivalent flat-plate area (m²).
    pub flat_plate_area_m2: f64,
    pub reference_area_m2: f64,
    /// `f / S_ref`.
    pub cd0: f64,
    /// Parasite drag force (N).
    pub drag_n: f64,
    /// Per-component flat-plate areas (m²); empty for lumped models.
    pub components: BTreeMap<String, f64>,
}

/// Reference area used to non-dimensionalize drag: wing area when there is
/// a wing, otherwise total lift-rotor disk area.
pub fn reference_area(vehicle: &Vehicle) -> f64 {
    match &vehicle.wing {
        Some(wing) => wing.area_m2,
        None => vehicle.lift_rotor.disk_area_total(),
    }
}

/// Parasite drag of the airframe at `speed_m_s`.
///
/// `wetted` is only consulted by the component build-up; missing entries
/// fall back to the geometric estimate.
pub fn parasite_drag(
    model: ParasiteDragModel,
    vehicle: &Vehicle,
    weight_kg: f64,
    atmosphere: &Atmosphere,
    speed_m_s: f64,
    wetted: Option<&WettedAreas>,
) -> Result<DragBreakdown, AeroError> {
    if !(weight_kg > 0.0) {
        return Err(AeroError::NonPositiveWeight(weight_kg));
    }
    let s_ref = reference_area(vehicle);
    let q = atmosphere.dynamic_pressure(speed_m_s);

    let (f, components) = match model {
        ParasiteDragModel::WeightBasedRegression { coefficient } => {
            let f_ft2 = coefficient * kg_to_lb(weight_kg).powf(WEIGHT_REGRESSION_EXPONENT);
            (ft2_to_m2(f_ft2), BTreeMap::new())
        }
        ParasiteDragModel::BacchiniExperimentalFixedValueForLPC => {
            let wing = vehicle.wing.as_ref().ok_or(AeroError::ModelNotApplicable {
                model: model.name(),
                configuration: "multirotor",
            })?;
            (BACCHINI_LPC_CD0 * wing.area_m2, BTreeMap::new())
        }
        ParasiteDragModel::ComponentBuildUp => {
            if !(speed_m_s > 0.0) {
                return Err(AeroError::NonPositiveSpeed(speed_m_s));
            }
            let components = component_build_up(vehicle, weight_kg, atmosphere, speed_m_s, wetted);
            let f = MISC_DRAG_FACTOR * components.values().sum::<f64>();
            (f, components)
        }
    };

    Ok(DragBreakdown {
        flat_plate_area_m2: f,
        reference_area_m2: s_ref,
        cd0: f / s_ref,
        drag_n: q * f,
        components,
    })
}

fn component_build_up(
    vehicle: &Vehicle,
    weight_kg: f64,
    atmosphere: &Atmosphere,
    speed_m_s: f64,
    wetted: Option<&WettedAreas>,
) -> BTreeMap<String, f64> {
    let estimate = WettedAreas::estimate(vehicle);
    let area = |name: &str| {
        wetted
            .and_then(|w| w.get(name))
            .or_else(|| estimate.get(name))
            .unwrap_or(0.0)
    };
    let mach = speed_m_s / atmosphere.sound_speed_m_s;
    let nu = atmosphere.kinematic_viscosity();
    let skin_friction = |length_m: f64| {
        let re = (speed_m_s * length_m / nu).max(1.0e4);
        0.455 / re.log10().powf(2.58) / (1.0 + 0.144 * mach * mach).powf(0.65)
    };

    let mut f = BTreeMap::new();

    let fuselage = &vehicle.fuselage;
    let fr = fuselage.fineness_ratio();
    let ff_body = 1.0 + 60.0 / fr.powi(3) + fr / 400.0;
    f.insert(
        "Fuselage".to_string(),
        skin_friction(fuselage.length_m) * ff_body * area("Fuselage"),
    );

    let lifting_ff = |t_c: f64, sweep_deg: f64| {
        let x_c = 0.3;
        (1.0 + 0.6 / x_c * t_c + 100.0 * t_c.powi(4))
            * (1.34 * mach.max(1e-3).powf(0.18) * sweep_deg.to_radians().cos().powf(0.28))
    };
    if let Some(wing) = &vehicle.wing {
        let cf = skin_friction(wing.mean_chord_m());
        f.insert(
            "Wing".to_string(),
            cf * lifting_ff(wing.thickness_to_chord, wing.sweep_deg) * area("Wing"),
        );
    }
    for (name, tail) in [
        ("HorizontalTail", vehicle.horizontal_tail.as_ref()),
        ("VerticalTail", vehicle.vertical_tail.as_ref()),
    ] {
        if let Some(tail) = tail {
            let chord = tail.area_m2 / tail.span_m();
            // tail interference factor 1.05
            f.insert(
                name.to_string(),
                1.05 * skin_friction(chord) * lifting_ff(tail.thickness_to_chord, 0.0) * area(name),
            );
        }
    }

    let boom = &vehicle.boom;
    if boom.count > 0 && boom.diameter_m > 0.0 {
        let fr_boom = (boom.length_m / boom.diameter_m).max(2.0);
        let ff_boom = 1.0 + 60.0 / fr_boom.powi(3) + fr_boom / 400.0;
        for i in 0..boom.count {
            let name = format!("Boom_{}", i + 1);
            let value = skin_friction(boom.length_m) * ff_boom * area(&name);
            f.insert(name, value);
        }
    }

    let gear = &vehicle.landing_gear;
    f.insert(
        "LandingGear".to_string(),
        GEAR_STRUT_CD * gear.strut_count as f64 * gear.strut_diameter_m * gear.strut_length_m,
    );

    // Rotor hubs: f_hub = 0.85 (W_lb / 1000)^(2/3) ft² shared over the lift rotors
    let rotor = &vehicle.lift_rotor;
    let hub_ft2 = 0.85 * (kg_to_lb(weight_kg) / 1_000.0).powf(2.0 / 3.0);
    let hub_scale = (rotor.hub_radius_m / (0.1 * rotor.radius_m)).clamp(0.25, 4.0);
    f.insert("Hubs".to_string(), ft2_to_m2(hub_ft2) * hub_scale.sqrt());

    if vehicle.configuration == Configuration::LiftPlusCruise {
        // Stopped lift-rotor blades seen edge-on in cruise
        let blade_area =
            rotor.chord_m() * (rotor.radius_m - rotor.hub_radius_m) * rotor.blade_count as f64;
        f.insert(
            "StoppedLiftRotors".to_string(),
            2.0 * STOPPED_BLADE_CD * blade_area * rotor.count as f64,
        );
    } else {
        // Motor pods under each rotor
        let pod_diameter = (0.8 * rotor.hub_radius_m).max(0.05);
        f.insert(
            "MotorPods".to_string(),
            0.5 * PI * pod_diameter * pod_diameter / 4.0 * rotor.count as f64,
        );
    }

    f
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_lift_plus_cruise_drag_needs_a_wing() {
        let air = Atmosphere::sea_level();
        let model = ParasiteDragModel::BacchiniExperimentalFixedValueForLPC;
        assert!(matches!(
            parasite_drag(model, &Vehicle::reference_multirotor(), 1_500.0, &air, 50.0, None),
            Err(AeroError::ModelNotApplicable { .. })
        ));
        let vehicle = Vehicle::reference_lift_plus_cruise();
        let drag = parasite_drag(model, &vehicle, 1_500.0, &air, 50.0, None).unwrap();
        assert!((drag.cd0 - BACCHINI_LPC_CD0).abs() < 1e-12);
    }

    #[test]
    fn regression_drag_grows_with_weight() {
        let air = Atmosphere::sea_level();
        let vehicle = Vehicle::reference_multirotor();
        let model = ParasiteDragModel::weight_based_for(Configuration::Multirotor);
        let light = parasite_drag(model, &vehicle, 1_000.0, &air, 50.0, None).unwrap();
        let heavy = parasite_drag(model, &vehicle, 2_000.0, &air, 50.0, None).unwrap();
        let ratio = heavy.flat_plate_area_m2 / light.flat_plate_area_m2;
        assert!((ratio - 2f64.powf(WEIGHT_REGRESSION_EXPONENT)).abs() < 1e-9);
    }

    #[test]
    fn build_up_uses_supplied_wetted_areas() {
        let air = Atmosphere::sea_level();
        let vehicle = Vehicle::reference_lift_plus_cruise();
        let model = ParasiteDragModel::ComponentBuildUp;
        let estimated = parasite_drag(model, &vehicle, 1_800.0, &air, 60.0, None).unwrap();
        assert!(estimated.components.contains_key("Boom_4"));
        assert!(estimated.components.contains_key("StoppedLiftRotors"));

        let mut wetted = WettedAreas::estimate(&vehicle);
        let fuselage = wetted.get("Fuselage").unwrap();
        wetted.insert("Fuselage", 2.0 * fuselage);
        let supplied = parasite_drag(model, &vehicle, 1_800.0, &air, 60.0, Some(&wetted)).unwrap();
        assert!(
            (supplied.components["Fuselage"] - 2.0 * estimated.components["Fuselage"]).abs()
                < 1e-12
        );
        assert!(supplied.drag_n > estimated.drag_n);
    }
}
