use evtol_vehicle::{
    Airfoil, Battery, Boom, Configuration, Fuselage, LandingGear, Rotor, RpmSchedule, Tail,
    TechnologyFactors, Vehicle, Wing,
};
use serde::Deserialize;

use crate::ConfigError;

/// Vehicle manifest. Leaf components use the engine's own field names.
#[derive(Debug, Deserialize, Clone)]
pub struct VehicleConfig {
    pub name: String,
    pub configuration: Configuration,
    pub battery: Battery,
    pub lift_rotor: RotorConfig,
    #[serde(default)]
    pub propeller: Option<RotorConfig>,
    #[serde(default)]
    pub wing: Option<Wing>,
    #[serde(default)]
    pub horizontal_tail: Option<Tail>,
    #[serde(default)]
    pub vertical_tail: Option<Tail>,
    pub fuselage: Fuselage,
    pub landing_gear: LandingGear,
    pub boom: Boom,
    #[serde(default)]
    pub tech_factors: TechnologyFactors,
    #[serde(default = "default_load_factor")]
    pub ultimate_load_factor: f64,
}

fn default_load_factor() -> f64 {
    3.8
}

fn default_figure_of_merit() -> f64 {
    0.75
}

fn default_global_twist() -> f64 {
    12.0
}

/// Rotor speed: one value for every phase, or a per-phase table.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(untagged)]
pub enum RpmConfig {
    Uniform(f64),
    Schedule(RpmSchedule),
}

impl From<RpmConfig> for RpmSchedule {
    fn from(value: RpmConfig) -> Self {
        match value {
            RpmConfig::Uniform(rpm) => RpmSchedule::uniform(rpm),
            RpmConfig::Schedule(schedule) => schedule,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RotorConfig {
    pub count: usize,
    pub blade_count: usize,
    pub radius_m: f64,
    pub mean_chord_to_radius: f64,
    pub hub_radius_m: f64,
    #[serde(default = "Airfoil::naca0012")]
    pub airfoil: Airfoil,
    #[serde(default = "default_figure_of_merit")]
    pub figure_of_merit: f64,
    #[serde(default)]
    pub twist_deg: f64,
    #[serde(default = "default_global_twist")]
    pub global_twist_deg: f64,
    pub rpm: RpmConfig,
}

impl From<RotorConfig> for Rotor {
    fn from(value: RotorConfig) -> Self {
        Rotor {
            count: value.count,
            blade_count: value.blade_count,
            radius_m: value.radius_m,
            mean_chord_to_radius: value.mean_chord_to_radius,
            hub_radius_m: value.hub_radius_m,
            airfoil: value.airfoil,
            figure_of_merit: value.figure_of_merit,
            twist_deg: value.twist_deg,
            global_twist_deg: value.global_twist_deg,
            rpm: value.rpm.into(),
        }
    }
}

impl TryFrom<VehicleConfig> for Vehicle {
    type Error = ConfigError;

    fn try_from(value: VehicleConfig) -> Result<Self, Self::Error> {
        let vehicle = Vehicle {
            name: value.name,
            configuration: value.configuration,
            battery: value.battery,
            lift_rotor: value.lift_rotor.into(),
            propeller: value.propeller.map(Rotor::from),
            wing: value.wing,
            horizontal_tail: value.horizontal_tail,
            vertical_tail: value.vertical_tail,
            fuselage: value.fuselage,
            landing_gear: value.landing_gear,
            boom: value.boom,
            tech_factors: value.tech_factors,
            ultimate_load_factor: value.ultimate_load_factor,
        };
        vehicle.validate()?;
        Ok(vehicle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MULTIROTOR: &str = r#"
name = "Quad"
configuration = "multirotor"

[battery]
density_wh_kg = 250.0
efficiency = 0.95
max_discharge = 0.9

[lift_rotor]
count = 4
blade_count = 3
radius_m = 1.6
mean_chord_to_radius = 0.1
hub_radius_m = 0.15
rpm = 900.0

[fuselage]
length_m = 6.0
max_diameter_m = 1.8
passenger_count = 2
payload_per_passenger_kg = 100.0

[landing_gear]
strut_length_m = 0.6
strut_diameter_m = 0.08
strut_count = 4

[boom]
count = 4
length_m = 2.5
diameter_m = 0.15
"#;

    #[test]
    fn multirotor_manifest_fills_defaults() {
        let config: VehicleConfig = toml::from_str(MULTIROTOR).expect("manifest parses");
        let vehicle = Vehicle::try_from(config).expect("valid vehicle");
        assert_eq!(vehicle.configuration, Configuration::Multirotor);
        assert_eq!(vehicle.lift_rotor.rpm.cruise, 900.0);
        assert_eq!(vehicle.lift_rotor.airfoil.name, "NACA0012");
        assert_eq!(vehicle.tech_factors.structure, 1.0);
        assert_eq!(vehicle.payload_kg(), 200.0);
    }

    #[test]
    fn lift_plus_cruise_without_wing_is_rejected() {
        let manifest = MULTIROTOR.replace("\"multirotor\"", "\"lift_plus_cruise\"");
        let config: VehicleConfig = toml::from_str(&manifest).expect("manifest parses");
        assert!(matches!(
            Vehicle::try_from(config),
            Err(ConfigError::Vehicle(_))
        ));
    }
}
