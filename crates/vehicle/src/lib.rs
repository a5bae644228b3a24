//! Vehicle component tree, configuration topology, and per-point overrides.
//!
//! Geometry is held in SI. Derived quantities (solidity, disk area, span) are
//! methods, never stored fields, so they cannot drift from their inputs.

use std::f64::consts::PI;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Vehicle topology. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Configuration {
    /// Lift rotors only; the rotors tilt with the body to produce propulsive force.
    Multirotor,
    /// Dedicated lift rotors for hover plus a propeller and wing for forward flight.
    LiftPlusCruise,
}

/// Flight phase used to look up commanded rotor speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightPhase {
    Hover,
    Climb,
    Cruise,
    Descent,
}

/// Battery pack technology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Battery {
    /// Cell-level specific energy (Wh/kg).
    pub density_wh_kg: f64,
    /// Round-trip (discharge path) efficiency in (0, 1].
    pub efficiency: f64,
    /// Usable fraction of the pack energy in (0, 1].
    pub max_discharge: f64,
}

impl Battery {
    /// Energy delivered to the shafts per kilogram of battery (Wh/kg).
    pub fn usable_specific_energy_wh_kg(&self) -> f64 {
        self.density_wh_kg * self.efficiency * self.max_discharge
    }
}

/// Quadratic section drag polar `cd = cd0 + cd1·α + cd2·α²` with linear lift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airfoil {
    pub name: String,
    /// Section lift-curve slope (1/rad).
    pub lift_slope_per_rad: f64,
    pub cd0: f64,
    pub cd1: f64,
    pub cd2: f64,
}

impl Airfoil {
    /// Section drag coefficient at angle of attack `alpha_rad`.
    pub fn drag_coefficient(&self, alpha_rad: f64) -> f64 {
        self.cd0 + self.cd1 * alpha_rad + self.cd2 * alpha_rad * alpha_rad
    }

    /// NACA 0012 polar fit, the default rotor section.
    pub fn naca0012() -> Self {
        Self {
            name: "NACA0012".to_string(),
            lift_slope_per_rad: 5.73,
            cd0: 0.0087,
            cd1: -0.0216,
            cd2: 0.400,
        }
    }
}

/// Commanded rotor speed per flight phase (rpm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RpmSchedule {
    pub hover: f64,
    pub climb: f64,
    pub cruise: f64,
    pub descent: f64,
}

impl RpmSchedule {
    pub fn uniform(rpm: f64) -> Self {
        Self {
            hover: rpm,
            climb: rpm,
            cruise: rpm,
            descent: rpm,
        }
    }

    pub fn for_phase(&self, phase: FlightPhase) -> f64 {
        match phase {
            FlightPhase::Hover => self.hover,
            FlightPhase::Climb => self.climb,
            FlightPhase::Cruise => self.cruise,
            FlightPhase::Descent => self.descent,
        }
    }
}

/// Rotor or propeller group: `count` identical rotors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rotor {
    pub count: usize,
    pub blade_count: usize,
    pub radius_m: f64,
    pub mean_chord_to_radius: f64,
    pub hub_radius_m: f64,
    pub airfoil: Airfoil,
    /// Hover figure of merit used by the momentum-theory models.
    pub figure_of_merit: f64,
    /// Linear blade twist from root to tip (deg, negative = washout).
    pub twist_deg: f64,
    /// Blade pitch at 75 % radius (deg); the fixed-pitch setting seen by blade-element models.
    pub global_twist_deg: f64,
    pub rpm: RpmSchedule,
}

impl Rotor {
    /// Blade solidity `n_blade · (c/R) / π`.
    pub fn solidity(&self) -> f64 {
        self.blade_count as f64 * self.mean_chord_to_radius / PI
    }

    /// Disk area of one rotor (m²).
    pub fn disk_area_each(&self) -> f64 {
        PI * self.radius_m * self.radius_m
    }

    /// Combined disk area of the group (m²).
    pub fn disk_area_total(&self) -> f64 {
        self.disk_area_each() * self.count as f64
    }

    pub fn chord_m(&self) -> f64 {
        self.mean_chord_to_radius * self.radius_m
    }

    /// Blade tip speed for a given rotor speed (m/s).
    pub fn tip_speed(&self, rpm: f64) -> f64 {
        rpm * PI / 30.0 * self.radius_m
    }
}

/// Main wing (LiftPlusCruise only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wing {
    pub area_m2: f64,
    pub aspect_ratio: f64,
    pub oswald_efficiency: f64,
    /// Section lift-curve slope (1/rad).
    pub section_lift_slope_per_rad: f64,
    pub zero_lift_aoa_deg: f64,
    pub cl_max: f64,
    pub thickness_to_chord: f64,
    pub taper_ratio: f64,
    pub sweep_deg: f64,
}

impl Wing {
    pub fn span_m(&self) -> f64 {
        (self.area_m2 * self.aspect_ratio).sqrt()
    }

    pub fn mean_chord_m(&self) -> f64 {
        self.area_m2 / self.span_m()
    }

    /// Finite-wing lift-curve slope (Helmbold, 1/rad).
    pub fn lift_slope_per_rad(&self) -> f64 {
        let a0 = self.section_lift_slope_per_rad;
        let ar = self.aspect_ratio;
        let k = a0 / (PI * ar);
        a0 / ((1.0 + k * k).sqrt() + k)
    }
}

/// Horizontal or vertical tail surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tail {
    pub area_m2: f64,
    pub aspect_ratio: f64,
    pub thickness_to_chord: f64,
    /// Distance from the wing quarter chord to the tail quarter chord (m).
    pub arm_m: f64,
}

impl Tail {
    pub fn span_m(&self) -> f64 {
        (self.area_m2 * self.aspect_ratio).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fuselage {
    pub length_m: f64,
    pub max_diameter_m: f64,
    pub passenger_count: usize,
    pub payload_per_passenger_kg: f64,
}

impl Fuselage {
    pub fn fineness_ratio(&self) -> f64 {
        self.length_m / self.max_diameter_m
    }

    /// Fixed payload mass; not a function of anything computed.
    pub fn payload_kg(&self) -> f64 {
        self.passenger_count as f64 * self.payload_per_passenger_kg
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandingGear {
    pub strut_length_m: f64,
    pub strut_diameter_m: f64,
    pub strut_count: usize,
}

/// Rotor support booms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boom {
    pub count: usize,
    pub length_m: f64,
    pub diameter_m: f64,
}

/// Lightweighting credits applied to the weight regressions, each in (0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TechnologyFactors {
    pub structure: f64,
    pub propulsion: f64,
    pub equipment: f64,
}

impl Default for TechnologyFactors {
    fn default() -> Self {
        Self {
            structure: 1.0,
            propulsion: 1.0,
            equipment: 1.0,
        }
    }
}

/// Errors surfaced when a vehicle definition is inconsistent.
#[derive(Debug, Error, PartialEq)]
pub enum VehicleError {
    #[error("{configuration:?} vehicle requires a {component}")]
    MissingComponent {
        configuration: Configuration,
        component: &'static str,
    },
    #[error("technology factor `{name}` must lie in (0, 1], got {value}")]
    TechnologyFactor { name: &'static str, value: f64 },
    #[error("`{name}` must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("`{name}` must lie in (0, 1], got {value}")]
    Fraction { name: &'static str, value: f64 },
}

/// Aggregate root for the sized aircraft.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vehicle {
    pub name: String,
    pub configuration: Configuration,
    pub battery: Battery,
    pub lift_rotor: Rotor,
    pub propeller: Option<Rotor>,
    pub wing: Option<Wing>,
    pub horizontal_tail: Option<Tail>,
    pub vertical_tail: Option<Tail>,
    pub fuselage: Fuselage,
    pub landing_gear: LandingGear,
    pub boom: Boom,
    pub tech_factors: TechnologyFactors,
    /// Ultimate structural load factor used by the structure regressions.
    pub ultimate_load_factor: f64,
}

impl Vehicle {
    /// Check topology and physical ranges. Called once by every analysis constructor.
    pub fn validate(&self) -> Result<(), VehicleError> {
        if self.configuration == Configuration::LiftPlusCruise {
            let required: [(&'static str, bool); 4] = [
                ("propeller", self.propeller.is_some()),
                ("wing", self.wing.is_some()),
                ("horizontal tail", self.horizontal_tail.is_some()),
                ("vertical tail", self.vertical_tail.is_some()),
            ];
            for (component, present) in required {
                if !present {
                    return Err(VehicleError::MissingComponent {
                        configuration: self.configuration,
                        component,
                    });
                }
            }
        }

        for (name, value) in [
            ("tech_factors.structure", self.tech_factors.structure),
            ("tech_factors.propulsion", self.tech_factors.propulsion),
            ("tech_factors.equipment", self.tech_factors.equipment),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(VehicleError::TechnologyFactor { name, value });
            }
        }

        positive("battery.density_wh_kg", self.battery.density_wh_kg)?;
        fraction("battery.efficiency", self.battery.efficiency)?;
        fraction("battery.max_discharge", self.battery.max_discharge)?;
        check_rotor("lift_rotor", &self.lift_rotor)?;
        if let Some(propeller) = &self.propeller {
            check_rotor("propeller", propeller)?;
        }
        if let Some(wing) = &self.wing {
            positive("wing.area_m2", wing.area_m2)?;
            positive("wing.aspect_ratio", wing.aspect_ratio)?;
            fraction("wing.oswald_efficiency", wing.oswald_efficiency)?;
        }
        positive("fuselage.length_m", self.fuselage.length_m)?;
        positive("fuselage.max_diameter_m", self.fuselage.max_diameter_m)?;
        positive("ultimate_load_factor", self.ultimate_load_factor)?;
        Ok(())
    }

    /// Fixed payload mass (kg).
    pub fn payload_kg(&self) -> f64 {
        self.fuselage.payload_kg()
    }

    /// Rotor group carrying forward-flight thrust.
    pub fn forward_thrust_rotor(&self) -> &Rotor {
        match (&self.configuration, &self.propeller) {
            (Configuration::LiftPlusCruise, Some(propeller)) => propeller,
            _ => &self.lift_rotor,
        }
    }

    /// Apply a per-point override, producing an independent vehicle value.
    pub fn with_override(&self, overrides: &PointOverride) -> Vehicle {
        let mut vehicle = self.clone();
        if let Some(density) = overrides.battery_density_wh_kg {
            vehicle.battery.density_wh_kg = density;
        }
        if let Some(efficiency) = overrides.battery_efficiency {
            vehicle.battery.efficiency = efficiency;
        }
        if let Some(max_discharge) = overrides.battery_max_discharge {
            vehicle.battery.max_discharge = max_discharge;
        }
        if let Some(passengers) = overrides.passenger_count {
            vehicle.fuselage.passenger_count = passengers;
        }
        vehicle
    }

    /// Reference 6-rotor, 4-passenger multirotor.
    pub fn reference_multirotor() -> Self {
        Self {
            name: "Reference Multirotor".to_string(),
            configuration: Configuration::Multirotor,
            battery: Battery {
                density_wh_kg: 250.0,
                efficiency: 0.95,
                max_discharge: 0.9,
            },
            lift_rotor: Rotor {
                count: 6,
                blade_count: 3,
                radius_m: 1.5,
                mean_chord_to_radius: 0.1,
                hub_radius_m: 0.15,
                airfoil: Airfoil::naca0012(),
                figure_of_merit: 0.75,
                twist_deg: -10.0,
                global_twist_deg: 12.0,
                rpm: RpmSchedule {
                    hover: 900.0,
                    climb: 1_000.0,
                    cruise: 1_000.0,
                    descent: 1_000.0,
                },
            },
            propeller: None,
            wing: None,
            horizontal_tail: None,
            vertical_tail: None,
            fuselage: Fuselage {
                length_m: 6.0,
                max_diameter_m: 1.8,
                passenger_count: 4,
                payload_per_passenger_kg: 100.0,
            },
            landing_gear: LandingGear {
                strut_length_m: 0.6,
                strut_diameter_m: 0.08,
                strut_count: 4,
            },
            boom: Boom {
                count: 6,
                length_m: 2.5,
                diameter_m: 0.15,
            },
            tech_factors: TechnologyFactors {
                structure: 0.8,
                propulsion: 0.8,
                equipment: 0.8,
            },
            ultimate_load_factor: 3.8,
        }
    }

    /// Reference 8 lift rotor + 1 pusher propeller, 4-passenger lift+cruise aircraft.
    pub fn reference_lift_plus_cruise() -> Self {
        Self {
            name: "Reference Lift+Cruise".to_string(),
            configuration: Configuration::LiftPlusCruise,
            battery: Battery {
                density_wh_kg: 250.0,
                efficiency: 0.95,
                max_discharge: 0.9,
            },
            lift_rotor: Rotor {
                count: 8,
                blade_count: 2,
                radius_m: 1.0,
                mean_chord_to_radius: 0.1,
                hub_radius_m: 0.1,
                airfoil: Airfoil::naca0012(),
                figure_of_merit: 0.75,
                twist_deg: -8.0,
                global_twist_deg: 12.0,
                rpm: RpmSchedule::uniform(1_300.0),
            },
            propeller: Some(Rotor {
                count: 1,
                blade_count: 5,
                radius_m: 1.0,
                mean_chord_to_radius: 0.1,
                hub_radius_m: 0.15,
                airfoil: Airfoil::naca0012(),
                figure_of_merit: 0.8,
                twist_deg: -30.0,
                global_twist_deg: 30.0,
                rpm: RpmSchedule {
                    hover: 1_000.0,
                    climb: 1_500.0,
                    cruise: 1_500.0,
                    descent: 1_200.0,
                },
            }),
            wing: Some(Wing {
                area_m2: 12.0,
                aspect_ratio: 10.0,
                oswald_efficiency: 0.8,
                section_lift_slope_per_rad: 2.0 * PI,
                zero_lift_aoa_deg: -2.0,
                cl_max: 1.4,
                thickness_to_chord: 0.15,
                taper_ratio: 0.6,
                sweep_deg: 0.0,
            }),
            horizontal_tail: Some(Tail {
                area_m2: 2.5,
                aspect_ratio: 4.0,
                thickness_to_chord: 0.12,
                arm_m: 4.0,
            }),
            vertical_tail: Some(Tail {
                area_m2: 1.5,
                aspect_ratio: 1.5,
                thickness_to_chord: 0.12,
                arm_m: 4.0,
            }),
            fuselage: Fuselage {
                length_m: 7.5,
                max_diameter_m: 1.7,
                passenger_count: 4,
                payload_per_passenger_kg: 100.0,
            },
            landing_gear: LandingGear {
                strut_length_m: 0.5,
                strut_diameter_m: 0.08,
                strut_count: 3,
            },
            boom: Boom {
                count: 4,
                length_m: 5.0,
                diameter_m: 0.2,
            },
            tech_factors: TechnologyFactors {
                structure: 0.8,
                propulsion: 0.8,
                equipment: 0.8,
            },
            ultimate_load_factor: 3.8,
        }
    }
}

fn check_rotor(prefix: &'static str, rotor: &Rotor) -> Result<(), VehicleError> {
    if rotor.count == 0 {
        return Err(VehicleError::NonPositive {
            name: prefix,
            value: 0.0,
        });
    }
    positive(prefix, rotor.radius_m)?;
    positive(prefix, rotor.mean_chord_to_radius)?;
    fraction(prefix, rotor.figure_of_merit)?;
    if rotor.hub_radius_m >= rotor.radius_m {
        return Err(VehicleError::Fraction {
            name: prefix,
            value: rotor.hub_radius_m / rotor.radius_m,
        });
    }
    Ok(())
}

fn positive(name: &'static str, value: f64) -> Result<(), VehicleError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(VehicleError::NonPositive { name, value })
    }
}

fn fraction(name: &'static str, value: f64) -> Result<(), VehicleError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(VehicleError::Fraction { name, value })
    }
}

/// Per-point values that may differ between points sharing one airframe.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PointOverride {
    pub battery_density_wh_kg: Option<f64>,
    pub battery_efficiency: Option<f64>,
    pub battery_max_discharge: Option<f64>,
    pub passenger_count: Option<usize>,
}

impl PointOverride {
    pub fn battery_density(density_wh_kg: f64) -> Self {
        Self {
            battery_density_wh_kg: Some(density_wh_kg),
            ..Self::default()
        }
    }
}

/// One evaluation point: shared immutable baseline geometry plus its own override.
///
/// The baseline sits behind an `Arc`, so points never alias mutable state;
/// resolving a point always yields a fresh `Vehicle` value.
#[derive(Debug, Clone)]
pub struct VehiclePoint {
    pub name: String,
    pub baseline: Arc<Vehicle>,
    pub overrides: PointOverride,
}

impl VehiclePoint {
    pub fn new(name: impl Into<String>, baseline: Arc<Vehicle>, overrides: PointOverride) -> Self {
        Self {
            name: name.into(),
            baseline,
            overrides,
        }
    }

    /// Materialize the vehicle for this point.
    pub fn resolve(&self) -> Vehicle {
        self.baseline.with_override(&self.overrides)
    }

    /// Materialize the vehicle for this point on top of a modified baseline.
    pub fn resolve_on(&self, baseline: &Vehicle) -> Vehicle {
        baseline.with_override(&self.overrides)
    }
}

/// How tail areas are obtained for a winged vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum TailSizing {
    /// Keep the tail areas the vehicle was defined with.
    Given,
    /// Size tails from volume coefficients on the current wing:
    /// `S_h = V_h S_w c̄ / l_h`, `S_v = V_v S_w b / l_v`.
    VolumeCoefficient { horizontal: f64, vertical: f64 },
}

impl TailSizing {
    /// Vehicle with tail areas resolved; wingless vehicles pass through untouched.
    pub fn apply(&self, vehicle: &Vehicle) -> Vehicle {
        let mut sized = vehicle.clone();
        let (TailSizing::VolumeCoefficient { horizontal, vertical }, Some(wing)) =
            (self, &vehicle.wing)
        else {
            return sized;
        };
        if let Some(tail) = sized.horizontal_tail.as_mut() {
            if tail.arm_m > 0.0 {
                tail.area_m2 = horizontal * wing.area_m2 * wing.mean_chord_m() / tail.arm_m;
            }
        }
        if let Some(tail) = sized.vertical_tail.as_mut() {
            if tail.arm_m > 0.0 {
                tail.area_m2 = vertical * wing.area_m2 * wing.span_m() / tail.arm_m;
            }
        }
        sized
    }
}
