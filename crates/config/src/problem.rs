use evtol_core::units::kmh_to_ms;
use evtol_design::{
    Constraint, DesignProblem, MultiPointOptions, OffDesignOptions, OffDesignPoint, ProblemKind,
    SweepGrid,
};
use evtol_mission::Mission;
use evtol_vehicle::Vehicle;
use evtol_weight::{ClosureOptions, Fidelity, SizingResult, SolvedBy, WeightType};
use serde::Deserialize;

use crate::{ConfigError, parse_unit};

/// Study manifest: how to close the weight, and optionally what to optimize or sweep.
#[derive(Debug, Deserialize, Clone)]
pub struct ProblemConfig {
    #[serde(default = "default_weight_type")]
    pub weight_type: String,
    #[serde(default = "default_solved_by")]
    pub solved_by: String,
    /// Starting takeoff weight (kg).
    #[serde(default = "default_guess")]
    pub initial_guess_kg: f64,
    /// Battery density flown by a gross evaluation; the sizing density when absent.
    #[serde(default)]
    pub gross_battery_density_wh_kg: Option<f64>,
    #[serde(default)]
    pub closure: ClosureConfig,
    #[serde(default)]
    pub optimization: Option<OptimizationConfig>,
    #[serde(default)]
    pub sweep: Option<SweepConfig>,
}

fn default_weight_type() -> String {
    "maximum".to_string()
}

fn default_solved_by() -> String {
    "nonlinear_solver".to_string()
}

fn default_guess() -> f64 {
    1_500.0
}

fn default_reference() -> f64 {
    1.0
}

fn default_unit() -> String {
    "-".to_string()
}

fn default_kind() -> String {
    ProblemKind::SingleObjective.as_str().to_string()
}

impl Default for ProblemConfig {
    fn default() -> Self {
        Self {
            weight_type: default_weight_type(),
            solved_by: default_solved_by(),
            initial_guess_kg: default_guess(),
            gross_battery_density_wh_kg: None,
            closure: ClosureConfig::default(),
            optimization: None,
            sweep: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ClosureConfig {
    #[serde(default)]
    pub tolerance_kg2: Option<f64>,
    #[serde(default)]
    pub max_iterations: Option<usize>,
    /// `[lower, upper]` takeoff weight search interval (kg).
    #[serde(default)]
    pub bounds_kg: Option<[f64; 2]>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ObjectiveConfig {
    pub name: String,
    #[serde(default = "default_reference")]
    pub reference: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VariableConfig {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    pub initial: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConstraintConfig {
    pub name: String,
    #[serde(default)]
    pub lower: Option<f64>,
    #[serde(default)]
    pub upper: Option<f64>,
    #[serde(default)]
    pub equals: Option<f64>,
    #[serde(default = "default_reference")]
    pub reference: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OptimizationConfig {
    #[serde(default = "default_kind")]
    pub kind: String,
    pub objective: ObjectiveConfig,
    #[serde(default)]
    pub design_variables: Vec<VariableConfig>,
    #[serde(default)]
    pub constraints: Vec<ConstraintConfig>,
    /// One multi-point evaluation point per battery density (Wh/kg).
    #[serde(default)]
    pub point_battery_densities_wh_kg: Vec<f64>,
    #[serde(default)]
    pub on_design_density_wh_kg: Option<f64>,
    #[serde(default)]
    pub off_design_density_wh_kg: Option<f64>,
    /// Put an unprefixed off-design objective on the off-design point.
    #[serde(default)]
    pub objective_on_off_design: bool,
    #[serde(default)]
    pub max_outer_iterations: Option<usize>,
    #[serde(default)]
    pub feasibility_tolerance: Option<f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SweepConfig {
    pub ranges_km: Vec<f64>,
    #[serde(default)]
    pub cruise_speeds_m_s: Vec<f64>,
    #[serde(default)]
    pub cruise_speeds_km_h: Vec<f64>,
    pub battery_densities_wh_kg: Vec<f64>,
}

impl ProblemConfig {
    pub fn weight_type(&self) -> Result<WeightType, ConfigError> {
        Ok(self.weight_type.parse()?)
    }

    pub fn solved_by(&self) -> Result<SolvedBy, ConfigError> {
        Ok(self.solved_by.parse()?)
    }

    pub fn closure_options(&self) -> ClosureOptions {
        let mut options = ClosureOptions::default();
        if let Some(tolerance) = self.closure.tolerance_kg2 {
            options.tolerance_kg2 = tolerance;
        }
        if let Some(max_iterations) = self.closure.max_iterations {
            options.max_iterations = max_iterations;
        }
        if let Some([lower, upper]) = self.closure.bounds_kg {
            options.bounds_kg = (lower, upper);
        }
        options
    }
}

impl ConstraintConfig {
    fn to_constraint(&self) -> Result<Constraint, ConfigError> {
        let unit = parse_unit(&self.name, &self.unit)?;
        let (lower, upper) = match self.equals {
            Some(target) if self.lower.is_none() && self.upper.is_none() => {
                (Some(target), Some(target))
            }
            Some(_) => {
                return Err(ConfigError::InvalidProblem(format!(
                    "constraint `{}` mixes `equals` with bounds",
                    self.name
                )));
            }
            None => (self.lower, self.upper),
        };
        Ok(Constraint::new(&self.name, lower, upper, self.reference, unit))
    }
}

impl OptimizationConfig {
    pub fn kind(&self) -> Result<ProblemKind, ConfigError> {
        self.kind.parse().map_err(ConfigError::InvalidProblem)
    }

    /// Assemble the optimization problem for a vehicle, mission and fidelity.
    /// `sized` is the airframe a gross-takeoff problem flies.
    pub fn design_problem(
        &self,
        vehicle: Vehicle,
        mission: Mission,
        fidelity: Fidelity,
        sized: Option<SizingResult>,
    ) -> Result<DesignProblem, ConfigError> {
        let kind = self.kind()?;
        let objective_unit = parse_unit(&self.objective.name, &self.objective.unit)?;
        let mut problem = DesignProblem::new(vehicle, mission, fidelity).kind(kind).objective(
            &self.objective.name,
            self.objective.reference,
            objective_unit,
        );

        for variable in &self.design_variables {
            let unit = parse_unit(&variable.name, &variable.unit)?;
            problem = problem.design_variable(
                &variable.name,
                variable.lower,
                variable.upper,
                variable.initial,
                unit,
            );
        }
        for constraint in &self.constraints {
            problem = problem.constraint(constraint.to_constraint()?);
        }

        match kind {
            ProblemKind::MultiPoint | ProblemKind::MultiPointWithFixedEmptyWeight => {
                if self.point_battery_densities_wh_kg.is_empty() {
                    return Err(ConfigError::InvalidProblem(format!(
                        "{kind} needs point_battery_densities_wh_kg"
                    )));
                }
                problem = problem.multipoint_options(MultiPointOptions::battery_densities(
                    &self.point_battery_densities_wh_kg,
                ));
            }
            ProblemKind::OffDesign => {
                let (Some(on), Some(off)) =
                    (self.on_design_density_wh_kg, self.off_design_density_wh_kg)
                else {
                    return Err(ConfigError::InvalidProblem(
                        "off_design needs on_design_density_wh_kg and off_design_density_wh_kg"
                            .to_string(),
                    ));
                };
                let point = if self.objective_on_off_design {
                    OffDesignPoint::OffDesign
                } else {
                    OffDesignPoint::OnDesign
                };
                problem = problem
                    .offdesign_options(OffDesignOptions::battery_densities(on, off).objective_on(point));
            }
            ProblemKind::SingleObjective | ProblemKind::GrossTakeoff => {}
        }
        if let Some(sized) = sized {
            problem = problem.sized_airframe(sized);
        }

        let mut optimizer = problem.optimizer;
        if let Some(iterations) = self.max_outer_iterations {
            optimizer.max_outer_iterations = iterations;
        }
        if let Some(tolerance) = self.feasibility_tolerance {
            optimizer.feasibility_tolerance = tolerance;
        }
        Ok(problem.optimizer_options(optimizer))
    }
}

impl SweepConfig {
    pub fn grid(&self) -> Result<SweepGrid, ConfigError> {
        let cruise_speeds_m_s = match (
            self.cruise_speeds_m_s.is_empty(),
            self.cruise_speeds_km_h.is_empty(),
        ) {
            (false, true) => self.cruise_speeds_m_s.clone(),
            (true, false) => self.cruise_speeds_km_h.iter().map(|&v| kmh_to_ms(v)).collect(),
            _ => {
                return Err(ConfigError::InvalidProblem(
                    "sweep needs exactly one of cruise_speeds_m_s and cruise_speeds_km_h"
                        .to_string(),
                ));
            }
        };
        Ok(SweepGrid {
            ranges_km: self.ranges_km.clone(),
            cruise_speeds_m_s,
            battery_densities_wh_kg: self.battery_densities_wh_kg.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evtol_mission::StandardProfile;
    use evtol_weight::WeightError;

    #[test]
    fn defaults_size_with_newton() {
        let config: ProblemConfig = toml::from_str("").expect("empty manifest parses");
        assert_eq!(config.weight_type().expect("valid"), WeightType::Maximum);
        assert_eq!(config.solved_by().expect("valid"), SolvedBy::NonlinearSolver);
        assert_eq!(config.closure_options(), ClosureOptions::default());
    }

    #[test]
    fn unknown_selectors_are_configuration_errors() {
        let config: ProblemConfig = toml::from_str(
            r#"
weight_type = "empty"
solved_by = "genetic"
"#,
        )
        .expect("manifest parses");
        assert!(matches!(
            config.weight_type(),
            Err(ConfigError::Weight(WeightError::UnknownWeightType(_)))
        ));
        assert!(matches!(
            config.solved_by(),
            Err(ConfigError::Weight(WeightError::UnknownSolvedBy(_)))
        ));
    }

    #[test]
    fn optimization_section_builds_problem() {
        let config: ProblemConfig = toml::from_str(
            r#"
[optimization]
kind = "multi_point"
point_battery_densities_wh_kg = [250.0, 400.0]
objective = { name = "Weight|takeoff", reference = 1000.0, unit = "kg" }

[[optimization.design_variables]]
name = "LiftRotor|radius"
lower = 0.8
upper = 2.5
initial = 1.5
unit = "m"

[[optimization.constraints]]
name = "LiftRotor|clearance"
lower = 1.0
"#,
        )
        .expect("manifest parses");
        let vehicle = Vehicle::reference_multirotor();
        let fidelity = Fidelity::baseline(vehicle.configuration);
        let mission =
            Mission::standard(&StandardProfile::new(50.0, 60.0)).expect("valid mission");
        let problem = config
            .optimization
            .as_ref()
            .expect("optimization section")
            .design_problem(vehicle, mission, fidelity, None)
            .expect("valid problem");
        assert_eq!(problem.kind, ProblemKind::MultiPoint);
        assert_eq!(problem.design_variables.len(), 1);
        assert_eq!(
            problem.multipoint_options.as_ref().map(|o| o.points.len()),
            Some(2)
        );
    }

    #[test]
    fn sweep_grid_converts_speeds() {
        let config: SweepConfig = toml::from_str(
            r#"
ranges_km = [50.0, 100.0]
cruise_speeds_km_h = [180.0]
battery_densities_wh_kg = [250.0]
"#,
        )
        .expect("manifest parses");
        let grid = config.grid().expect("valid grid");
        assert_eq!(grid.len(), 2);
        assert!((grid.cruise_speeds_m_s[0] - 50.0).abs() < 1e-9);
    }
}
