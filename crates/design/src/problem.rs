//! Problem builder.

use std::fmt;
use std::str::FromStr;

use evtol_core::units::Unit;
use evtol_mission::Mission;
use evtol_solver::MinimizeOptions;
use evtol_vehicle::{PointOverride, Vehicle};
use evtol_weight::{ClosureOptions, Fidelity, SizingResult};
use serde::Serialize;

use crate::DesignError;
use crate::variables::DesignVariable;

/// Shape of the optimization problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProblemKind {
    /// One vehicle, one mission, maximum-takeoff closure.
    SingleObjective,
    /// Independent maximum-takeoff points sharing geometry variables.
    MultiPoint,
    /// First point sized at maximum takeoff; the rest fly its airframe.
    MultiPointWithFixedEmptyWeight,
    /// An on-design sizing point and an off-design gross point.
    OffDesign,
    /// One gross point on an airframe sized beforehand.
    GrossTakeoff,
}

impl ProblemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProblemKind::SingleObjective => "single_objective",
            ProblemKind::MultiPoint => "multi_point",
            ProblemKind::MultiPointWithFixedEmptyWeight => "multi_point_fixed_empty_weight",
            ProblemKind::OffDesign => "off_design",
            ProblemKind::GrossTakeoff => "gross_takeoff",
        }
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProblemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            ProblemKind::SingleObjective,
            ProblemKind::MultiPoint,
            ProblemKind::MultiPointWithFixedEmptyWeight,
            ProblemKind::OffDesign,
            ProblemKind::GrossTakeoff,
        ]
        .into_iter()
        .find(|kind| kind.as_str() == s.trim())
        .ok_or_else(|| format!("unknown problem kind `{s}`"))
    }
}

/// Output minimized by the optimizer, divided by `reference`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Objective {
    pub name: String,
    pub reference: f64,
    pub unit: Unit,
}

impl Objective {
    pub fn new(name: impl Into<String>, reference: f64, unit: Unit) -> Self {
        Self {
            name: name.into(),
            reference,
            unit,
        }
    }
}

/// Bounds on a named output, in `unit`, scaled by `reference` for the optimizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constraint {
    pub name: String,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub reference: f64,
    pub unit: Unit,
}

impl Constraint {
    pub fn new(
        name: impl Into<String>,
        lower: Option<f64>,
        upper: Option<f64>,
        reference: f64,
        unit: Unit,
    ) -> Self {
        Self {
            name: name.into(),
            lower,
            upper,
            reference,
            unit,
        }
    }

    pub fn at_least(name: impl Into<String>, lower: f64, reference: f64, unit: Unit) -> Self {
        Self::new(name, Some(lower), None, reference, unit)
    }

    pub fn at_most(name: impl Into<String>, upper: f64, reference: f64, unit: Unit) -> Self {
        Self::new(name, None, Some(upper), reference, unit)
    }

    pub fn equal(name: impl Into<String>, target: f64, reference: f64, unit: Unit) -> Self {
        Self::new(name, Some(target), Some(target), reference, unit)
    }

    pub(crate) fn validate(&self) -> Result<(), DesignError> {
        let bounded = self.lower.is_some() || self.upper.is_some();
        if !bounded || !(self.reference > 0.0) {
            return Err(DesignError::InvalidConstraint(self.name.clone()));
        }
        Ok(())
    }
}

/// One point of a multi-point problem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationPoint {
    pub name: String,
    pub overrides: PointOverride,
    /// Weight of this point's metric in the objective.
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiPointOptions {
    pub points: Vec<EvaluationPoint>,
}

impl MultiPointOptions {
    /// Equally weighted points `Point_1..Point_N`, one per battery density.
    pub fn battery_densities(densities_wh_kg: &[f64]) -> Self {
        let weight = 1.0 / densities_wh_kg.len().max(1) as f64;
        Self {
            points: densities_wh_kg
                .iter()
                .enumerate()
                .map(|(i, &density)| EvaluationPoint {
                    name: format!("Point_{}", i + 1),
                    overrides: PointOverride::battery_density(density),
                    weight,
                })
                .collect(),
        }
    }
}

/// Point whose metric an unprefixed off-design objective refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OffDesignPoint {
    OnDesign,
    OffDesign,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OffDesignOptions {
    pub on_design: PointOverride,
    pub off_design: PointOverride,
    pub objective_point: OffDesignPoint,
}

impl OffDesignOptions {
    pub fn battery_densities(on_design_wh_kg: f64, off_design_wh_kg: f64) -> Self {
        Self {
            on_design: PointOverride::battery_density(on_design_wh_kg),
            off_design: PointOverride::battery_density(off_design_wh_kg),
            objective_point: OffDesignPoint::OnDesign,
        }
    }

    pub fn objective_on(mut self, point: OffDesignPoint) -> Self {
        self.objective_point = point;
        self
    }
}

/// Everything one optimization run needs. Built once, consumed by
/// [`DesignProblem::run_optimization`].
#[derive(Debug, Clone)]
pub struct DesignProblem {
    pub vehicle: Vehicle,
    pub mission: Mission,
    pub fidelity: Fidelity,
    pub kind: ProblemKind,
    pub objective: Objective,
    pub design_variables: Vec<DesignVariable>,
    pub constraints: Vec<Constraint>,
    pub multipoint_options: Option<MultiPointOptions>,
    pub offdesign_options: Option<OffDesignOptions>,
    /// Airframe a [`ProblemKind::GrossTakeoff`] problem flies.
    pub sized_airframe: Option<SizingResult>,
    pub optimizer: MinimizeOptions,
    /// Settings of the closure nested in each evaluation when takeoff
    /// weight is not a design variable.
    pub closure: ClosureOptions,
    /// Starting takeoff weight of nested closures (kg).
    pub closure_guess_kg: f64,
}

impl DesignProblem {
    /// Single-objective problem minimizing takeoff weight.
    pub fn new(vehicle: Vehicle, mission: Mission, fidelity: Fidelity) -> Self {
        Self {
            vehicle,
            mission,
            fidelity,
            kind: ProblemKind::SingleObjective,
            objective: Objective::new("Weight|takeoff", 1_000.0, Unit::Kilogram),
            design_variables: Vec::new(),
            constraints: Vec::new(),
            multipoint_options: None,
            offdesign_options: None,
            sized_airframe: None,
            optimizer: MinimizeOptions::default(),
            closure: ClosureOptions {
                tolerance_kg2: 1e-12,
                ..ClosureOptions::default()
            },
            closure_guess_kg: 1_500.0,
        }
    }

    pub fn kind(mut self, kind: ProblemKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn objective(mut self, name: impl Into<String>, reference: f64, unit: Unit) -> Self {
        self.objective = Objective::new(name, reference, unit);
        self
    }

    /// Add a design variable, replacing one of the same name.
    pub fn design_variable(
        mut self,
        name: impl Into<String>,
        lower: f64,
        upper: f64,
        initial: f64,
        unit: Unit,
    ) -> Self {
        let variable = DesignVariable::new(name, lower, upper, initial, unit);
        match self.design_variables.iter_mut().find(|v| v.name == variable.name) {
            Some(existing) => *existing = variable,
            None => self.design_variables.push(variable),
        }
        self
    }

    /// Add a constraint, replacing one of the same name.
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        match self.constraints.iter_mut().find(|c| c.name == constraint.name) {
            Some(existing) => *existing = constraint,
            None => self.constraints.push(constraint),
        }
        self
    }

    pub fn multipoint_options(mut self, options: MultiPointOptions) -> Self {
        self.multipoint_options = Some(options);
        self
    }

    pub fn offdesign_options(mut self, options: OffDesignOptions) -> Self {
        self.offdesign_options = Some(options);
        self
    }

    pub fn sized_airframe(mut self, sized: SizingResult) -> Self {
        self.sized_airframe = Some(sized);
        self
    }

    pub fn optimizer_options(mut self, options: MinimizeOptions) -> Self {
        self.optimizer = options;
        self
    }

    pub fn closure_guess(mut self, guess_kg: f64) -> Self {
        self.closure_guess_kg = guess_kg;
        self
    }

    /// Whether each point's takeoff weight is owned by the optimizer.
    pub fn weight_is_design_variable(&self) -> bool {
        self.design_variables
            .iter()
            .any(|v| v.name.trim() == "Weight|takeoff")
    }

    /// Initial value of a design variable, if present.
    pub fn initial_value(&self, name: &str) -> Option<f64> {
        self.design_variables
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.initial)
    }

    /// Move a design variable's starting point, clamped into its bounds.
    pub fn set_initial_value(&mut self, name: &str, value: f64) {
        if let Some(variable) = self.design_variables.iter_mut().find(|v| v.name == name) {
            variable.initial = value.clamp(variable.lower, variable.upper);
        }
    }
}
