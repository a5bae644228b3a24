//! A vehicle, mission and fidelity loaded from manifests, with the runs they support.

use std::path::Path;

use evtol_config::{
    ConfigError, FidelityConfig, MissionConfig, ProblemConfig, VehicleConfig, load_fidelity,
    load_mission, load_problem, load_vehicle,
};
use evtol_design::{
    DesignError, DesignProblem, OptimizationResult, ProblemKind, SweepGrid, SweepMode, SweepRow,
    SweepSetup, run_sweep,
};
use evtol_mission::{Mission, StandardProfile};
use evtol_vehicle::{PointOverride, Vehicle};
use evtol_weight::{Fidelity, SizingResult, WeightAnalysis, WeightError, WeightType};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum StudyError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Weight(#[from] WeightError),
    #[error(transparent)]
    Design(#[from] DesignError),
    #[error("problem manifest has no `{0}` section")]
    MissingSection(&'static str),
    #[error("sweeps need a mission described by a standard profile")]
    NotStandardMission,
}

/// Everything one sizing study needs, validated.
#[derive(Debug, Clone)]
pub struct Study {
    pub vehicle: Vehicle,
    pub mission: Mission,
    pub fidelity: Fidelity,
    /// Template for sweeps; present when the mission is a standard profile.
    pub profile: Option<StandardProfile>,
    pub problem: ProblemConfig,
}

impl Study {
    /// Load the manifests. Without a problem manifest, the defaults apply
    /// (maximum takeoff weight, Newton closure).
    pub fn load(
        vehicle: &Path,
        mission: &Path,
        fidelity: &Path,
        problem: Option<&Path>,
    ) -> Result<Self, StudyError> {
        let problem = match problem {
            Some(path) => load_problem(path)?,
            None => ProblemConfig::default(),
        };
        Self::from_configs(
            load_vehicle(vehicle)?,
            &load_mission(mission)?,
            &load_fidelity(fidelity)?,
            problem,
        )
    }

    pub fn from_configs(
        vehicle: VehicleConfig,
        mission: &MissionConfig,
        fidelity: &FidelityConfig,
        problem: ProblemConfig,
    ) -> Result<Self, StudyError> {
        let vehicle = Vehicle::try_from(vehicle)?;
        let fidelity = fidelity.to_fidelity(vehicle.configuration)?;
        let profile = mission.standard_profile().transpose()?;
        let mission = mission.to_mission()?;
        problem.weight_type()?;
        problem.solved_by()?;
        Ok(Self {
            vehicle,
            mission,
            fidelity,
            profile,
            problem,
        })
    }

    fn size_maximum(&self) -> Result<SizingResult, StudyError> {
        let result = WeightAnalysis::new(
            self.vehicle.clone(),
            self.mission.clone(),
            self.fidelity,
            WeightType::Maximum,
            self.problem.solved_by()?,
        )?
        .with_options(self.problem.closure_options())
        .evaluate(self.problem.initial_guess_kg)?;
        Ok(result)
    }

    /// Close the weight. A gross study sizes the airframe first, then flies
    /// it with the gross battery density.
    pub fn size(&self) -> Result<SizingResult, StudyError> {
        let sized = self.size_maximum()?;
        let result = match self.problem.weight_type()? {
            WeightType::Maximum => sized,
            WeightType::Gross => {
                let vehicle = match self.problem.gross_battery_density_wh_kg {
                    Some(density) => self
                        .vehicle
                        .with_override(&PointOverride::battery_density(density)),
                    None => self.vehicle.clone(),
                };
                WeightAnalysis::gross(
                    vehicle,
                    self.mission.clone(),
                    self.fidelity,
                    self.problem.solved_by()?,
                    &sized,
                )?
                .with_options(self.problem.closure_options())
                .evaluate(sized.takeoff_weight_kg())?
            }
        };
        info!(
            vehicle = %self.vehicle.name,
            weight_type = %result.weight_type,
            takeoff_kg = result.takeoff_weight_kg(),
            converged = result.converged,
            "sizing finished"
        );
        Ok(result)
    }

    fn design_problem(&self) -> Result<DesignProblem, StudyError> {
        let optimization = self
            .problem
            .optimization
            .as_ref()
            .ok_or(StudyError::MissingSection("optimization"))?;
        let sized = match optimization.kind()? {
            ProblemKind::GrossTakeoff => Some(self.size_maximum()?),
            _ => None,
        };
        let problem = optimization
            .design_problem(
                self.vehicle.clone(),
                self.mission.clone(),
                self.fidelity,
                sized,
            )?
            .closure_guess(self.problem.initial_guess_kg);
        Ok(problem)
    }

    /// Run the `[optimization]` section of the problem manifest.
    pub fn optimize(&self) -> Result<OptimizationResult, StudyError> {
        Ok(self.design_problem()?.run_optimization()?)
    }

    pub fn sweep_grid(&self) -> Result<SweepGrid, StudyError> {
        let sweep = self
            .problem
            .sweep
            .as_ref()
            .ok_or(StudyError::MissingSection("sweep"))?;
        Ok(sweep.grid()?)
    }

    /// Run the `[sweep]` grid, sizing at each point, or optimizing when
    /// `optimize` is set.
    pub fn sweep(&self, optimize: bool) -> Result<Vec<SweepRow>, StudyError> {
        let grid = self.sweep_grid()?;
        let profile = self.profile.clone().ok_or(StudyError::NotStandardMission)?;
        let mode = if optimize {
            SweepMode::Optimization(Box::new(self.design_problem()?))
        } else {
            SweepMode::Sizing(self.problem.solved_by()?)
        };
        let setup = SweepSetup {
            vehicle: self.vehicle.clone(),
            fidelity: self.fidelity,
            profile,
            mode,
            closure: self.problem.closure_options(),
            default_guess_kg: self.problem.initial_guess_kg,
        };
        Ok(run_sweep(&setup, &grid))
    }
}
