//! Physics-model selection for one analysis.

use evtol_aero::ParasiteDragModel;
use evtol_power::{HoverModel, PowerSettings};
use evtol_vehicle::{Configuration, TailSizing};
use serde::Serialize;

use crate::WeightError;
use crate::regressions::{RotorWeightModel, StructureModel};

/// Model variant per physical sub-domain. Validated once when an analysis
/// is constructed and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fidelity {
    pub parasite: ParasiteDragModel,
    pub hover: HoverModel,
    pub structure: StructureModel,
    pub rotor_weight: RotorWeightModel,
    /// Tail sizing rule; required for lift+cruise vehicles.
    pub stability: Option<TailSizing>,
}

impl Fidelity {
    /// Momentum-theory hover, weight-regression drag, Roskam structure.
    pub fn baseline(configuration: Configuration) -> Self {
        Self {
            parasite: ParasiteDragModel::weight_based_for(configuration),
            hover: HoverModel::MomentumTheory,
            structure: StructureModel::Roskam,
            rotor_weight: RotorWeightModel::ThrustBased,
            stability: match configuration {
                Configuration::Multirotor => None,
                Configuration::LiftPlusCruise => Some(TailSizing::Given),
            },
        }
    }

    pub fn with_hover(mut self, hover: HoverModel) -> Self {
        self.hover = hover;
        self
    }

    pub fn with_parasite(mut self, parasite: ParasiteDragModel) -> Self {
        self.parasite = parasite;
        self
    }

    pub fn with_structure(mut self, structure: StructureModel) -> Self {
        self.structure = structure;
        self
    }

    /// Check that the selected variants make sense for `configuration`.
    pub fn validate(&self, configuration: Configuration) -> Result<(), WeightError> {
        if configuration == Configuration::LiftPlusCruise && self.stability.is_none() {
            return Err(WeightError::MissingFidelityKey {
                key: "stability",
                configuration,
            });
        }
        if configuration == Configuration::Multirotor
            && self.parasite == ParasiteDragModel::BacchiniExperimentalFixedValueForLPC
        {
            return Err(WeightError::IncompatibleFidelity {
                key: "aerodynamics.parasite",
                value: self.parasite.name(),
                configuration,
            });
        }
        Ok(())
    }

    pub fn power_settings(&self) -> PowerSettings {
        PowerSettings::new(self.hover, self.parasite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lift_plus_cruise_requires_stability() {
        let mut fidelity = Fidelity::baseline(Configuration::LiftPlusCruise);
        assert!(fidelity.validate(Configuration::LiftPlusCruise).is_ok());
        fidelity.stability = None;
        assert!(matches!(
            fidelity.validate(Configuration::LiftPlusCruise),
            Err(WeightError::MissingFidelityKey { key: "stability", .. })
        ));
    }

    #[test]
    fn bacchini_drag_rejected_for_multirotor() {
        let fidelity = Fidelity::baseline(Configuration::Multirotor)
            .with_parasite(ParasiteDragModel::BacchiniExperimentalFixedValueForLPC);
        assert!(fidelity.validate(Configuration::Multirotor).is_err());
    }
}
