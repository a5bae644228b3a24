use evtol_aero::ParasiteDragModel;
use evtol_power::{BemtSettings, HoverModel};
use evtol_vehicle::{Configuration, TailSizing};
use evtol_weight::{Fidelity, RotorWeightModel, StructureModel};
use serde::Deserialize;

use crate::ConfigError;

/// Fidelity manifest, keyed the way model choices are usually written down:
/// `aerodynamics.parasite`, `power_model.hover_climb`, `weight_model.structure`.
#[derive(Debug, Deserialize, Clone)]
pub struct FidelityConfig {
    pub aerodynamics: AerodynamicsConfig,
    pub power_model: PowerModelConfig,
    #[serde(default)]
    pub weight_model: WeightModelConfig,
    #[serde(default)]
    pub stability: Option<StabilityConfig>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ParasiteDragKind {
    WeightBasedRegression,
    ComponentBuildUp,
    BacchiniExperimentalFixedValueForLPC,
}

/// Induced drag of the wing. The parabolic polar is the only model.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum InducedDragKind {
    #[default]
    ParabolicDragPolar,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AerodynamicsConfig {
    pub parasite: ParasiteDragKind,
    /// Overrides the configuration's default weight-regression coefficient.
    #[serde(default)]
    pub parasite_coefficient: Option<f64>,
    #[serde(default)]
    pub induced: InducedDragKind,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum HoverModelKind {
    MomentumTheory,
    ModifiedMomentumTheory,
    BladeElementMomentumTheory,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BemtConfig {
    #[serde(default)]
    pub annuli: Option<usize>,
    #[serde(default)]
    pub min_rpm: Option<f64>,
    #[serde(default)]
    pub max_tip_mach: Option<f64>,
    #[serde(default)]
    pub thrust_tolerance: Option<f64>,
    #[serde(default)]
    pub max_iterations: Option<usize>,
}

impl From<&BemtConfig> for BemtSettings {
    fn from(value: &BemtConfig) -> Self {
        let defaults = BemtSettings::default();
        BemtSettings {
            annuli: value.annuli.unwrap_or(defaults.annuli),
            min_rpm: value.min_rpm.unwrap_or(defaults.min_rpm),
            max_tip_mach: value.max_tip_mach.unwrap_or(defaults.max_tip_mach),
            thrust_tolerance: value.thrust_tolerance.unwrap_or(defaults.thrust_tolerance),
            max_iterations: value.max_iterations.unwrap_or(defaults.max_iterations),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PowerModelConfig {
    pub hover_climb: HoverModelKind,
    #[serde(default)]
    pub bemt: BemtConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeightModelConfig {
    #[serde(default = "default_structure")]
    pub structure: StructureModel,
    #[serde(default = "default_rotor")]
    pub rotor: RotorWeightModel,
}

fn default_structure() -> StructureModel {
    StructureModel::Roskam
}

fn default_rotor() -> RotorWeightModel {
    RotorWeightModel::ThrustBased
}

impl Default for WeightModelConfig {
    fn default() -> Self {
        Self {
            structure: default_structure(),
            rotor: default_rotor(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(tag = "tail_sizing", rename_all = "snake_case")]
pub enum StabilityConfig {
    Given,
    VolumeCoefficient { horizontal: f64, vertical: f64 },
}

impl From<StabilityConfig> for TailSizing {
    fn from(value: StabilityConfig) -> Self {
        match value {
            StabilityConfig::Given => TailSizing::Given,
            StabilityConfig::VolumeCoefficient {
                horizontal,
                vertical,
            } => TailSizing::VolumeCoefficient {
                horizontal,
                vertical,
            },
        }
    }
}

impl FidelityConfig {
    /// Resolve the model variants for `configuration` without checking them.
    pub fn resolve(&self, configuration: Configuration) -> Fidelity {
        let parasite = match self.aerodynamics.parasite {
            ParasiteDragKind::WeightBasedRegression => match self.aerodynamics.parasite_coefficient
            {
                Some(coefficient) => ParasiteDragModel::WeightBasedRegression { coefficient },
                None => ParasiteDragModel::weight_based_for(configuration),
            },
            ParasiteDragKind::ComponentBuildUp => ParasiteDragModel::ComponentBuildUp,
            ParasiteDragKind::BacchiniExperimentalFixedValueForLPC => {
                ParasiteDragModel::BacchiniExperimentalFixedValueForLPC
            }
        };
        let hover = match self.power_model.hover_climb {
            HoverModelKind::MomentumTheory => HoverModel::MomentumTheory,
            HoverModelKind::ModifiedMomentumTheory => HoverModel::ModifiedMomentumTheory,
            HoverModelKind::BladeElementMomentumTheory => {
                HoverModel::BladeElementMomentumTheory((&self.power_model.bemt).into())
            }
        };
        Fidelity {
            parasite,
            hover,
            structure: self.weight_model.structure,
            rotor_weight: self.weight_model.rotor,
            stability: self.stability.map(TailSizing::from),
        }
    }

    /// Check the selection against `configuration`: lift+cruise vehicles need
    /// `stability`, and the fixed lift+cruise drag value is refused for a multirotor.
    pub fn validate(&self, configuration: Configuration) -> Result<(), ConfigError> {
        self.resolve(configuration).validate(configuration)?;
        Ok(())
    }

    /// Resolve and validate in one step.
    pub fn to_fidelity(&self, configuration: Configuration) -> Result<Fidelity, ConfigError> {
        let fidelity = self.resolve(configuration);
        fidelity.validate(configuration)?;
        Ok(fidelity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evtol_weight::WeightError;

    fn parse(manifest: &str) -> FidelityConfig {
        toml::from_str(manifest).expect("manifest parses")
    }

    #[test]
    fn nested_keys_resolve_to_models() {
        let config = parse(
            r#"
[aerodynamics]
parasite = "ComponentBuildUp"
induced = "ParabolicDragPolar"

[power_model]
hover_climb = "BladeElementMomentumTheory"
bemt = { annuli = 20 }

[weight_model]
structure = "M4"
rotor = "PowerBased"

[stability]
tail_sizing = "volume_coefficient"
horizontal = 0.6
vertical = 0.04
"#,
        );
        let fidelity = config
            .to_fidelity(Configuration::LiftPlusCruise)
            .expect("valid for lift+cruise");
        assert_eq!(fidelity.parasite, ParasiteDragModel::ComponentBuildUp);
        assert!(matches!(
            fidelity.hover,
            HoverModel::BladeElementMomentumTheory(BemtSettings { annuli: 20, .. })
        ));
        assert_eq!(fidelity.structure, StructureModel::M4);
        assert!(matches!(
            fidelity.stability,
            Some(TailSizing::VolumeCoefficient { .. })
        ));
    }

    #[test]
    fn lift_plus_cruise_without_stability_is_rejected() {
        let config = parse(
            r#"
[aerodynamics]
parasite = "WeightBasedRegression"

[power_model]
hover_climb = "MomentumTheory"
"#,
        );
        assert!(config.validate(Configuration::Multirotor).is_ok());
        assert!(matches!(
            config.validate(Configuration::LiftPlusCruise),
            Err(ConfigError::Weight(WeightError::MissingFidelityKey { .. }))
        ));
    }

    #[test]
    fn fixed_lift_plus_cruise_drag_is_rejected_for_multirotor() {
        let config = parse(
            r#"
[aerodynamics]
parasite = "BacchiniExperimentalFixedValueForLPC"

[power_model]
hover_climb = "MomentumTheory"
"#,
        );
        assert!(matches!(
            config.validate(Configuration::Multirotor),
            Err(ConfigError::Weight(WeightError::IncompatibleFidelity { .. }))
        ));
    }
}
