//! Named design variables and how they act on a vehicle and mission.

use evtol_core::units::{Unit, convert};
use evtol_mission::Mission;
use evtol_vehicle::{Configuration, Vehicle};
use serde::Serialize;

use crate::DesignError;

/// Quantity an optimizer may own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DesignParameter {
    TakeoffWeight,
    LiftRotorRadius,
    PropellerRadius,
    WingArea,
    WingAspectRatio,
    LiftRotorCruiseRpm,
    PropellerCruiseRpm,
    CruiseSpeed,
    CruiseAoa,
    LiftRotorGlobalTwist,
}

impl DesignParameter {
    pub const ALL: [DesignParameter; 10] = [
        DesignParameter::TakeoffWeight,
        DesignParameter::LiftRotorRadius,
        DesignParameter::PropellerRadius,
        DesignParameter::WingArea,
        DesignParameter::WingAspectRatio,
        DesignParameter::LiftRotorCruiseRpm,
        DesignParameter::PropellerCruiseRpm,
        DesignParameter::CruiseSpeed,
        DesignParameter::CruiseAoa,
        DesignParameter::LiftRotorGlobalTwist,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DesignParameter::TakeoffWeight => "Weight|takeoff",
            DesignParameter::LiftRotorRadius => "LiftRotor|radius",
            DesignParameter::PropellerRadius => "Propeller|radius",
            DesignParameter::WingArea => "Wing|area",
            DesignParameter::WingAspectRatio => "Wing|aspect_ratio",
            DesignParameter::LiftRotorCruiseRpm => "LiftRotor|Cruise|RPM",
            DesignParameter::PropellerCruiseRpm => "Propeller|Cruise|RPM",
            DesignParameter::CruiseSpeed => "Mission|cruise_speed",
            DesignParameter::CruiseAoa => "Wing|Cruise|AoA",
            DesignParameter::LiftRotorGlobalTwist => "LiftRotor|global_twist",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, DesignError> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == name.trim())
            .ok_or_else(|| DesignError::UnknownVariable(name.to_string()))
    }

    /// Unit the vehicle and mission models take this parameter in.
    pub fn model_unit(self) -> Unit {
        match self {
            DesignParameter::TakeoffWeight => Unit::Kilogram,
            DesignParameter::LiftRotorRadius | DesignParameter::PropellerRadius => Unit::Metre,
            DesignParameter::WingArea => Unit::SquareMetre,
            DesignParameter::WingAspectRatio => Unit::Dimensionless,
            DesignParameter::LiftRotorCruiseRpm | DesignParameter::PropellerCruiseRpm => Unit::Rpm,
            DesignParameter::CruiseSpeed => Unit::MetrePerSecond,
            DesignParameter::CruiseAoa | DesignParameter::LiftRotorGlobalTwist => Unit::Degree,
        }
    }

    /// Whether the vehicle topology has the component this parameter acts on.
    pub fn applies_to(self, configuration: Configuration) -> bool {
        match self {
            DesignParameter::PropellerRadius
            | DesignParameter::PropellerCruiseRpm
            | DesignParameter::WingArea
            | DesignParameter::WingAspectRatio
            | DesignParameter::CruiseAoa => configuration == Configuration::LiftPlusCruise,
            _ => true,
        }
    }

    /// Write `value` (in [`Self::model_unit`]) into the vehicle or mission.
    ///
    /// Takeoff weight is not a geometric parameter and leaves both untouched.
    pub(crate) fn apply(
        self,
        value: f64,
        vehicle: &mut Vehicle,
        mission: &mut Mission,
    ) -> Result<(), DesignError> {
        match self {
            DesignParameter::TakeoffWeight => {}
            DesignParameter::LiftRotorRadius => vehicle.lift_rotor.radius_m = value,
            DesignParameter::PropellerRadius => {
                if let Some(propeller) = vehicle.propeller.as_mut() {
                    propeller.radius_m = value;
                }
            }
            DesignParameter::WingArea => {
                if let Some(wing) = vehicle.wing.as_mut() {
                    wing.area_m2 = value;
                }
            }
            DesignParameter::WingAspectRatio => {
                if let Some(wing) = vehicle.wing.as_mut() {
                    wing.aspect_ratio = value;
                }
            }
            DesignParameter::LiftRotorCruiseRpm => vehicle.lift_rotor.rpm.cruise = value,
            DesignParameter::PropellerCruiseRpm => {
                if let Some(propeller) = vehicle.propeller.as_mut() {
                    propeller.rpm.cruise = value;
                }
            }
            DesignParameter::CruiseSpeed => *mission = mission.with_cruise_speed(value)?,
            DesignParameter::CruiseAoa => *mission = mission.with_cruise_aoa(value)?,
            DesignParameter::LiftRotorGlobalTwist => vehicle.lift_rotor.global_twist_deg = value,
        }
        Ok(())
    }
}

/// Bounded design variable, expressed in the caller's unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignVariable {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    pub initial: f64,
    pub unit: Unit,
}

impl DesignVariable {
    pub fn new(name: impl Into<String>, lower: f64, upper: f64, initial: f64, unit: Unit) -> Self {
        Self {
            name: name.into(),
            lower,
            upper,
            initial,
            unit,
        }
    }

    /// Check the name, unit and bounds against the vehicle topology.
    pub(crate) fn resolve(
        &self,
        configuration: Configuration,
    ) -> Result<DesignParameter, DesignError> {
        let parameter = DesignParameter::from_name(&self.name)?;
        if !parameter.applies_to(configuration) {
            return Err(DesignError::VariableNotApplicable {
                name: self.name.clone(),
                configuration,
            });
        }
        convert(1.0, self.unit, parameter.model_unit()).map_err(|source| DesignError::Unit {
            name: self.name.clone(),
            source,
        })?;
        let ordered = self.lower <= self.initial && self.initial <= self.upper;
        if !ordered || !self.lower.is_finite() || !self.upper.is_finite() {
            return Err(DesignError::InvalidVariable {
                name: self.name.clone(),
                lower: self.lower,
                upper: self.upper,
                initial: self.initial,
            });
        }
        Ok(parameter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evtol_mission::StandardProfile;

    #[test]
    fn names_round_trip() {
        for parameter in DesignParameter::ALL {
            assert_eq!(DesignParameter::from_name(parameter.name()).unwrap(), parameter);
        }
        assert!(DesignParameter::from_name("Wing|span").is_err());
    }

    #[test]
    fn wing_variables_rejected_for_multirotor() {
        let variable = DesignVariable::new("Wing|area", 5.0, 20.0, 10.0, Unit::SquareMetre);
        assert!(matches!(
            variable.resolve(Configuration::Multirotor),
            Err(DesignError::VariableNotApplicable { .. })
        ));
        assert!(variable.resolve(Configuration::LiftPlusCruise).is_ok());
    }

    #[test]
    fn cruise_speed_rebuilds_mission() {
        let mut vehicle = Vehicle::reference_multirotor();
        let mut mission = Mission::standard(&StandardProfile::new(50.0, 50.0)).unwrap();
        let before = mission.cruise_segment().duration_s;
        DesignParameter::CruiseSpeed
            .apply(60.0, &mut vehicle, &mut mission)
            .unwrap();
        assert_eq!(mission.cruise_segment().speed_m_s, 60.0);
        assert!(mission.cruise_segment().duration_s < before);
    }
}
