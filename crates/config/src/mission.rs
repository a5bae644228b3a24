use evtol_core::units::kmh_to_ms;
use evtol_mission::{Mission, SegmentDef, SegmentSpec, StandardProfile};
use serde::Deserialize;

use crate::ConfigError;

/// Mission manifest: either a `[standard]` profile or an explicit `[[segments]]` list.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct MissionConfig {
    #[serde(default)]
    pub takeoff_altitude_m: f64,
    #[serde(default)]
    pub standard: Option<StandardMissionConfig>,
    #[serde(default)]
    pub segments: Vec<SegmentConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StandardMissionConfig {
    pub range_km: f64,
    #[serde(default)]
    pub cruise_speed_m_s: Option<f64>,
    #[serde(default)]
    pub cruise_speed_km_h: Option<f64>,
    #[serde(default)]
    pub reserve_minutes: Option<f64>,
    #[serde(default)]
    pub cruise_aoa_deg: Option<f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SegmentConfig {
    pub name: String,
    #[serde(flatten)]
    pub kind: SegmentKindConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentKindConfig {
    HoverStay {
        duration_s: f64,
    },
    HoverClimb {
        speed_m_s: f64,
        altitude_change_m: f64,
    },
    Climb {
        vertical_speed_m_s: f64,
        horizontal_speed_m_s: f64,
        altitude_change_m: f64,
    },
    Cruise {
        speed_m_s: f64,
        distance_m: f64,
        #[serde(default)]
        aoa_deg: Option<f64>,
    },
    Descent {
        vertical_speed_m_s: f64,
        horizontal_speed_m_s: f64,
        altitude_change_m: f64,
    },
    HoverDescent {
        speed_m_s: f64,
        altitude_change_m: f64,
    },
    ConstantPower {
        duration_s: f64,
        power_fraction: f64,
    },
    NoCreditClimb {
        distance_m: f64,
        altitude_change_m: f64,
    },
    NoCreditDescent {
        distance_m: f64,
        altitude_change_m: f64,
    },
    ReserveCruise {
        duration_s: f64,
    },
}

impl From<SegmentKindConfig> for SegmentSpec {
    fn from(value: SegmentKindConfig) -> Self {
        use SegmentKindConfig as K;
        match value {
            K::HoverStay { duration_s } => SegmentSpec::HoverStay { duration_s },
            K::HoverClimb {
                speed_m_s,
                altitude_change_m,
            } => SegmentSpec::HoverClimb {
                speed_m_s,
                altitude_change_m,
            },
            K::Climb {
                vertical_speed_m_s,
                horizontal_speed_m_s,
                altitude_change_m,
            } => SegmentSpec::Climb {
                vertical_speed_m_s,
                horizontal_speed_m_s,
                altitude_change_m,
            },
            K::Cruise {
                speed_m_s,
                distance_m,
                aoa_deg,
            } => SegmentSpec::Cruise {
                speed_m_s,
                distance_m,
                aoa_deg,
            },
            K::Descent {
                vertical_speed_m_s,
                horizontal_speed_m_s,
                altitude_change_m,
            } => SegmentSpec::Descent {
                vertical_speed_m_s,
                horizontal_speed_m_s,
                altitude_change_m,
            },
            K::HoverDescent {
                speed_m_s,
                altitude_change_m,
            } => SegmentSpec::HoverDescent {
                speed_m_s,
                altitude_change_m,
            },
            K::ConstantPower {
                duration_s,
                power_fraction,
            } => SegmentSpec::ConstantPower {
                duration_s,
                power_fraction,
            },
            K::NoCreditClimb {
                distance_m,
                altitude_change_m,
            } => SegmentSpec::NoCreditClimb {
                distance_m,
                altitude_change_m,
            },
            K::NoCreditDescent {
                distance_m,
                altitude_change_m,
            } => SegmentSpec::NoCreditDescent {
                distance_m,
                altitude_change_m,
            },
            K::ReserveCruise { duration_s } => SegmentSpec::ReserveCruise { duration_s },
        }
    }
}

impl StandardMissionConfig {
    fn cruise_speed_m_s(&self) -> Result<f64, ConfigError> {
        match (self.cruise_speed_m_s, self.cruise_speed_km_h) {
            (Some(speed), None) => Ok(speed),
            (None, Some(speed)) => Ok(kmh_to_ms(speed)),
            _ => Err(ConfigError::InvalidMission(
                "standard profile needs exactly one of cruise_speed_m_s and cruise_speed_km_h",
            )),
        }
    }

    pub fn profile(&self, takeoff_altitude_m: f64) -> Result<StandardProfile, ConfigError> {
        let mut profile = StandardProfile::new(self.range_km, self.cruise_speed_m_s()?)
            .with_takeoff_altitude(takeoff_altitude_m);
        if let Some(minutes) = self.reserve_minutes {
            profile = profile.with_reserve_minutes(minutes);
        }
        profile.cruise_aoa_deg = self.cruise_aoa_deg;
        Ok(profile)
    }
}

impl MissionConfig {
    /// The standard profile template, when the mission is described by one.
    pub fn standard_profile(&self) -> Option<Result<StandardProfile, ConfigError>> {
        self.standard
            .as_ref()
            .map(|standard| standard.profile(self.takeoff_altitude_m))
    }

    pub fn to_mission(&self) -> Result<Mission, ConfigError> {
        match (&self.standard, self.segments.is_empty()) {
            (Some(standard), true) => {
                Ok(Mission::standard(&standard.profile(self.takeoff_altitude_m)?)?)
            }
            (None, false) => {
                let defs = self
                    .segments
                    .iter()
                    .map(|segment| SegmentDef::new(&segment.name, segment.kind.clone().into()))
                    .collect();
                Ok(Mission::new(defs, self.takeoff_altitude_m)?)
            }
            (Some(_), false) => Err(ConfigError::InvalidMission(
                "give either a standard profile or a segment list, not both",
            )),
            (None, true) => Err(ConfigError::InvalidMission(
                "mission needs a standard profile or a segment list",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evtol_mission::{MissionError, SegmentKind};

    #[test]
    fn standard_profile_accepts_km_per_hour() {
        let config: MissionConfig = toml::from_str(
            r#"
[standard]
range_km = 100.0
cruise_speed_km_h = 241.4
"#,
        )
        .expect("manifest parses");
        let mission = config.to_mission().expect("valid mission");
        assert!((mission.cruise_segment().speed_m_s - 67.055).abs() < 1e-2);
    }

    #[test]
    fn explicit_segments_keep_order() {
        let config: MissionConfig = serde_yaml::from_str(
            r#"
segments:
  - name: lift
    kind: hover_climb
    speed_m_s: 2.5
    altitude_change_m: 15.0
  - name: cruise
    kind: cruise
    speed_m_s: 60.0
    distance_m: 40000.0
  - name: land
    kind: hover_descent
    speed_m_s: 2.5
    altitude_change_m: 15.0
"#,
        )
        .expect("manifest parses");
        let mission = config.to_mission().expect("valid mission");
        let kinds: Vec<_> = mission.segments().iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            [
                SegmentKind::HoverClimbConstantSpeed,
                SegmentKind::CruiseConstantSpeed,
                SegmentKind::HoverDescentConstantSpeed
            ]
        );
    }

    #[test]
    fn reserve_and_constant_power_only_is_rejected() {
        let config: MissionConfig = toml::from_str(
            r#"
[[segments]]
name = "reserve"
kind = "reserve_cruise"
duration_s = 1200.0

[[segments]]
name = "taxi"
kind = "constant_power"
duration_s = 30.0
power_fraction = 0.1
"#,
        )
        .expect("manifest parses");
        assert!(matches!(
            config.to_mission(),
            Err(ConfigError::Mission(MissionError::NoSizingSegment))
        ));
    }

    #[test]
    fn empty_manifest_is_rejected() {
        assert!(matches!(
            MissionConfig::default().to_mission(),
            Err(ConfigError::InvalidMission(_))
        ));
    }
}
