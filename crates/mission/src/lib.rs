//! Mission segment model: an ordered, immutable list of flight legs.
//!
//! Segments are described by a [`SegmentSpec`] (what the caller knows) and
//! resolved into a [`MissionSegment`] (what the power chain needs) once, when
//! the [`Mission`] is built. Design-variable updates rebuild the mission from
//! its specs rather than editing resolved segments in place.

use evtol_core::atmosphere::{Atmosphere, standard_atmosphere};
use serde::Serialize;
use thiserror::Error;

mod standard;

pub use standard::StandardProfile;

/// Fixed enumeration of segment kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SegmentKind {
    HoverStay,
    HoverClimbConstantSpeed,
    ClimbConstantVyConstantVx,
    CruiseConstantSpeed,
    DescentConstantVyConstantVx,
    HoverDescentConstantSpeed,
    ConstantPower,
    NoCreditClimb,
    NoCreditDescent,
    ReserveCruise,
}

impl SegmentKind {
    /// Vertical-flight segments flown on the lift rotors.
    pub fn is_hover(self) -> bool {
        matches!(
            self,
            SegmentKind::HoverStay
                | SegmentKind::HoverClimbConstantSpeed
                | SegmentKind::HoverDescentConstantSpeed
        )
    }

    /// Wing-borne / edgewise forward-flight segments that need a trim solution.
    pub fn is_forward_flight(self) -> bool {
        matches!(
            self,
            SegmentKind::ClimbConstantVyConstantVx
                | SegmentKind::CruiseConstantSpeed
                | SegmentKind::DescentConstantVyConstantVx
        )
    }

    /// Whether the segment's thrust and power enter the sizing envelope.
    pub fn contributes_to_sizing(self) -> bool {
        !matches!(
            self,
            SegmentKind::ConstantPower
                | SegmentKind::NoCreditClimb
                | SegmentKind::NoCreditDescent
                | SegmentKind::ReserveCruise
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            SegmentKind::HoverStay => "HoverStay",
            SegmentKind::HoverClimbConstantSpeed => "HoverClimb",
            SegmentKind::ClimbConstantVyConstantVx => "Climb",
            SegmentKind::CruiseConstantSpeed => "Cruise",
            SegmentKind::DescentConstantVyConstantVx => "Descent",
            SegmentKind::HoverDescentConstantSpeed => "HoverDescent",
            SegmentKind::ConstantPower => "ConstantPower",
            SegmentKind::NoCreditClimb => "NoCreditClimb",
            SegmentKind::NoCreditDescent => "NoCreditDescent",
            SegmentKind::ReserveCruise => "ReserveCruise",
        }
    }
}

/// Caller-facing description of one leg. Exactly one of distance/duration is
/// authoritative per variant; the other is derived on resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentSpec {
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

impl SegmentSpec {
    pub fn kind(&self) -> SegmentKind {
        match self {
            SegmentSpec::HoverStay { .. } => SegmentKind::HoverStay,
            SegmentSpec::HoverClimb { .. } => SegmentKind::HoverClimbConstantSpeed,
            SegmentSpec::Climb { .. } => SegmentKind::ClimbConstantVyConstantVx,
            SegmentSpec::Cruise { .. } => SegmentKind::CruiseConstantSpeed,
            SegmentSpec::Descent { .. } => SegmentKind::DescentConstantVyConstantVx,
            SegmentSpec::HoverDescent { .. } => SegmentKind::HoverDescentConstantSpeed,
            SegmentSpec::ConstantPower { .. } => SegmentKind::ConstantPower,
            SegmentSpec::NoCreditClimb { .. } => SegmentKind::NoCreditClimb,
            SegmentSpec::NoCreditDescent { .. } => SegmentKind::NoCreditDescent,
            SegmentSpec::ReserveCruise { .. } => SegmentKind::ReserveCruise,
        }
    }
}

/// Named segment definition as supplied to [`Mission::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentDef {
    pub name: String,
    pub spec: SegmentSpec,
}

impl SegmentDef {
    pub fn new(name: impl Into<String>, spec: SegmentSpec) -> Self {
        Self {
            name: name.into(),
            spec,
        }
    }
}

/// One resolved leg of flight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissionSegment {
    /// 1-based position in the mission.
    pub id: usize,
    pub name: String,
    pub kind: SegmentKind,
    /// Airspeed magnitude (m/s).
    pub speed_m_s: f64,
    pub horizontal_speed_m_s: f64,
    /// Signed vertical speed (m/s), positive up.
    pub vertical_speed_m_s: f64,
    /// Horizontal distance covered (m).
    pub distance_m: f64,
    /// Signed altitude change (m), positive up.
    pub altitude_change_m: f64,
    pub duration_s: f64,
    /// Flight path angle (rad), positive climbing; zero outside climb/descent.
    pub gamma_rad: f64,
    /// Prescribed wing angle of attack (rad); `None` lets trim choose it.
    pub aoa_rad: Option<f64>,
    /// Fraction of the sizing power drawn by a constant-power segment.
    pub power_fraction: Option<f64>,
    pub constants: Atmosphere,
}

/// Errors surfaced while building a mission.
#[derive(Debug, Error, PartialEq)]
pub enum MissionError {
    #[error("mission has no segments")]
    Empty,
    #[error(
        "mission has no segment that contributes to the sizing envelope (needs hover climb, climb, cruise, descent, or hover descent)"
    )]
    NoSizingSegment,
    #[error("mission must contain exactly one cruise segment, found {0}")]
    CruiseCount(usize),
    #[error("segment `{segment}`: `{field}` must be positive, got {value}")]
    NonPositive {
        segment: String,
        field: &'static str,
        value: f64,
    },
    #[error("segment `{segment}`: power fraction must lie in (0, 1], got {value}")]
    PowerFraction { segment: String, value: f64 },
    #[error("mission range {range_m} m is shorter than climb + descent distance {required_m} m")]
    RangeTooShort { range_m: f64, required_m: f64 },
}

/// Ordered, immutable mission.
#[derive(Debug, Clone, PartialEq)]
pub struct Mission {
    defs: Vec<SegmentDef>,
    segments: Vec<MissionSegment>,
    cruise_index: usize,
    takeoff_altitude_m: f64,
}

impl Mission {
    /// Resolve a list of segment definitions at the given takeoff altitude.
    ///
    /// Environmental constants are taken once from the standard atmosphere at
    /// the takeoff altitude and copied into every segment.
    pub fn new(defs: Vec<SegmentDef>, takeoff_altitude_m: f64) -> Result<Self, MissionError> {
        if defs.is_empty() {
            return Err(MissionError::Empty);
        }
        if !defs.iter().any(|d| d.spec.kind().contributes_to_sizing()) {
            return Err(MissionError::NoSizingSegment);
        }
        let cruise_positions: Vec<usize> = defs
            .iter()
            .enumerate()
            .filter(|(_, d)| d.spec.kind() == SegmentKind::CruiseConstantSpeed)
            .map(|(i, _)| i)
            .collect();
        if cruise_positions.len() != 1 {
            return Err(MissionError::CruiseCount(cruise_positions.len()));
        }
        let cruise_index = cruise_positions[0];
        let SegmentSpec::Cruise {
            speed_m_s: cruise_speed,
            ..
        } = defs[cruise_index].spec
        else {
            return Err(MissionError::CruiseCount(0));
        };
        positive(&defs[cruise_index].name, "speed_m_s", cruise_speed)?;

        let constants = standard_atmosphere(takeoff_altitude_m);
        let segments = defs
            .iter()
            .enumerate()
            .map(|(i, def)| resolve(i + 1, def, cruise_speed, constants))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            defs,
            segments,
            cruise_index,
            takeoff_altitude_m,
        })
    }

    /// Build the standard taxi / hover-climb / climb / cruise / descent /
    /// hover-descent / taxi / reserve profile.
    pub fn standard(profile: &StandardProfile) -> Result<Self, MissionError> {
        profile.build()
    }

    pub fn segments(&self) -> &[MissionSegment] {
        &self.segments
    }

    pub fn definitions(&self) -> &[SegmentDef] {
        &self.defs
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segment by 1-based id.
    pub fn segment(&self, id: usize) -> Option<&MissionSegment> {
        id.checked_sub(1).and_then(|i| self.segments.get(i))
    }

    /// The single design cruise segment.
    pub fn cruise_segment(&self) -> &MissionSegment {
        &self.segments[self.cruise_index]
    }

    pub fn takeoff_altitude_m(&self) -> f64 {
        self.takeoff_altitude_m
    }

    pub fn constants(&self) -> &Atmosphere {
        &self.segments[0].constants
    }

    /// Total flight time including reserve (s).
    pub fn total_time_s(&self) -> f64 {
        self.segments.iter().map(|s| s.duration_s).sum()
    }

    /// Flight time excluding reserve legs (s).
    pub fn block_time_s(&self) -> f64 {
        self.segments
            .iter()
            .filter(|s| s.kind != SegmentKind::ReserveCruise)
            .map(|s| s.duration_s)
            .sum()
    }

    /// Horizontal distance flown excluding reserve legs (m).
    pub fn range_m(&self) -> f64 {
        self.segments
            .iter()
            .filter(|s| s.kind != SegmentKind::ReserveCruise)
            .map(|s| s.distance_m)
            .sum()
    }

    /// Rebuild the mission with a new cruise speed; reserve and no-credit legs follow it.
    pub fn with_cruise_speed(&self, speed_m_s: f64) -> Result<Self, MissionError> {
        self.with_cruise(|speed, _| *speed = speed_m_s)
    }

    /// Rebuild the mission with a new cruise leg distance.
    pub fn with_cruise_distance(&self, distance_m: f64) -> Result<Self, MissionError> {
        self.with_cruise(|_, distance| *distance = distance_m)
    }

    /// Rebuild the mission with a prescribed cruise angle of attack.
    pub fn with_cruise_aoa(&self, aoa_deg: f64) -> Result<Self, MissionError> {
        let mut defs = self.defs.clone();
        if let SegmentSpec::Cruise { aoa_deg: aoa, .. } = &mut defs[self.cruise_index].spec {
            *aoa = Some(aoa_deg);
        }
        Self::new(defs, self.takeoff_altitude_m)
    }

    fn with_cruise(&self, edit: impl FnOnce(&mut f64, &mut f64)) -> Result<Self, MissionError> {
        let mut defs = self.defs.clone();
        if let SegmentSpec::Cruise {
            speed_m_s,
            distance_m,
            ..
        } = &mut defs[self.cruise_index].spec
        {
            edit(speed_m_s, distance_m);
        }
        Self::new(defs, self.takeoff_altitude_m)
    }

    /// Position/altitude/speed samples at segment boundaries, for plotting collaborators.
    pub fn timeline(&self) -> Vec<ProfileSample> {
        let mut samples = Vec::with_capacity(self.segments.len() + 1);
        let mut time = 0.0;
        let mut distance = 0.0;
        let mut altitude = 0.0;
        samples.push(ProfileSample {
            segment_id: 0,
            time_s: 0.0,
            distance_m: 0.0,
            altitude_m: 0.0,
            speed_m_s: 0.0,
        });
        for segment in &self.segments {
            time += segment.duration_s;
            distance += segment.distance_m;
            altitude += segment.altitude_change_m;
            samples.push(ProfileSample {
                segment_id: segment.id,
                time_s: time,
                distance_m: distance,
                altitude_m: altitude,
                speed_m_s: segment.speed_m_s,
            });
        }
        samples
    }
}

/// Boundary sample of the mission profile.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSample {
    pub segment_id: usize,
    pub time_s: f64,
    pub distance_m: f64,
    pub altitude_m: f64,
    pub speed_m_s: f64,
}

fn positive(segment: &str, field: &'static str, value: f64) -> Result<(), MissionError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(MissionError::NonPositive {
            segment: segment.to_string(),
            field,
            value,
        })
    }
}

fn resolve(
    id: usize,
    def: &SegmentDef,
    cruise_speed: f64,
    constants: Atmosphere,
) -> Result<MissionSegment, MissionError> {
    let name = def.name.as_str();
    let mut segment = MissionSegment {
        id,
        name: def.name.clone(),
        kind: def.spec.kind(),
        speed_m_s: 0.0,
        horizontal_speed_m_s: 0.0,
        vertical_speed_m_s: 0.0,
        distance_m: 0.0,
        altitude_change_m: 0.0,
        duration_s: 0.0,
        gamma_rad: 0.0,
        aoa_rad: None,
        power_fraction: None,
        constants,
    };

    match def.spec {
        SegmentSpec::HoverStay { duration_s } => {
            positive(name, "duration_s", duration_s)?;
            segment.duration_s = duration_s;
        }
        SegmentSpec::HoverClimb {
            speed_m_s,
            altitude_change_m,
        }
        | SegmentSpec::HoverDescent {
            speed_m_s,
            altitude_change_m,
        } => {
            positive(name, "speed_m_s", speed_m_s)?;
            positive(name, "altitude_change_m", altitude_change_m.abs())?;
            let sign = if segment.kind == SegmentKind::HoverClimbConstantSpeed {
                1.0
            } else {
                -1.0
            };
            segment.speed_m_s = speed_m_s;
            segment.vertical_speed_m_s = sign * speed_m_s;
            segment.altitude_change_m = sign * altitude_change_m.abs();
            segment.duration_s = altitude_change_m.abs() / speed_m_s;
            segment.gamma_rad = sign * std::f64::consts::FRAC_PI_2;
        }
        SegmentSpec::Climb {
            vertical_speed_m_s,
            horizontal_speed_m_s,
            altitude_change_m,
        }
        | SegmentSpec::Descent {
            vertical_speed_m_s,
            horizontal_speed_m_s,
            altitude_change_m,
        } => {
            positive(name, "vertical_speed_m_s", vertical_speed_m_s.abs())?;
            positive(name, "horizontal_speed_m_s", horizontal_speed_m_s)?;
            positive(name, "altitude_change_m", altitude_change_m.abs())?;
            let sign = if segment.kind == SegmentKind::ClimbConstantVyConstantVx {
                1.0
            } else {
                -1.0
            };
            let vy = sign * vertical_speed_m_s.abs();
            let duration = altitude_change_m.abs() / vertical_speed_m_s.abs();
            segment.vertical_speed_m_s = vy;
            segment.horizontal_speed_m_s = horizontal_speed_m_s;
            segment.speed_m_s = horizontal_speed_m_s.hypot(vy);
            segment.gamma_rad = vy.atan2(horizontal_speed_m_s);
            segment.duration_s = duration;
            segment.distance_m = horizontal_speed_m_s * duration;
            segment.altitude_change_m = sign * altitude_change_m.abs();
        }
        SegmentSpec::Cruise {
            speed_m_s,
            distance_m,
            aoa_deg,
        } => {
            positive(name, "distance_m", distance_m)?;
            segment.speed_m_s = speed_m_s;
            segment.horizontal_speed_m_s = speed_m_s;
            segment.distance_m = distance_m;
            segment.duration_s = distance_m / speed_m_s;
            segment.aoa_rad = aoa_deg.map(f64::to_radians);
        }
        SegmentSpec::ConstantPower {
            duration_s,
            power_fraction,
        } => {
            positive(name, "duration_s", duration_s)?;
            if !(power_fraction > 0.0 && power_fraction <= 1.0) {
                return Err(MissionError::PowerFraction {
                    segment: def.name.clone(),
                    value: power_fraction,
                });
            }
            segment.duration_s = duration_s;
            segment.power_fraction = Some(power_fraction);
        }
        SegmentSpec::NoCreditClimb {
            distance_m,
            altitude_change_m,
        }
        | SegmentSpec::NoCreditDescent {
            distance_m,
            altitude_change_m,
        } => {
            let sign = if segment.kind == SegmentKind::NoCreditClimb {
                1.0
            } else {
                -1.0
            };
            segment.distance_m = distance_m.max(0.0);
            segment.altitude_change_m = sign * altitude_change_m.abs();
            segment.speed_m_s = cruise_speed;
            segment.horizontal_speed_m_s = cruise_speed;
            segment.duration_s = segment.distance_m / cruise_speed;
        }
        SegmentSpec::ReserveCruise { duration_s } => {
            positive(name, "duration_s", duration_s)?;
            segment.speed_m_s = cruise_speed;
            segment.horizontal_speed_m_s = cruise_speed;
            segment.duration_s = duration_s;
            segment.distance_m = cruise_speed * duration_s;
        }
    }

    Ok(segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cruise(distance_m: f64) -> SegmentDef {
        SegmentDef::new(
            "Cruise",
            SegmentSpec::Cruise {
                speed_m_s: 50.0,
                distance_m,
                aoa_deg: None,
            },
        )
    }

    #[test]
    fn standard_profile_covers_requested_range() {
        let mission = Mission::standard(&StandardProfile::new(100.0, 60.0)).unwrap();
        assert_eq!(mission.len(), 8);
        assert!((mission.range_m() - 100_000.0).abs() < 1e-6);
        assert_eq!(mission.cruise_segment().kind, SegmentKind::CruiseConstantSpeed);
        let reserve = mission.segments().last().unwrap();
        assert_eq!(reserve.kind, SegmentKind::ReserveCruise);
        assert_eq!(reserve.speed_m_s, 60.0);
    }

    #[test]
    fn short_range_is_rejected() {
        assert!(matches!(
            Mission::standard(&StandardProfile::new(2.0, 60.0)),
            Err(MissionError::RangeTooShort { .. })
        ));
    }

    #[test]
    fn descent_legs_lose_altitude() {
        let mission = Mission::standard(&StandardProfile::new(50.0, 50.0)).unwrap();
        let end = mission.timeline().last().cloned().unwrap();
        assert!(end.altitude_m.abs() < 1e-9);
        assert!((end.time_s - mission.total_time_s()).abs() < 1e-9);
        for segment in mission.segments() {
            match segment.kind {
                SegmentKind::DescentConstantVyConstantVx
                | SegmentKind::HoverDescentConstantSpeed => {
                    assert!(segment.vertical_speed_m_s < 0.0);
                    assert!(segment.gamma_rad < 0.0);
                }
                SegmentKind::ClimbConstantVyConstantVx => assert!(segment.gamma_rad > 0.0),
                _ => {}
            }
        }
    }

    #[test]
    fn exactly_one_cruise_is_required() {
        let defs = vec![
            SegmentDef::new("Hover", SegmentSpec::HoverStay { duration_s: 30.0 }),
            cruise(10_000.0),
            cruise(5_000.0),
        ];
        assert_eq!(Mission::new(defs, 0.0), Err(MissionError::CruiseCount(2)));
    }

    #[test]
    fn reserve_follows_new_cruise_speed() {
        let defs = vec![
            cruise(20_000.0),
            SegmentDef::new("Reserve", SegmentSpec::ReserveCruise { duration_s: 600.0 }),
        ];
        let mission = Mission::new(defs, 0.0).unwrap().with_cruise_speed(40.0).unwrap();
        let reserve = mission.segment(2).unwrap();
        assert_eq!(reserve.speed_m_s, 40.0);
        assert!((reserve.distance_m - 24_000.0).abs() < 1e-9);
        assert!((mission.range_m() - 20_000.0).abs() < 1e-9);
    }

    #[test]
    fn power_fraction_must_lie_in_unit_interval() {
        let defs = vec![
            cruise(10_000.0),
            SegmentDef::new(
                "Taxi",
                SegmentSpec::ConstantPower {
                    duration_s: 30.0,
                    power_fraction: 1.5,
                },
            ),
        ];
        assert!(matches!(
            Mission::new(defs, 0.0),
            Err(MissionError::PowerFraction { .. })
        ));
    }
}
