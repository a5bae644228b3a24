//! Standard urban air mobility profile.

use evtol_core::units::{ft_to_m, km_to_m};

use crate::{Mission, MissionError, SegmentDef, SegmentSpec};

/// Parameters of the fixed-order standard profile:
/// taxi, hover climb, climb, cruise, descent, hover descent, taxi, reserve.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardProfile {
    /// Total horizontal range including climb and descent legs (m).
    pub range_m: f64,
    pub cruise_speed_m_s: f64,
    pub takeoff_altitude_m: f64,
    /// Height gained in the vertical hover climb (m).
    pub hover_altitude_m: f64,
    pub hover_climb_speed_m_s: f64,
    pub hover_descent_speed_m_s: f64,
    /// Height gained between the end of hover climb and cruise (m).
    pub climb_altitude_m: f64,
    pub climb_vertical_speed_m_s: f64,
    pub climb_horizontal_speed_m_s: f64,
    pub descent_vertical_speed_m_s: f64,
    pub descent_horizontal_speed_m_s: f64,
    pub taxi_duration_s: f64,
    pub taxi_power_fraction: f64,
    pub reserve_duration_s: f64,
    pub cruise_aoa_deg: Option<f64>,
}

impl StandardProfile {
    /// Standard profile for a given range (km) and cruise speed (m/s).
    ///
    /// Hover climb to 50 ft at 500 ft/min, climb to 1500 ft at 900 ft/min,
    /// mirror-image descent, 10 % power taxi for 30 s at each end, and a
    /// 20 minute reserve at cruise conditions.
    pub fn new(range_km: f64, cruise_speed_m_s: f64) -> Self {
        let climb_vx = 0.8 * cruise_speed_m_s;
        Self {
            range_m: km_to_m(range_km),
            cruise_speed_m_s,
            takeoff_altitude_m: 0.0,
            hover_altitude_m: ft_to_m(50.0),
            hover_climb_speed_m_s: ft_to_m(500.0) / 60.0,
            hover_descent_speed_m_s: ft_to_m(500.0) / 60.0,
            climb_altitude_m: ft_to_m(1_450.0),
            climb_vertical_speed_m_s: ft_to_m(900.0) / 60.0,
            climb_horizontal_speed_m_s: climb_vx,
            descent_vertical_speed_m_s: ft_to_m(900.0) / 60.0,
            descent_horizontal_speed_m_s: climb_vx,
            taxi_duration_s: 30.0,
            taxi_power_fraction: 0.1,
            reserve_duration_s: 20.0 * 60.0,
            cruise_aoa_deg: None,
        }
    }

    pub fn with_reserve_minutes(mut self, minutes: f64) -> Self {
        self.reserve_duration_s = minutes * 60.0;
        self
    }

    pub fn with_takeoff_altitude(mut self, altitude_m: f64) -> Self {
        self.takeoff_altitude_m = altitude_m;
        self
    }

    /// The same profile over another range and cruise speed. Climb and
    /// descent horizontal speeds keep their ratio to cruise speed.
    pub fn retargeted(&self, range_km: f64, cruise_speed_m_s: f64) -> Self {
        let scale = cruise_speed_m_s / self.cruise_speed_m_s;
        Self {
            range_m: km_to_m(range_km),
            cruise_speed_m_s,
            climb_horizontal_speed_m_s: self.climb_horizontal_speed_m_s * scale,
            descent_horizontal_speed_m_s: self.descent_horizontal_speed_m_s * scale,
            ..self.clone()
        }
    }

    pub(crate) fn build(&self) -> Result<Mission, MissionError> {
        let climb_distance = self.climb_horizontal_speed_m_s * self.climb_altitude_m
            / self.climb_vertical_speed_m_s;
        let descent_distance = self.descent_horizontal_speed_m_s * self.climb_altitude_m
            / self.descent_vertical_speed_m_s;
        let cruise_distance = self.range_m - climb_distance - descent_distance;
        if cruise_distance <= 0.0 {
            return Err(MissionError::RangeTooShort {
                range_m: self.range_m,
                required_m: climb_distance + descent_distance,
            });
        }

        let mut defs = Vec::with_capacity(8);
        if self.taxi_duration_s > 0.0 {
            defs.push(SegmentDef::new(
                "Taxi (departure)",
                SegmentSpec::ConstantPower {
                    duration_s: self.taxi_duration_s,
                    power_fraction: self.taxi_power_fraction,
                },
            ));
        }
        defs.push(SegmentDef::new(
            "Hover climb",
            SegmentSpec::HoverClimb {
                speed_m_s: self.hover_climb_speed_m_s,
                altitude_change_m: self.hover_altitude_m,
            },
        ));
        defs.push(SegmentDef::new(
            "Climb",
            SegmentSpec::Climb {
                vertical_speed_m_s: self.climb_vertical_speed_m_s,
                horizontal_speed_m_s: self.climb_horizontal_speed_m_s,
                altitude_change_m: self.climb_altitude_m,
            },
        ));
        defs.push(SegmentDef::new(
            "Cruise",
            SegmentSpec::Cruise {
                speed_m_s: self.cruise_speed_m_s,
                distance_m: cruise_distance,
                aoa_deg: self.cruise_aoa_deg,
            },
        ));
        defs.push(SegmentDef::new(
            "Descent",
            SegmentSpec::Descent {
                vertical_speed_m_s: self.descent_vertical_speed_m_s,
                horizontal_speed_m_s: self.descent_horizontal_speed_m_s,
                altitude_change_m: self.climb_altitude_m,
            },
        ));
        defs.push(SegmentDef::new(
            "Hover descent",
            SegmentSpec::HoverDescent {
                speed_m_s: self.hover_descent_speed_m_s,
                altitude_change_m: self.hover_altitude_m,
            },
        ));
        if self.taxi_duration_s > 0.0 {
            defs.push(SegmentDef::new(
                "Taxi (arrival)",
                SegmentSpec::ConstantPower {
                    duration_s: self.taxi_duration_s,
                    power_fraction: self.taxi_power_fraction,
                },
            ));
        }
        if self.reserve_duration_s > 0.0 {
            defs.push(SegmentDef::new(
                "Reserve",
                SegmentSpec::ReserveCruise {
                    duration_s: self.reserve_duration_s,
                },
            ));
        }

        Mission::new(defs, self.takeoff_altitude_m)
    }
}
