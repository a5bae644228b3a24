//! Core units, constants, and shared primitives for the eVTOL sizing workspace.
//!
//! Everything inside the analysis chain is carried in SI. Unit tags only show
//! up at the edges (configuration, reported outputs, exported records).

pub mod atmosphere;
pub mod outputs;

/// Physical constants expressed in SI units (unless stated otherwise).
pub mod constants {
    /// Standard gravity at Earth's surface (m/s²).
    pub const G0: f64 = 9.80665;
    /// Specific gas constant for dry air (J/(kg·K)).
    pub const R_AIR: f64 = 287.052_87;
    /// Ratio of specific heats for air.
    pub const GAMMA_AIR: f64 = 1.4;
    /// Seconds per hour.
    pub const SECONDS_PER_HOUR: f64 = 3_600.0;
}

/// Basic unit conversion helpers.
pub mod units {
    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    const FT_TO_M: f64 = 0.3048;
    const LB_TO_KG: f64 = 0.453_592_37;
    const MPH_TO_MS: f64 = 0.447_04;
    const KNOT_TO_MS: f64 = 0.514_444;
    const HP_TO_W: f64 = 745.699_872;

    /// Convert kilometres to metres.
    #[inline]
    pub fn km_to_m(v: f64) -> f64 {
        v * 1_000.0
    }

    /// Convert metres to kilometres.
    #[inline]
    pub fn m_to_km(v: f64) -> f64 {
        v / 1_000.0
    }

    /// Convert kilometres per hour to metres per second.
    #[inline]
    pub fn kmh_to_ms(v: f64) -> f64 {
        v / 3.6
    }

    /// Convert metres per second to kilometres per hour.
    #[inline]
    pub fn ms_to_kmh(v: f64) -> f64 {
        v * 3.6
    }

    /// Convert miles per hour to metres per second.
    #[inline]
    pub fn mph_to_ms(v: f64) -> f64 {
        v * MPH_TO_MS
    }

    /// Convert metres per second to knots.
    #[inline]
    pub fn ms_to_knots(v: f64) -> f64 {
        v / KNOT_TO_MS
    }

    /// Convert feet to metres.
    #[inline]
    pub fn ft_to_m(v: f64) -> f64 {
        v * FT_TO_M
    }

    /// Convert metres to feet.
    #[inline]
    pub fn m_to_ft(v: f64) -> f64 {
        v / FT_TO_M
    }

    /// Convert square feet to square metres.
    #[inline]
    pub fn ft2_to_m2(v: f64) -> f64 {
        v * FT_TO_M * FT_TO_M
    }

    /// Convert square metres to square feet.
    #[inline]
    pub fn m2_to_ft2(v: f64) -> f64 {
        v / (FT_TO_M * FT_TO_M)
    }

    /// Convert kilograms to pounds (mass).
    #[inline]
    pub fn kg_to_lb(v: f64) -> f64 {
        v / LB_TO_KG
    }

    /// Convert pounds (mass) to kilograms.
    #[inline]
    pub fn lb_to_kg(v: f64) -> f64 {
        v * LB_TO_KG
    }

    /// Convert joules to watt-hours.
    #[inline]
    pub fn j_to_wh(v: f64) -> f64 {
        v / 3_600.0
    }

    /// Convert watt-hours to joules.
    #[inline]
    pub fn wh_to_j(v: f64) -> f64 {
        v * 3_600.0
    }

    /// Convert revolutions per minute to radians per second.
    #[inline]
    pub fn rpm_to_rad_s(v: f64) -> f64 {
        v * std::f64::consts::PI / 30.0
    }

    /// Convert radians per second to revolutions per minute.
    #[inline]
    pub fn rad_s_to_rpm(v: f64) -> f64 {
        v * 30.0 / std::f64::consts::PI
    }

    /// Convert degrees to radians.
    #[inline]
    pub fn deg_to_rad(v: f64) -> f64 {
        v.to_radians()
    }

    /// Physical dimension of a unit tag; conversion is only legal within one dimension.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Dimension {
        Mass,
        Force,
        Power,
        Energy,
        Length,
        Area,
        Pressure,
        Time,
        Speed,
        Angle,
        AngularSpeed,
        ThrustPerPower,
        MassSquared,
        Dimensionless,
    }

    /// Unit tag attached to reported quantities.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum Unit {
        #[serde(rename = "kg")]
        Kilogram,
        #[serde(rename = "lb")]
        Pound,
        #[serde(rename = "N")]
        Newton,
        #[serde(rename = "W")]
        Watt,
        #[serde(rename = "kW")]
        Kilowatt,
        #[serde(rename = "hp")]
        Horsepower,
        #[serde(rename = "J")]
        Joule,
        #[serde(rename = "Wh")]
        WattHour,
        #[serde(rename = "kWh")]
        KilowattHour,
        #[serde(rename = "m")]
        Metre,
        #[serde(rename = "ft")]
        Foot,
        #[serde(rename = "km")]
        Kilometre,
        #[serde(rename = "m**2")]
        SquareMetre,
        #[serde(rename = "ft**2")]
        SquareFoot,
        #[serde(rename = "s")]
        Second,
        #[serde(rename = "min")]
        Minute,
        #[serde(rename = "h")]
        Hour,
        #[serde(rename = "m/s")]
        MetrePerSecond,
        #[serde(rename = "km/h")]
        KilometrePerHour,
        #[serde(rename = "mph")]
        MilePerHour,
        #[serde(rename = "kn")]
        Knot,
        #[serde(rename = "rad")]
        Radian,
        #[serde(rename = "deg")]
        Degree,
        #[serde(rename = "rpm")]
        Rpm,
        #[serde(rename = "rad/s")]
        RadianPerSecond,
        #[serde(rename = "N/W")]
        NewtonPerWatt,
        #[serde(rename = "g/W")]
        GramPerWatt,
        #[serde(rename = "N/m**2")]
        NewtonPerSquareMetre,
        #[serde(rename = "lbf/ft**2")]
        PoundForcePerSquareFoot,
        #[serde(rename = "kg**2")]
        SquareKilogram,
        #[serde(rename = "-")]
        Dimensionless,
    }

    #[derive(Debug, Error, PartialEq)]
    pub enum UnitError {
        #[error("cannot convert {from} to {to}: incompatible dimensions")]
        Incompatible { from: Unit, to: Unit },
        #[error("unknown unit `{0}`")]
        Unknown(String),
    }

    impl Unit {
        /// Dimension the unit measures.
        pub fn dimension(self) -> Dimension {
            use Unit::*;
            match self {
                Kilogram | Pound => Dimension::Mass,
                Newton => Dimension::Force,
                Watt | Kilowatt | Horsepower => Dimension::Power,
                Joule | WattHour | KilowattHour => Dimension::Energy,
                Metre | Foot | Kilometre => Dimension::Length,
                SquareMetre | SquareFoot => Dimension::Area,
                Second | Minute | Hour => Dimension::Time,
                MetrePerSecond | KilometrePerHour | MilePerHour | Knot => Dimension::Speed,
                Radian | Degree => Dimension::Angle,
                Rpm | RadianPerSecond => Dimension::AngularSpeed,
                NewtonPerWatt | GramPerWatt => Dimension::ThrustPerPower,
                NewtonPerSquareMetre | PoundForcePerSquareFoot => Dimension::Pressure,
                SquareKilogram => Dimension::MassSquared,
                Dimensionless => Dimension::Dimensionless,
            }
        }

        /// Multiplier taking a value in this unit to the SI base of its dimension.
        fn to_si_factor(self) -> f64 {
            use Unit::*;
            match self {
                Kilogram => 1.0,
                Pound => LB_TO_KG,
                Newton => 1.0,
                Watt => 1.0,
                Kilowatt => 1_000.0,
                Horsepower => HP_TO_W,
                Joule => 1.0,
                WattHour => 3_600.0,
                KilowattHour => 3.6e6,
                Metre => 1.0,
                Foot => FT_TO_M,
                Kilometre => 1_000.0,
                SquareMetre => 1.0,
                SquareFoot => FT_TO_M * FT_TO_M,
                Second => 1.0,
                Minute => 60.0,
                Hour => 3_600.0,
                MetrePerSecond => 1.0,
                KilometrePerHour => 1.0 / 3.6,
                MilePerHour => MPH_TO_MS,
                Knot => KNOT_TO_MS,
                Radian => 1.0,
                Degree => std::f64::consts::PI / 180.0,
                Rpm => std::f64::consts::PI / 30.0,
                RadianPerSecond => 1.0,
                // thrust-to-power is reported in N/W; g/W divides thrust by g0
                NewtonPerWatt => 1.0,
                GramPerWatt => super::constants::G0 / 1_000.0,
                NewtonPerSquareMetre => 1.0,
                PoundForcePerSquareFoot => LB_TO_KG * super::constants::G0 / (FT_TO_M * FT_TO_M),
                SquareKilogram => 1.0,
                Dimensionless => 1.0,
            }
        }

        /// Short symbol used in CSV headers and printed summaries.
        pub fn symbol(self) -> &'static str {
            use Unit::*;
            match self {
                Kilogram => "kg",
                Pound => "lb",
                Newton => "N",
                Watt => "W",
                Kilowatt => "kW",
                Horsepower => "hp",
                Joule => "J",
                WattHour => "Wh",
                KilowattHour => "kWh",
                Metre => "m",
                Foot => "ft",
                Kilometre => "km",
                SquareMetre => "m**2",
                SquareFoot => "ft**2",
                Second => "s",
                Minute => "min",
                Hour => "h",
                MetrePerSecond => "m/s",
                KilometrePerHour => "km/h",
                MilePerHour => "mph",
                Knot => "kn",
                Radian => "rad",
                Degree => "deg",
                Rpm => "rpm",
                RadianPerSecond => "rad/s",
                NewtonPerWatt => "N/W",
                GramPerWatt => "g/W",
                NewtonPerSquareMetre => "N/m**2",
                PoundForcePerSquareFoot => "lbf/ft**2",
                SquareKilogram => "kg**2",
                Dimensionless => "-",
            }
        }

        /// Parse a unit symbol as written in manifests and CSV headers.
        pub fn parse(symbol: &str) -> Result<Unit, UnitError> {
            use Unit::*;
            let unit = match symbol.trim() {
                "kg" => Kilogram,
                "lb" => Pound,
                "N" => Newton,
                "W" => Watt,
                "kW" => Kilowatt,
                "hp" => Horsepower,
                "J" => Joule,
                "Wh" | "W*h" => WattHour,
                "kWh" | "kW*h" => KilowattHour,
                "m" => Metre,
                "ft" => Foot,
                "km" => Kilometre,
                "m**2" | "m2" => SquareMetre,
                "ft**2" | "ft2" => SquareFoot,
                "s" => Second,
                "min" => Minute,
                "h" => Hour,
                "m/s" => MetrePerSecond,
                "km/h" => KilometrePerHour,
                "mph" => MilePerHour,
                "kn" | "knot" => Knot,
                "rad" => Radian,
                "deg" => Degree,
                "rpm" => Rpm,
                "rad/s" => RadianPerSecond,
                "N/W" => NewtonPerWatt,
                "g/W" => GramPerWatt,
                "N/m**2" | "N/m2" | "Pa" => NewtonPerSquareMetre,
                "lbf/ft**2" | "psf" => PoundForcePerSquareFoot,
                "kg**2" => SquareKilogram,
                "-" | "" | "None" => Dimensionless,
                other => return Err(UnitError::Unknown(other.to_string())),
            };
            Ok(unit)
        }
    }

    impl std::fmt::Display for Unit {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.symbol())
        }
    }

    /// Convert `value` expressed in `from` into `to`.
    pub fn convert(value: f64, from: Unit, to: Unit) -> Result<f64, UnitError> {
        if from.dimension() != to.dimension() {
            return Err(UnitError::Incompatible { from, to });
        }
        if from == to {
            return Ok(value);
        }
        Ok(value * from.to_si_factor() / to.to_si_factor())
    }

    /// Value paired with the unit it is expressed in.
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Quantity {
        pub value: f64,
        pub unit: Unit,
    }

    impl Quantity {
        pub fn new(value: f64, unit: Unit) -> Self {
            Self { value, unit }
        }

        /// Express the quantity in another unit of the same dimension.
        pub fn to(&self, unit: Unit) -> Result<f64, UnitError> {
            convert(self.value, self.unit, unit)
        }

        /// Value expressed in the SI base unit of its dimension.
        pub fn si(&self) -> f64 {
            self.value * self.unit.to_si_factor()
        }
    }
}
