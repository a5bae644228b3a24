//! Named, unit-tagged result values.
//!
//! Names follow the `Group|quantity[|qualifier]` convention
//! (`Weight|takeoff`, `Power|LiftRotor|segment_3`, `OnDesign|Weight|battery`).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::units::{Quantity, Unit, UnitError};

#[derive(Debug, Error, PartialEq)]
pub enum OutputError {
    #[error("no output named `{0}`")]
    Missing(String),
    #[error("output `{name}`: {source}")]
    Unit {
        name: String,
        #[source]
        source: UnitError,
    },
}

/// Insertion-ordered map of output name to quantity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outputs {
    entries: Vec<(String, Quantity)>,
}

impl Outputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `name`, keeping its original position when it exists.
    pub fn insert(&mut self, name: impl Into<String>, value: f64, unit: Unit) {
        let name = name.into();
        let quantity = Quantity::new(value, unit);
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = quantity,
            None => self.entries.push((name, quantity)),
        }
    }

    pub fn quantity(&self, name: &str) -> Option<Quantity> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, q)| *q)
    }

    /// Value of `name` converted to `unit`.
    pub fn get(&self, name: &str, unit: Unit) -> Result<f64, OutputError> {
        let quantity = self
            .quantity(name)
            .ok_or_else(|| OutputError::Missing(name.to_string()))?;
        quantity.to(unit).map_err(|source| OutputError::Unit {
            name: name.to_string(),
            source,
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Append every entry of `other` under `prefix|`.
    pub fn extend_prefixed(&mut self, prefix: &str, other: &Outputs) {
        for (name, q) in other.iter() {
            self.insert(format!("{prefix}|{name}"), q.value, q.unit);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Quantity)> {
        self.entries.iter().map(|(n, q)| (n.as_str(), q))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_on_lookup() {
        let mut outputs = Outputs::new();
        outputs.insert("Weight|takeoff", 1_000.0, Unit::Kilogram);
        let lb = outputs.get("Weight|takeoff", Unit::Pound).unwrap();
        assert!((lb - 2_204.622_6).abs() < 1e-3);
        assert!(matches!(
            outputs.get("Weight|takeoff", Unit::Watt),
            Err(OutputError::Unit { .. })
        ));
        assert!(matches!(
            outputs.get("Weight|battery", Unit::Kilogram),
            Err(OutputError::Missing(_))
        ));
    }

    #[test]
    fn overwrite_keeps_position() {
        let mut outputs = Outputs::new();
        outputs.insert("a", 1.0, Unit::Dimensionless);
        outputs.insert("b", 2.0, Unit::Dimensionless);
        outputs.insert("a", 3.0, Unit::Dimensionless);
        let names: Vec<&str> = outputs.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(outputs.get("a", Unit::Dimensionless).unwrap(), 3.0);
    }
}
