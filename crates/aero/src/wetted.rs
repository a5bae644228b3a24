//! Wetted-area bookkeeping.
//!
//! Geometry tooling normally supplies these areas keyed by component name
//! (`"Fuselage"`, `"Wing"`, `"Boom_1"` ...). When it doesn't, the simple
//! geometric estimate below stands in for it.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use evtol_vehicle::Vehicle;

/// Component name → wetted area (m²).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WettedAreas(pub BTreeMap<String, f64>);

impl WettedAreas {
    pub fn get(&self, component: &str) -> Option<f64> {
        self.0.get(component).copied()
    }

    pub fn insert(&mut self, component: impl Into<String>, area_m2: f64) {
        self.0.insert(component.into(), area_m2);
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Estimate wetted areas from primary geometry.
    pub fn estimate(vehicle: &Vehicle) -> Self {
        let mut areas = WettedAreas::default();
        let fuselage = &vehicle.fuselage;
        let fr = fuselage.fineness_ratio().max(2.5);
        // Slender body of revolution
        let body = PI * fuselage.max_diameter_m * fuselage.length_m
            * (1.0 - 2.0 / fr).powf(2.0 / 3.0)
            * (1.0 + 1.0 / (fr * fr));
        areas.insert("Fuselage", body);

        if let Some(wing) = &vehicle.wing {
            areas.insert("Wing", 2.0 * wing.area_m2 * (1.0 + 0.2 * wing.thickness_to_chord));
        }
        if let Some(tail) = &vehicle.horizontal_tail {
            areas.insert(
                "HorizontalTail",
                2.0 * tail.area_m2 * (1.0 + 0.2 * tail.thickness_to_chord),
            );
        }
        if let Some(tail) = &vehicle.vertical_tail {
            areas.insert(
                "VerticalTail",
                2.0 * tail.area_m2 * (1.0 + 0.2 * tail.thickness_to_chord),
            );
        }
        for i in 0..vehicle.boom.count {
            areas.insert(
                format!("Boom_{}", i + 1),
                PI * vehicle.boom.diameter_m * vehicle.boom.length_m,
            );
        }
        areas
    }
}
