use evtol_core::units::j_to_wh;

use crate::SegmentPower;

/// Energy of one segment (Wh).
pub fn segment_energy_wh(power_w: f64, duration_s: f64) -> f64 {
    j_to_wh(power_w * duration_s)
}

/// Total mission energy (Wh): `Σ power · duration`, independent of segment order.
pub fn mission_energy_wh(segments: &[SegmentPower]) -> f64 {
    segments
        .iter()
        .map(|s| segment_energy_wh(s.total_power_w, s.duration_s))
        .sum()
}
