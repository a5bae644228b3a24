//! Two-pass mission power evaluation.
//!
//! Pass 1 evaluates every segment whose power depends only on its own
//! kinematics, copies cruise into reserve legs, and collects the sizing
//! envelope. Pass 2 resolves constant-power segments as a fraction of the
//! pass-1 maximum total power.

use evtol_aero::{TrimRequest, TrimSolution, trim_edgewise, trim_winged};
use evtol_core::atmosphere::Atmosphere;
use evtol_mission::{Mission, MissionSegment, SegmentKind};
use evtol_vehicle::{Configuration, FlightPhase, Rotor, Vehicle};
use tracing::warn;

use crate::energy::{mission_energy_wh, segment_energy_wh};
use crate::forward::{ForwardPower, forward_flight_power};
use crate::hover::HoverPower;
use crate::{ComponentPower, MissionPower, PowerError, PowerSettings, SegmentPower, SizingLoads};

/// Evaluate thrust, power and energy of every segment at takeoff weight `weight_kg`.
pub fn evaluate_mission(
    vehicle: &Vehicle,
    mission: &Mission,
    settings: &PowerSettings,
    weight_kg: f64,
) -> Result<MissionPower, PowerError> {
    if !(weight_kg > 0.0) || !weight_kg.is_finite() {
        return Err(PowerError::InvalidWeight(weight_kg));
    }
    if vehicle.configuration == Configuration::LiftPlusCruise && vehicle.propeller.is_none() {
        return Err(PowerError::MissingPropeller);
    }

    // pass 1: self-contained segments
    let mut slots: Vec<Option<SegmentPower>> = Vec::with_capacity(mission.len());
    for segment in mission.segments() {
        let evaluated = match segment.kind {
            kind if kind.is_hover() => Some(hover_segment(vehicle, settings, segment, weight_kg)),
            kind if kind.is_forward_flight() => {
                Some(forward_segment(vehicle, settings, segment, weight_kg)?)
            }
            SegmentKind::NoCreditClimb | SegmentKind::NoCreditDescent => Some(assemble(
                segment,
                ComponentPower::idle(),
                ComponentPower::idle(),
                None,
            )),
            _ => None,
        };
        slots.push(evaluated);
    }

    let cruise_id = mission.cruise_segment().id;
    let cruise = slots[cruise_id - 1].clone();
    if let Some(cruise) = cruise {
        for segment in mission.segments() {
            if segment.kind == SegmentKind::ReserveCruise {
                slots[segment.id - 1] = Some(assemble(
                    segment,
                    cruise.lift_rotor,
                    cruise.propeller,
                    cruise.trim.clone(),
                ));
            }
        }
    }

    let sizing = sizing_loads(slots.iter().flatten());

    // pass 2: constant-power segments against the pass-1 envelope
    let book_on_propeller = sizing.propeller_power_w > sizing.lift_rotor_power_w;
    for segment in mission.segments() {
        if segment.kind != SegmentKind::ConstantPower {
            continue;
        }
        let fraction = segment.power_fraction.unwrap_or(0.0);
        let mut booked = ComponentPower::idle();
        booked.active = true;
        booked.power_w = fraction * sizing.total_power_w;
        let (lift, prop) = if book_on_propeller {
            (ComponentPower::idle(), booked)
        } else {
            (booked, ComponentPower::idle())
        };
        slots[segment.id - 1] = Some(assemble(segment, lift, prop, None));
    }

    let segments: Vec<SegmentPower> = slots
        .into_iter()
        .zip(mission.segments())
        .map(|(slot, segment)| {
            slot.unwrap_or_else(|| {
                assemble(segment, ComponentPower::idle(), ComponentPower::idle(), None)
            })
        })
        .collect();

    let converged = segments.iter().all(|s| s.converged);
    if !converged {
        for s in segments.iter().filter(|s| !s.converged) {
            warn!(segment = s.id, name = %s.name, weight_kg, "inner power solve did not converge");
        }
    }

    Ok(MissionPower {
        weight_kg,
        energy_wh: mission_energy_wh(&segments),
        total_time_s: mission.total_time_s(),
        sizing,
        segments,
        converged,
    })
}

fn sizing_loads<'a>(segments: impl Iterator<Item = &'a SegmentPower>) -> SizingLoads {
    segments
        .filter(|s| s.kind.contributes_to_sizing())
        .fold(SizingLoads::default(), |acc, s| SizingLoads {
            lift_rotor_thrust_each_n: acc.lift_rotor_thrust_each_n.max(s.lift_rotor.thrust_each_n),
            lift_rotor_power_w: acc.lift_rotor_power_w.max(s.lift_rotor.power_w),
            propeller_thrust_each_n: acc.propeller_thrust_each_n.max(s.propeller.thrust_each_n),
            propeller_power_w: acc.propeller_power_w.max(s.propeller.power_w),
            total_power_w: acc.total_power_w.max(s.total_power_w),
        })
}

fn assemble(
    segment: &MissionSegment,
    lift_rotor: ComponentPower,
    propeller: ComponentPower,
    trim: Option<TrimSolution>,
) -> SegmentPower {
    let total_power_w = lift_rotor.power_w + propeller.power_w;
    SegmentPower {
        id: segment.id,
        name: segment.name.clone(),
        kind: segment.kind,
        duration_s: segment.duration_s,
        converged: lift_rotor.converged && propeller.converged,
        lift_rotor,
        propeller,
        total_power_w,
        energy_wh: segment_energy_wh(total_power_w, segment.duration_s),
        trim,
    }
}

fn hover_segment(
    vehicle: &Vehicle,
    settings: &PowerSettings,
    segment: &MissionSegment,
    weight_kg: f64,
) -> SegmentPower {
    let rotor = &vehicle.lift_rotor;
    let thrust_each = weight_kg * segment.constants.gravity_m_s2 / rotor.count as f64;
    let hover = settings.hover.compute(
        rotor,
        thrust_each,
        segment.vertical_speed_m_s,
        &segment.constants,
        settings.hover_rpm.get(&segment.id).copied(),
    );
    assemble(
        segment,
        from_hover(rotor, &hover, &segment.constants),
        ComponentPower::idle(),
        None,
    )
}

fn forward_segment(
    vehicle: &Vehicle,
    settings: &PowerSettings,
    segment: &MissionSegment,
    weight_kg: f64,
) -> Result<SegmentPower, PowerError> {
    let request = TrimRequest {
        vehicle,
        drag_model: settings.parasite,
        wetted: settings.wetted.as_ref(),
        atmosphere: &segment.constants,
        weight_kg,
        speed_m_s: segment.speed_m_s,
        gamma_rad: segment.gamma_rad,
        aoa_rad: segment.aoa_rad,
    };
    let phase = match segment.kind {
        SegmentKind::ClimbConstantVyConstantVx => FlightPhase::Climb,
        SegmentKind::DescentConstantVyConstantVx => FlightPhase::Descent,
        _ => FlightPhase::Cruise,
    };

    match vehicle.configuration {
        Configuration::Multirotor => {
            let trim = trim_edgewise(&request)?;
            let rotor = &vehicle.lift_rotor;
            let power = forward_flight_power(
                rotor,
                trim.thrust_n,
                segment.speed_m_s,
                trim.disk_aoa_rad,
                rotor.rpm.for_phase(phase),
                &segment.constants,
            );
            Ok(assemble(
                segment,
                from_forward(rotor, &power),
                ComponentPower::idle(),
                Some(trim),
            ))
        }
        Configuration::LiftPlusCruise => {
            let propeller = vehicle.propeller.as_ref().ok_or(PowerError::MissingPropeller)?;
            let trim = trim_winged(&request)?;
            let power = forward_flight_power(
                propeller,
                trim.thrust_n,
                segment.speed_m_s,
                trim.disk_aoa_rad,
                propeller.rpm.for_phase(phase),
                &segment.constants,
            );
            Ok(assemble(
                segment,
                ComponentPower::idle(),
                from_forward(propeller, &power),
                Some(trim),
            ))
        }
    }
}

fn from_hover(rotor: &Rotor, hover: &HoverPower, atmosphere: &Atmosphere) -> ComponentPower {
    let tip_speed = rotor.tip_speed(hover.rpm);
    let rho_a_vt2 = atmosphere.density_kg_m3 * rotor.disk_area_each() * tip_speed * tip_speed;
    ComponentPower {
        active: true,
        thrust_each_n: hover.thrust_each_n,
        thrust_total_n: hover.thrust_each_n * rotor.count as f64,
        power_w: hover.power_w,
        induced_power_w: hover.power_w - hover.profile_power_w,
        profile_power_w: hover.profile_power_w,
        rpm: hover.rpm,
        mu: 0.0,
        ct: if rho_a_vt2 > 0.0 {
            hover.thrust_each_n / rho_a_vt2
        } else {
            0.0
        },
        lambda: if tip_speed > 0.0 {
            hover.induced_velocity_m_s / tip_speed
        } else {
            0.0
        },
        disk_loading_n_m2: hover.thrust_each_n / rotor.disk_area_each(),
        thrust_residual: hover.thrust_residual,
        converged: hover.converged,
    }
}

fn from_forward(rotor: &Rotor, power: &ForwardPower) -> ComponentPower {
    ComponentPower {
        active: true,
        thrust_each_n: power.thrust_each_n,
        thrust_total_n: power.thrust_each_n * rotor.count as f64,
        power_w: power.power_w,
        induced_power_w: power.induced_power_w,
        profile_power_w: power.profile_power_w,
        rpm: power.rpm,
        mu: power.inflow.mu,
        ct: power.ct,
        lambda: power.inflow.lambda,
        disk_loading_n_m2: power.thrust_each_n / rotor.disk_area_each(),
        thrust_residual: 0.0,
        converged: power.inflow.converged,
    }
}
