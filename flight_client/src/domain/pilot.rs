// Pilot controls: turns held inputs into forces and keeps the craft inside
// the altitude band around the planet.

use super::body::Body;
use super::flight::FlightModel;
use super::input::InputState;
use glam::{Mat3, Quat, Vec3};

/// Gameplay tuning for the local craft's controls.
///
/// Keep this separate from runtime configuration (intervals, channel sizes).
#[derive(Debug, Clone, Copy)]
pub struct PilotTuning {
    /// Force per held direction control, per tick.
    pub move_force: f32,

    /// Force per held direction control while boosting.
    pub boost_force: f32,

    /// Slerp factor toward the centre-facing orientation when idle.
    pub turn_speed: f32,

    /// Centre-ward force applied when idle and above the drift threshold.
    pub idle_pull: f32,

    pub globe_radius: f32,

    /// Closest allowed distance to the planet centre.
    pub min_distance: f32,

    /// Farthest allowed distance to the planet centre.
    pub max_distance: f32,

    /// Outward velocity added after hitting the lower bound.
    pub floor_bounce: f32,

    /// Inward force applied after hitting the upper bound.
    pub ceiling_pull: f32,
}

impl Default for PilotTuning {
    fn default() -> Self {
        let globe_radius = 100.0;
        Self {
            move_force: 0.1,
            boost_force: 0.2,
            turn_speed: 0.02,
            idle_pull: 0.01,
            globe_radius,
            min_distance: globe_radius + 30.0,
            max_distance: globe_radius * 30.0,
            floor_bounce: 0.1,
            ceiling_pull: 0.1,
        }
    }
}

/// Applies this tick's control forces. Call before `integrate`.
pub fn steer(model: &mut FlightModel, input: &InputState, tuning: &PilotTuning) {
    if !input.any_held() {
        turn_toward_centre(model, tuning);
        return;
    }

    let force = if input.boost {
        tuning.boost_force
    } else {
        tuning.move_force
    };
    let body = model.body();
    let forward = body.forward();
    let right = body.right();

    let mut thrust = Vec3::ZERO;
    if input.forward {
        thrust += forward * force;
    }
    if input.back {
        thrust -= forward * force;
    }
    if input.right {
        thrust += right * force;
    }
    if input.left {
        thrust -= right * force;
    }
    if input.up {
        thrust += Vec3::Y * force;
    }
    if input.down {
        thrust -= Vec3::Y * force;
    }
    model.apply_force(thrust);
}

fn turn_toward_centre(model: &mut FlightModel, tuning: &PilotTuning) {
    let body = model.body_mut();
    if let Some(target) = facing_centre(body.position) {
        body.rotation = body.rotation.slerp(target, tuning.turn_speed).normalize();
    }

    let distance = body.position.length();
    if distance > tuning.min_distance + 5.0 {
        let to_centre = -body.position / distance;
        model.apply_force(to_centre * tuning.idle_pull);
    }
}

// Orientation whose local -Z points from `position` at the origin, world Y up.
fn facing_centre(position: Vec3) -> Option<Quat> {
    let back = position.try_normalize()?;
    let up = if back.cross(Vec3::Y).length_squared() > 1e-8 {
        Vec3::Y
    } else {
        // Directly above or below the pole: any perpendicular up works.
        Vec3::Z
    };
    let right = up.cross(back).normalize();
    let true_up = back.cross(right);
    Some(Quat::from_mat3(&Mat3::from_cols(right, true_up, back)).normalize())
}

/// Clamps the body into the band between `min_distance` and `max_distance`.
/// Call after `integrate`.
pub fn enforce_altitude_band(model: &mut FlightModel, tuning: &PilotTuning) {
    let body: &mut Body = model.body_mut();
    let distance = body.position.length();
    let Some(outward) = body.position.try_normalize() else {
        return;
    };

    if distance < tuning.min_distance {
        body.position = outward * tuning.min_distance;
        let radial = body.velocity.dot(outward);
        if radial < 0.0 {
            body.velocity -= outward * radial;
            body.velocity += outward * tuning.floor_bounce;
        }
    }

    if distance > tuning.max_distance {
        body.position = outward * tuning.max_distance;
        model.apply_force(-outward * tuning.ceiling_pull);
    }
}
