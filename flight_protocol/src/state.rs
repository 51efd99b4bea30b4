use glam::Vec3;

/// Replicated state of one craft.
///
/// This is the one value type shared by the physics layer (local snapshots),
/// the replication layer (outbound updates, remote proxies) and the relay
/// (per-peer records). Rotation is kept as Euler angles (XYZ order, radians)
/// because that is what travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyState {
    pub position: Vec3,
    pub rotation: Vec3,
    pub velocity: Vec3,
}

impl BodyState {
    /// A motionless, unrotated body at `position`.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Vec3::ZERO,
            velocity: Vec3::ZERO,
        }
    }

    /// True when every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite() && self.velocity.is_finite()
    }
}
