// The per-frame pipeline for the local craft plus its view of the relay.

use super::replication::{ReplicationClient, RosterChange};
use crate::domain::celestial::CelestialOrbit;
use crate::domain::effects::{EffectTracker, TransientEffect, Weapon, WeaponTuning};
use crate::domain::pilot::{self, PilotTuning};
use crate::domain::{
    Body, BodyId, ColliderError, CollisionEngine, CollisionEvent, CollisionTuning, FlightModel,
    InputState,
};
use flight_protocol::{ClientMessage, ServerMessage};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Gameplay tuning for one flight session.
#[derive(Debug, Clone, Copy)]
pub struct SessionTuning {
    pub pilot: PilotTuning,
    pub collision: CollisionTuning,
    pub weapon: WeaponTuning,

    /// Collider radius of the local craft.
    pub local_radius: f32,

    /// Collider radius given to every remote craft.
    pub peer_radius: f32,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            pilot: PilotTuning::default(),
            collision: CollisionTuning::default(),
            weapon: WeaponTuning::default(),
            local_radius: 10.0,
            peer_radius: 10.0,
        }
    }
}

/// Outcome of one tick, for logging and presentation.
#[derive(Debug, Default)]
pub struct TickReport {
    pub collisions: Vec<CollisionEvent>,
    // Effect id of a laser fired this tick.
    pub laser: Option<u64>,
    pub expired: Vec<TransientEffect>,
}

pub struct FlightSession {
    flight: FlightModel,
    pilot: PilotTuning,
    peer_radius: f32,
    collisions: CollisionEngine,
    collision_rx: mpsc::UnboundedReceiver<CollisionEvent>,
    orbit: CelestialOrbit,
    weapon: Weapon,
    effects: EffectTracker,
    replication: ReplicationClient,
    ticks: u64,
}

impl FlightSession {
    pub fn new(tuning: SessionTuning) -> Result<Self, ColliderError> {
        Self::with_body(Body::default(), tuning)
    }

    pub fn with_body(body: Body, tuning: SessionTuning) -> Result<Self, ColliderError> {
        let (collision_tx, collision_rx) = mpsc::unbounded_channel();
        let mut collisions = CollisionEngine::new(tuning.collision, collision_tx);
        collisions.register(BodyId::Local, tuning.local_radius)?;
        let orbit = CelestialOrbit::default();
        orbit.register(&mut collisions)?;

        Ok(Self {
            flight: FlightModel::new(body),
            pilot: tuning.pilot,
            peer_radius: tuning.peer_radius,
            collisions,
            collision_rx,
            orbit,
            weapon: Weapon::new(tuning.weapon),
            effects: EffectTracker::default(),
            replication: ReplicationClient::new(),
            ticks: 0,
        })
    }

    pub fn flight(&self) -> &FlightModel {
        &self.flight
    }

    pub fn replication(&self) -> &ReplicationClient {
        &self.replication
    }

    pub fn collisions(&self) -> &CollisionEngine {
        &self.collisions
    }

    pub fn orbit(&self) -> &CelestialOrbit {
        &self.orbit
    }

    pub fn effects(&self) -> &EffectTracker {
        &self.effects
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Runs one frame: controls, integration, altitude band, landmarks,
    /// collisions, weapon, then effect expiry. `now` is session time.
    pub fn tick(&mut self, input: InputState, now: Duration) -> TickReport {
        pilot::steer(&mut self.flight, &input, &self.pilot);
        self.flight.integrate();
        pilot::enforce_altitude_band(&mut self.flight, &self.pilot);

        self.orbit.advance();
        self.orbit.sync(&mut self.collisions);

        self.collisions.check(
            &BodyId::Local,
            self.flight.body_mut(),
            &self.replication,
            now,
        );

        let mut report = TickReport::default();
        while let Ok(event) = self.collision_rx.try_recv() {
            debug!(other = %event.other, point = ?event.point, "collision");
            self.weapon.flash(event.point, now, &mut self.effects);
            report.collisions.push(event);
        }

        if input.fire {
            report.laser = self.weapon.fire(self.flight.body(), now, &mut self.effects);
        }
        report.expired = self.effects.expire(now);

        self.ticks += 1;
        report
    }

    /// Update message for the current local snapshot.
    pub fn outbound(&self) -> ClientMessage {
        self.replication.outbound(self.flight.state())
    }

    /// Applies a relay message and keeps peer colliders in step with proxies.
    pub fn apply_server_message(&mut self, msg: ServerMessage) {
        let changes = self.replication.apply(msg);
        self.sync_colliders(changes);
    }

    /// Drops every proxy and its collider after the transport is lost.
    pub fn connection_lost(&mut self) {
        let changes = self.replication.disconnect();
        info!(peers = changes.len(), "connection lost; clearing remote peers");
        self.sync_colliders(changes);
    }

    fn sync_colliders(&mut self, changes: Vec<RosterChange>) {
        for change in changes {
            match change {
                RosterChange::Added(id) => {
                    let peer_id = id.clone();
                    if let Err(e) = self.collisions.register(BodyId::Peer(id), self.peer_radius) {
                        warn!(peer_id = %peer_id, error = %e, "peer collider rejected");
                    }
                }
                // Tracked colliders pick up new positions on the next check.
                RosterChange::Moved(_) => {}
                RosterChange::Removed(id) => {
                    self.collisions.unregister(&BodyId::Peer(id));
                }
            }
        }
    }
}
