// Short-lived visual effects and the weapon that spawns lasers.
//
// Effects are plain entries with an expiry time; the tick releases them,
// so nothing outlives the session that created it.

use super::body::Body;
use glam::Vec3;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum EffectKind {
    Laser {
        origin: Vec3,
        direction: Vec3,
        length: f32,
    },
    CollisionFlash {
        point: Vec3,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransientEffect {
    pub id: u64,
    pub kind: EffectKind,
    pub expires_at: Duration,
}

#[derive(Debug, Default)]
pub struct EffectTracker {
    effects: Vec<TransientEffect>,
    next_id: u64,
}

impl EffectTracker {
    pub fn spawn(&mut self, kind: EffectKind, now: Duration, lifetime: Duration) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.effects.push(TransientEffect {
            id,
            kind,
            expires_at: now + lifetime,
        });
        id
    }

    /// Removes and returns every effect whose lifetime has run out.
    pub fn expire(&mut self, now: Duration) -> Vec<TransientEffect> {
        let (expired, live): (Vec<_>, Vec<_>) = std::mem::take(&mut self.effects)
            .into_iter()
            .partition(|e| e.expires_at <= now);
        self.effects = live;
        expired
    }

    pub fn cancel(&mut self, id: u64) -> Option<TransientEffect> {
        let index = self.effects.iter().position(|e| e.id == id)?;
        Some(self.effects.remove(index))
    }

    pub fn active(&self) -> &[TransientEffect] {
        &self.effects
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

/// Gameplay tuning for the laser and collision feedback.
#[derive(Debug, Clone, Copy)]
pub struct WeaponTuning {
    /// Minimum time between two shots.
    pub shot_delay: Duration,

    pub laser_lifetime: Duration,

    pub laser_length: f32,

    /// How long a collision flash stays visible.
    pub flash_lifetime: Duration,
}

impl Default for WeaponTuning {
    fn default() -> Self {
        Self {
            shot_delay: Duration::from_millis(200),
            laser_lifetime: Duration::from_millis(1000),
            laser_length: 100.0,
            flash_lifetime: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Default)]
pub struct Weapon {
    tuning: WeaponTuning,
    last_shot: Option<Duration>,
}

impl Weapon {
    pub fn new(tuning: WeaponTuning) -> Self {
        Self {
            tuning,
            last_shot: None,
        }
    }

    /// Fires along the body's nose unless the previous shot is too recent.
    pub fn fire(&mut self, body: &Body, now: Duration, effects: &mut EffectTracker) -> Option<u64> {
        if let Some(last) = self.last_shot
            && now.saturating_sub(last) < self.tuning.shot_delay
        {
            return None;
        }
        self.last_shot = Some(now);

        let laser = EffectKind::Laser {
            origin: body.position,
            direction: body.forward(),
            length: self.tuning.laser_length,
        };
        Some(effects.spawn(laser, now, self.tuning.laser_lifetime))
    }

    pub fn flash(&self, point: Vec3, now: Duration, effects: &mut EffectTracker) -> u64 {
        effects.spawn(
            EffectKind::CollisionFlash { point },
            now,
            self.tuning.flash_lifetime,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn when_fire_is_held_then_shots_respect_the_delay() {
        let mut weapon = Weapon::default();
        let mut effects = EffectTracker::default();
        let body = Body::default();

        assert!(weapon.fire(&body, ms(0), &mut effects).is_some());
        assert!(weapon.fire(&body, ms(150), &mut effects).is_none());
        assert!(weapon.fire(&body, ms(200), &mut effects).is_some());
        assert_eq!(effects.len(), 2);
    }

    #[test]
    fn when_laser_is_fired_then_it_points_along_the_nose() {
        let mut weapon = Weapon::default();
        let mut effects = EffectTracker::default();
        let body = Body::at(Vec3::new(0.0, 0.0, 120.0));

        weapon.fire(&body, ms(0), &mut effects);

        assert_eq!(
            effects.active()[0].kind,
            EffectKind::Laser {
                origin: Vec3::new(0.0, 0.0, 120.0),
                direction: Vec3::NEG_Z,
                length: 100.0,
            }
        );
    }

    #[test]
    fn when_lifetimes_run_out_then_expire_releases_only_those_effects() {
        let weapon = Weapon::default();
        let mut effects = EffectTracker::default();
        let flash = weapon.flash(Vec3::ONE, ms(0), &mut effects);
        let later = weapon.flash(Vec3::ONE, ms(100), &mut effects);

        let expired = effects.expire(ms(200));

        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, flash);
        assert_eq!(effects.active()[0].id, later);
        assert_eq!(effects.expire(ms(300)).len(), 1);
        assert!(effects.is_empty());
    }

    #[test]
    fn when_effect_is_cancelled_then_it_is_gone_before_expiry() {
        let mut effects = EffectTracker::default();
        let id = effects.spawn(EffectKind::CollisionFlash { point: Vec3::ZERO }, ms(0), ms(200));

        assert!(effects.cancel(id).is_some());
        assert!(effects.cancel(id).is_none());
        assert!(effects.expire(ms(1000)).is_empty());
    }
}
