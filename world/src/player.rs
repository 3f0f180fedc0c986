use glam::Vec3;
use ruin_survival_collision::Capsule;
use ruin_survival_core::{PlayerConfig, PlayerMotion, PlayerSnapshot};

/// Outcome of applying damage to the player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum DamageOutcome {
    /// Damage was rejected because the player is dead or the amount is invalid.
    Ignored,
    /// Health decreased but the player survived.
    Wounded { health: f32 },
    /// Health crossed to zero with this hit.
    Killed,
}

/// Authoritative player record.
#[derive(Clone, Debug)]
pub(crate) struct Player {
    capsule: Capsule,
    velocity: Vec3,
    on_ground: bool,
    safe_position: Vec3,
    health: f32,
    max_health: f32,
    dead: bool,
}

impl Player {
    pub(crate) fn new(config: &PlayerConfig) -> Self {
        let capsule = config.initial_capsule();
        Self {
            safe_position: capsule.end,
            capsule,
            velocity: Vec3::ZERO,
            on_ground: false,
            health: config.max_health,
            max_health: config.max_health,
            dead: false,
        }
    }

    pub(crate) const fn is_dead(&self) -> bool {
        self.dead
    }

    pub(crate) const fn health(&self) -> f32 {
        self.health
    }

    pub(crate) const fn max_health(&self) -> f32 {
        self.max_health
    }

    pub(crate) fn eye(&self) -> Vec3 {
        self.capsule.end
    }

    pub(crate) fn apply_motion(&mut self, motion: &PlayerMotion) -> bool {
        if self.dead {
            return false;
        }
        if !motion.velocity.is_finite() || !motion.capsule.start.is_finite() {
            return false;
        }

        self.capsule = Capsule::new(motion.capsule.start, motion.capsule.end, self.capsule.radius);
        self.velocity = motion.velocity;
        self.on_ground = motion.on_ground;
        self.safe_position = motion.safe_position;
        true
    }

    pub(crate) fn damage(&mut self, amount: f32) -> DamageOutcome {
        if self.dead || !amount.is_finite() || amount <= 0.0 {
            return DamageOutcome::Ignored;
        }

        self.health = (self.health - amount).clamp(0.0, self.max_health);
        if self.health > 0.0 {
            return DamageOutcome::Wounded {
                health: self.health,
            };
        }

        self.dead = true;
        self.velocity = Vec3::ZERO;
        DamageOutcome::Killed
    }

    pub(crate) fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            capsule: self.capsule,
            velocity: self.velocity,
            on_ground: self.on_ground,
            safe_position: self.safe_position,
            health: self.health,
            max_health: self.max_health,
            dead: self.dead,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_is_clamped_and_death_is_reported_once() {
        let mut player = Player::new(&PlayerConfig::default());
        assert_eq!(player.damage(2.0), DamageOutcome::Wounded { health: 3.0 });
        assert_eq!(player.damage(10.0), DamageOutcome::Killed);
        assert_eq!(player.health(), 0.0);
        assert_eq!(player.damage(1.0), DamageOutcome::Ignored);
        assert!(player.is_dead());
    }

    #[test]
    fn negative_damage_does_not_heal() {
        let mut player = Player::new(&PlayerConfig::default());
        assert_eq!(player.damage(-3.0), DamageOutcome::Ignored);
        assert_eq!(player.damage(f32::NAN), DamageOutcome::Ignored);
        assert_eq!(player.health(), player.max_health());
    }

    #[test]
    fn motion_keeps_capsule_radius() {
        let mut player = Player::new(&PlayerConfig::default());
        let motion = PlayerMotion {
            capsule: Capsule::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(1.0, 2.45, 3.0), 9.0),
            velocity: Vec3::X,
            on_ground: true,
            safe_position: Vec3::new(1.0, 2.45, 3.0),
            returned_to_safety: false,
        };
        assert!(player.apply_motion(&motion));
        assert_eq!(player.snapshot().capsule.radius, 0.35);
        assert_eq!(player.eye(), Vec3::new(1.0, 2.45, 3.0));
    }
}
