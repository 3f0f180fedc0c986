//! Tunable simulation parameters loaded from TOML.

use std::time::Duration;

use glam::Vec3;
use ruin_survival_collision::{Aabb, Capsule};
use serde::Deserialize;
use thiserror::Error;

/// Complete parameter set consumed by the world, the systems and the driver.
///
/// Every section defaults to the reference constant set, so a TOML document
/// only needs to mention the values it overrides.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Frame clock and substep parameters.
    pub driver: DriverConfig,
    /// Player movement, collision and health parameters.
    pub player: PlayerConfig,
    /// Projectile pool and ballistics parameters.
    pub projectiles: ProjectileConfig,
    /// Enemy behaviour parameters.
    pub enemies: EnemyConfig,
    /// Wave scheduling parameters.
    pub waves: WaveConfig,
    /// World boundary and level geometry parameters.
    pub world: WorldConfig,
}

impl SimulationConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects parameter combinations the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.driver.substeps == 0 {
            return Err(ConfigError::invalid("driver.substeps", "must be at least 1"));
        }
        ensure_positive("driver.max_frame_delta_secs", self.driver.max_frame_delta_secs)?;
        ensure_positive("player.max_health", self.player.max_health)?;
        ensure_positive("player.capsule_radius", self.player.capsule_radius)?;
        if self.projectiles.pool_size == 0 {
            return Err(ConfigError::invalid("projectiles.pool_size", "must be at least 1"));
        }
        ensure_positive("projectiles.radius", self.projectiles.radius)?;
        ensure_positive("projectiles.hit_radius", self.projectiles.hit_radius)?;
        if self.enemies.max_health <= 0 {
            return Err(ConfigError::invalid("enemies.max_health", "must be positive"));
        }
        ensure_positive("enemies.attack_cooldown_secs", self.enemies.attack_cooldown_secs)?;
        if self.enemies.attack_range >= self.enemies.chase_range {
            return Err(ConfigError::invalid(
                "enemies.attack_range",
                "must be smaller than enemies.chase_range",
            ));
        }
        let death_delay = self.enemies.death_delay_secs;
        if !death_delay.is_finite() || death_delay < 0.0 {
            return Err(ConfigError::invalid("enemies.death_delay_secs", "must not be negative"));
        }
        ensure_positive("waves.spawn_interval_secs", self.waves.spawn_interval_secs)?;
        Ok(())
    }
}

/// Frame clock parameters.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverConfig {
    /// Number of fixed substeps each frame is divided into.
    pub substeps: u32,
    /// Upper bound applied to the wall-clock delta of a single frame.
    pub max_frame_delta_secs: f32,
}

impl DriverConfig {
    /// Upper bound applied to a frame's elapsed time.
    #[must_use]
    pub fn max_frame_delta(&self) -> Duration {
        Duration::try_from_secs_f32(self.max_frame_delta_secs).unwrap_or(Duration::ZERO)
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            substeps: 3,
            max_frame_delta_secs: 0.05,
        }
    }
}

/// Player parameters.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    /// Health restored on reset.
    pub max_health: f32,
    /// Lower capsule endpoint at spawn.
    pub capsule_start: [f32; 3],
    /// Upper capsule endpoint at spawn; doubles as the eye position.
    pub capsule_end: [f32; 3],
    /// Capsule radius.
    pub capsule_radius: f32,
    /// Downward acceleration applied while airborne.
    pub gravity: f32,
    /// Horizontal acceleration gained per second of held input.
    pub move_speed: f32,
    /// Vertical velocity set when jumping.
    pub jump_impulse: f32,
    /// Maximum horizontal speed.
    pub max_speed: f32,
    /// Acceleration multiplier while airborne.
    pub air_control: f32,
    /// Horizontal velocity retained per substep while grounded.
    pub friction: f32,
    /// Minimum vertical normal component that counts as ground.
    pub ground_normal_threshold: f32,
    /// Distance probed below the capsule to keep resting players grounded.
    pub ground_probe_distance: f32,
    /// Multiplier applied to the penetration depth when pushing out.
    pub penetration_slop: f32,
    /// Fraction of the inbound normal velocity removed on contact.
    pub bounce_factor: f32,
    /// Cap on the velocity correction applied by a single contact.
    pub max_bounce_correction: f32,
}

impl PlayerConfig {
    /// Capsule the player occupies at spawn and after a reset.
    #[must_use]
    pub fn initial_capsule(&self) -> Capsule {
        Capsule::new(
            Vec3::from_array(self.capsule_start),
            Vec3::from_array(self.capsule_end),
            self.capsule_radius,
        )
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 5.0,
            capsule_start: [0.0, 1.35, 0.0],
            capsule_end: [0.0, 1.8, 0.0],
            capsule_radius: 0.35,
            gravity: 9.8,
            move_speed: 5.0,
            jump_impulse: 8.0,
            max_speed: 5.0,
            air_control: 0.5,
            friction: 0.9,
            ground_normal_threshold: 0.5,
            ground_probe_distance: 0.05,
            penetration_slop: 1.01,
            bounce_factor: 0.8,
            max_bounce_correction: 5.0,
        }
    }
}

/// Projectile parameters.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectileConfig {
    /// Number of pooled projectile slots.
    pub pool_size: usize,
    /// Sphere radius of a projectile.
    pub radius: f32,
    /// Downward acceleration applied to active projectiles.
    pub gravity: f32,
    /// Launch speed of hand throws.
    pub hand_speed: f32,
    /// Launch speed of motion-controller throws.
    pub controller_speed: f32,
    /// Distance in front of the eye position where projectiles appear.
    pub origin_offset: f32,
    /// Distance to an enemy's hit center that counts as a hit.
    pub hit_radius: f32,
    /// Projectiles below this height are parked.
    pub despawn_depth: f32,
    /// Height parked projectiles are moved to.
    pub parked_height: f32,
    /// Whether projectiles bounce off the player's capsule.
    pub collide_with_player: bool,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            pool_size: 100,
            radius: 0.1,
            gravity: 30.0,
            hand_speed: 20.0,
            controller_speed: 15.0,
            origin_offset: 0.5,
            hit_radius: 1.0,
            despawn_depth: -50.0,
            parked_height: -100.0,
            collide_with_player: false,
        }
    }
}

/// Enemy parameters.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnemyConfig {
    /// Health assigned at spawn.
    pub max_health: i32,
    /// Pursuit speed in units per second.
    pub speed: f32,
    /// Horizontal distance at or below which enemies attack.
    pub attack_range: f32,
    /// Horizontal distance below which enemies chase.
    pub chase_range: f32,
    /// Damage dealt per attack.
    pub attack_damage: f32,
    /// Time between attacks.
    pub attack_cooldown_secs: f32,
    /// Time a dead enemy stays in place before sinking.
    pub death_delay_secs: f32,
    /// Downward acceleration applied while sinking.
    pub sink_gravity: f32,
    /// Depth below the floor at which a sinking enemy is removed.
    pub removal_depth: f32,
    /// Horizontal spacing enforced between live enemies.
    pub separation_radius: f32,
    /// Height above an enemy's feet used as its hit center.
    pub hit_height: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            max_health: 3,
            speed: 1.5,
            attack_range: 1.5,
            chase_range: 15.0,
            attack_damage: 0.5,
            attack_cooldown_secs: 1.0,
            death_delay_secs: 2.0,
            sink_gravity: 2.0,
            removal_depth: 2.0,
            separation_radius: 0.8,
            hit_height: 0.9,
        }
    }
}

/// Wave scheduling parameters.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaveConfig {
    /// Last wave that will be spawned.
    pub max_waves: u32,
    /// Time between consecutive waves.
    pub spawn_interval_secs: f32,
    /// Half side of the square around the origin enemies spawn in.
    pub spawn_half_extent: f32,
    /// Seed for spawn position sampling.
    pub rng_seed: u64,
}

impl WaveConfig {
    /// Time between consecutive waves.
    #[must_use]
    pub fn spawn_interval(&self) -> Duration {
        Duration::try_from_secs_f32(self.spawn_interval_secs).unwrap_or(Duration::ZERO)
    }
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            max_waves: 15,
            spawn_interval_secs: 10.0,
            spawn_half_extent: 20.0,
            rng_seed: 0x5eed_0f_2b_ad_c0de,
        }
    }
}

/// World boundary parameters.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Minimum corner of the playable volume.
    pub bounds_min: [f32; 3],
    /// Maximum corner of the playable volume.
    pub bounds_max: [f32; 3],
    /// Height below which a falling player takes fatal damage.
    pub death_depth: f32,
    /// Height of the invisible safety floor.
    pub boundary_floor_height: f32,
    /// Half side of the invisible safety floor.
    pub boundary_floor_half_extent: f32,
    /// Distance of the invisible walls from the origin.
    pub wall_distance: f32,
    /// Height of the invisible walls.
    pub wall_height: f32,
    /// Thickness of the invisible walls.
    pub wall_thickness: f32,
    /// Height of the ground plane used when the level fails to load.
    pub fallback_floor_height: f32,
}

impl WorldConfig {
    /// Playable volume as a box.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::new(
            Vec3::from_array(self.bounds_min),
            Vec3::from_array(self.bounds_max),
        )
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            bounds_min: [-50.0, -5.0, -50.0],
            bounds_max: [50.0, 50.0, 50.0],
            death_depth: -25.0,
            boundary_floor_height: -0.5,
            boundary_floor_half_extent: 100.0,
            wall_distance: 50.0,
            wall_height: 30.0,
            wall_thickness: 5.0,
            fallback_floor_height: 0.0,
        }
    }
}

/// Errors raised while loading a [`SimulationConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid TOML or does not match the schema.
    #[error("could not parse simulation config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is outside the range the simulation supports.
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Constraint the value violated.
        reason: &'static str,
    },
}

impl ConfigError {
    const fn invalid(field: &'static str, reason: &'static str) -> Self {
        Self::Invalid { field, reason }
    }
}

fn ensure_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be a positive number"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_reference_constants() {
        let config = SimulationConfig::from_toml_str("").expect("config");
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.projectiles.pool_size, 100);
        assert_eq!(config.waves.max_waves, 15);
        assert_eq!(config.driver.max_frame_delta(), Duration::from_millis(50));
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = SimulationConfig::from_toml_str(
            "[driver]\nsubsteps = 5\n\n[waves]\nmax_waves = 3\n",
        )
        .expect("config");
        assert_eq!(config.driver.substeps, 5);
        assert!((config.driver.max_frame_delta_secs - 0.05).abs() < f32::EPSILON);
        assert_eq!(config.waves.max_waves, 3);
        assert!((config.waves.spawn_interval_secs - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn zero_substeps_are_rejected() {
        let error = SimulationConfig::from_toml_str("[driver]\nsubsteps = 0\n").unwrap_err();
        assert!(matches!(
            error,
            ConfigError::Invalid {
                field: "driver.substeps",
                ..
            }
        ));
    }

    #[test]
    fn overlapping_ranges_are_rejected() {
        let error =
            SimulationConfig::from_toml_str("[enemies]\nattack_range = 20.0\n").unwrap_err();
        assert!(matches!(error, ConfigError::Invalid { .. }));
    }

    #[test]
    fn unknown_fields_fail_to_parse() {
        let error = SimulationConfig::from_toml_str("[player]\nwings = true\n").unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
    }
}
