#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Player controller system integrating the capsule against the static world.
//!
//! Every [`Event::SubstepAdvanced`] advances the player through the same
//! pipeline: movement integration, collision correction against the world
//! surface, the fall-death check and finally the world-bounds check. The
//! result is proposed to the world as a single [`Command::MovePlayer`].

use glam::Vec3;
use log::{debug, trace};
use ruin_survival_collision::{Aabb, Capsule, CollisionSurface};
use ruin_survival_core::{
    Command, DamageSource, Event, InputState, PlayerConfig, PlayerMotion, PlayerSnapshot,
    WorldConfig,
};

/// Pure system that advances the player capsule once per physics substep.
#[derive(Debug)]
pub struct PlayerController {
    config: PlayerConfig,
    bounds: Aabb,
    death_depth: f32,
    capsule_height: f32,
}

impl PlayerController {
    /// Creates a controller for the provided player tuning and world limits.
    #[must_use]
    pub fn new(config: PlayerConfig, world: &WorldConfig) -> Self {
        let capsule = config.initial_capsule();
        Self {
            capsule_height: capsule.end.y - capsule.start.y,
            bounds: world.bounds(),
            death_depth: world.death_depth,
            config,
        }
    }

    /// Consumes world events and the player snapshot to emit movement commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        player: &PlayerSnapshot,
        input: &InputState,
        surface: &CollisionSurface,
        out: &mut Vec<Command>,
    ) {
        if player.dead {
            return;
        }

        let mut motion = player.motion();
        let mut stepped = false;
        for event in events {
            let Event::SubstepAdvanced { dt } = event else {
                continue;
            };
            let dt = dt.as_secs_f32();
            if dt <= 0.0 {
                continue;
            }

            let (next, fell) = self.step(motion, input, surface, dt);
            motion = next;
            stepped = true;
            out.push(Command::MovePlayer { motion });
            if fell {
                debug!("player fell below {}", self.death_depth);
                out.push(Command::DamagePlayer {
                    amount: player.max_health,
                    source: DamageSource::Fall,
                });
                break;
            }
        }

        if stepped {
            trace!(
                "player at {:?} grounded={}",
                motion.capsule.end,
                motion.on_ground
            );
        }
    }

    /// Advances one substep, reporting whether the player fell to their death.
    fn step(
        &self,
        motion: PlayerMotion,
        input: &InputState,
        surface: &CollisionSurface,
        dt: f32,
    ) -> (PlayerMotion, bool) {
        let mut capsule = motion.capsule;
        let mut velocity = motion.velocity;
        let mut safe_position = motion.safe_position;
        let mut on_ground = self.is_grounded(&capsule, surface);

        self.integrate(&mut capsule, &mut velocity, &mut on_ground, input, dt);

        on_ground = false;
        if let Some(contact) = surface.capsule_intersect(&capsule) {
            on_ground = contact.normal.y > self.config.ground_normal_threshold;
            capsule.translate(contact.normal * (contact.depth * self.config.penetration_slop));

            let approach = velocity.dot(contact.normal);
            if approach < 0.0 {
                let correction =
                    (-approach * self.config.bounce_factor).min(self.config.max_bounce_correction);
                velocity += contact.normal * correction;
            }
            if on_ground {
                safe_position = capsule.end;
            }
        }
        if !on_ground && velocity.y <= 0.0 {
            on_ground = self.is_grounded(&capsule, surface);
        }

        let mut next = PlayerMotion {
            capsule,
            velocity,
            on_ground,
            safe_position,
            returned_to_safety: false,
        };

        let fell = next.capsule.start.y < self.death_depth;
        if fell || self.out_of_bounds(next.capsule.end) {
            self.return_to_safety(&mut next);
        }
        (next, fell)
    }

    fn integrate(
        &self,
        capsule: &mut Capsule,
        velocity: &mut Vec3,
        on_ground: &mut bool,
        input: &InputState,
        dt: f32,
    ) {
        let control = if *on_ground {
            1.0
        } else {
            self.config.air_control
        };
        let speed_delta = dt * self.config.move_speed * control;

        if *on_ground {
            velocity.x *= self.config.friction;
            velocity.z *= self.config.friction;
        }

        *velocity += input.wish_direction() * speed_delta;

        let horizontal = Vec3::new(velocity.x, 0.0, velocity.z);
        if horizontal.length() > self.config.max_speed {
            let clamped = horizontal.normalize_or_zero() * self.config.max_speed;
            velocity.x = clamped.x;
            velocity.z = clamped.z;
        }

        if *on_ground && input.jump {
            velocity.y = self.config.jump_impulse;
            *on_ground = false;
        }

        if !*on_ground {
            velocity.y -= self.config.gravity * dt;
        }

        capsule.translate(*velocity * dt);
    }

    /// Probes slightly below the capsule for walkable ground.
    fn is_grounded(&self, capsule: &Capsule, surface: &CollisionSurface) -> bool {
        let mut probe = *capsule;
        probe.translate(Vec3::new(0.0, -self.config.ground_probe_distance, 0.0));
        surface
            .capsule_intersect(&probe)
            .is_some_and(|contact| contact.normal.y > self.config.ground_normal_threshold)
    }

    fn out_of_bounds(&self, position: Vec3) -> bool {
        position.x < self.bounds.min.x
            || position.x > self.bounds.max.x
            || position.z < self.bounds.min.z
            || position.z > self.bounds.max.z
            || position.y < self.bounds.min.y
    }

    fn return_to_safety(&self, motion: &mut PlayerMotion) {
        let safe = motion.safe_position;
        motion.capsule = Capsule::new(
            safe - Vec3::new(0.0, self.capsule_height, 0.0),
            safe,
            motion.capsule.radius,
        );
        motion.velocity = Vec3::ZERO;
        motion.returned_to_safety = true;
        debug!("player returned to safe position {safe:?}");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn controller() -> PlayerController {
        PlayerController::new(PlayerConfig::default(), &WorldConfig::default())
    }

    fn snapshot(capsule: Capsule, velocity: Vec3) -> PlayerSnapshot {
        PlayerSnapshot {
            capsule,
            velocity,
            on_ground: false,
            safe_position: Vec3::new(0.0, 1.8, 0.0),
            health: 5.0,
            max_health: 5.0,
            dead: false,
        }
    }

    fn substep() -> Event {
        Event::SubstepAdvanced {
            dt: Duration::from_secs_f32(1.0 / 180.0),
        }
    }

    #[test]
    fn leaving_the_bounds_returns_to_safety() {
        let capsule = Capsule::new(Vec3::new(60.0, 5.0, 0.0), Vec3::new(60.0, 5.45, 0.0), 0.35);
        let player = snapshot(capsule, Vec3::new(3.0, 0.0, 0.0));
        let mut commands = Vec::new();
        controller().handle(
            &[substep()],
            &player,
            &InputState::default(),
            &CollisionSurface::empty(),
            &mut commands,
        );

        let [Command::MovePlayer { motion }] = commands.as_slice() else {
            panic!("unexpected commands: {commands:?}");
        };
        assert!(motion.returned_to_safety);
        assert_eq!(motion.velocity, Vec3::ZERO);
        assert!((motion.capsule.start - Vec3::new(0.0, 1.35, 0.0)).length() < 1e-5);
        assert!((motion.capsule.end - Vec3::new(0.0, 1.8, 0.0)).length() < 1e-5);
    }

    #[test]
    fn falling_past_death_depth_costs_full_health() {
        let capsule = Capsule::new(
            Vec3::new(0.0, -30.0, 0.0),
            Vec3::new(0.0, -29.55, 0.0),
            0.35,
        );
        let player = snapshot(capsule, Vec3::new(0.0, -10.0, 0.0));
        let mut commands = Vec::new();
        controller().handle(
            &[substep(), substep()],
            &player,
            &InputState::default(),
            &CollisionSurface::empty(),
            &mut commands,
        );

        assert_eq!(commands.len(), 2);
        assert!(matches!(
            commands[0],
            Command::MovePlayer { motion } if motion.returned_to_safety
        ));
        assert_eq!(
            commands[1],
            Command::DamagePlayer {
                amount: 5.0,
                source: DamageSource::Fall,
            }
        );
    }

    #[test]
    fn dead_players_do_not_move() {
        let mut player = snapshot(Capsule::new(Vec3::ZERO, Vec3::Y, 0.35), Vec3::X);
        player.dead = true;
        let mut commands = Vec::new();
        controller().handle(
            &[substep()],
            &player,
            &InputState::default(),
            &CollisionSurface::empty(),
            &mut commands,
        );
        assert!(commands.is_empty());
    }

    #[test]
    fn airborne_player_accelerates_downwards() {
        let capsule = Capsule::new(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.0, 10.45, 0.0), 0.35);
        let player = snapshot(capsule, Vec3::ZERO);
        let mut commands = Vec::new();
        controller().handle(
            &[substep()],
            &player,
            &InputState::default(),
            &CollisionSurface::empty(),
            &mut commands,
        );
        let [Command::MovePlayer { motion }] = commands.as_slice() else {
            panic!("unexpected commands: {commands:?}");
        };
        assert!(motion.velocity.y < 0.0);
        assert!(!motion.on_ground);
    }
}
