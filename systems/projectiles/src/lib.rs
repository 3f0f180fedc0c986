#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Ballistic integration and collision response for pooled projectiles.

use glam::Vec3;
use log::trace;
use ruin_survival_collision::{resolve_sphere_pair, sphere_capsule, within_distance, Sphere};
use ruin_survival_core::{
    Command, EnemyConfig, EnemyId, EnemyView, Event, PlayerSnapshot, ProjectileConfig,
    ProjectileSlot, ProjectileView,
};

#[derive(Clone, Copy, Debug)]
struct Flight {
    slot: ProjectileSlot,
    sphere: Sphere,
    velocity: Vec3,
    active: bool,
}

#[derive(Clone, Copy, Debug)]
struct Target {
    id: EnemyId,
    center: Vec3,
    health: i32,
}

/// Pure system advancing every active projectile once per physics substep.
#[derive(Debug)]
pub struct Ballistics {
    config: ProjectileConfig,
    hit_height: f32,
}

impl Ballistics {
    /// Creates the system from projectile tuning and the enemy hit volume.
    #[must_use]
    pub fn new(config: ProjectileConfig, enemies: &EnemyConfig) -> Self {
        Self {
            config,
            hit_height: enemies.hit_height,
        }
    }

    /// Consumes world events and immutable views to emit projectile commands.
    ///
    /// Projectiles pass through level geometry; a miss keeps falling until it
    /// drops below the despawn depth and is parked. Enemy health is tracked
    /// locally while resolving hits so that several projectiles arriving in the
    /// same substep never strike a dead enemy.
    pub fn handle(
        &mut self,
        events: &[Event],
        projectiles: &ProjectileView,
        enemies: &EnemyView,
        player: &PlayerSnapshot,
        out: &mut Vec<Command>,
    ) {
        let mut flights: Vec<Flight> = projectiles
            .active()
            .map(|snapshot| Flight {
                slot: snapshot.slot,
                sphere: snapshot.sphere,
                velocity: snapshot.velocity,
                active: true,
            })
            .collect();
        if flights.is_empty() {
            return;
        }

        let mut targets: Vec<Target> = enemies
            .iter()
            .filter(|enemy| enemy.is_alive())
            .map(|enemy| Target {
                id: enemy.id,
                center: enemy.position + Vec3::new(0.0, self.hit_height, 0.0),
                health: enemy.health,
            })
            .collect();

        let mut stepped = false;
        for event in events {
            let Event::SubstepAdvanced { dt } = event else {
                continue;
            };
            let dt = dt.as_secs_f32();
            if dt <= 0.0 {
                continue;
            }
            stepped = true;

            for flight in flights.iter_mut().filter(|flight| flight.active) {
                self.advance(flight, dt);
                if !flight.active {
                    out.push(Command::ParkProjectile { slot: flight.slot });
                    continue;
                }
                if let Some(enemy) = self.strike(flight, &mut targets) {
                    out.push(Command::HitEnemy {
                        enemy,
                        slot: flight.slot,
                    });
                }
            }

            separate(&mut flights);
            if self.config.collide_with_player && !player.dead {
                for flight in flights.iter_mut().filter(|flight| flight.active) {
                    deflect_from_player(flight, player);
                }
            }
        }

        if !stepped {
            return;
        }

        let mut moved = 0_usize;
        for flight in flights.iter().filter(|flight| flight.active) {
            moved += 1;
            out.push(Command::MoveProjectile {
                slot: flight.slot,
                center: flight.sphere.center,
                velocity: flight.velocity,
            });
        }
        trace!("advanced {moved} projectiles");
    }

    fn advance(&self, flight: &mut Flight, dt: f32) {
        flight.velocity.y -= self.config.gravity * dt;
        flight.sphere.center += flight.velocity * dt;

        if flight.sphere.center.y < self.config.despawn_depth || !flight.sphere.center.is_finite()
        {
            flight.active = false;
        }
    }

    /// Tests live targets in identifier order; at most one is struck.
    fn strike(&self, flight: &mut Flight, targets: &mut [Target]) -> Option<EnemyId> {
        let target = targets.iter_mut().find(|target| {
            target.health > 0
                && within_distance(flight.sphere.center, target.center, self.config.hit_radius)
        })?;
        target.health -= 1;
        flight.active = false;
        Some(target.id)
    }
}

fn separate(flights: &mut [Flight]) {
    for first in 0..flights.len() {
        let (head, tail) = flights.split_at_mut(first + 1);
        let a = &mut head[first];
        if !a.active {
            continue;
        }
        for b in tail.iter_mut().filter(|flight| flight.active) {
            let _ = resolve_sphere_pair(
                &mut a.sphere,
                &mut a.velocity,
                &mut b.sphere,
                &mut b.velocity,
            );
        }
    }
}

fn deflect_from_player(flight: &mut Flight, player: &PlayerSnapshot) {
    let Some(contact) = sphere_capsule(&flight.sphere, &player.capsule) else {
        return;
    };
    flight.sphere.center += contact.normal * contact.depth;
    let approach = flight.velocity.dot(contact.normal);
    if approach < 0.0 {
        flight.velocity -= contact.normal * (2.0 * approach);
    }
}
