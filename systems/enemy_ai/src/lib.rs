#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Enemy state machine driving pursuit, melee attacks and death decay.
//!
//! The system runs once per frame. Each live enemy is classified by its
//! horizontal distance to the player into `Idle`, `Walk` or `Attack`. Attacks
//! also need the player's capsule within `attack_range` vertically. Dead
//! enemies wait out the post-death delay, sink under gravity and are finally
//! removed from the roster. A symmetric separation pass keeps live enemies
//! from stacking on top of each other.

use glam::Vec3;
use log::debug;
use ruin_survival_collision::{horizontal_direction, horizontal_distance, Capsule};
use ruin_survival_core::{
    Command, DamageSource, EnemyConfig, EnemyId, EnemySnapshot, EnemyState, EnemyUpdate,
    EnemyView, Event, PlayerSnapshot,
};

/// Pure system that advances every active enemy once per frame.
#[derive(Debug)]
pub struct EnemyAi {
    config: EnemyConfig,
}

impl EnemyAi {
    /// Creates the system from enemy tuning.
    #[must_use]
    pub fn new(config: EnemyConfig) -> Self {
        Self { config }
    }

    /// Consumes world events and immutable views to emit enemy commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        enemies: &EnemyView,
        player: &PlayerSnapshot,
        out: &mut Vec<Command>,
    ) {
        let dt: f32 = events
            .iter()
            .filter_map(|event| match event {
                Event::FrameAdvanced { dt } => Some(dt.as_secs_f32()),
                _ => None,
            })
            .sum();
        if dt <= 0.0 || enemies.is_empty() {
            return;
        }

        let mut updates: Vec<(EnemyId, EnemyUpdate)> = Vec::with_capacity(enemies.len());
        for enemy in enemies.iter() {
            if enemy.is_alive() && !enemy.state.is_terminal() {
                updates.push((enemy.id, self.pursue(enemy, &player.capsule, dt, out)));
                continue;
            }

            let update = self.decay(enemy, dt);
            let floor = enemy.death_height.unwrap_or(enemy.position.y) - self.config.removal_depth;
            if update.position.y < floor {
                debug!("enemy {} settled below the floor", enemy.id.get());
                out.push(Command::RemoveEnemy { enemy: enemy.id });
            } else {
                updates.push((enemy.id, update));
            }
        }

        separate(&mut updates, self.config.separation_radius);

        for (enemy, update) in updates {
            out.push(Command::UpdateEnemy { enemy, update });
        }
    }

    fn pursue(
        &self,
        enemy: &EnemySnapshot,
        player: &Capsule,
        dt: f32,
        out: &mut Vec<Command>,
    ) -> EnemyUpdate {
        let mut update = enemy.to_update();
        let target = player.end;
        let distance = horizontal_distance(enemy.position, target);
        let within_reach = vertical_gap(enemy.position, player) <= self.config.attack_range;

        if distance <= self.config.attack_range && within_reach {
            update.state = EnemyState::Attack;
            update.attack_timer += dt;
            if update.attack_timer >= self.config.attack_cooldown_secs {
                out.push(Command::DamagePlayer {
                    amount: self.config.attack_damage,
                    source: DamageSource::Enemy { enemy: enemy.id },
                });
                update.attack_timer = 0.0;
            }
        } else if distance < self.config.chase_range {
            update.state = EnemyState::Walk;
            if let Some(direction) = horizontal_direction(enemy.position, target) {
                let step = (self.config.speed * dt).min(distance);
                update.position += direction * step;
                update.yaw = direction.x.atan2(direction.z);
            }
        } else {
            update.state = EnemyState::Idle;
        }
        update
    }

    fn decay(&self, enemy: &EnemySnapshot, dt: f32) -> EnemyUpdate {
        let mut update = enemy.to_update();
        update.state = EnemyState::Die;

        let remaining = update.death_timer.unwrap_or(self.config.death_delay_secs) - dt;
        update.death_timer = Some(remaining.max(0.0));
        if remaining <= 0.0 {
            update.sink_velocity += self.config.sink_gravity * dt;
            update.position.y -= update.sink_velocity * dt;
        }
        update
    }
}

/// Height between the enemy's feet and the nearest point of the player's capsule.
fn vertical_gap(feet: Vec3, player: &Capsule) -> f32 {
    let bottom = player.start.y.min(player.end.y) - player.radius;
    let top = player.start.y.max(player.end.y) + player.radius;
    (bottom - feet.y).max(feet.y - top).max(0.0)
}

/// Pushes overlapping live enemies apart by half the overlap each.
fn separate(updates: &mut [(EnemyId, EnemyUpdate)], radius: f32) {
    if radius <= 0.0 {
        return;
    }
    for first in 0..updates.len() {
        let (head, tail) = updates.split_at_mut(first + 1);
        let a = &mut head[first].1;
        if a.state.is_terminal() {
            continue;
        }
        for (_, b) in tail.iter_mut().filter(|(_, b)| !b.state.is_terminal()) {
            let distance = horizontal_distance(a.position, b.position);
            if distance >= radius {
                continue;
            }
            // coincident enemies are split along X
            let push = horizontal_direction(b.position, a.position).unwrap_or(Vec3::X)
                * ((radius - distance) * 0.5);
            a.position += push;
            b.position -= push;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walker(x: f32, z: f32) -> (EnemyId, EnemyUpdate) {
        (
            EnemyId::new(0),
            EnemyUpdate {
                state: EnemyState::Walk,
                position: Vec3::new(x, 0.0, z),
                yaw: 0.0,
                attack_timer: 0.0,
                death_timer: None,
                sink_velocity: 0.0,
            },
        )
    }

    #[test]
    fn vertical_gap_is_zero_inside_the_capsule_span() {
        let player = Capsule::new(Vec3::new(0.0, 1.35, 0.0), Vec3::new(0.0, 1.8, 0.0), 0.35);
        assert!((vertical_gap(Vec3::ZERO, &player) - 1.0).abs() < 1e-5);
        assert_eq!(vertical_gap(Vec3::new(0.0, 1.5, 0.0), &player), 0.0);
        assert!((vertical_gap(Vec3::new(0.0, 4.15, 0.0), &player) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn separation_is_symmetric() {
        let mut updates = vec![walker(0.0, 0.0), walker(0.4, 0.0)];
        separate(&mut updates, 0.8);
        let a = updates[0].1.position;
        let b = updates[1].1.position;
        assert!((a.x + 0.2).abs() < 1e-5);
        assert!((b.x - 0.6).abs() < 1e-5);
        assert!(((a + b) * 0.5 - Vec3::new(0.2, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn coincident_enemies_are_split() {
        let mut updates = vec![walker(1.0, 1.0), walker(1.0, 1.0)];
        separate(&mut updates, 0.8);
        let gap = horizontal_distance(updates[0].1.position, updates[1].1.position);
        assert!((gap - 0.8).abs() < 1e-5);
    }

    #[test]
    fn dying_enemies_are_not_pushed() {
        let mut updates = vec![walker(0.0, 0.0), walker(0.1, 0.0)];
        updates[1].1.state = EnemyState::Die;
        separate(&mut updates, 0.8);
        assert_eq!(updates[1].1.position, Vec3::new(0.1, 0.0, 0.0));
        assert_eq!(updates[0].1.position, Vec3::ZERO);
    }
}
