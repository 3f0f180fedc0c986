use glam::Vec3;
use ruin_survival_core::{EnemyId, EnemySnapshot, EnemyState, EnemyUpdate};

/// Enemy requested by a wave whose assets have not settled yet.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PendingEnemy {
    pub(crate) id: EnemyId,
    pub(crate) position: Vec3,
}

#[derive(Clone, Copy, Debug)]
struct Enemy {
    id: EnemyId,
    state: EnemyState,
    health: i32,
    position: Vec3,
    yaw: f32,
    attack_timer: f32,
    death_timer: Option<f32>,
    sink_velocity: f32,
    death_height: Option<f32>,
}

/// Result of a projectile striking an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HitOutcome {
    /// The enemy is unknown or already dead.
    Ignored,
    /// The enemy survived with the provided health.
    Wounded { health: i32 },
    /// The enemy's health crossed to zero with this hit, leaving `from`.
    Killed { from: EnemyState },
}

/// Pending and active enemies. Identifiers are never reused.
#[derive(Clone, Debug)]
pub(crate) struct Roster {
    pending: Vec<PendingEnemy>,
    active: Vec<Enemy>,
    next_id: u32,
    max_health: i32,
}

impl Roster {
    pub(crate) fn new(max_health: i32) -> Self {
        Self {
            pending: Vec::new(),
            active: Vec::new(),
            next_id: 0,
            max_health,
        }
    }

    pub(crate) fn request(&mut self, position: Vec3) -> EnemyId {
        let id = EnemyId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.pending.push(PendingEnemy { id, position });
        id
    }

    pub(crate) fn activate(&mut self, enemy: EnemyId) -> Option<Vec3> {
        let index = self.pending.iter().position(|pending| pending.id == enemy)?;
        let pending = self.pending.remove(index);
        self.active.push(Enemy {
            id: pending.id,
            state: EnemyState::Idle,
            health: self.max_health,
            position: pending.position,
            yaw: 0.0,
            attack_timer: 0.0,
            death_timer: None,
            sink_velocity: 0.0,
            death_height: None,
        });
        Some(pending.position)
    }

    pub(crate) fn hit(&mut self, enemy: EnemyId, death_delay: f32) -> HitOutcome {
        let Some(target) = self.enemy_mut(enemy) else {
            return HitOutcome::Ignored;
        };
        if target.health <= 0 {
            return HitOutcome::Ignored;
        }

        target.health -= 1;
        if target.health > 0 {
            return HitOutcome::Wounded {
                health: target.health,
            };
        }

        let from = std::mem::replace(&mut target.state, EnemyState::Die);
        target.death_timer = Some(death_delay);
        target.death_height = Some(target.position.y);
        target.attack_timer = 0.0;
        HitOutcome::Killed { from }
    }

    /// Stores an AI update, returning the previous state when it was applied.
    ///
    /// Dead enemies stay in [`EnemyState::Die`] whatever the update says.
    pub(crate) fn update(&mut self, enemy: EnemyId, update: &EnemyUpdate) -> Option<EnemyState> {
        let target = self.enemy_mut(enemy)?;
        if !update.position.is_finite() {
            return None;
        }

        let previous = target.state;
        let dead = target.health <= 0 || previous.is_terminal();
        target.state = if dead { EnemyState::Die } else { update.state };
        target.position = update.position;
        target.yaw = if update.yaw.is_finite() {
            update.yaw
        } else {
            target.yaw
        };
        target.attack_timer = update.attack_timer.max(0.0);
        target.sink_velocity = update.sink_velocity;
        if target.state.is_terminal() {
            target.death_timer = update.death_timer.or(target.death_timer);
            if target.death_height.is_none() {
                target.death_height = Some(target.position.y);
            }
        }
        Some(previous)
    }

    pub(crate) fn remove(&mut self, enemy: EnemyId) -> bool {
        let Some(index) = self
            .active
            .iter()
            .position(|candidate| candidate.id == enemy && candidate.state.is_terminal())
        else {
            return false;
        };
        let _ = self.active.remove(index);
        true
    }

    /// Drops every enemy while keeping the identifier counter.
    pub(crate) fn clear(&mut self) {
        self.pending.clear();
        self.active.clear();
    }

    pub(crate) fn pending(&self) -> &[PendingEnemy] {
        &self.pending
    }

    pub(crate) fn snapshots(&self) -> Vec<EnemySnapshot> {
        self.active
            .iter()
            .map(|enemy| EnemySnapshot {
                id: enemy.id,
                state: enemy.state,
                health: enemy.health,
                position: enemy.position,
                yaw: enemy.yaw,
                attack_timer: enemy.attack_timer,
                death_timer: enemy.death_timer,
                sink_velocity: enemy.sink_velocity,
                death_height: enemy.death_height,
            })
            .collect()
    }

    fn enemy_mut(&mut self, enemy: EnemyId) -> Option<&mut Enemy> {
        self.active.iter_mut().find(|candidate| candidate.id == enemy)
    }
}
