#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Ruin Survival.

mod enemies;
mod player;
mod projectiles;

use glam::Vec3;
use log::{debug, info};
use ruin_survival_collision::{CollisionSurface, SurfaceBuilder};
use ruin_survival_core::{
    Command, DamageSource, EnemyState, Event, LevelGeometry, PlayState, SimulationConfig,
    ThrowKind, WorldConfig, WELCOME_BANNER,
};

use enemies::{HitOutcome, Roster};
use player::{DamageOutcome, Player};
use projectiles::ProjectilePool;

/// Represents the authoritative Ruin Survival world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: SimulationConfig,
    play_state: PlayState,
    session_started: bool,
    player: Player,
    projectiles: ProjectilePool,
    enemies: Roster,
    wave: u32,
    waves_finished: bool,
    kill_count: u32,
    surface: CollisionSurface,
}

impl World {
    /// Creates a new world using the reference constant set.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SimulationConfig::default())
    }

    /// Creates a new world using the provided parameters.
    ///
    /// The collision surface initially contains only the boundary floor and
    /// walls; level geometry arrives later through [`Command::InstallLevel`].
    #[must_use]
    pub fn with_config(config: SimulationConfig) -> Self {
        Self {
            banner: WELCOME_BANNER,
            play_state: PlayState::Running,
            session_started: false,
            player: Player::new(&config.player),
            projectiles: ProjectilePool::new(&config.projectiles),
            enemies: Roster::new(config.enemies.max_health),
            wave: 0,
            waves_finished: false,
            kill_count: 0,
            surface: boundary(&config.world).build(),
            config,
        }
    }

    fn is_running(&self) -> bool {
        self.play_state == PlayState::Running
    }

    fn reset(&mut self) {
        self.player = Player::new(&self.config.player);
        self.projectiles.reset();
        self.enemies.clear();
        self.wave = 0;
        self.waves_finished = false;
        self.kill_count = 0;
    }

    fn throw_speed(&self, kind: ThrowKind) -> f32 {
        match kind {
            ThrowKind::Hand => self.config.projectiles.hand_speed,
            ThrowKind::Controller => self.config.projectiles.controller_speed,
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StartSession => {
            if world.session_started {
                return;
            }
            world.session_started = true;
            world.play_state = PlayState::Running;
            info!("session started");
            out_events.push(Event::SessionStarted);
        }
        Command::Reset => {
            world.reset();
            world.session_started = true;
            info!("session reset");
            out_events.push(Event::SessionReset);
            if world.play_state != PlayState::Running {
                world.play_state = PlayState::Running;
                out_events.push(Event::PlayStateChanged {
                    state: PlayState::Running,
                });
            }
        }
        Command::SetPlayState { state } => {
            if world.play_state == state {
                return;
            }
            world.play_state = state;
            debug!("play state changed to {state:?}");
            out_events.push(Event::PlayStateChanged { state });
        }
        Command::AdvanceSubstep { dt } => {
            if world.is_running() {
                out_events.push(Event::SubstepAdvanced { dt });
            }
        }
        Command::AdvanceFrame { dt } => {
            if world.is_running() {
                out_events.push(Event::FrameAdvanced { dt });
            }
        }
        Command::InstallLevel { geometry } => {
            let builder = boundary(&world.config.world);
            let fallback = matches!(geometry, LevelGeometry::Fallback);
            let builder = match geometry {
                LevelGeometry::Loaded(triangles) => builder.with_triangles(triangles),
                LevelGeometry::Fallback => builder.with_plane(
                    world.config.world.fallback_floor_height,
                    world.config.world.boundary_floor_half_extent,
                ),
            };
            world.surface = builder.build();
            let triangles = world.surface.triangle_count();
            info!("installed level collision surface with {triangles} triangles");
            out_events.push(Event::LevelInstalled {
                triangles,
                fallback,
            });
        }
        Command::MovePlayer { motion } => {
            if !world.is_running() {
                return;
            }
            if world.player.apply_motion(&motion) && motion.returned_to_safety {
                out_events.push(Event::PlayerReturnedToSafety {
                    position: motion.safe_position,
                });
            }
        }
        Command::DamagePlayer { amount, source } => {
            apply_player_damage(world, amount, source, out_events);
        }
        Command::ThrowProjectile { direction, kind } => {
            if !world.is_running() || world.player.is_dead() {
                return;
            }
            let Some(direction) = direction.try_normalize() else {
                return;
            };
            let origin = world.player.eye() + direction * world.config.projectiles.origin_offset;
            let velocity = direction * world.throw_speed(kind);
            let slot = world.projectiles.launch(origin, velocity);
            out_events.push(Event::ProjectileThrown { slot, kind });
        }
        Command::MoveProjectile {
            slot,
            center,
            velocity,
        } => {
            let _ = world.projectiles.set(slot, center, velocity);
        }
        Command::ParkProjectile { slot } => {
            if world.projectiles.park(slot) {
                out_events.push(Event::ProjectileParked { slot });
            }
        }
        Command::HitEnemy { enemy, slot } => {
            let outcome = world
                .enemies
                .hit(enemy, world.config.enemies.death_delay_secs);
            if outcome == HitOutcome::Ignored {
                return;
            }
            if world.projectiles.park(slot) {
                out_events.push(Event::ProjectileParked { slot });
            }
            match outcome {
                HitOutcome::Wounded { health } => {
                    out_events.push(Event::EnemyHit { enemy, health });
                }
                HitOutcome::Killed { from } => {
                    world.kill_count = world.kill_count.saturating_add(1);
                    debug!("enemy {} killed", enemy.get());
                    out_events.push(Event::EnemyHit { enemy, health: 0 });
                    out_events.push(Event::EnemyStateChanged {
                        enemy,
                        from,
                        to: EnemyState::Die,
                    });
                    out_events.push(Event::EnemyKilled {
                        enemy,
                        kills: world.kill_count,
                    });
                }
                HitOutcome::Ignored => {}
            }
        }
        Command::BeginWave { wave, positions } => {
            if world.waves_finished || wave <= world.wave || wave > world.config.waves.max_waves {
                return;
            }
            world.wave = wave;
            let enemies = positions.len() as u32;
            for position in positions {
                let enemy = world.enemies.request(position);
                out_events.push(Event::EnemyRequested { enemy, position });
            }
            info!("wave {wave} started with {enemies} enemies");
            out_events.push(Event::WaveStarted { wave, enemies });
        }
        Command::FinishWaves => {
            if world.waves_finished {
                return;
            }
            world.waves_finished = true;
            info!("final wave reached");
            out_events.push(Event::WavesFinished);
        }
        Command::MarkEnemyReady { enemy } => {
            if let Some(position) = world.enemies.activate(enemy) {
                debug!("enemy {} ready", enemy.get());
                out_events.push(Event::EnemySpawned { enemy, position });
            }
        }
        Command::UpdateEnemy { enemy, update } => {
            let Some(from) = world.enemies.update(enemy, &update) else {
                return;
            };
            let to = if from.is_terminal() {
                from
            } else {
                update.state
            };
            if from != to {
                debug!("enemy {} {from:?} -> {to:?}", enemy.get());
                out_events.push(Event::EnemyStateChanged { enemy, from, to });
            }
        }
        Command::RemoveEnemy { enemy } => {
            if world.enemies.remove(enemy) {
                out_events.push(Event::EnemyRemoved { enemy });
            }
        }
    }
}

fn apply_player_damage(
    world: &mut World,
    amount: f32,
    source: DamageSource,
    out_events: &mut Vec<Event>,
) {
    let (health, killed) = match world.player.damage(amount) {
        DamageOutcome::Ignored => return,
        DamageOutcome::Wounded { health } => (health, false),
        DamageOutcome::Killed => (world.player.health(), true),
    };

    out_events.push(Event::PlayerDamaged {
        health,
        max_health: world.player.max_health(),
        source,
    });
    if killed {
        info!("player died ({source:?})");
        out_events.push(Event::PlayerDied);
    }
}

/// Invisible floor plus four perimeter walls enclosing the play area.
fn boundary(config: &WorldConfig) -> SurfaceBuilder {
    let distance = config.wall_distance;
    let half_height = config.wall_height * 0.5;
    let half_thickness = config.wall_thickness * 0.5;
    let center_y = config.boundary_floor_height + half_height;
    let along_x = Vec3::new(distance, half_height, half_thickness);
    let along_z = Vec3::new(half_thickness, half_height, distance);

    SurfaceBuilder::new()
        .with_plane(
            config.boundary_floor_height,
            config.boundary_floor_half_extent,
        )
        .with_box(Vec3::new(0.0, center_y, -distance), along_x)
        .with_box(Vec3::new(0.0, center_y, distance), along_x)
        .with_box(Vec3::new(-distance, center_y, 0.0), along_z)
        .with_box(Vec3::new(distance, center_y, 0.0), along_z)
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec3;
    use ruin_survival_collision::CollisionSurface;
    use ruin_survival_core::{
        EnemyId, EnemyView, PlayState, PlayerSnapshot, ProjectileView, SimulationConfig,
        WaveSnapshot,
    };

    use super::World;

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Parameters the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &SimulationConfig {
        &world.config
    }

    /// Current play state.
    #[must_use]
    pub fn play_state(world: &World) -> PlayState {
        world.play_state
    }

    /// Reports whether a session has been started.
    #[must_use]
    pub fn session_started(world: &World) -> bool {
        world.session_started
    }

    /// Captures the player's current state.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        world.player.snapshot()
    }

    /// Captures a read-only view of the active enemies.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.snapshots())
    }

    /// Enemies still waiting for their assets, in request order.
    #[must_use]
    pub fn pending_enemies(world: &World) -> Vec<(EnemyId, Vec3)> {
        world
            .enemies
            .pending()
            .iter()
            .map(|pending| (pending.id, pending.position))
            .collect()
    }

    /// Captures the whole projectile pool.
    #[must_use]
    pub fn projectile_view(world: &World) -> ProjectileView {
        ProjectileView::from_snapshots(world.projectiles.snapshots())
    }

    /// Wave progress for the current session.
    #[must_use]
    pub fn wave(world: &World) -> WaveSnapshot {
        WaveSnapshot {
            current: world.wave,
            max_waves: world.config.waves.max_waves,
            finished: world.waves_finished,
        }
    }

    /// Number of enemies killed this session.
    #[must_use]
    pub fn kill_count(world: &World) -> u32 {
        world.kill_count
    }

    /// Static collision surface queried by the physics systems.
    #[must_use]
    pub fn collision_surface(world: &World) -> &CollisionSurface {
        &world.surface
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ruin_survival_core::{
        EnemyId, EnemyState, EnemyUpdate, PlayerConfig, PlayerMotion, ProjectileSlot,
    };

    use super::*;

    fn run(world: &mut World, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, command, &mut events);
        events
    }

    fn spawn_enemy(world: &mut World, position: Vec3) -> EnemyId {
        let wave = query::wave(world).current + 1;
        let events = run(
            world,
            Command::BeginWave {
                wave,
                positions: vec![position],
            },
        );
        let Some(Event::EnemyRequested { enemy, .. }) = events.first().cloned() else {
            panic!("expected an enemy request, got {events:?}");
        };
        let _ = run(world, Command::MarkEnemyReady { enemy });
        enemy
    }

    #[test]
    fn session_starts_once() {
        let mut world = World::new();
        assert_eq!(run(&mut world, Command::StartSession), vec![Event::SessionStarted]);
        assert!(run(&mut world, Command::StartSession).is_empty());
        assert!(query::session_started(&world));
    }

    #[test]
    fn time_is_frozen_while_paused() {
        let mut world = World::new();
        let dt = Duration::from_millis(16);
        let _ = run(
            &mut world,
            Command::SetPlayState {
                state: PlayState::Paused,
            },
        );
        assert!(run(&mut world, Command::AdvanceSubstep { dt }).is_empty());
        assert!(run(&mut world, Command::AdvanceFrame { dt }).is_empty());

        let _ = run(
            &mut world,
            Command::SetPlayState {
                state: PlayState::Running,
            },
        );
        assert_eq!(
            run(&mut world, Command::AdvanceFrame { dt }),
            vec![Event::FrameAdvanced { dt }]
        );
    }

    #[test]
    fn fatal_damage_reports_death_exactly_once() {
        let mut world = World::new();
        let events = run(
            &mut world,
            Command::DamagePlayer {
                amount: 7.0,
                source: DamageSource::Fall,
            },
        );
        assert_eq!(
            events,
            vec![
                Event::PlayerDamaged {
                    health: 0.0,
                    max_health: 5.0,
                    source: DamageSource::Fall,
                },
                Event::PlayerDied,
            ]
        );
        assert!(run(
            &mut world,
            Command::DamagePlayer {
                amount: 1.0,
                source: DamageSource::Fall,
            }
        )
        .is_empty());
        assert_eq!(query::player(&world).health, 0.0);
    }

    #[test]
    fn throws_start_ahead_of_the_eye_and_reuse_slots() {
        let mut world = World::new();
        let capacity = query::config(&world).projectiles.pool_size;
        let mut last = None;
        for _ in 0..=capacity {
            let events = run(
                &mut world,
                Command::ThrowProjectile {
                    direction: Vec3::new(0.0, 0.0, -2.0),
                    kind: ThrowKind::Hand,
                },
            );
            if let Some(Event::ProjectileThrown { slot, .. }) = events.first() {
                last = Some(*slot);
            }
        }
        assert_eq!(last, Some(ProjectileSlot::new(0)));

        let view = query::projectile_view(&world);
        assert_eq!(view.capacity(), capacity);
        let first = view.iter().next().copied().expect("slot 0");
        assert!((first.sphere.center - Vec3::new(0.0, 1.8, -0.5)).length() < 1e-5);
        assert!((first.velocity - Vec3::new(0.0, 0.0, -20.0)).length() < 1e-4);
    }

    #[test]
    fn throws_are_ignored_when_dead_or_aimless() {
        let mut world = World::new();
        assert!(run(
            &mut world,
            Command::ThrowProjectile {
                direction: Vec3::ZERO,
                kind: ThrowKind::Hand,
            }
        )
        .is_empty());

        let _ = run(
            &mut world,
            Command::DamagePlayer {
                amount: 5.0,
                source: DamageSource::Fall,
            },
        );
        assert!(run(
            &mut world,
            Command::ThrowProjectile {
                direction: Vec3::X,
                kind: ThrowKind::Controller,
            }
        )
        .is_empty());
    }

    #[test]
    fn waves_only_move_forward() {
        let mut world = World::new();
        let events = run(
            &mut world,
            Command::BeginWave {
                wave: 2,
                positions: vec![Vec3::ZERO, Vec3::X],
            },
        );
        assert_eq!(events.len(), 3);
        assert!(run(
            &mut world,
            Command::BeginWave {
                wave: 1,
                positions: vec![Vec3::ZERO],
            }
        )
        .is_empty());
        assert_eq!(query::pending_enemies(&world).len(), 2);
        assert!(query::enemy_view(&world).is_empty());
    }

    #[test]
    fn killing_hits_park_the_projectile_and_count() {
        let mut world = World::new();
        let enemy = spawn_enemy(&mut world, Vec3::new(0.0, 0.0, -3.0));
        let slot = ProjectileSlot::new(0);

        for expected in [2, 1] {
            let _ = run(
                &mut world,
                Command::ThrowProjectile {
                    direction: Vec3::NEG_Z,
                    kind: ThrowKind::Hand,
                },
            );
            let events = run(&mut world, Command::HitEnemy { enemy, slot });
            assert!(events.contains(&Event::EnemyHit {
                enemy,
                health: expected
            }));
        }

        let events = run(&mut world, Command::HitEnemy { enemy, slot });
        assert!(events.contains(&Event::EnemyStateChanged {
            enemy,
            from: EnemyState::Idle,
            to: EnemyState::Die,
        }));
        assert!(events.contains(&Event::EnemyKilled { enemy, kills: 1 }));
        assert!(run(&mut world, Command::HitEnemy { enemy, slot }).is_empty());

        let snapshot = *query::enemy_view(&world).get(enemy).expect("enemy");
        assert_eq!(snapshot.state, EnemyState::Die);
        assert_eq!(query::kill_count(&world), 1);
    }

    #[test]
    fn reset_restores_the_initial_session() {
        let mut world = World::new();
        let enemy = spawn_enemy(&mut world, Vec3::ZERO);
        for _ in 0..world.config.enemies.max_health {
            let _ = run(
                &mut world,
                Command::HitEnemy {
                    enemy,
                    slot: ProjectileSlot::new(0),
                },
            );
        }
        assert_eq!(query::kill_count(&world), 1);

        let mut moved = query::player(&world);
        moved.capsule.translate(Vec3::new(7.0, 3.0, -4.0));
        let _ = run(
            &mut world,
            Command::MovePlayer {
                motion: PlayerMotion {
                    capsule: moved.capsule,
                    velocity: Vec3::new(1.0, -2.0, 3.0),
                    on_ground: false,
                    safe_position: moved.capsule.end,
                    returned_to_safety: false,
                },
            },
        );
        assert_eq!(query::player(&world).capsule, moved.capsule);

        let _ = run(
            &mut world,
            Command::ThrowProjectile {
                direction: Vec3::X,
                kind: ThrowKind::Hand,
            },
        );
        let _ = run(
            &mut world,
            Command::DamagePlayer {
                amount: 2.0,
                source: DamageSource::Fall,
            },
        );
        let _ = run(
            &mut world,
            Command::SetPlayState {
                state: PlayState::Paused,
            },
        );

        let events = run(&mut world, Command::Reset);
        assert_eq!(
            events,
            vec![
                Event::SessionReset,
                Event::PlayStateChanged {
                    state: PlayState::Running
                }
            ]
        );
        let player = query::player(&world);
        assert_eq!(player.health, 5.0);
        assert_eq!(player.capsule, PlayerConfig::default().initial_capsule());
        assert_eq!(player.velocity, Vec3::ZERO);
        assert_eq!(player.safe_position, Vec3::new(0.0, 1.8, 0.0));
        assert_eq!(query::kill_count(&world), 0);
        assert!(query::enemy_view(&world).is_empty());
        assert_eq!(query::projectile_view(&world).active().count(), 0);
        assert_eq!(query::wave(&world).current, 0);
    }

    #[test]
    fn stale_readiness_is_ignored() {
        let mut world = World::new();
        let _ = run(
            &mut world,
            Command::BeginWave {
                wave: 1,
                positions: vec![Vec3::ZERO],
            },
        );
        let _ = run(&mut world, Command::Reset);
        assert!(run(
            &mut world,
            Command::MarkEnemyReady {
                enemy: EnemyId::new(0)
            }
        )
        .is_empty());
    }

    #[test]
    fn enemy_updates_report_state_changes() {
        let mut world = World::new();
        let enemy = spawn_enemy(&mut world, Vec3::ZERO);
        let update = EnemyUpdate {
            state: EnemyState::Walk,
            position: Vec3::new(0.5, 0.0, 0.0),
            yaw: 1.0,
            attack_timer: 0.0,
            death_timer: None,
            sink_velocity: 0.0,
        };
        assert_eq!(
            run(&mut world, Command::UpdateEnemy { enemy, update }),
            vec![Event::EnemyStateChanged {
                enemy,
                from: EnemyState::Idle,
                to: EnemyState::Walk,
            }]
        );
        assert!(run(&mut world, Command::RemoveEnemy { enemy }).is_empty());
    }

    #[test]
    fn fallback_level_adds_ground_plane() {
        let mut world = World::new();
        let before = query::collision_surface(&world).triangle_count();
        let events = run(
            &mut world,
            Command::InstallLevel {
                geometry: LevelGeometry::Fallback,
            },
        );
        assert_eq!(
            events,
            vec![Event::LevelInstalled {
                triangles: before + 2,
                fallback: true,
            }]
        );
    }
}
