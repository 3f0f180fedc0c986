use std::time::Duration;

use glam::Vec3;
use ruin_survival_core::{Command, EnemyId, Event, LevelGeometry, SimulationConfig, ThrowKind};
use ruin_survival_system_projectiles::Ballistics;
use ruin_survival_world::{self as world, query, World};

const SUBSTEP: Duration = Duration::from_micros(5_556);

fn spawn_enemy(world: &mut World, feet: Vec3) -> EnemyId {
    let mut events = Vec::new();
    let wave = query::wave(world).current + 1;
    world::apply(
        world,
        Command::BeginWave {
            wave,
            positions: vec![feet],
        },
        &mut events,
    );
    let enemy = events
        .iter()
        .find_map(|event| match event {
            Event::EnemyRequested { enemy, .. } => Some(*enemy),
            _ => None,
        })
        .expect("enemy requested");
    world::apply(world, Command::MarkEnemyReady { enemy }, &mut events);
    enemy
}

fn throw(world: &mut World, direction: Vec3) {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::ThrowProjectile {
            direction,
            kind: ThrowKind::Hand,
        },
        &mut events,
    );
}

fn step(world: &mut World, ballistics: &mut Ballistics) -> Vec<Command> {
    let mut events = Vec::new();
    world::apply(world, Command::AdvanceSubstep { dt: SUBSTEP }, &mut events);

    let mut commands = Vec::new();
    ballistics.handle(
        &events,
        &query::projectile_view(world),
        &query::enemy_view(world),
        &query::player(world),
        &mut commands,
    );
    for command in commands.clone() {
        world::apply(world, command, &mut events);
    }
    commands
}

fn ballistics(config: &SimulationConfig) -> Ballistics {
    Ballistics::new(config.projectiles.clone(), &config.enemies)
}

#[test]
fn hit_costs_exactly_one_health_and_parks_the_projectile() {
    let config = SimulationConfig::default();
    let mut world = World::with_config(config.clone());
    let enemy = spawn_enemy(&mut world, Vec3::new(0.0, 0.9, -1.0));
    throw(&mut world, Vec3::NEG_Z);

    let commands = step(&mut world, &mut ballistics(&config));
    assert!(commands.contains(&Command::HitEnemy {
        enemy,
        slot: ruin_survival_core::ProjectileSlot::new(0),
    }));

    let snapshot = *query::enemy_view(&world).get(enemy).expect("enemy");
    assert_eq!(snapshot.health, config.enemies.max_health - 1);

    let view = query::projectile_view(&world);
    assert_eq!(view.active().count(), 0);
    let parked = view.iter().next().expect("slot 0");
    assert_eq!(parked.sphere.center.y, config.projectiles.parked_height);
}

#[test]
fn simultaneous_projectiles_never_overkill() {
    let mut config = SimulationConfig::default();
    config.enemies.max_health = 1;
    let mut world = World::with_config(config.clone());
    let enemy = spawn_enemy(&mut world, Vec3::new(0.0, 0.9, -1.0));
    throw(&mut world, Vec3::NEG_Z);
    throw(&mut world, Vec3::NEG_Z);

    let commands = step(&mut world, &mut ballistics(&config));
    let hits = commands
        .iter()
        .filter(|command| matches!(command, Command::HitEnemy { .. }))
        .count();
    assert_eq!(hits, 1);
    assert_eq!(query::kill_count(&world), 1);
    assert!(!query::enemy_view(&world).get(enemy).expect("enemy").is_alive());
}

#[test]
fn distant_enemies_are_not_hit() {
    let config = SimulationConfig::default();
    let mut world = World::with_config(config.clone());
    let enemy = spawn_enemy(&mut world, Vec3::new(10.0, 0.0, 10.0));
    throw(&mut world, Vec3::NEG_Z);

    let mut system = ballistics(&config);
    for _ in 0..10 {
        let commands = step(&mut world, &mut system);
        assert!(!commands
            .iter()
            .any(|command| matches!(command, Command::HitEnemy { .. })));
    }
    let snapshot = *query::enemy_view(&world).get(enemy).expect("enemy");
    assert_eq!(snapshot.health, config.enemies.max_health);

    let flying = query::projectile_view(&world);
    let projectile = flying.active().next().expect("projectile still in flight");
    assert!(projectile.sphere.center.z < -0.5);
    assert!(projectile.velocity.y < 0.0);
}

#[test]
fn missed_throws_fall_through_the_level_and_are_parked() {
    let config = SimulationConfig::default();
    let mut world = World::with_config(config.clone());
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::InstallLevel {
            geometry: LevelGeometry::Fallback,
        },
        &mut events,
    );
    throw(&mut world, Vec3::NEG_Y);

    let mut system = ballistics(&config);
    let mut parked = false;
    for _ in 0..600 {
        let commands = step(&mut world, &mut system);
        parked |= commands
            .iter()
            .any(|command| matches!(command, Command::ParkProjectile { .. }));
    }
    assert!(parked);

    let view = query::projectile_view(&world);
    assert_eq!(view.active().count(), 0);
    let slot = view.iter().next().expect("slot 0");
    assert_eq!(slot.sphere.center.y, config.projectiles.parked_height);
}

#[test]
fn parked_misses_never_hurt_enemies() {
    let config = SimulationConfig::default();
    let mut world = World::with_config(config.clone());
    throw(&mut world, Vec3::NEG_Y);

    let mut system = ballistics(&config);
    for _ in 0..600 {
        let _ = step(&mut world, &mut system);
    }
    let enemy = spawn_enemy(&mut world, Vec3::new(0.0, 0.0, 0.0));
    for _ in 0..60 {
        let commands = step(&mut world, &mut system);
        assert!(!commands
            .iter()
            .any(|command| matches!(command, Command::HitEnemy { .. })));
    }
    let snapshot = *query::enemy_view(&world).get(enemy).expect("enemy");
    assert_eq!(snapshot.health, config.enemies.max_health);
}
