use std::time::Duration;

use ruin_survival_core::{
    Command, Event, InputState, LevelGeometry, PlayerConfig, SimulationConfig,
};
use ruin_survival_system_player_controller::PlayerController;
use ruin_survival_world::{self as world, query, World};

fn settled_world() -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::InstallLevel {
            geometry: LevelGeometry::Fallback,
        },
        &mut events,
    );
    world
}

fn simulate(world: &mut World, input: InputState, seconds: f32, substeps: u32) {
    let config = SimulationConfig::default();
    let mut controller = PlayerController::new(config.player.clone(), &config.world);
    let frame = Duration::from_secs_f32(1.0 / 60.0);
    let substep = frame / substeps;
    let frames = (seconds * 60.0).round() as u32;

    for _ in 0..frames {
        for _ in 0..substeps {
            let mut events = Vec::new();
            world::apply(world, Command::AdvanceSubstep { dt: substep }, &mut events);

            let mut commands = Vec::new();
            controller.handle(
                &events,
                &query::player(world),
                &input,
                query::collision_surface(world),
                &mut commands,
            );
            for command in commands {
                world::apply(world, command, &mut events);
            }
        }
    }
}

#[test]
fn player_settles_on_the_fallback_ground() {
    let mut world = settled_world();
    simulate(&mut world, InputState::default(), 2.0, 3);

    let player = query::player(&world);
    let radius = PlayerConfig::default().capsule_radius;
    assert!(player.on_ground, "player should rest on the ground");
    assert!(
        (player.capsule.start.y - radius).abs() < 0.02,
        "unexpected rest height {}",
        player.capsule.start.y
    );
    assert!((player.safe_position - player.capsule.end).length() < 0.02);
}

#[test]
fn resting_height_does_not_depend_on_substep_count() {
    let mut coarse = settled_world();
    let mut fine = settled_world();
    simulate(&mut coarse, InputState::default(), 2.0, 3);
    simulate(&mut fine, InputState::default(), 2.0, 8);

    let coarse = query::player(&coarse);
    let fine = query::player(&fine);
    assert!(
        (coarse.capsule.start.y - fine.capsule.start.y).abs() < 0.01,
        "rest heights diverged: {} vs {}",
        coarse.capsule.start.y,
        fine.capsule.start.y
    );
    assert!(coarse.velocity.length() < 0.05);
    assert!(fine.velocity.length() < 0.05);
}

#[test]
fn holding_forward_walks_down_negative_z() {
    let mut world = settled_world();
    simulate(&mut world, InputState::default(), 1.0, 3);
    let before = query::player(&world).capsule.end;

    let input = InputState {
        forward: true,
        ..InputState::default()
    };
    simulate(&mut world, input, 1.0, 3);
    let after = query::player(&world);

    assert!(after.capsule.end.z < before.z, "player did not move forward");
    assert!((after.capsule.end.x - before.x).abs() < 1e-3);
    let horizontal = after.velocity.x.hypot(after.velocity.z);
    assert!(horizontal <= PlayerConfig::default().max_speed + 1e-4);
}

#[test]
fn jumping_leaves_the_ground() {
    let mut world = settled_world();
    simulate(&mut world, InputState::default(), 1.0, 3);
    let rest = query::player(&world).capsule.start.y;

    let input = InputState {
        jump: true,
        ..InputState::default()
    };
    simulate(&mut world, input, 0.1, 3);
    let airborne = query::player(&world);
    assert!(airborne.capsule.start.y > rest + 0.2);
    assert!(!airborne.on_ground);

    let mut events = Vec::new();
    world::apply(&mut world, Command::Reset, &mut events);
    assert_eq!(events.first(), Some(&Event::SessionReset));
}
