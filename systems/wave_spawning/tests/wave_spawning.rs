use std::time::Duration;

use ruin_survival_core::{Command, Event, WaveConfig};
use ruin_survival_system_wave_spawning::WaveSpawning;
use ruin_survival_world::{self as world, query, World};

fn waves(commands: &[Command]) -> Vec<(u32, usize)> {
    commands
        .iter()
        .filter_map(|command| match command {
            Command::BeginWave { wave, positions } => Some((*wave, positions.len())),
            _ => None,
        })
        .collect()
}

#[test]
fn session_start_begins_the_first_wave_immediately() {
    let mut spawning = WaveSpawning::new(WaveConfig::default());
    let mut commands = Vec::new();
    spawning.handle(&[Event::SessionStarted], &mut commands);

    assert_eq!(waves(&commands), vec![(1, 1)]);
    assert!(spawning.is_armed());
}

#[test]
fn fifteen_waves_then_nothing() {
    let config = WaveConfig::default();
    let mut spawning = WaveSpawning::new(config.clone());
    let mut commands = Vec::new();
    spawning.handle(&[Event::SessionStarted], &mut commands);

    let second = Duration::from_secs(1);
    for _ in 0..400 {
        spawning.handle(&[Event::FrameAdvanced { dt: second }], &mut commands);
    }

    let started = waves(&commands);
    assert_eq!(started.len(), config.max_waves as usize);
    for (index, (wave, enemies)) in started.iter().enumerate() {
        assert_eq!(*wave, index as u32 + 1);
        assert_eq!(*enemies, *wave as usize);
    }
    assert_eq!(
        commands
            .iter()
            .filter(|command| **command == Command::FinishWaves)
            .count(),
        1
    );
    assert!(!spawning.is_armed());
}

#[test]
fn waves_follow_the_interval() {
    let mut spawning = WaveSpawning::new(WaveConfig::default());
    let mut commands = Vec::new();
    spawning.handle(&[Event::SessionStarted], &mut commands);

    spawning.handle(
        &[Event::FrameAdvanced {
            dt: Duration::from_millis(9_950),
        }],
        &mut commands,
    );
    assert_eq!(waves(&commands).len(), 1);

    spawning.handle(
        &[Event::FrameAdvanced {
            dt: Duration::from_millis(50),
        }],
        &mut commands,
    );
    assert_eq!(waves(&commands), vec![(1, 1), (2, 2)]);
}

#[test]
fn reset_rearms_a_single_timer() {
    let mut spawning = WaveSpawning::new(WaveConfig::default());
    let mut commands = Vec::new();
    spawning.handle(&[Event::SessionStarted], &mut commands);
    spawning.handle(
        &[Event::FrameAdvanced {
            dt: Duration::from_secs(25),
        }],
        &mut commands,
    );
    assert_eq!(waves(&commands).last(), Some(&(3, 3)));

    commands.clear();
    spawning.handle(&[Event::SessionReset], &mut commands);
    spawning.handle(
        &[Event::FrameAdvanced {
            dt: Duration::from_secs(10),
        }],
        &mut commands,
    );
    assert_eq!(waves(&commands), vec![(1, 1), (2, 2)]);
}

#[test]
fn spawn_positions_stay_inside_the_square() {
    let config = WaveConfig::default();
    let mut spawning = WaveSpawning::new(config.clone());
    let mut commands = Vec::new();
    spawning.handle(&[Event::SessionStarted], &mut commands);
    spawning.handle(
        &[Event::FrameAdvanced {
            dt: Duration::from_secs(140),
        }],
        &mut commands,
    );

    for command in &commands {
        if let Command::BeginWave { positions, .. } = command {
            for position in positions {
                assert!(position.x.abs() <= config.spawn_half_extent);
                assert!(position.z.abs() <= config.spawn_half_extent);
                assert_eq!(position.y, 0.0);
            }
        }
    }
}

#[test]
fn same_seed_replays_identically() {
    let run = || {
        let mut spawning = WaveSpawning::new(WaveConfig::default());
        let mut commands = Vec::new();
        spawning.handle(&[Event::SessionStarted], &mut commands);
        spawning.handle(
            &[Event::FrameAdvanced {
                dt: Duration::from_secs(30),
            }],
            &mut commands,
        );
        commands
    };
    assert_eq!(run(), run());
}

#[test]
fn world_requests_one_pending_enemy_per_wave_member() {
    let mut world = World::new();
    let mut spawning = WaveSpawning::new(WaveConfig::default());
    let mut events = Vec::new();
    world::apply(&mut world, Command::StartSession, &mut events);

    let mut commands = Vec::new();
    spawning.handle(&events, &mut commands);
    spawning.handle(
        &[Event::FrameAdvanced {
            dt: Duration::from_secs(10),
        }],
        &mut commands,
    );
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }

    assert_eq!(query::wave(&world).current, 2);
    assert_eq!(query::pending_enemies(&world).len(), 3);
}
