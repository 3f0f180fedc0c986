//! Fixed-substep simulation driver.

use std::time::Duration;

use glam::Vec3;
use log::{debug, info, trace, warn};
use ruin_survival_core::{
    Command, DamageSource, EnemyState, EnemyView, Event, InputState, PlayState, PlayerSnapshot,
    ProjectileView, SimulationConfig, ThrowKind, WaveSnapshot,
};
use ruin_survival_system_enemy_ai::EnemyAi;
use ruin_survival_system_player_controller::PlayerController;
use ruin_survival_system_projectiles::Ballistics;
use ruin_survival_system_wave_spawning::WaveSpawning;
use ruin_survival_world::{self as world, query, World};

use crate::{
    assets::{AssetTracker, ENEMY_ANIMATIONS, ENEMY_MODEL_PATH, LEVEL_MODEL_PATH},
    collaborators::{
        AssetLoader, Audio, Hud, ImmersiveDevice, InputSource, LoadCompletion, Renderer, SoundId,
    },
};

const BACKGROUND_VOLUME: f32 = 0.5;

/// Splits wall-clock frame time into clamped, equal substeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameClock {
    substeps: u32,
    max_frame_delta: Duration,
}

impl FrameClock {
    /// Creates a clock with the provided substep count and frame delta ceiling.
    #[must_use]
    pub fn new(substeps: u32, max_frame_delta: Duration) -> Self {
        Self {
            substeps: substeps.max(1),
            max_frame_delta,
        }
    }

    /// Number of substeps per frame.
    #[must_use]
    pub const fn substeps(&self) -> u32 {
        self.substeps
    }

    /// Frame delta actually simulated for the provided elapsed time.
    #[must_use]
    pub fn clamp(&self, elapsed: Duration) -> Duration {
        elapsed.min(self.max_frame_delta)
    }

    /// Duration of one substep of the provided clamped frame.
    #[must_use]
    pub fn substep(&self, frame: Duration) -> Duration {
        frame / self.substeps
    }
}

/// Immutable state handed to the renderer once per frame.
#[derive(Clone, Debug)]
pub struct FrameView {
    /// Player state; `player.capsule.end` is the camera position.
    pub player: PlayerSnapshot,
    /// Active enemies.
    pub enemies: EnemyView,
    /// Projectile pool.
    pub projectiles: ProjectileView,
    /// Wave progress.
    pub wave: WaveSnapshot,
    /// Session kill count.
    pub kill_count: u32,
    /// Whether the simulation is paused.
    pub play_state: PlayState,
}

/// Summary of one call to [`Simulation::frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameReport {
    /// Clamped delta that was simulated; zero while paused.
    pub simulated: Duration,
    /// Number of substeps that ran.
    pub substeps: u32,
    /// Whether the frame was skipped because the simulation is paused.
    pub paused: bool,
}

/// External collaborators driven by the simulation.
pub struct Collaborators {
    /// Asynchronous asset loader.
    pub assets: Box<dyn AssetLoader>,
    /// Audio playback.
    pub audio: Box<dyn Audio>,
    /// Heads-up display.
    pub hud: Box<dyn Hud>,
    /// Keyboard, mouse and pointer capture.
    pub input: Box<dyn InputSource>,
    /// Immersive session provider.
    pub immersive: Box<dyn ImmersiveDevice>,
    /// Frame presentation.
    pub renderer: Box<dyn Renderer>,
}

/// Owns the world, the systems and the collaborators, and runs the frame loop.
pub struct Simulation {
    world: World,
    clock: FrameClock,
    player: PlayerController,
    ballistics: Ballistics,
    enemy_ai: EnemyAi,
    waves: WaveSpawning,
    tracker: AssetTracker,
    collaborators: Collaborators,
    outbox: Vec<Event>,
    completions: Vec<LoadCompletion>,
    input: InputState,
    pointer_was_locked: bool,
    assets_requested: bool,
    immersive_notified: bool,
}

impl Simulation {
    /// Creates a simulation with the provided parameters and collaborators.
    #[must_use]
    pub fn new(config: SimulationConfig, collaborators: Collaborators) -> Self {
        let pointer_was_locked = collaborators.input.pointer_locked();
        Self {
            clock: FrameClock::new(config.driver.substeps, config.driver.max_frame_delta()),
            player: PlayerController::new(config.player.clone(), &config.world),
            ballistics: Ballistics::new(config.projectiles.clone(), &config.enemies),
            enemy_ai: EnemyAi::new(config.enemies.clone()),
            waves: WaveSpawning::new(config.waves.clone()),
            world: World::with_config(config),
            tracker: AssetTracker::new(),
            collaborators,
            outbox: Vec::new(),
            completions: Vec::new(),
            input: InputState::default(),
            pointer_was_locked,
            assets_requested: false,
            immersive_notified: false,
        }
    }

    /// Read-only access to the authoritative world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Frame clock derived from the driver configuration.
    #[must_use]
    pub fn clock(&self) -> FrameClock {
        self.clock
    }

    /// Begins the session: requests assets, starts the ambient track and the first wave.
    pub fn start(&mut self) {
        if query::session_started(&self.world) {
            return;
        }

        if !self.assets_requested {
            self.assets_requested = true;
            let ticket = self.tracker.request_level();
            self.collaborators.assets.load_model(LEVEL_MODEL_PATH, ticket);
            for (name, path) in ENEMY_ANIMATIONS {
                let ticket = self.tracker.request_animation(name);
                self.collaborators.assets.load_animation_clip(path, ticket);
            }
        }

        self.collaborators
            .audio
            .set_volume(SoundId::Background, BACKGROUND_VOLUME);
        self.collaborators.audio.play(SoundId::Background);
        self.refresh_hud();

        let events = self.execute(Command::StartSession);
        self.run_waves(&events);
        self.dispatch();
        info!("{}", query::welcome_banner(&self.world));
    }

    /// Restores the initial session state and restarts the waves.
    pub fn reset(&mut self) {
        if !query::session_started(&self.world) {
            self.start();
            return;
        }
        self.tracker.forget_enemies();
        let events = self.execute(Command::Reset);
        self.run_waves(&events);
        self.collaborators.audio.stop(SoundId::EnemyWalk);
        self.dispatch();
    }

    /// Pauses or resumes the simulation.
    pub fn set_paused(&mut self, paused: bool) {
        let state = if paused {
            PlayState::Paused
        } else {
            PlayState::Running
        };
        let _ = self.execute(Command::SetPlayState { state });
        self.dispatch();
    }

    /// Flips between paused and running.
    pub fn toggle_pause(&mut self) {
        let paused = query::play_state(&self.world) == PlayState::Running;
        self.set_paused(paused);
    }

    /// Throws a projectile along the camera direction.
    ///
    /// Hand throws require pointer capture.
    pub fn throw(&mut self, kind: ThrowKind) {
        if kind == ThrowKind::Hand && !self.collaborators.input.pointer_locked() {
            return;
        }
        let direction = self.input.aim_direction();
        self.throw_along(direction, kind);
    }

    /// Throws a projectile along an explicit direction, e.g. a controller ray.
    pub fn throw_along(&mut self, direction: Vec3, kind: ThrowKind) {
        let _ = self.execute(Command::ThrowProjectile { direction, kind });
        self.dispatch();
    }

    /// Requests an immersive session.
    ///
    /// Failures are reported to the HUD once per simulation; the game keeps
    /// running in flat mode.
    pub fn enter_immersive(&mut self) -> bool {
        match self.collaborators.immersive.request_session() {
            Ok(()) => {
                info!("immersive session started");
                true
            }
            Err(error) => {
                warn!("{error}");
                if !self.immersive_notified {
                    self.immersive_notified = true;
                    self.collaborators.hud.notify(&error.to_string());
                }
                false
            }
        }
    }

    /// Runs one frame of the simulation for the provided wall-clock time.
    ///
    /// Always renders exactly once, even while paused, so the host can keep
    /// scheduling frames.
    pub fn frame(&mut self, elapsed: Duration) -> FrameReport {
        self.apply_completions();
        self.watch_pointer();

        if query::play_state(&self.world) == PlayState::Paused {
            self.dispatch();
            self.render();
            return FrameReport {
                simulated: Duration::ZERO,
                substeps: 0,
                paused: true,
            };
        }

        let dt = self.clock.clamp(elapsed);
        let substep = self.clock.substep(dt);
        let substeps = self.clock.substeps();

        for _ in 0..substeps {
            self.input = self.collaborators.input.sample();
            let events = self.execute(Command::AdvanceSubstep { dt: substep });
            let mut commands = Vec::new();
            self.player.handle(
                &events,
                &query::player(&self.world),
                &self.input,
                query::collision_surface(&self.world),
                &mut commands,
            );
            self.execute_all(commands);
        }

        for _ in 0..substeps {
            let events = self.execute(Command::AdvanceSubstep { dt: substep });
            let mut commands = Vec::new();
            self.ballistics.handle(
                &events,
                &query::projectile_view(&self.world),
                &query::enemy_view(&self.world),
                &query::player(&self.world),
                &mut commands,
            );
            self.execute_all(commands);
        }

        let events = self.execute(Command::AdvanceFrame { dt });
        let mut commands = Vec::new();
        self.enemy_ai.handle(
            &events,
            &query::enemy_view(&self.world),
            &query::player(&self.world),
            &mut commands,
        );
        self.waves.handle(&events, &mut commands);
        self.execute_all(commands);

        self.dispatch();
        self.update_walk_loop();
        self.render();
        trace!("frame simulated {dt:?} in {substeps} substeps");

        FrameReport {
            simulated: dt,
            substeps,
            paused: false,
        }
    }

    fn execute(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        self.outbox.extend(events.iter().cloned());
        events
    }

    fn execute_all(&mut self, commands: Vec<Command>) {
        for command in commands {
            let _ = self.execute(command);
        }
    }

    fn run_waves(&mut self, events: &[Event]) {
        let mut commands = Vec::new();
        self.waves.handle(events, &mut commands);
        self.execute_all(commands);
    }

    /// Applies queued load results before any system reads the world.
    fn apply_completions(&mut self) {
        self.collaborators.assets.poll(&mut self.completions);
        if self.completions.is_empty() {
            return;
        }

        let mut commands = Vec::new();
        for completion in self.completions.drain(..) {
            self.tracker.complete(completion, &mut commands);
        }
        self.execute_all(commands);
    }

    /// Pauses when pointer capture is lost during play.
    fn watch_pointer(&mut self) {
        let locked = self.collaborators.input.pointer_locked();
        let lost = self.pointer_was_locked && !locked;
        self.pointer_was_locked = locked;
        if lost
            && query::session_started(&self.world)
            && query::play_state(&self.world) == PlayState::Running
            && !query::player(&self.world).dead
        {
            debug!("pointer capture lost; pausing");
            let _ = self.execute(Command::SetPlayState {
                state: PlayState::Paused,
            });
        }
    }

    fn dispatch(&mut self) {
        for event in std::mem::take(&mut self.outbox) {
            match event {
                Event::EnemyRequested { enemy, .. } => {
                    let ticket = self.tracker.request_enemy(enemy);
                    self.collaborators.assets.load_model(ENEMY_MODEL_PATH, ticket);
                }
                Event::PlayerDamaged {
                    health,
                    max_health,
                    source,
                } => {
                    let percent = if max_health > 0.0 {
                        health / max_health * 100.0
                    } else {
                        0.0
                    };
                    self.collaborators.hud.set_health_percent(percent);
                    if matches!(source, DamageSource::Enemy { .. }) {
                        self.collaborators.audio.play(SoundId::EnemyAttack);
                    }
                }
                Event::PlayerDied => {
                    self.collaborators.input.release_pointer();
                    self.collaborators.hud.show_death_screen();
                    self.collaborators.audio.stop(SoundId::EnemyWalk);
                }
                Event::SessionReset => {
                    self.collaborators.hud.hide_death_screen();
                    self.refresh_hud();
                }
                Event::EnemyKilled { kills, .. } => {
                    self.collaborators.hud.set_kill_count(kills);
                }
                Event::PlayStateChanged { state } => {
                    self.collaborators
                        .hud
                        .show_pause_screen(state == PlayState::Paused);
                }
                Event::LevelInstalled {
                    triangles,
                    fallback,
                } => {
                    debug!("collision surface ready ({triangles} triangles, fallback={fallback})");
                }
                _ => {}
            }
        }
    }

    fn update_walk_loop(&mut self) {
        let walking = !query::player(&self.world).dead
            && query::enemy_view(&self.world)
                .iter()
                .any(|enemy| enemy.state == EnemyState::Walk);
        let audio = &mut self.collaborators.audio;
        if walking && !audio.is_playing(SoundId::EnemyWalk) {
            audio.play(SoundId::EnemyWalk);
        } else if !walking && audio.is_playing(SoundId::EnemyWalk) {
            audio.stop(SoundId::EnemyWalk);
        }
    }

    fn refresh_hud(&mut self) {
        let player = query::player(&self.world);
        self.collaborators
            .hud
            .set_health_percent(player.health_percent());
        self.collaborators
            .hud
            .set_kill_count(query::kill_count(&self.world));
    }

    fn render(&mut self) {
        let view = FrameView {
            player: query::player(&self.world),
            enemies: query::enemy_view(&self.world),
            projectiles: query::projectile_view(&self.world),
            wave: query::wave(&self.world),
            kill_count: query::kill_count(&self.world),
            play_state: query::play_state(&self.world),
        };
        self.collaborators.renderer.render(&view);
    }
}
