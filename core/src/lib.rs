#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Ruin Survival simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems and collaborators to react to. Systems consume event streams,
//! query immutable snapshots, and respond exclusively with new command
//! batches.

mod config;

use std::time::Duration;

use glam::Vec3;
use ruin_survival_collision::{Capsule, Sphere, Triangle};
use serde::{Deserialize, Serialize};

pub use config::{
    ConfigError, DriverConfig, EnemyConfig, PlayerConfig, ProjectileConfig, SimulationConfig,
    WaveConfig, WorldConfig,
};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to the ruins. Survive the waves.";

/// Describes whether the simulation is advancing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayState {
    /// Systems advance every frame.
    Running,
    /// Simulation is frozen; the frame loop keeps running.
    Paused,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Starts the play session. Has no effect once a session is running.
    StartSession,
    /// Restores the player, enemies, projectiles and waves to their initial state.
    Reset,
    /// Requests that the world transition to the provided play state.
    SetPlayState {
        /// State the world should adopt.
        state: PlayState,
    },
    /// Announces one fixed physics substep.
    AdvanceSubstep {
        /// Duration of the substep.
        dt: Duration,
    },
    /// Announces one full frame for frame-rate systems.
    AdvanceFrame {
        /// Clamped duration of the frame.
        dt: Duration,
    },
    /// Installs the static collision surface built from level geometry.
    InstallLevel {
        /// Geometry that became available, or the fallback marker.
        geometry: LevelGeometry,
    },
    /// Overwrites the player's kinematic state with an integrated result.
    MovePlayer {
        /// Kinematic state computed by the player controller.
        motion: PlayerMotion,
    },
    /// Reduces the player's health.
    DamagePlayer {
        /// Health removed from the player.
        amount: f32,
        /// Cause of the damage.
        source: DamageSource,
    },
    /// Launches the next pooled projectile.
    ThrowProjectile {
        /// Launch direction; normalised by the world.
        direction: Vec3,
        /// Throwing variant, which selects the launch speed.
        kind: ThrowKind,
    },
    /// Stores the integrated state of an active projectile.
    MoveProjectile {
        /// Pool slot of the projectile.
        slot: ProjectileSlot,
        /// New sphere center.
        center: Vec3,
        /// New velocity.
        velocity: Vec3,
    },
    /// Deactivates a projectile that left the playable volume.
    ParkProjectile {
        /// Pool slot of the projectile.
        slot: ProjectileSlot,
    },
    /// Resolves a projectile striking an enemy.
    HitEnemy {
        /// Enemy that was struck.
        enemy: EnemyId,
        /// Projectile that struck it; parked by the hit.
        slot: ProjectileSlot,
    },
    /// Advances the wave counter and requests enemies for the new wave.
    BeginWave {
        /// Wave number being started.
        wave: u32,
        /// Spawn position of every requested enemy.
        positions: Vec<Vec3>,
    },
    /// Records that no further waves will start this session.
    FinishWaves,
    /// Moves an enemy whose assets finished loading into the active roster.
    MarkEnemyReady {
        /// Enemy whose assets are available.
        enemy: EnemyId,
    },
    /// Stores the state-machine result computed for an enemy.
    UpdateEnemy {
        /// Enemy being updated.
        enemy: EnemyId,
        /// New behavioural and kinematic state.
        update: EnemyUpdate,
    },
    /// Removes a settled dead enemy from the roster.
    RemoveEnemy {
        /// Enemy to remove.
        enemy: EnemyId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A play session began.
    SessionStarted,
    /// The session was restored to its initial state.
    SessionReset,
    /// The play state changed.
    PlayStateChanged {
        /// State that became active.
        state: PlayState,
    },
    /// A physics substep elapsed.
    SubstepAdvanced {
        /// Duration of the substep.
        dt: Duration,
    },
    /// A full frame elapsed.
    FrameAdvanced {
        /// Clamped duration of the frame.
        dt: Duration,
    },
    /// A new collision surface replaced the previous one.
    LevelInstalled {
        /// Number of triangles in the new surface.
        triangles: usize,
        /// Whether the fallback ground was used.
        fallback: bool,
    },
    /// The player was moved back to the last safe position.
    PlayerReturnedToSafety {
        /// Position the player was returned to.
        position: Vec3,
    },
    /// The player lost health.
    PlayerDamaged {
        /// Remaining health.
        health: f32,
        /// Maximum health.
        max_health: f32,
        /// Cause of the damage.
        source: DamageSource,
    },
    /// The player's health reached zero. Emitted once per life.
    PlayerDied,
    /// A pooled projectile was launched.
    ProjectileThrown {
        /// Slot that was reused.
        slot: ProjectileSlot,
        /// Throwing variant.
        kind: ThrowKind,
    },
    /// A projectile was deactivated.
    ProjectileParked {
        /// Slot that was parked.
        slot: ProjectileSlot,
    },
    /// A wave began and its enemies were requested.
    WaveStarted {
        /// Wave number.
        wave: u32,
        /// Number of enemies requested.
        enemies: u32,
    },
    /// The last wave was spawned; the wave timer is gone for this session.
    WavesFinished,
    /// An enemy was created in the pending state and awaits its assets.
    EnemyRequested {
        /// Identifier allocated to the enemy.
        enemy: EnemyId,
        /// Spawn position.
        position: Vec3,
    },
    /// A pending enemy joined the active roster.
    EnemySpawned {
        /// Enemy that became active.
        enemy: EnemyId,
        /// Position at activation.
        position: Vec3,
    },
    /// An enemy changed behavioural state.
    EnemyStateChanged {
        /// Enemy whose state changed.
        enemy: EnemyId,
        /// Previous state.
        from: EnemyState,
        /// New state.
        to: EnemyState,
    },
    /// A projectile struck an enemy.
    EnemyHit {
        /// Enemy that was struck.
        enemy: EnemyId,
        /// Remaining health.
        health: i32,
    },
    /// An enemy's health crossed to zero.
    EnemyKilled {
        /// Enemy that died.
        enemy: EnemyId,
        /// Session kill count after this kill.
        kills: u32,
    },
    /// A dead enemy left the roster.
    EnemyRemoved {
        /// Enemy that was removed.
        enemy: EnemyId,
    },
}

/// Level geometry delivered by the asset loader.
#[derive(Clone, Debug, PartialEq)]
pub enum LevelGeometry {
    /// Triangles extracted from the loaded level model.
    Loaded(Vec<Triangle>),
    /// The level failed to load; use a flat ground plane instead.
    Fallback,
}

/// Cause of player damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DamageSource {
    /// Melee attack from an enemy.
    Enemy {
        /// Attacking enemy.
        enemy: EnemyId,
    },
    /// Falling past the death depth.
    Fall,
}

/// Variant of projectile throw, which selects the launch speed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThrowKind {
    /// Thrown with the pointer along the camera direction.
    Hand,
    /// Thrown from a tracked motion controller.
    Controller,
}

/// Behavioural state of an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyState {
    /// Player is out of chase range.
    Idle,
    /// Pursuing the player.
    Walk,
    /// Within attack range.
    Attack,
    /// Dead. Terminal.
    Die,
}

impl EnemyState {
    /// Reports whether the state is the terminal death state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Die)
    }
}

/// Unique identifier assigned to an enemy.
///
/// Identifiers are never reused within a process, so asset completions that
/// arrive after a reset can never be attributed to a newer enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index of a slot within the projectile pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileSlot(u32);

impl ProjectileSlot {
    /// Creates a slot handle for the provided pool index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the slot.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Slot as a pool index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Input state sampled from the input collaborator once per substep.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputState {
    /// Move along the camera's horizontal forward vector.
    pub forward: bool,
    /// Move against the camera's horizontal forward vector.
    pub backward: bool,
    /// Strafe left.
    pub left: bool,
    /// Strafe right.
    pub right: bool,
    /// Jump when grounded.
    pub jump: bool,
    /// Camera yaw in radians; zero looks down negative Z.
    pub yaw: f32,
    /// Camera pitch in radians; positive looks up.
    pub pitch: f32,
}

impl InputState {
    /// Camera forward direction projected onto the horizontal plane.
    #[must_use]
    pub fn forward_vector(&self) -> Vec3 {
        let yaw = finite_or_zero(self.yaw);
        Vec3::new(-yaw.sin(), 0.0, -yaw.cos())
    }

    /// Horizontal right-hand direction of the camera.
    #[must_use]
    pub fn side_vector(&self) -> Vec3 {
        self.forward_vector().cross(Vec3::Y)
    }

    /// Sum of the held movement directions. Not normalised.
    #[must_use]
    pub fn wish_direction(&self) -> Vec3 {
        let forward = self.forward_vector();
        let side = self.side_vector();
        let mut wish = Vec3::ZERO;
        if self.forward {
            wish += forward;
        }
        if self.backward {
            wish -= forward;
        }
        if self.left {
            wish -= side;
        }
        if self.right {
            wish += side;
        }
        wish
    }

    /// Unit direction the camera looks along.
    #[must_use]
    pub fn aim_direction(&self) -> Vec3 {
        let yaw = finite_or_zero(self.yaw);
        let pitch = finite_or_zero(self.pitch);
        Vec3::new(
            -yaw.sin() * pitch.cos(),
            pitch.sin(),
            -yaw.cos() * pitch.cos(),
        )
    }
}

fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Kinematic state of the player produced by one controller step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerMotion {
    /// Capsule after integration and collision correction.
    pub capsule: Capsule,
    /// Velocity after integration and collision correction.
    pub velocity: Vec3,
    /// Whether the capsule rests on walkable ground.
    pub on_ground: bool,
    /// Last upper capsule endpoint recorded while grounded.
    pub safe_position: Vec3,
    /// Whether the step ended with a teleport back to the safe position.
    pub returned_to_safety: bool,
}

/// Immutable representation of the player used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Collision capsule; `capsule.end` is the eye position.
    pub capsule: Capsule,
    /// Current velocity.
    pub velocity: Vec3,
    /// Whether the player stands on walkable ground.
    pub on_ground: bool,
    /// Last upper capsule endpoint recorded while grounded.
    pub safe_position: Vec3,
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Whether the player died this life.
    pub dead: bool,
}

impl PlayerSnapshot {
    /// Remaining health as a percentage of the maximum.
    #[must_use]
    pub fn health_percent(&self) -> f32 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        (self.health / self.max_health * 100.0).clamp(0.0, 100.0)
    }

    /// Kinematic part of the snapshot.
    #[must_use]
    pub fn motion(&self) -> PlayerMotion {
        PlayerMotion {
            capsule: self.capsule,
            velocity: self.velocity,
            on_ground: self.on_ground,
            safe_position: self.safe_position,
            returned_to_safety: false,
        }
    }
}

/// Behavioural and kinematic state written back by the enemy AI.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyUpdate {
    /// Behavioural state.
    pub state: EnemyState,
    /// Feet position.
    pub position: Vec3,
    /// Facing angle around the vertical axis.
    pub yaw: f32,
    /// Time accumulated towards the next attack.
    pub attack_timer: f32,
    /// Remaining post-death delay, once dead.
    pub death_timer: Option<f32>,
    /// Downward speed while sinking.
    pub sink_velocity: f32,
}

/// Immutable representation of a single active enemy used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Behavioural state.
    pub state: EnemyState,
    /// Remaining health.
    pub health: i32,
    /// Feet position.
    pub position: Vec3,
    /// Facing angle around the vertical axis.
    pub yaw: f32,
    /// Time accumulated towards the next attack.
    pub attack_timer: f32,
    /// Remaining post-death delay, once dead.
    pub death_timer: Option<f32>,
    /// Downward speed while sinking.
    pub sink_velocity: f32,
    /// Feet height recorded when the enemy died.
    pub death_height: Option<f32>,
}

impl EnemySnapshot {
    /// Reports whether the enemy still participates in pursuit and attacks.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Mutable part of the snapshot.
    #[must_use]
    pub fn to_update(&self) -> EnemyUpdate {
        EnemyUpdate {
            state: self.state,
            position: self.position,
            yaw: self.yaw,
            attack_timer: self.attack_timer,
            death_timer: self.death_timer,
            sink_velocity: self.sink_velocity,
        }
    }
}

/// Read-only snapshot describing all active enemies.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a snapshot by identifier.
    #[must_use]
    pub fn get(&self, enemy: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&enemy, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of captured enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no enemies were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a pooled projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Pool slot.
    pub slot: ProjectileSlot,
    /// Collision sphere.
    pub sphere: Sphere,
    /// Current velocity.
    pub velocity: Vec3,
    /// Whether the projectile is in flight.
    pub active: bool,
}

/// Read-only snapshot of the whole projectile pool in slot order.
#[derive(Clone, Debug, Default)]
pub struct ProjectileView {
    snapshots: Vec<ProjectileSnapshot>,
}

impl ProjectileView {
    /// Creates a view from snapshots ordered by slot.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ProjectileSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.slot);
        Self { snapshots }
    }

    /// Iterator over every slot.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over projectiles currently in flight.
    pub fn active(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
        self.snapshots.iter().filter(|snapshot| snapshot.active)
    }

    /// Number of slots in the pool.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.snapshots.len()
    }
}

/// Wave progress visible to systems and collaborators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveSnapshot {
    /// Last wave started; zero before the first wave.
    pub current: u32,
    /// Last wave that will be started.
    pub max_waves: u32,
    /// Whether spawning stopped permanently for this session.
    pub finished: bool,
}
