//! Contracts for the external collaborators the simulation calls into.
//!
//! Hosts implement these traits on top of their asset pipeline, audio engine,
//! HUD, input devices and renderer. Implementations are expected to tolerate
//! calls for resources that have not finished loading.

use ruin_survival_collision::Triangle;
use ruin_survival_core::InputState;
use thiserror::Error;

use crate::FrameView;

/// Sounds the simulation asks the audio collaborator to play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundId {
    /// Looping ambient track.
    Background,
    /// One-shot played when an enemy lands a hit.
    EnemyAttack,
    /// Loop played while any enemy is walking.
    EnemyWalk,
}

/// Handle correlating an asset request with its completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(u64);

impl LoadTicket {
    /// Creates a ticket with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the ticket.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Payload delivered by a successful load.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadedAsset {
    /// Level model reduced to its collision triangles.
    Level(Vec<Triangle>),
    /// Visual model for an enemy.
    Model,
    /// Animation clip.
    AnimationClip,
}

/// Result of an asynchronous load, queued until the next frame.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadCompletion {
    /// Ticket passed with the request.
    pub ticket: LoadTicket,
    /// Loaded asset or the reason it is unavailable.
    pub result: Result<LoadedAsset, AssetError>,
}

/// Reasons an asset failed to load.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AssetError {
    /// The asset does not exist.
    #[error("asset `{path}` was not found")]
    Missing {
        /// Requested path.
        path: String,
    },
    /// The asset exists but could not be decoded.
    #[error("asset `{path}` could not be decoded: {reason}")]
    Corrupt {
        /// Requested path.
        path: String,
        /// Decoder message.
        reason: String,
    },
}

/// Reasons an immersive session could not be entered.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The host has no immersive runtime.
    #[error("immersive mode is not available on this device")]
    Unsupported,
    /// The runtime refused the session request.
    #[error("immersive session request was rejected: {0}")]
    Rejected(String),
}

/// Asynchronous asset loader.
///
/// Requests return immediately; results are handed back through [`poll`],
/// which the driver calls at the start of every frame.
///
/// [`poll`]: AssetLoader::poll
pub trait AssetLoader {
    /// Starts loading a model.
    fn load_model(&mut self, path: &str, ticket: LoadTicket);

    /// Starts loading an animation clip.
    fn load_animation_clip(&mut self, path: &str, ticket: LoadTicket);

    /// Moves every finished load into `out`.
    fn poll(&mut self, out: &mut Vec<LoadCompletion>);
}

/// Audio playback.
pub trait Audio {
    /// Starts a sound unless it is already playing.
    fn play(&mut self, sound: SoundId);

    /// Stops a sound if it is playing.
    fn stop(&mut self, sound: SoundId);

    /// Adjusts the volume of a sound.
    fn set_volume(&mut self, sound: SoundId, volume: f32);

    /// Reports whether a sound is currently playing.
    fn is_playing(&self, sound: SoundId) -> bool;
}

/// Heads-up display.
pub trait Hud {
    /// Updates the health bar.
    fn set_health_percent(&mut self, percent: f32);

    /// Updates the kill counter.
    fn set_kill_count(&mut self, kills: u32);

    /// Shows the death screen.
    fn show_death_screen(&mut self);

    /// Hides the death screen after a reset.
    fn hide_death_screen(&mut self);

    /// Shows or hides the pause screen.
    fn show_pause_screen(&mut self, visible: bool);

    /// Displays a one-shot message.
    fn notify(&mut self, message: &str);
}

/// Keyboard, mouse and pointer capture.
pub trait InputSource {
    /// Samples the current input state.
    fn sample(&mut self) -> InputState;

    /// Reports whether the pointer is captured by the game.
    fn pointer_locked(&self) -> bool;

    /// Releases pointer capture.
    fn release_pointer(&mut self);
}

/// Immersive (VR) session provider.
pub trait ImmersiveDevice {
    /// Requests an immersive session.
    fn request_session(&mut self) -> Result<(), SessionError>;
}

/// Frame presentation. Called exactly once per frame, paused or not.
pub trait Renderer {
    /// Presents the provided frame.
    fn render(&mut self, frame: &FrameView);
}
