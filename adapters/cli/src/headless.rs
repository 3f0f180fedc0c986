//! Collaborators for running the simulation without a window, audio device or
//! asset pipeline.

use std::{cell::RefCell, collections::HashSet, rc::Rc};

use log::{debug, info, warn};
use ruin_survival_collision::SurfaceBuilder;
use ruin_survival_core::InputState;
use ruin_survival_runtime::{
    assets::LEVEL_MODEL_PATH,
    collaborators::{
        AssetError, AssetLoader, Audio, Hud, ImmersiveDevice, InputSource, LoadCompletion,
        LoadTicket, LoadedAsset, Renderer, SessionError, SoundId,
    },
    Collaborators, FrameView,
};

/// Half side of the synthetic level floor.
const LEVEL_HALF_EXTENT: f32 = 40.0;
/// Yaw change per input sample, so the scripted player walks in a wide circle.
const YAW_STEP: f32 = 0.004;

/// State observed by the headless collaborators.
#[derive(Debug, Default)]
pub(crate) struct Ledger {
    pub(crate) frames_rendered: u64,
    pub(crate) deaths_shown: u32,
    pub(crate) notices: Vec<String>,
    pub(crate) pointer_locked: bool,
    playing: HashSet<SoundId>,
    pending: Vec<LoadCompletion>,
    yaw: f32,
}

/// Builds collaborators sharing one ledger.
///
/// Every load completes on the next poll. When `missing_level` is set the level
/// load fails so the fallback ground is exercised.
pub(crate) fn collaborators(missing_level: bool) -> (Collaborators, Rc<RefCell<Ledger>>) {
    let ledger = Rc::new(RefCell::new(Ledger {
        pointer_locked: true,
        ..Ledger::default()
    }));
    let host = || {
        Box::new(Headless {
            ledger: Rc::clone(&ledger),
            missing_level,
        })
    };
    let collaborators = Collaborators {
        assets: host(),
        audio: host(),
        hud: host(),
        input: host(),
        immersive: host(),
        renderer: host(),
    };
    (collaborators, ledger)
}

struct Headless {
    ledger: Rc<RefCell<Ledger>>,
    missing_level: bool,
}

impl Headless {
    fn queue(&self, ticket: LoadTicket, result: Result<LoadedAsset, AssetError>) {
        self.ledger
            .borrow_mut()
            .pending
            .push(LoadCompletion { ticket, result });
    }
}

impl AssetLoader for Headless {
    fn load_model(&mut self, path: &str, ticket: LoadTicket) {
        if path != LEVEL_MODEL_PATH {
            self.queue(ticket, Ok(LoadedAsset::Model));
            return;
        }

        let result = if self.missing_level {
            Err(AssetError::Missing {
                path: path.to_owned(),
            })
        } else {
            let floor = SurfaceBuilder::new()
                .with_plane(0.0, LEVEL_HALF_EXTENT)
                .build();
            Ok(LoadedAsset::Level(floor.triangles().to_vec()))
        };
        self.queue(ticket, result);
    }

    fn load_animation_clip(&mut self, _path: &str, ticket: LoadTicket) {
        self.queue(ticket, Ok(LoadedAsset::AnimationClip));
    }

    fn poll(&mut self, out: &mut Vec<LoadCompletion>) {
        out.append(&mut self.ledger.borrow_mut().pending);
    }
}

impl Audio for Headless {
    fn play(&mut self, sound: SoundId) {
        if self.ledger.borrow_mut().playing.insert(sound) {
            debug!("audio: play {sound:?}");
        }
    }

    fn stop(&mut self, sound: SoundId) {
        if self.ledger.borrow_mut().playing.remove(&sound) {
            debug!("audio: stop {sound:?}");
        }
    }

    fn set_volume(&mut self, sound: SoundId, volume: f32) {
        debug!("audio: {sound:?} volume {volume}");
    }

    fn is_playing(&self, sound: SoundId) -> bool {
        self.ledger.borrow().playing.contains(&sound)
    }
}

impl Hud for Headless {
    fn set_health_percent(&mut self, percent: f32) {
        debug!("hud: health {percent:.0}%");
    }

    fn set_kill_count(&mut self, kills: u32) {
        debug!("hud: kills {kills}");
    }

    fn show_death_screen(&mut self) {
        info!("hud: you died");
        self.ledger.borrow_mut().deaths_shown += 1;
    }

    fn hide_death_screen(&mut self) {}

    fn show_pause_screen(&mut self, visible: bool) {
        debug!("hud: pause screen {visible}");
    }

    fn notify(&mut self, message: &str) {
        warn!("hud: {message}");
        self.ledger.borrow_mut().notices.push(message.to_owned());
    }
}

impl InputSource for Headless {
    fn sample(&mut self) -> InputState {
        let mut ledger = self.ledger.borrow_mut();
        ledger.yaw += YAW_STEP;
        InputState {
            forward: true,
            yaw: ledger.yaw,
            ..InputState::default()
        }
    }

    fn pointer_locked(&self) -> bool {
        self.ledger.borrow().pointer_locked
    }

    fn release_pointer(&mut self) {
        self.ledger.borrow_mut().pointer_locked = false;
    }
}

impl ImmersiveDevice for Headless {
    fn request_session(&mut self) -> Result<(), SessionError> {
        Err(SessionError::Unsupported)
    }
}

impl Renderer for Headless {
    fn render(&mut self, _frame: &FrameView) {
        self.ledger.borrow_mut().frames_rendered += 1;
    }
}
