//! Ready gate turning asset completions into world commands.

use std::collections::HashMap;

use log::{debug, info, warn};
use ruin_survival_core::{Command, EnemyId, LevelGeometry};

use crate::collaborators::{LoadCompletion, LoadTicket, LoadedAsset};

/// Level model providing the static collision surface.
pub const LEVEL_MODEL_PATH: &str = "assets/models/ruins.glb";
/// Model instantiated for every enemy.
pub const ENEMY_MODEL_PATH: &str = "assets/models/enemy.fbx";
/// Animation set shared by every enemy, keyed by state name.
pub const ENEMY_ANIMATIONS: [(&str, &str); 4] = [
    ("idle", "assets/models/enemy_idle.fbx"),
    ("walk", "assets/models/enemy_walk.fbx"),
    ("attack", "assets/models/enemy_attack.fbx"),
    ("die", "assets/models/enemy_die.fbx"),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Request {
    Level,
    Animation(&'static str),
    EnemyModel(EnemyId),
}

/// Tracks outstanding loads and decides when enemies may become active.
///
/// An enemy is ready once its own model settled and the shared animation set
/// settled. Failures settle a request too; the host shows a fallback visual.
#[derive(Debug, Default)]
pub struct AssetTracker {
    next_ticket: u64,
    requests: HashMap<LoadTicket, Request>,
    animations_requested: usize,
    animations_settled: usize,
    waiting: Vec<EnemyId>,
}

impl AssetTracker {
    /// Creates a tracker with no outstanding requests.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the level load.
    pub fn request_level(&mut self) -> LoadTicket {
        self.register(Request::Level)
    }

    /// Registers one animation clip of the shared set.
    pub fn request_animation(&mut self, name: &'static str) -> LoadTicket {
        self.animations_requested += 1;
        self.register(Request::Animation(name))
    }

    /// Registers the model load of a pending enemy.
    pub fn request_enemy(&mut self, enemy: EnemyId) -> LoadTicket {
        self.register(Request::EnemyModel(enemy))
    }

    /// Reports whether every requested animation clip settled.
    #[must_use]
    pub fn animations_ready(&self) -> bool {
        self.animations_settled >= self.animations_requested
    }

    /// Number of loads that have not completed yet.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.requests.len()
    }

    /// Forgets every enemy request so completions that arrive later are ignored.
    pub fn forget_enemies(&mut self) {
        self.requests
            .retain(|_, request| !matches!(request, Request::EnemyModel(_)));
        self.waiting.clear();
    }

    /// Converts a completion into the commands it unlocks.
    pub fn complete(&mut self, completion: LoadCompletion, out: &mut Vec<Command>) {
        let Some(request) = self.requests.remove(&completion.ticket) else {
            debug!("ignoring stale load completion {}", completion.ticket.get());
            return;
        };

        match request {
            Request::Level => {
                let geometry = match completion.result {
                    Ok(LoadedAsset::Level(triangles)) => LevelGeometry::Loaded(triangles),
                    Ok(other) => {
                        warn!("level load returned {other:?}; using fallback ground");
                        LevelGeometry::Fallback
                    }
                    Err(error) => {
                        warn!("{error}; using fallback ground");
                        LevelGeometry::Fallback
                    }
                };
                out.push(Command::InstallLevel { geometry });
            }
            Request::Animation(name) => {
                if let Err(error) = completion.result {
                    warn!("animation `{name}` unavailable: {error}");
                }
                self.animations_settled += 1;
                if self.animations_ready() {
                    info!("enemy animation set ready");
                    out.extend(
                        self.waiting
                            .drain(..)
                            .map(|enemy| Command::MarkEnemyReady { enemy }),
                    );
                }
            }
            Request::EnemyModel(enemy) => {
                if let Err(error) = completion.result {
                    warn!("enemy {} uses the fallback visual: {error}", enemy.get());
                }
                if self.animations_ready() {
                    out.push(Command::MarkEnemyReady { enemy });
                } else {
                    self.waiting.push(enemy);
                }
            }
        }
    }

    fn register(&mut self, request: Request) -> LoadTicket {
        let ticket = LoadTicket::new(self.next_ticket);
        self.next_ticket += 1;
        let _ = self.requests.insert(ticket, request);
        ticket
    }
}
