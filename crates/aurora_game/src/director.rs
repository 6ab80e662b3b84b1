//! Top-level scene state machine and click routing.
//!
//! The director owns the current `SceneState`, the audio flag and the world.
//! It never touches the audio device itself: every tick it emits music
//! directives and sound requests, and the frontend applies them to the
//! mixer. That keeps the whole state machine runnable in tests.

use aurora_core::geom::Aabb;
use aurora_core::input::MouseBtn;
use aurora_core::states::{AudioStatus, SceneState};

use crate::player::InputSample;
use crate::world::{Sfx, World};

const BUTTON_HALF_W: f32 = 95.0;
const BUTTON_HALF_H: f32 = 22.5;
pub const START_BUTTON_CENTER: (f32, f32) = (400.0, 200.0);
pub const AUDIO_BUTTON_CENTER: (f32, f32) = (400.0, 270.0);
pub const QUIT_BUTTON_CENTER: (f32, f32) = (400.0, 340.0);

/// What a pointer click did. `Quit` is the only outcome the frontend must
/// act on; the rest exist for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Ignored,
    GameStarted,
    AudioToggled(AudioStatus),
    ReturnedToMenu,
    Quit,
}

/// Music control requests, applied by the frontend in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicDirective {
    Restart,
    Resume,
    Pause,
    Stop,
}

#[derive(Debug, Clone, Default)]
pub struct FrameOutput {
    pub music: Vec<MusicDirective>,
    pub sounds: Vec<Sfx>,
}

pub struct SceneDirector {
    pub scene: SceneState,
    pub audio: AudioStatus,
    pub world: World,
    music_restart_pending: bool,
}

impl SceneDirector {
    pub fn new() -> Self {
        Self {
            scene: SceneState::Menu,
            audio: AudioStatus::Enabled,
            world: World::new(),
            music_restart_pending: false,
        }
    }

    pub fn button_rect(center: (f32, f32)) -> Aabb {
        Aabb::new(center.0, center.1, BUTTON_HALF_W, BUTTON_HALF_H)
    }

    /// Menu button labels with their centers, for the HUD. The audio label
    /// reflects the current flag.
    pub fn menu_labels(&self) -> [(&'static str, (f32, f32)); 3] {
        let audio_label = match self.audio {
            AudioStatus::Enabled => "Music On",
            AudioStatus::Disabled => "Music Off",
        };
        [
            ("Start", START_BUTTON_CENTER),
            (audio_label, AUDIO_BUTTON_CENTER),
            ("Quit", QUIT_BUTTON_CENTER),
        ]
    }

    /// Route a pointer click. Clicks only mean anything in the menu and on
    /// the game-over screen, and only with the left button.
    pub fn handle_click(&mut self, x: f32, y: f32, button: MouseBtn) -> ClickOutcome {
        if button != MouseBtn::Left {
            return ClickOutcome::Ignored;
        }

        match self.scene {
            SceneState::Menu => {
                if Self::button_rect(START_BUTTON_CENTER).contains_point(x, y) {
                    // Fresh session on every entry: world, player and enemy
                    // set all restart, and the soundtrack starts over.
                    self.world = World::new();
                    self.music_restart_pending = true;
                    self.scene = SceneState::Playing;
                    log::info!("Scene: menu -> playing");
                    ClickOutcome::GameStarted
                } else if Self::button_rect(AUDIO_BUTTON_CENTER).contains_point(x, y) {
                    self.audio = self.audio.toggled();
                    log::info!("Audio toggled: {}", self.audio);
                    ClickOutcome::AudioToggled(self.audio)
                } else if Self::button_rect(QUIT_BUTTON_CENTER).contains_point(x, y) {
                    log::info!("Quit requested from menu");
                    ClickOutcome::Quit
                } else {
                    ClickOutcome::Ignored
                }
            }
            SceneState::GameOver => {
                // The game-over screen reuses the start button's hit area.
                if Self::button_rect(START_BUTTON_CENTER).contains_point(x, y) {
                    self.scene = SceneState::Menu;
                    log::info!("Scene: game over -> menu");
                    ClickOutcome::ReturnedToMenu
                } else {
                    ClickOutcome::Ignored
                }
            }
            SceneState::Playing => ClickOutcome::Ignored,
        }
    }

    /// One fixed step. The audio flag is applied to the music stream every
    /// tick, in every scene, before any scene-specific work runs.
    pub fn advance(&mut self, input: InputSample) -> FrameOutput {
        let mut out = FrameOutput::default();

        if self.music_restart_pending {
            self.music_restart_pending = false;
            out.music.push(MusicDirective::Restart);
        }
        out.music.push(match self.audio {
            AudioStatus::Enabled => MusicDirective::Resume,
            AudioStatus::Disabled => MusicDirective::Pause,
        });

        if self.scene == SceneState::Playing {
            let events = self.world.tick(input, self.audio);
            out.sounds = events.sounds;
            if events.player_died {
                out.music.push(MusicDirective::Stop);
                self.scene = SceneState::GameOver;
                log::info!("Scene: playing -> game over");
            }
        }

        out
    }
}

impl Default for SceneDirector {
    fn default() -> Self {
        Self::new()
    }
}
