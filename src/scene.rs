//! The avatar scene
//!
//! Single owner of avatar, camera, display and audio state. The frame loop
//! applies [`SceneCommand`]s from the poller and ticks the scene once per
//! frame; nothing else touches this state, so no locking is involved.

use crate::api::ActionRecord;
use crate::avatar::{
    Animator, AvatarController, BlendShapes, DispatchOutcome, HeadlessAnimator, HeadlessFace,
};
use crate::camera::{CameraRig, CameraSwitcher, HeadlessCameras};
use crate::config::Config;
use crate::display::DisplayPanel;
use crate::voice::{AudioClip, AudioSink};

/// Work handed from the poller to the scene
#[derive(Debug, Clone)]
pub enum SceneCommand {
    /// Show and animate a freshly fetched action
    Action(ActionRecord),
    /// Switch to a camera index (validated by the scene)
    Camera(i32),
    /// Play a downloaded clip and lip-sync to its length
    Speak(AudioClip),
    /// Nothing pending; blank the display
    ClearDisplay,
    /// A fetch failed
    ShowError,
}

/// Scene backed by the headless rig
pub type HeadlessScene = Scene<HeadlessAnimator, HeadlessFace, HeadlessCameras>;

/// Avatar, cameras, display and voice of one session
pub struct Scene<A, B, C> {
    avatar: AvatarController<A, B>,
    cameras: CameraSwitcher<C>,
    display: DisplayPanel,
    audio: Box<dyn AudioSink + Send>,
    startup_speak: f32,
    running: bool,
}

impl HeadlessScene {
    /// Build a headless scene from configuration
    #[must_use]
    pub fn headless(config: &Config, audio: Box<dyn AudioSink + Send>) -> Self {
        let animator = HeadlessAnimator::new(config.avatar.clip_length);
        let face = HeadlessFace::new([
            config.avatar.eyes_blend_shape.clone(),
            config.avatar.mouth_blend_shape.clone(),
        ]);
        let avatar = AvatarController::new(animator, face, config.avatar.clone());
        let cameras = CameraSwitcher::new(HeadlessCameras::new(config.cameras.clone()));

        Self::new(avatar, cameras, DisplayPanel::new(config.display.enabled), audio)
            .with_startup_speak(config.avatar.startup_speak)
    }
}

impl<A: Animator, B: BlendShapes, C: CameraRig> Scene<A, B, C> {
    #[must_use]
    pub fn new(
        avatar: AvatarController<A, B>,
        cameras: CameraSwitcher<C>,
        display: DisplayPanel,
        audio: Box<dyn AudioSink + Send>,
    ) -> Self {
        Self {
            avatar,
            cameras,
            display,
            audio,
            startup_speak: 0.0,
            running: false,
        }
    }

    /// Seconds of lip-sync to play on start (0 disables)
    #[must_use]
    pub fn with_startup_speak(mut self, seconds: f32) -> Self {
        self.startup_speak = seconds;
        self
    }

    /// Begin the session at time `now`
    pub fn start(&mut self, now: f32) {
        self.running = true;
        self.avatar.begin(now);

        if self.startup_speak > 0.0 {
            self.avatar.speak(self.startup_speak);
        }

        tracing::info!(cameras = self.cameras.rig().camera_count(), "scene started");
    }

    /// Apply one command from the poller
    pub fn apply(&mut self, command: SceneCommand) {
        if !self.running {
            tracing::debug!(?command, "scene stopped, command dropped");
            return;
        }

        match command {
            SceneCommand::Action(record) => {
                self.display.update(&record);
                if let DispatchOutcome::Played(outcome) = self.avatar.dispatch(&record) {
                    tracing::debug!(id = record.id, ?outcome, "action dispatched");
                }
            }
            SceneCommand::Camera(index) => {
                if let Err(e) = self.cameras.switch_to(index) {
                    tracing::warn!(error = %e, "camera switch skipped");
                }
            }
            SceneCommand::Speak(clip) => {
                let duration = clip.duration();
                if let Err(e) = self.audio.play(&clip) {
                    tracing::error!(error = %e, "audio playback failed");
                }
                self.avatar.speak(duration);
            }
            SceneCommand::ClearDisplay => self.display.clear(),
            SceneCommand::ShowError => self.display.show_error(),
        }
    }

    /// Advance one frame
    pub fn tick(&mut self, now: f32, dt: f32) {
        if self.running {
            self.avatar.tick(now, dt);
        }
    }

    /// End the session: silence audio and relax the face
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.audio.stop();
        self.avatar.reset();
        tracing::info!("scene stopped");
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub const fn avatar(&self) -> &AvatarController<A, B> {
        &self.avatar
    }

    #[must_use]
    pub const fn cameras(&self) -> &CameraSwitcher<C> {
        &self.cameras
    }

    #[must_use]
    pub const fn display(&self) -> &DisplayPanel {
        &self.display
    }
}
