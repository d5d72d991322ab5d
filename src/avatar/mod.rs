//! Avatar controller
//!
//! Owns trigger dispatch, the idle blink state machine and lip-sync.
//! Nothing here runs on its own: the frame loop calls [`AvatarController::tick`]
//! with the current time and the frame delta, and every routine advances by
//! that delta.

mod blink;
mod rig;
mod speak;
mod triggers;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::api::ActionRecord;
use crate::config::AvatarConfig;

pub use blink::{BlinkPhase, BlinkRoutine};
pub use rig::{Animator, BlendShapes, HeadlessAnimator, HeadlessFace};
pub use speak::{SpeakRoutine, mouth_weight};
pub use triggers::{DISPATCH_GROUPS, animation_trigger, dispatch_group};

/// Result of asking the animator to play a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Trigger fired
    Fired(String),
    /// Current animation still playing; request dropped
    Busy,
    /// Group code has no trigger
    Unknown,
}

/// Result of dispatching an action record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Group was valid and handed to the animator
    Played(TriggerOutcome),
    /// Group id outside the dispatchable range
    UnknownGroup(i32),
}

/// Drives one avatar's animator and facial blend shapes
pub struct AvatarController<A, B> {
    animator: A,
    face: B,
    config: AvatarConfig,
    now: f32,
    last_action_time: f32,
    blink: Option<(usize, BlinkRoutine)>,
    speak: Option<(usize, SpeakRoutine)>,
    rng: StdRng,
}

impl<A: Animator, B: BlendShapes> AvatarController<A, B> {
    #[must_use]
    pub fn new(animator: A, face: B, config: AvatarConfig) -> Self {
        Self {
            animator,
            face,
            config,
            now: 0.0,
            last_action_time: 0.0,
            blink: None,
            speak: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Replace the RNG used to pick trigger variants
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Set the clock to `now` and count it as activity
    pub fn begin(&mut self, now: f32) {
        self.now = now;
        self.last_action_time = now;
    }

    /// Record activity now, postponing the next idle blink
    pub fn mark_action(&mut self) {
        self.last_action_time = self.now;
    }

    /// Fire the trigger for a group code if the current animation has finished
    pub fn play_animation(&mut self, code: i32) -> TriggerOutcome {
        let Some(trigger) = animation_trigger(code, &mut self.rng) else {
            return TriggerOutcome::Unknown;
        };

        if self.animator.normalized_time() < 1.0 {
            tracing::debug!(code, trigger = %trigger, "animation still playing, trigger dropped");
            return TriggerOutcome::Busy;
        }

        self.animator.set_trigger(&trigger);
        self.mark_action();
        TriggerOutcome::Fired(trigger)
    }

    /// Dispatch an action record's group to the animator
    ///
    /// Groups outside [`DISPATCH_GROUPS`] are skipped with a warning. A valid
    /// group marks activity whether or not the trigger fired.
    pub fn dispatch(&mut self, record: &ActionRecord) -> DispatchOutcome {
        tracing::debug!(
            group = record.group_id,
            description = %record.group_description,
            "action group"
        );

        let Some(code) = dispatch_group(record.group_id) else {
            tracing::warn!(group = record.group_id, id = record.id, "unknown action group");
            return DispatchOutcome::UnknownGroup(record.group_id);
        };

        let outcome = self.play_animation(code);
        self.mark_action();
        DispatchOutcome::Played(outcome)
    }

    /// Start lip-sync for `duration` seconds, replacing any running one
    ///
    /// Returns `false` if the mesh has no mouth blend shape.
    pub fn speak(&mut self, duration: f32) -> bool {
        let Some(mouth) = self.face.index_of(&self.config.mouth_blend_shape) else {
            tracing::debug!(
                blend_shape = %self.config.mouth_blend_shape,
                "mouth blend shape missing, not speaking"
            );
            return false;
        };

        if self.speak.is_some() {
            tracing::debug!("replacing running lip-sync");
        }

        self.speak = Some((mouth, SpeakRoutine::new(duration, self.config.speak_rate)));
        true
    }

    /// Advance animation, blink and lip-sync by one frame
    pub fn tick(&mut self, now: f32, dt: f32) {
        self.now = now;
        self.animator.advance(dt);

        self.check_idle_blink();
        self.step_blink(dt);
        self.step_speak(dt);
    }

    /// Stop running routines and relax both blend shapes
    pub fn reset(&mut self) {
        if let Some((eyes, _)) = self.blink.take() {
            self.face.set_weight(eyes, 0.0);
        }
        if let Some((mouth, _)) = self.speak.take() {
            self.face.set_weight(mouth, 0.0);
        }
    }

    fn check_idle_blink(&mut self) {
        if self.blink.is_some() {
            return;
        }

        // Animation playing
        if self.animator.normalized_time() < 1.0 {
            return;
        }

        if self.now - self.last_action_time < self.config.idle_blink_delay {
            return;
        }

        match self.face.index_of(&self.config.eyes_blend_shape) {
            Some(eyes) => {
                tracing::trace!("idle blink");
                self.blink = Some((eyes, BlinkRoutine::new(self.config.blink_speed)));
            }
            None => {
                tracing::trace!(
                    blend_shape = %self.config.eyes_blend_shape,
                    "eye blend shape missing, blink skipped"
                );
            }
        }
    }

    fn step_blink(&mut self, dt: f32) {
        let Some((eyes, routine)) = self.blink.as_mut() else {
            return;
        };
        let eyes = *eyes;

        if let Some(weight) = routine.step(dt) {
            self.face.set_weight(eyes, weight);
        } else {
            self.face.set_weight(eyes, 0.0);
            self.blink = None;
            // Blinking counts as activity
            self.mark_action();
        }
    }

    fn step_speak(&mut self, dt: f32) {
        let Some((mouth, routine)) = self.speak.as_mut() else {
            return;
        };
        let mouth = *mouth;

        let weight = routine.step(dt);
        let finished = routine.is_finished();
        self.face.set_weight(mouth, weight);
        if finished {
            self.speak = None;
        }
    }

    #[must_use]
    pub const fn is_blinking(&self) -> bool {
        self.blink.is_some()
    }

    #[must_use]
    pub const fn is_speaking(&self) -> bool {
        self.speak.is_some()
    }

    #[must_use]
    pub const fn last_action_time(&self) -> f32 {
        self.last_action_time
    }

    #[must_use]
    pub const fn animator(&self) -> &A {
        &self.animator
    }

    #[must_use]
    pub const fn face(&self) -> &B {
        &self.face
    }
}
