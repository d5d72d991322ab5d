//! Synthetic lip-sync driven by clip duration

/// Mouth weight for a given elapsed time: `50 * (sin(elapsed * rate) + 1)`
#[must_use]
pub fn mouth_weight(elapsed: f32, rate: f32) -> f32 {
    50.0 * ((elapsed * rate).sin() + 1.0)
}

/// Mouth oscillation lasting a fixed duration
///
/// Not driven by audio amplitude; the weight is a smooth 0–100 wave.
#[derive(Debug, Clone)]
pub struct SpeakRoutine {
    duration: f32,
    rate: f32,
    elapsed: f32,
}

impl SpeakRoutine {
    #[must_use]
    pub const fn new(duration: f32, rate: f32) -> Self {
        Self {
            duration,
            rate,
            elapsed: 0.0,
        }
    }

    /// Advance by `dt` and return the weight for this frame
    ///
    /// The weight is exactly 0 once `elapsed >= duration`; check
    /// [`Self::is_finished`] afterwards.
    pub fn step(&mut self, dt: f32) -> f32 {
        self.elapsed += dt;
        if self.is_finished() {
            0.0
        } else {
            mouth_weight(self.elapsed, self.rate)
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }
}
