//! Two-phase eyelid blink

/// Phase of a running blink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkPhase {
    /// Weight ramps 0 → 100
    Closing,
    /// Weight ramps 100 → 0
    Opening,
    /// Ramp finished
    Done,
}

/// A single blink, stepped once per frame
///
/// Each phase lasts `speed` seconds of accumulated frame time.
#[derive(Debug, Clone)]
pub struct BlinkRoutine {
    speed: f32,
    phase: BlinkPhase,
    t: f32,
}

impl BlinkRoutine {
    #[must_use]
    pub fn new(speed: f32) -> Self {
        Self {
            speed: speed.max(f32::EPSILON),
            phase: BlinkPhase::Closing,
            t: 0.0,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> BlinkPhase {
        self.phase
    }

    /// Weight for this frame, then advance by `dt`
    ///
    /// Returns `None` once both phases have completed.
    pub fn step(&mut self, dt: f32) -> Option<f32> {
        loop {
            match self.phase {
                BlinkPhase::Closing if self.t < 1.0 => {
                    let weight = lerp(0.0, 100.0, self.t);
                    self.t += dt / self.speed;
                    return Some(weight);
                }
                BlinkPhase::Closing => {
                    self.phase = BlinkPhase::Opening;
                    self.t = 0.0;
                }
                BlinkPhase::Opening if self.t < 1.0 => {
                    let weight = lerp(100.0, 0.0, self.t);
                    self.t += dt / self.speed;
                    return Some(weight);
                }
                BlinkPhase::Opening => {
                    self.phase = BlinkPhase::Done;
                }
                BlinkPhase::Done => return None,
            }
        }
    }
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    (to - from).mul_add(t, from)
}
