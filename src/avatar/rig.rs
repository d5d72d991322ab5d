//! Engine-facing rig traits and their headless implementations

/// Animation state machine of the avatar's base layer
pub trait Animator {
    /// Normalized playback time of the current state (1.0 = one full loop)
    fn normalized_time(&self) -> f32;

    /// Fire a named trigger
    fn set_trigger(&mut self, trigger: &str);

    /// Advance playback by `dt` seconds
    ///
    /// Engines that drive their own animation graph leave this empty.
    fn advance(&mut self, _dt: f32) {}
}

/// Facial blend shapes of the avatar mesh
pub trait BlendShapes {
    /// Index of a blend shape by name
    fn index_of(&self, name: &str) -> Option<usize>;

    /// Set a blend shape weight in `[0, 100]`
    fn set_weight(&mut self, index: usize, weight: f32);
}

/// Animator without an engine: every trigger starts a fixed-length clip
#[derive(Debug, Clone)]
pub struct HeadlessAnimator {
    clip_length: f32,
    normalized_time: f32,
    current: Option<String>,
    fired: usize,
}

impl HeadlessAnimator {
    /// Create an animator whose clips last `clip_length` seconds
    ///
    /// Starts with the idle state already finished, so the first trigger fires.
    #[must_use]
    pub fn new(clip_length: f32) -> Self {
        Self {
            clip_length: clip_length.max(f32::EPSILON),
            normalized_time: 1.0,
            current: None,
            fired: 0,
        }
    }

    /// Trigger currently playing, if any has fired
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Number of triggers fired so far
    #[must_use]
    pub const fn fired(&self) -> usize {
        self.fired
    }
}

impl Animator for HeadlessAnimator {
    fn normalized_time(&self) -> f32 {
        self.normalized_time
    }

    fn set_trigger(&mut self, trigger: &str) {
        tracing::info!(trigger, "animation trigger");
        self.current = Some(trigger.to_string());
        self.normalized_time = 0.0;
        self.fired += 1;
    }

    fn advance(&mut self, dt: f32) {
        self.normalized_time += dt / self.clip_length;
    }
}

/// Blend shape set without a mesh: named channels holding weights
#[derive(Debug, Clone, Default)]
pub struct HeadlessFace {
    names: Vec<String>,
    weights: Vec<f32>,
}

impl HeadlessFace {
    /// Create a face with the given blend shape channels, all at weight 0
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let weights = vec![0.0; names.len()];
        Self { names, weights }
    }

    /// Current weight of a channel by name
    #[must_use]
    pub fn weight(&self, name: &str) -> Option<f32> {
        self.index_of(name).map(|i| self.weights[i])
    }
}

impl BlendShapes for HeadlessFace {
    fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    fn set_weight(&mut self, index: usize, weight: f32) {
        if let Some(w) = self.weights.get_mut(index) {
            *w = weight.clamp(0.0, 100.0);
        }
    }
}
