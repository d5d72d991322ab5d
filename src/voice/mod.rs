//! Avatar voice
//!
//! Decodes downloaded clips and plays them. The clip's duration drives
//! lip-sync (see `avatar`).

mod clip;
mod playback;

pub use clip::AudioClip;
pub use playback::{AudioSink, SilentSink, SpeakerSink};
