//! Avatar Puppeteer - headless avatar client driven by a local action queue
//!
//! Polls an HTTP action queue for animation and camera commands and drives an
//! avatar rig with them:
//! - Animation triggers per action group
//! - Idle blinking
//! - Lip-sync sized to downloaded audio
//! - Camera switching
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               Action queue (HTTP)            │
//! │   get_action_mapping │ add_camera_change │ … │
//! └──────────────────────┬───────────────────────┘
//!                        │ poll every interval
//! ┌──────────────────────▼───────────────────────┐
//! │                    Poller                    │
//! │   busy flag │ decode │ delete │ audio load   │
//! └──────────────────────┬───────────────────────┘
//!                        │ SceneCommand (mpsc)
//! ┌──────────────────────▼───────────────────────┐
//! │              Scene (frame loop)              │
//! │   Avatar │ Cameras │ Display │ Audio sink    │
//! └──────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod avatar;
pub mod camera;
pub mod config;
pub mod daemon;
pub mod display;
pub mod error;
pub mod poller;
pub mod scene;
pub mod voice;

pub use api::{ActionClient, ActionRecord, ApiEnvelope};
pub use avatar::{AvatarController, DispatchOutcome, TriggerOutcome};
pub use camera::{CameraRig, CameraSwitcher};
pub use config::Config;
pub use daemon::Daemon;
pub use display::DisplayPanel;
pub use error::{Error, Result};
pub use poller::{PollOutcome, Poller};
pub use scene::{HeadlessScene, Scene, SceneCommand};
pub use voice::{AudioClip, AudioSink};
