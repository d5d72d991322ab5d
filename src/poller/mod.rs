//! Fetch loop
//!
//! After an initial delay, repeats until shutdown: fetch the next action,
//! fetch the next camera change, sleep. Failures are logged and the next
//! cycle simply tries again; there is no retry or backoff.
//!
//! Decoded work is forwarded to the scene as [`SceneCommand`]s. Deleting a
//! consumed action and downloading its audio run as detached tasks.

mod dedup;

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::api::{ActionClient, ApiEnvelope, BusyFlag, decode_envelope};
use crate::avatar::dispatch_group;
use crate::camera::requested_camera;
use crate::config::NetworkConfig;
use crate::scene::SceneCommand;
use crate::voice::AudioClip;
use crate::{Error, Result};

pub use dedup::SeenActions;

/// What a single fetch step did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Another fetch was outstanding; nothing sent
    Busy,
    /// Transport failure, timeout or non-2xx status
    Failed,
    /// Batch empty, absent or undecodable
    Empty,
    /// First action handed to the scene
    Dispatched(i64),
    /// First action already dispatched within the dedup window
    Duplicate(i64),
    /// Camera switch requested
    Camera(i32),
    /// No record named a camera
    NoCamera,
    /// First camera name was not an integer
    InvalidCamera,
}

/// Polls the action queue and feeds the scene
pub struct Poller {
    client: ActionClient,
    busy: BusyFlag,
    first_delay: Duration,
    interval: Duration,
    auto_delete: bool,
    seen: Option<Mutex<SeenActions>>,
    tx: mpsc::Sender<SceneCommand>,
}

impl Poller {
    #[must_use]
    pub fn new(client: ActionClient, config: &NetworkConfig, tx: mpsc::Sender<SceneCommand>) -> Self {
        Self {
            client,
            busy: BusyFlag::default(),
            first_delay: config.first_delay,
            interval: config.interval,
            auto_delete: config.auto_delete,
            seen: config.dedup_window.map(|ttl| Mutex::new(SeenActions::new(ttl))),
            tx,
        }
    }

    /// Run the fetch loop until `shutdown` flips to `true` or its sender drops
    ///
    /// Shutdown is observed at the initial delay and between cycles; a cycle
    /// in progress runs to completion.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            first_delay = ?self.first_delay,
            interval = ?self.interval,
            auto_delete = self.auto_delete,
            "fetch loop starting"
        );

        tokio::select! {
            () = tokio::time::sleep(self.first_delay) => {}
            _ = shutdown.changed() => return,
        }

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.cycle().await;

            tokio::select! {
                () = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("fetch loop stopped");
    }

    /// One cycle: action fetch, then camera fetch
    pub async fn cycle(&self) -> (PollOutcome, PollOutcome) {
        let action = self.poll_actions().await;
        let camera = self.poll_camera().await;
        (action, camera)
    }

    /// Fetch and dispatch the first pending action
    pub async fn poll_actions(&self) -> PollOutcome {
        let body = {
            let Some(_guard) = self.busy.try_acquire() else {
                tracing::debug!("fetch already in flight, action poll skipped");
                return PollOutcome::Busy;
            };
            self.client.fetch_actions().await
        };

        let body = match body {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "action fetch failed");
                self.send(SceneCommand::ShowError).await;
                return PollOutcome::Failed;
            }
        };

        let Some(record) = decode_or_empty(&body, "action").into_first() else {
            tracing::debug!("no pending actions");
            self.send(SceneCommand::ClearDisplay).await;
            return PollOutcome::Empty;
        };

        let id = record.id;
        tracing::info!(
            id,
            action = %record.action_name,
            group = record.group_id,
            audio_duration = record.audio_duration,
            executed = record.is_executed,
            "action received"
        );

        if self.already_seen(id) {
            tracing::info!(id, "action already dispatched, skipping");
            if self.auto_delete {
                self.spawn_delete(id);
            }
            return PollOutcome::Duplicate(id);
        }

        let audio_url = dispatch_group(record.group_id)
            .and(record.audio_url())
            .map(ToString::to_string);

        self.send(SceneCommand::Action(record)).await;

        if let Some(url) = audio_url {
            self.spawn_audio(url);
        }

        if self.auto_delete {
            self.spawn_delete(id);
        }

        PollOutcome::Dispatched(id)
    }

    /// Fetch pending camera changes and request the first named camera
    pub async fn poll_camera(&self) -> PollOutcome {
        let body = {
            let Some(_guard) = self.busy.try_acquire() else {
                tracing::debug!("fetch already in flight, camera poll skipped");
                return PollOutcome::Busy;
            };
            self.client.fetch_camera_changes().await
        };

        let body = match body {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "camera fetch failed, cameras unchanged");
                self.send(SceneCommand::ShowError).await;
                return PollOutcome::Failed;
            }
        };

        let envelope = decode_or_empty(&body, "camera");
        if envelope.records().is_empty() {
            tracing::debug!("no pending camera changes");
            return PollOutcome::Empty;
        }

        match requested_camera(envelope.records()) {
            Ok(Some(index)) => {
                tracing::info!(camera = index, "camera change received");
                self.send(SceneCommand::Camera(index)).await;
                PollOutcome::Camera(index)
            }
            Ok(None) => PollOutcome::NoCamera,
            Err(e) => {
                tracing::warn!(error = %e, "camera change skipped");
                PollOutcome::InvalidCamera
            }
        }
    }

    /// Mark an action consumed without waiting for the result
    pub fn spawn_delete(&self, id: i64) -> tokio::task::JoinHandle<()> {
        let client = self.client.clone();
        tokio::spawn(async move {
            match client.delete_action(id, false).await {
                Ok(()) => tracing::info!(id, "action deleted"),
                Err(e) => tracing::error!(id, error = %e, "action delete failed"),
            }
        })
    }

    /// Download a clip and hand it to the scene when ready
    fn spawn_audio(&self, url: String) -> tokio::task::JoinHandle<()> {
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            match load_clip(&client, &url).await {
                Ok(clip) => {
                    tracing::debug!(url = %url, duration = clip.duration(), "audio loaded");
                    if tx.send(SceneCommand::Speak(clip)).await.is_err() {
                        tracing::debug!("scene closed, audio dropped");
                    }
                }
                Err(e) => tracing::error!(url = %url, error = %e, "audio load failed"),
            }
        })
    }

    fn already_seen(&self, id: i64) -> bool {
        self.seen.as_ref().is_some_and(|seen| {
            seen.lock()
                .map(|mut seen| seen.is_duplicate(id))
                .unwrap_or(false)
        })
    }

    async fn send(&self, command: SceneCommand) {
        if self.tx.send(command).await.is_err() {
            tracing::debug!("scene closed, command dropped");
        }
    }
}

/// Decode a response body, treating malformed JSON as an empty batch
fn decode_or_empty(body: &str, what: &str) -> ApiEnvelope {
    decode_envelope(body).unwrap_or_else(|e| {
        tracing::warn!(error = %e, kind = what, "undecodable response, treating as empty");
        ApiEnvelope::default()
    })
}

/// Download and decode an audio clip
async fn load_clip(client: &ActionClient, url: &str) -> Result<AudioClip> {
    let bytes = client.fetch_audio(url).await?;
    tokio::task::spawn_blocking(move || AudioClip::decode(&bytes))
        .await
        .map_err(|e| Error::Audio(format!("decode task failed: {e}")))?
}
