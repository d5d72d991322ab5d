//! Puppeteer daemon
//!
//! Wires the fetch loop to the scene. The poller runs as its own task; the
//! frame loop runs on the caller's task and is the only owner of the scene.

use std::future::Future;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};

use crate::api::ActionClient;
use crate::avatar::{Animator, BlendShapes};
use crate::camera::CameraRig;
use crate::poller::{PollOutcome, Poller};
use crate::scene::{HeadlessScene, Scene, SceneCommand};
use crate::voice::{AudioSink, SilentSink, SpeakerSink};
use crate::{Config, Result};

/// Pending scene commands before the poller waits
const COMMAND_BUFFER: usize = 32;

/// Main puppeteer daemon
pub struct Daemon {
    config: Config,
    audio: bool,
}

impl Daemon {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self {
            config,
            audio: false,
        }
    }

    /// Play downloaded clips on the default output device
    #[must_use]
    pub fn with_audio(mut self, enabled: bool) -> Self {
        self.audio = enabled;
        self
    }

    /// Run until Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub async fn run(self) -> Result<()> {
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        };
        self.run_until(shutdown).await
    }

    /// Run until `shutdown` resolves
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let client = ActionClient::new(&self.config.network)?;
        let (tx, mut rx) = mpsc::channel(COMMAND_BUFFER);
        let (stop_tx, stop_rx) = watch::channel(false);

        let poller = Poller::new(client, &self.config.network, tx);
        let poll_task = tokio::spawn(poller.run(stop_rx));

        let mut scene = HeadlessScene::headless(&self.config, self.audio_sink());

        tracing::info!(
            get_url = %self.config.network.get_url,
            cameras = self.config.cameras.len(),
            frame_rate = self.config.frame_rate,
            "puppeteer running"
        );

        run_frames(&mut scene, &mut rx, self.config.frame_period(), shutdown).await;

        // In-flight requests finish on their own; the loop exits at its next wait
        let _ = stop_tx.send(true);
        if let Err(e) = poll_task.await {
            tracing::warn!(error = %e, "fetch loop task failed");
        }
        scene.stop();

        Ok(())
    }

    /// Run a single fetch cycle against a fresh scene, without deleting
    ///
    /// Returns the cycle's outcomes and the scene after applying them.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub async fn run_once(&self) -> Result<(PollOutcome, PollOutcome, HeadlessScene)> {
        let mut network = self.config.network.clone();
        network.auto_delete = false;

        let client = ActionClient::new(&network)?;
        let (tx, mut rx) = mpsc::channel(COMMAND_BUFFER);
        let poller = Poller::new(client, &network, tx);

        let mut scene = HeadlessScene::headless(&self.config, Box::new(SilentSink));
        scene.start(0.0);

        let (action, camera) = poller.cycle().await;
        drop(poller);

        while let Ok(command) = rx.try_recv() {
            scene.apply(command);
        }

        Ok((action, camera, scene))
    }

    fn audio_sink(&self) -> Box<dyn AudioSink + Send> {
        if !self.audio {
            return Box::new(SilentSink);
        }

        match SpeakerSink::new() {
            Ok(sink) => Box::new(sink),
            Err(e) => {
                tracing::warn!(error = %e, "audio output unavailable, continuing silently");
                Box::new(SilentSink)
            }
        }
    }
}

/// Drive a scene: apply commands as they arrive and tick once per `period`
///
/// Returns when `shutdown` resolves. Scene time starts at 0.
pub async fn run_frames<A, B, C, F>(
    scene: &mut Scene<A, B, C>,
    rx: &mut mpsc::Receiver<SceneCommand>,
    period: Duration,
    shutdown: F,
) where
    A: Animator,
    B: BlendShapes,
    C: CameraRig,
    F: Future<Output = ()>,
{
    let start = Instant::now();
    let mut last = start;
    let mut frames = tokio::time::interval(period);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    scene.start(0.0);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                tracing::info!("shutdown requested");
                break;
            }
            Some(command) = rx.recv() => scene.apply(command),
            instant = frames.tick() => {
                let now = instant.duration_since(start).as_secs_f32();
                let dt = instant.duration_since(last).as_secs_f32();
                last = instant;
                scene.tick(now, dt);
            }
        }
    }
}
