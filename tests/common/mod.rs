//! Shared test utilities
//!
//! A fake action queue served by axum on an ephemeral port. Each endpoint
//! replies with whatever the test configured and records what it received.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{Value, json};

use avatar_puppeteer::config::NetworkConfig;

/// Canned response for one endpoint
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.into(),
        }
    }

    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }
}

/// A delete request as seen by the server
#[derive(Debug, Clone)]
pub struct DeleteRequest {
    pub params: HashMap<String, String>,
    pub content_type: Option<String>,
}

/// Shared state of the fake queue
pub struct QueueState {
    pub actions: Mutex<Reply>,
    pub cameras: Mutex<Reply>,
    pub delay: Mutex<Duration>,
    pub action_hits: AtomicUsize,
    pub camera_hits: AtomicUsize,
    pub deletes: Mutex<Vec<DeleteRequest>>,
    pub audio: Vec<u8>,
}

/// Running fake queue server
pub struct FakeQueue {
    pub addr: SocketAddr,
    pub state: Arc<QueueState>,
}

impl FakeQueue {
    /// Start a server with empty batches on both fetch endpoints
    pub async fn start() -> Self {
        let state = Arc::new(QueueState {
            actions: Mutex::new(Reply::ok(envelope(&json!([])))),
            cameras: Mutex::new(Reply::ok(envelope(&json!([])))),
            delay: Mutex::new(Duration::ZERO),
            action_hits: AtomicUsize::new(0),
            camera_hits: AtomicUsize::new(0),
            deletes: Mutex::new(Vec::new()),
            audio: wav_bytes(0.5, 16_000),
        });

        let router = Router::new()
            .route("/get_action_mapping", get(actions))
            .route("/add_camera_change", get(cameras))
            .route("/delete_action_mapping", post(delete))
            .route("/audio.wav", get(audio))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind fake queue");
        let addr = listener.local_addr().expect("no local addr");

        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        Self { addr, state }
    }

    /// Network settings pointing at this server, with fast timings
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            get_url: self.url("/get_action_mapping"),
            delete_url: self.url("/delete_action_mapping"),
            change_camera_url: self.url("/add_camera_change"),
            first_delay: Duration::ZERO,
            interval: Duration::from_millis(50),
            timeout: Duration::from_secs(2),
            auto_delete: true,
            dedup_window: None,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn set_actions(&self, reply: Reply) {
        *self.state.actions.lock().unwrap() = reply;
    }

    pub fn set_cameras(&self, reply: Reply) {
        *self.state.cameras.lock().unwrap() = reply;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock().unwrap() = delay;
    }

    pub fn action_hits(&self) -> usize {
        self.state.action_hits.load(Ordering::SeqCst)
    }

    pub fn camera_hits(&self) -> usize {
        self.state.camera_hits.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> Vec<DeleteRequest> {
        self.state.deletes.lock().unwrap().clone()
    }

    /// Wait until at least `count` deletes arrived, or two seconds pass
    pub async fn wait_for_deletes(&self, count: usize) -> Vec<DeleteRequest> {
        for _ in 0..200 {
            let deletes = self.deletes();
            if deletes.len() >= count {
                return deletes;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.deletes()
    }
}

async fn actions(State(state): State<Arc<QueueState>>) -> (StatusCode, String) {
    state.action_hits.fetch_add(1, Ordering::SeqCst);
    let delay = *state.delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let reply = state.actions.lock().unwrap().clone();
    (reply.status, reply.body)
}

async fn cameras(State(state): State<Arc<QueueState>>) -> (StatusCode, String) {
    state.camera_hits.fetch_add(1, Ordering::SeqCst);
    let reply = state.cameras.lock().unwrap().clone();
    (reply.status, reply.body)
}

async fn delete(
    State(state): State<Arc<QueueState>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> StatusCode {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    state.deletes.lock().unwrap().push(DeleteRequest {
        params,
        content_type,
    });
    StatusCode::OK
}

async fn audio(State(state): State<Arc<QueueState>>) -> (StatusCode, Vec<u8>) {
    (StatusCode::OK, state.audio.clone())
}

/// Wrap records in the queue's response envelope
pub fn envelope(records: &Value) -> String {
    let count = records.as_array().map_or(0, Vec::len);
    json!({
        "code": 0,
        "message": "ok",
        "data": { "data": records, "count": count },
    })
    .to_string()
}

/// Mono 16-bit WAV of silence
pub fn wav_bytes(seconds: f32, sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("wav writer");
        let frames = (seconds * sample_rate as f32) as usize;
        for _ in 0..frames {
            writer.write_sample(0i16).expect("wav sample");
        }
        writer.finalize().expect("wav finalize");
    }
    cursor.into_inner()
}
