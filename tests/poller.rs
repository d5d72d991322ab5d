//! Fetch loop integration tests against a fake action queue

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;
use tokio::sync::{mpsc, watch};

use avatar_puppeteer::{ActionClient, PollOutcome, Poller, SceneCommand};

mod common;
use common::{FakeQueue, Reply, envelope};

fn poller_for(
    config: &avatar_puppeteer::config::NetworkConfig,
) -> (Poller, mpsc::Receiver<SceneCommand>) {
    let client = ActionClient::new(config).expect("client");
    let (tx, rx) = mpsc::channel(16);
    (Poller::new(client, config, tx), rx)
}

async fn next_command(rx: &mut mpsc::Receiver<SceneCommand>) -> Option<SceneCommand> {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .ok()
        .flatten()
}

#[tokio::test]
async fn test_first_action_dispatched_and_deleted() {
    let queue = FakeQueue::start().await;
    queue.set_actions(Reply::ok(envelope(&json!([
        { "id": 7, "action_name": "wave", "group_id": 2, "audio_url": "" },
        { "id": 8, "action_name": "nod", "group_id": 3 },
    ]))));

    let (poller, mut rx) = poller_for(&queue.network_config());

    assert_eq!(poller.poll_actions().await, PollOutcome::Dispatched(7));

    match next_command(&mut rx).await {
        Some(SceneCommand::Action(record)) => {
            assert_eq!(record.id, 7);
            assert_eq!(record.action_name, "wave");
            assert_eq!(record.group_id, 2);
        }
        other => panic!("expected action, got {other:?}"),
    }

    let deletes = queue.wait_for_deletes(1).await;
    assert_eq!(deletes.len(), 1);
    assert_eq!(deletes[0].params.get("action_id").map(String::as_str), Some("7"));
    assert_eq!(deletes[0].params.get("delete_all").map(String::as_str), Some("false"));
    assert_eq!(
        deletes[0].content_type.as_deref(),
        Some("application/x-www-form-urlencoded")
    );

    // Empty audio URL: no clip is loaded
    assert!(tokio::time::timeout(Duration::from_millis(200), rx.recv()).await.is_err());
}

#[tokio::test]
async fn test_audio_loaded_for_dispatchable_group() {
    let queue = FakeQueue::start().await;
    let audio_url = queue.url("/audio.wav");
    queue.set_actions(Reply::ok(envelope(&json!([
        { "id": 3, "action_name": "talk", "group_id": 5, "audio_url": audio_url },
    ]))));

    let (poller, mut rx) = poller_for(&queue.network_config());
    assert_eq!(poller.poll_actions().await, PollOutcome::Dispatched(3));

    assert!(matches!(next_command(&mut rx).await, Some(SceneCommand::Action(_))));
    match next_command(&mut rx).await {
        Some(SceneCommand::Speak(clip)) => {
            assert!((clip.duration() - 0.5).abs() < 0.01);
        }
        other => panic!("expected speak, got {other:?}"),
    }
}

#[tokio::test]
async fn test_audio_skipped_for_unknown_group() {
    let queue = FakeQueue::start().await;
    let audio_url = queue.url("/audio.wav");
    queue.set_actions(Reply::ok(envelope(&json!([
        { "id": 4, "action_name": "noop", "group_id": 0, "audio_url": audio_url },
    ]))));

    let (poller, mut rx) = poller_for(&queue.network_config());
    assert_eq!(poller.poll_actions().await, PollOutcome::Dispatched(4));

    assert!(matches!(next_command(&mut rx).await, Some(SceneCommand::Action(_))));
    assert!(tokio::time::timeout(Duration::from_millis(200), rx.recv()).await.is_err());

    // Still consumed
    assert_eq!(queue.wait_for_deletes(1).await.len(), 1);
}

#[tokio::test]
async fn test_camera_from_first_named_record() {
    let queue = FakeQueue::start().await;
    queue.set_cameras(Reply::ok(envelope(&json!([
        { "id": 1, "name": "" },
        { "id": 2, "name": "2" },
        { "id": 3, "name": "0" },
    ]))));

    let (poller, mut rx) = poller_for(&queue.network_config());
    assert_eq!(poller.poll_camera().await, PollOutcome::Camera(2));
    assert!(matches!(next_command(&mut rx).await, Some(SceneCommand::Camera(2))));
    assert_eq!(queue.camera_hits(), 1);
}

#[tokio::test]
async fn test_invalid_camera_name_sends_nothing() {
    let queue = FakeQueue::start().await;
    queue.set_cameras(Reply::ok(envelope(&json!([
        { "id": 1, "name": "left" },
        { "id": 2, "name": "1" },
    ]))));

    let (poller, mut rx) = poller_for(&queue.network_config());
    assert_eq!(poller.poll_camera().await, PollOutcome::InvalidCamera);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_camera_records_without_names() {
    let queue = FakeQueue::start().await;
    queue.set_cameras(Reply::ok(envelope(&json!([{ "id": 1, "name": null }]))));

    let (poller, _rx) = poller_for(&queue.network_config());
    assert_eq!(poller.poll_camera().await, PollOutcome::NoCamera);
}

#[tokio::test]
async fn test_concurrent_fetch_skipped() {
    let queue = FakeQueue::start().await;
    queue.set_delay(Duration::from_millis(300));
    queue.set_actions(Reply::ok(envelope(&json!([{ "id": 9, "group_id": 1 }]))));

    let (poller, _rx) = poller_for(&queue.network_config());
    let (first, second) = tokio::join!(poller.poll_actions(), poller.poll_actions());

    assert_eq!(first, PollOutcome::Dispatched(9));
    assert_eq!(second, PollOutcome::Busy);
    assert_eq!(queue.action_hits(), 1);

    // Flag released once the exchange finished
    assert_eq!(poller.poll_actions().await, PollOutcome::Dispatched(9));
    assert_eq!(queue.action_hits(), 2);
}

#[tokio::test]
async fn test_camera_fetch_skipped_while_action_fetch_in_flight() {
    let queue = FakeQueue::start().await;
    queue.set_delay(Duration::from_millis(300));
    queue.set_actions(Reply::ok(envelope(&json!([{ "id": 9, "group_id": 1 }]))));
    queue.set_cameras(Reply::ok(envelope(&json!([{ "id": 1, "name": "1" }]))));

    let (poller, _rx) = poller_for(&queue.network_config());
    let (action, camera) = tokio::join!(poller.poll_actions(), poller.poll_camera());

    assert_eq!(action, PollOutcome::Dispatched(9));
    assert_eq!(camera, PollOutcome::Busy);
    assert_eq!(queue.camera_hits(), 0);

    assert_eq!(poller.poll_camera().await, PollOutcome::Camera(1));
    assert_eq!(queue.camera_hits(), 1);
}

#[tokio::test]
async fn test_record_with_null_numbers_is_dispatched_and_deleted() {
    let queue = FakeQueue::start().await;
    queue.set_actions(Reply::ok(
        r#"{"code":0,"message":"ok","data":{"data":[{"id":31,"action_name":"bow","group_id":4,"priority":null,"is_executed":null,"audio_url":null,"audio_duration":null}],"count":null}}"#,
    ));

    let (poller, mut rx) = poller_for(&queue.network_config());
    assert_eq!(poller.poll_actions().await, PollOutcome::Dispatched(31));

    match next_command(&mut rx).await {
        Some(SceneCommand::Action(record)) => {
            assert_eq!(record.group_id, 4);
            assert_eq!(record.priority, 0);
        }
        other => panic!("expected action, got {other:?}"),
    }

    let deletes = queue.wait_for_deletes(1).await;
    assert_eq!(deletes[0].params.get("action_id").map(String::as_str), Some("31"));
}

#[tokio::test]
async fn test_server_error_reports_failure() {
    let queue = FakeQueue::start().await;
    queue.set_actions(Reply::status(StatusCode::INTERNAL_SERVER_ERROR));

    let (poller, mut rx) = poller_for(&queue.network_config());
    assert_eq!(poller.poll_actions().await, PollOutcome::Failed);
    assert!(matches!(next_command(&mut rx).await, Some(SceneCommand::ShowError)));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(queue.deletes().is_empty());
}

#[tokio::test]
async fn test_unreachable_server_reports_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut config = avatar_puppeteer::config::NetworkConfig::default();
    config.get_url = format!("http://{addr}/get_action_mapping");
    config.change_camera_url = format!("http://{addr}/add_camera_change");

    let (poller, _rx) = poller_for(&config);
    assert_eq!(
        poller.cycle().await,
        (PollOutcome::Failed, PollOutcome::Failed)
    );
}

#[tokio::test]
async fn test_malformed_body_treated_as_empty() {
    let queue = FakeQueue::start().await;
    queue.set_actions(Reply::ok("<html>not json</html>"));
    queue.set_cameras(Reply::ok("{"));

    let (poller, mut rx) = poller_for(&queue.network_config());
    assert_eq!(
        poller.cycle().await,
        (PollOutcome::Empty, PollOutcome::Empty)
    );
    assert!(matches!(next_command(&mut rx).await, Some(SceneCommand::ClearDisplay)));
}

#[tokio::test]
async fn test_empty_batch_clears_display() {
    let queue = FakeQueue::start().await;
    queue.set_actions(Reply::ok(r#"{"code":0,"message":"ok","data":null}"#));

    let (poller, mut rx) = poller_for(&queue.network_config());
    assert_eq!(poller.poll_actions().await, PollOutcome::Empty);
    assert!(matches!(next_command(&mut rx).await, Some(SceneCommand::ClearDisplay)));
}

#[tokio::test]
async fn test_auto_delete_disabled() {
    let queue = FakeQueue::start().await;
    queue.set_actions(Reply::ok(envelope(&json!([{ "id": 5, "group_id": 2 }]))));

    let mut config = queue.network_config();
    config.auto_delete = false;

    let (poller, _rx) = poller_for(&config);
    assert_eq!(poller.poll_actions().await, PollOutcome::Dispatched(5));

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(queue.deletes().is_empty());
}

#[tokio::test]
async fn test_repeated_action_within_dedup_window() {
    let queue = FakeQueue::start().await;
    queue.set_actions(Reply::ok(envelope(&json!([{ "id": 7, "group_id": 2 }]))));

    let mut config = queue.network_config();
    config.dedup_window = Some(Duration::from_secs(60));

    let (poller, mut rx) = poller_for(&config);
    assert_eq!(poller.poll_actions().await, PollOutcome::Dispatched(7));
    assert_eq!(poller.poll_actions().await, PollOutcome::Duplicate(7));

    assert!(matches!(next_command(&mut rx).await, Some(SceneCommand::Action(_))));
    assert!(rx.try_recv().is_err());

    // Both sightings are deleted
    assert_eq!(queue.wait_for_deletes(2).await.len(), 2);
}

#[tokio::test]
async fn test_repeated_action_without_dedup_is_dispatched_again() {
    let queue = FakeQueue::start().await;
    queue.set_actions(Reply::ok(envelope(&json!([{ "id": 7, "group_id": 2 }]))));

    let (poller, _rx) = poller_for(&queue.network_config());
    assert_eq!(poller.poll_actions().await, PollOutcome::Dispatched(7));
    assert_eq!(poller.poll_actions().await, PollOutcome::Dispatched(7));
}

#[tokio::test]
async fn test_run_loop_stops_on_shutdown() {
    let queue = FakeQueue::start().await;
    queue.set_actions(Reply::ok(envelope(&json!([{ "id": 11, "group_id": 3 }]))));

    let (poller, mut rx) = poller_for(&queue.network_config());
    let (stop_tx, stop_rx) = watch::channel(false);
    let task = tokio::spawn(poller.run(stop_rx));

    assert!(matches!(next_command(&mut rx).await, Some(SceneCommand::Action(_))));

    stop_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("fetch loop did not stop")
        .unwrap();

    assert!(queue.action_hits() >= 1);
    assert!(queue.camera_hits() >= 1);
}
