use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use arm_relay::{HttpActuator, ModelAdapter, RelayServer, RelayService, ServoMap};
use futures_util::{SinkExt, StreamExt};
use httpmock::prelude::*;
use tempfile::TempDir;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

// 3 -> 4 linear network: first three outputs echo the inputs, the fourth
// sums them. Unit scalers keep the numbers easy to check by hand.
fn write_echo_model(dir: &Path) {
    let network = serde_json::json!({
        "input_dim": 3,
        "layers": [{
            "weights": [
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
                [1.0, 1.0, 1.0]
            ],
            "bias": [0.0, 0.0, 0.0, 0.0],
            "activation": "linear"
        }]
    });
    let unit_scaler_3 = serde_json::json!({
        "mean": [0.0, 0.0, 0.0],
        "scale": [1.0, 1.0, 1.0]
    });
    let unit_scaler_4 = serde_json::json!({
        "mean": [0.0, 0.0, 0.0, 0.0],
        "scale": [1.0, 1.0, 1.0, 1.0]
    });

    std::fs::write(dir.join("network.json"), network.to_string()).unwrap();
    std::fs::write(dir.join("x_scaler.json"), unit_scaler_3.to_string()).unwrap();
    std::fs::write(dir.join("y_scaler.json"), unit_scaler_4.to_string()).unwrap();
}

async fn start_relay(actuator_url: String, actuator_timeout_ms: u64) -> SocketAddr {
    let model_dir = TempDir::new().unwrap();
    write_echo_model(model_dir.path());
    let adapter = ModelAdapter::load(model_dir.path()).unwrap();

    let actuator =
        HttpActuator::new(actuator_url, Duration::from_millis(actuator_timeout_ms)).unwrap();
    let relay = Arc::new(RelayService::new(adapter, actuator, ServoMap::default()));

    let server = RelayServer::bind(SocketAddr::from(([127, 0, 0, 1], 0)), relay)
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    addr
}

async fn wait_for_hits(mock: &httpmock::Mock<'_>, expected: usize) {
    for _ in 0..100 {
        if mock.hits() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("actuator mock never reached {} hits", expected);
}

async fn recv_broadcast(
    read: &mut (impl StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
          + Unpin),
) -> serde_json::Value {
    let frame = timeout(Duration::from_secs(5), read.next())
        .await
        .expect("timed out waiting for a broadcast")
        .expect("connection closed")
        .expect("transport error");
    serde_json::from_str(frame.to_text().unwrap()).unwrap()
}

#[tokio::test]
async fn test_position_is_relayed_to_listener_and_actuator() {
    let actuator = MockServer::start();
    // [10, 20, 30] echoes to angles [10, 20, 30, 60], which the default
    // servo map turns into these exact pulse widths
    let actuator_mock = actuator.mock(|when, then| {
        when.method(POST)
            .path("/")
            .header("content-type", "application/json")
            .json_body(serde_json::json!({ "angles": [700, 1406, 2354, 1400] }));
        then.status(200);
    });

    let addr = start_relay(actuator.url("/"), 1000).await;
    let (ws, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
    let (mut write, mut read) = ws.split();

    write
        .send(Message::Text(
            r#"{"Target_position": [10.0, 20.0, 30.0]}"#.to_string(),
        ))
        .await
        .unwrap();

    let body = recv_broadcast(&mut read).await;
    let angles = body["Target_position"].as_array().unwrap();
    assert_eq!(angles.len(), 4);
    assert_eq!(angles[0].as_f64().unwrap(), 10.0);
    assert_eq!(angles[3].as_f64().unwrap(), 60.0);

    wait_for_hits(&actuator_mock, 1).await;
    actuator_mock.assert();
}

#[tokio::test]
async fn test_frame_without_position_produces_nothing() {
    let actuator = MockServer::start();
    let actuator_mock = actuator.mock(|when, then| {
        when.method(POST).path("/");
        then.status(200);
    });

    let addr = start_relay(actuator.url("/"), 1000).await;
    let (ws, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
    let (mut write, mut read) = ws.split();

    // dropped frame first, then a valid one; frames are processed in
    // order, so the first broadcast we see must come from the valid one
    write
        .send(Message::Text(
            r#"{"hand_position": [9.0, 9.0, 9.0]}"#.to_string(),
        ))
        .await
        .unwrap();
    write
        .send(Message::Text(
            r#"{"Target_position": [1.0, 2.0, 3.0]}"#.to_string(),
        ))
        .await
        .unwrap();

    let body = recv_broadcast(&mut read).await;
    let angles = body["Target_position"].as_array().unwrap();
    assert_eq!(angles[0].as_f64().unwrap(), 1.0);
    assert_eq!(angles[3].as_f64().unwrap(), 3.0);

    // only the valid frame reached the actuator
    wait_for_hits(&actuator_mock, 1).await;
    assert_eq!(actuator_mock.hits(), 1);
}

#[tokio::test]
async fn test_every_connected_listener_receives_the_broadcast() {
    let actuator = MockServer::start();
    actuator.mock(|when, then| {
        when.method(POST).path("/");
        then.status(200);
    });

    let addr = start_relay(actuator.url("/"), 1000).await;

    let (sender_ws, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
    let (mut sender_write, mut sender_read) = sender_ws.split();
    let (watcher_ws, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
    let (_watcher_write, mut watcher_read) = watcher_ws.split();

    // give the server a beat to finish registering both subscriptions
    tokio::time::sleep(Duration::from_millis(100)).await;

    sender_write
        .send(Message::Text(
            r#"{"Target_position": [1.0, 2.0, 3.0]}"#.to_string(),
        ))
        .await
        .unwrap();

    let to_sender = recv_broadcast(&mut sender_read).await;
    let to_watcher = recv_broadcast(&mut watcher_read).await;
    assert_eq!(to_sender, to_watcher);
}

#[tokio::test]
async fn test_disconnected_listener_gets_no_further_broadcasts() {
    let actuator = MockServer::start();
    actuator.mock(|when, then| {
        when.method(POST).path("/");
        then.status(200);
    });

    let addr = start_relay(actuator.url("/"), 1000).await;

    let (sender_ws, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
    let (mut sender_write, mut sender_read) = sender_ws.split();
    let (watcher_ws, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
    let (mut watcher_write, mut watcher_read) = watcher_ws.split();

    // give the server a beat to finish registering both subscriptions
    tokio::time::sleep(Duration::from_millis(100)).await;

    sender_write
        .send(Message::Text(
            r#"{"Target_position": [1.0, 2.0, 3.0]}"#.to_string(),
        ))
        .await
        .unwrap();
    recv_broadcast(&mut sender_read).await;
    recv_broadcast(&mut watcher_read).await;

    // watcher leaves; the relay must keep serving the remaining listener
    watcher_write.send(Message::Close(None)).await.unwrap();
    drop(watcher_write);
    drop(watcher_read);

    sender_write
        .send(Message::Text(
            r#"{"Target_position": [4.0, 5.0, 6.0]}"#.to_string(),
        ))
        .await
        .unwrap();
    let body = recv_broadcast(&mut sender_read).await;
    assert_eq!(body["Target_position"][0].as_f64().unwrap(), 4.0);
}

#[tokio::test]
async fn test_actuator_timeout_does_not_block_the_next_frame() {
    let actuator = MockServer::start();
    // every POST stalls past the client timeout
    let actuator_mock = actuator.mock(|when, then| {
        when.method(POST).path("/");
        then.status(200).delay(Duration::from_millis(1500));
    });

    let addr = start_relay(actuator.url("/"), 100).await;
    let (ws, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
    let (mut write, mut read) = ws.split();

    write
        .send(Message::Text(
            r#"{"Target_position": [1.0, 2.0, 3.0]}"#.to_string(),
        ))
        .await
        .unwrap();
    let first = recv_broadcast(&mut read).await;
    assert_eq!(first["Target_position"][0].as_f64().unwrap(), 1.0);

    write
        .send(Message::Text(
            r#"{"Target_position": [4.0, 5.0, 6.0]}"#.to_string(),
        ))
        .await
        .unwrap();
    let second = recv_broadcast(&mut read).await;
    assert_eq!(second["Target_position"][0].as_f64().unwrap(), 4.0);

    wait_for_hits(&actuator_mock, 2).await;
}
