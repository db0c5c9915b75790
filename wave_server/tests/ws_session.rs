mod support;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect() -> Socket {
    let base_url = support::ensure_server();
    let ws_url = base_url.replacen("http://", "ws://", 1) + "/ws";
    let (socket, _) = connect_async(ws_url).await.expect("ws connect");
    socket
}

async fn send_json(socket: &mut Socket, value: Value) {
    socket
        .send(Message::text(value.to_string()))
        .await
        .expect("ws send");
}

// Read text frames until one has the given `type`, failing after a few seconds.
async fn next_of_type(socket: &mut Socket, kind: &str) -> Value {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let msg = socket
                .next()
                .await
                .expect("stream should stay open")
                .expect("ws recv");
            let Ok(text) = msg.to_text() else { continue };
            let Ok(value) = serde_json::from_str::<Value>(text) else {
                continue;
            };
            if value["type"] == kind {
                return value;
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("no {kind} message in time"))
}

async fn join(socket: &mut Socket) -> u64 {
    send_json(
        socket,
        json!({ "type": "Join", "data": { "display_name": "tester" } }),
    )
    .await;
    let identity = next_of_type(socket, "Identity").await;
    identity["data"]["player_id"]
        .as_u64()
        .expect("identity carries player id")
}

#[tokio::test]
async fn when_joining_then_identity_is_followed_by_door_replay() {
    let mut socket = connect().await;
    let player_id = join(&mut socket).await;
    assert_ne!(player_id, 0);

    let replay = next_of_type(&mut socket, "Replay").await;
    let events = replay["data"]["events"]
        .as_array()
        .expect("replay events array");
    let doors: Vec<&Value> = events
        .iter()
        .filter(|e| e["type"] == "DoorState")
        .collect();

    assert_eq!(doors.len(), 2);
    assert!(doors.iter().any(|d| d["data"]["door_id"] == 1));
    assert!(
        doors
            .iter()
            .any(|d| d["data"]["door_id"] == 2 && d["data"]["is_open"] == false)
    );
}

#[tokio::test]
async fn when_emitting_arc_then_world_update_carries_its_init() {
    let mut socket = connect().await;
    let player_id = join(&mut socket).await;

    send_json(
        &mut socket,
        json!({ "type": "EmitStart", "data": { "aim": { "x": 1.0, "y": 0.0 }, "mode": "Arc" } }),
    )
    .await;

    let found = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let update = next_of_type(&mut socket, "WorldUpdate").await;
            let owned_init = update["data"]["events"]
                .as_array()
                .into_iter()
                .flatten()
                .any(|e| e["type"] == "ArcInit" && e["data"]["owner"] == player_id);
            if owned_init {
                return true;
            }
        }
    })
    .await
    .unwrap_or(false);
    assert!(found, "expected an ArcInit owned by player {player_id}");

    send_json(&mut socket, json!({ "type": "EmitStop" })).await;
}

#[tokio::test]
async fn when_first_message_is_not_join_then_connection_closes() {
    let mut socket = connect().await;
    send_json(&mut socket, json!({ "type": "EmitStop" })).await;

    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(msg) = socket.next().await {
            match msg {
                Ok(Message::Close(_)) | Err(_) => return true,
                Ok(_) => continue,
            }
        }
        true
    })
    .await
    .unwrap_or(false);
    assert!(closed);
}
