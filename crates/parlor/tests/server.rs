//! End-to-end tests: a real server on an OS-assigned port, driven by
//! plain tokio-tungstenite clients speaking the JSON protocol.

use std::time::Duration;

use tokio::io::AsyncReadExt;

use futures_util::{SinkExt, StreamExt};
use parlor::ParlorServerBuilder;
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

type Ws = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

// =========================================================================
// Helpers
// =========================================================================

async fn start() -> String {
    let server = ParlorServerBuilder::new()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should bind");
    let addr = server.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    addr
}

async fn connect(addr: &str) -> Ws {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("client should connect");
    ws
}

async fn send(ws: &mut Ws, msg: Value) {
    ws.send(Message::text(msg.to_string())).await.unwrap();
}

async fn recv(ws: &mut Ws) -> Value {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("message within 2s")
        .expect("stream open")
        .expect("valid frame");
    serde_json::from_slice(&msg.into_data()).expect("JSON frame")
}

/// Receives until a message of type `kind` arrives.
async fn recv_type(ws: &mut Ws, kind: &str) -> Value {
    loop {
        let msg = recv(ws).await;
        if msg["type"] == kind {
            return msg;
        }
    }
}

async fn create(ws: &mut Ws, game: &str, name: &str) -> String {
    send(ws, json!({"type": "create_session", "gameType": game, "playerName": name})).await;
    let created = recv_type(ws, "session_created").await;
    created["code"].as_str().unwrap().to_owned()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_tictactoe_game_over_websocket() {
    let addr = start().await;
    let mut alice = connect(&addr).await;
    let mut bob = connect(&addr).await;

    let code = create(&mut alice, "tictactoe", "Alice").await;
    send(&mut bob, json!({"type": "join_session", "code": code, "playerName": "Bob"})).await;

    let joined = recv_type(&mut bob, "session_joined").await;
    let bob_id = joined["playerId"].clone();
    let start = recv_type(&mut alice, "game_start").await;
    assert_eq!(start["session"]["players"][0]["symbol"], "X");
    let alice_id = start["session"]["players"][0]["id"].clone();
    assert_ne!(alice_id, bob_id);
    recv_type(&mut bob, "game_start").await;

    let moves = [(0, true), (4, false), (1, true), (7, false), (2, true)];
    let mut last = Value::Null;
    for (cell, by_alice) in moves {
        let ws = if by_alice { &mut alice } else { &mut bob };
        send(ws, json!({"type": "game_action", "code": code, "action": "move", "payload": {"cellIndex": cell}})).await;
        // Both players see every accepted move.
        last = recv_type(&mut alice, "game_update").await;
        recv_type(&mut bob, "game_update").await;
    }

    let game = &last["session"]["gameState"];
    assert_eq!(game["winner"], alice_id);
    assert_eq!(game["winningLine"], json!([0, 1, 2]));
    assert_eq!(last["session"]["state"], "finished");
}

#[tokio::test]
async fn test_undecodable_frame_gets_error_and_connection_survives() {
    let addr = start().await;
    let mut ws = connect(&addr).await;

    ws.send(Message::text("not json")).await.unwrap();
    let reply = recv(&mut ws).await;
    assert_eq!(reply["type"], "error");
    assert!(reply["message"].as_str().unwrap().starts_with("invalid message"));

    send(&mut ws, json!({"type": "teleport"})).await;
    assert_eq!(recv(&mut ws).await["type"], "error");

    let code = create(&mut ws, "rps", "Solo").await;
    assert_eq!(code.len(), 6);
}

#[tokio::test]
async fn test_close_mid_game_notifies_opponent() {
    let addr = start().await;
    let mut alice = connect(&addr).await;
    let mut bob = connect(&addr).await;

    let code = create(&mut alice, "connect4", "Alice").await;
    send(&mut bob, json!({"type": "join_session", "code": code, "playerName": "Bob"})).await;
    let joined = recv_type(&mut bob, "session_joined").await;
    recv_type(&mut alice, "game_start").await;

    bob.close(None).await.unwrap();

    let update = recv_type(&mut alice, "session_update").await;
    assert_eq!(update["session"]["players"].as_array().unwrap().len(), 1);
    let left = recv_type(&mut alice, "player_left").await;
    assert_eq!(left["playerId"], joined["playerId"]);
}

#[tokio::test]
async fn test_join_with_lowercase_code() {
    let addr = start().await;
    let mut host = connect(&addr).await;
    let mut guest = connect(&addr).await;

    let code = create(&mut host, "hangman", "Host").await;
    send(&mut guest, json!({"type": "join_session", "code": code.to_lowercase(), "playerName": ""})).await;
    let joined = recv_type(&mut guest, "session_joined").await;
    assert_eq!(joined["code"], code.as_str());
    assert_eq!(joined["session"]["players"][1]["name"], "Player 2");
}

#[tokio::test]
async fn test_stalled_handshake_does_not_block_other_clients() {
    let server = ParlorServerBuilder::new()
        .bind("127.0.0.1:0")
        .handshake_timeout(Duration::from_millis(200))
        .build()
        .await
        .unwrap();
    let addr = server.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // A peer that opens TCP and never sends the upgrade request.
    let mut idle = tokio::net::TcpStream::connect(&addr).await.unwrap();

    let mut ws = tokio::time::timeout(Duration::from_secs(2), connect(&addr))
        .await
        .expect("second client connects while the first is stalled");
    let code = create(&mut ws, "tictactoe", "Alice").await;
    assert_eq!(code.len(), 6);

    // The stalled peer is dropped once its handshake deadline passes.
    let mut buf = [0u8; 16];
    let read = tokio::time::timeout(Duration::from_secs(2), idle.read(&mut buf))
        .await
        .expect("stalled peer closed by the server");
    assert!(matches!(read, Ok(0) | Err(_)));
}
