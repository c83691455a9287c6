//! Per-connection handler: decode inbound frames, forward them to the
//! coordinator, and write outbound frames back to the socket.
//!
//! Each accepted connection gets its own Tokio task running
//! [`handle_connection`], plus a writer task draining its outbound
//! channel. The flow is:
//!   1. Register the outbound channel with the coordinator
//!   2. Loop: receive frame → decode → forward
//!   3. On close or error, the guard reports the disconnect

use std::sync::Arc;

use parlor_protocol::{ClientMessage, Codec, JsonCodec, PlayerId, ServerMessage};
use parlor_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::ParlorError;
use crate::coordinator::CoordinatorHandle;
use crate::gateway::Frame;

/// Reports the disconnect when the handler exits, however it exits.
struct ConnectionGuard {
    player_id: PlayerId,
    coordinator: CoordinatorHandle,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.coordinator.disconnected(self.player_id);
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    coordinator: CoordinatorHandle,
) -> Result<(), ParlorError> {
    let conn = Arc::new(conn);
    let player_id = PlayerId::from(conn.id());
    tracing::info!(%player_id, peer = %conn.peer_addr(), "player connected");

    let (tx, mut rx) = mpsc::unbounded_channel::<Frame>();
    coordinator.connected(player_id, tx.clone());
    let _guard = ConnectionGuard {
        player_id,
        coordinator: coordinator.clone(),
    };

    let writer = {
        let conn = Arc::clone(&conn);
        tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                if let Err(e) = conn.send(&frame).await {
                    tracing::debug!(%player_id, error = %e, "send failed, writer stopping");
                    break;
                }
            }
        })
    };

    let codec = JsonCodec;
    let result = loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%player_id, "connection closed cleanly");
                break Ok(());
            }
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break Err(e.into());
            }
        };

        match codec.decode::<ClientMessage>(&data) {
            Ok(msg) => coordinator.inbound(player_id, msg),
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "failed to decode client message");
                let reply: ServerMessage<()> =
                    ServerMessage::error(format!("invalid message: {e}"));
                let frame: Frame = codec.encode(&reply)?.into();
                // Only fails once the writer is gone, and then the
                // next recv reports the close.
                let _ = tx.send(frame);
            }
        }
    };

    writer.abort();
    // _guard drops here → disconnect reaches the coordinator.
    result
}
