//! Outbound delivery: private replies and session-wide broadcasts.
//!
//! The dispatcher only talks to the [`Gateway`] trait. The server plugs in
//! a [`Hub`], which encodes each message once and pushes the bytes into
//! the per-connection channels that the connection writers drain.

use std::collections::HashMap;
use std::sync::Arc;

use parlor_protocol::{Codec, JsonCodec, PlayerId, ServerMessage};
use parlor_session::Session;
use tokio::sync::mpsc;

/// One encoded frame, shared by every recipient of a broadcast.
pub type Frame = Arc<[u8]>;

/// Outbound channel of a single connection.
pub type FrameSender = mpsc::UnboundedSender<Frame>;

/// Where the dispatcher's messages go.
pub trait Gateway {
    /// Sends `msg` to each listed player. Unknown recipients are skipped.
    fn deliver(&mut self, recipients: &[PlayerId], msg: &ServerMessage<&Session>);

    /// Sends `msg` to one player only.
    fn reply(&mut self, to: PlayerId, msg: &ServerMessage<&Session>) {
        self.deliver(&[to], msg);
    }

    /// Sends `msg` to every player seated in `session`.
    fn broadcast(&mut self, session: &Session, msg: &ServerMessage<&Session>) {
        let recipients: Vec<PlayerId> = session.players.iter().map(|p| p.id).collect();
        self.deliver(&recipients, msg);
    }
}

// ---------------------------------------------------------------------------
// Hub
// ---------------------------------------------------------------------------

/// Channel-backed [`Gateway`] over live connections.
pub struct Hub<C: Codec = JsonCodec> {
    clients: HashMap<PlayerId, FrameSender>,
    codec: C,
}

impl Hub<JsonCodec> {
    pub fn new() -> Self {
        Self::with_codec(JsonCodec)
    }
}

impl Default for Hub<JsonCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Codec> Hub<C> {
    pub fn with_codec(codec: C) -> Self {
        Self {
            clients: HashMap::new(),
            codec,
        }
    }

    /// Starts routing frames for `id` into `sender`.
    pub fn register(&mut self, id: PlayerId, sender: FrameSender) {
        if self.clients.insert(id, sender).is_some() {
            tracing::warn!(player_id = %id, "connection registered twice, replacing sender");
        }
    }

    pub fn unregister(&mut self, id: PlayerId) {
        self.clients.remove(&id);
    }

    /// Number of connections currently registered.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl<C: Codec> Gateway for Hub<C> {
    fn deliver(&mut self, recipients: &[PlayerId], msg: &ServerMessage<&Session>) {
        let frame: Frame = match self.codec.encode(msg) {
            Ok(bytes) => bytes.into(),
            Err(e) => {
                tracing::error!(error = %e, "failed to encode outbound message");
                return;
            }
        };
        for id in recipients {
            let Some(sender) = self.clients.get(id) else {
                tracing::debug!(player_id = %id, "no connection for recipient");
                continue;
            };
            // A closed channel means the writer is gone; its disconnect
            // command is already on the way.
            if sender.send(Arc::clone(&frame)).is_err() {
                tracing::debug!(player_id = %id, "recipient channel closed");
            }
        }
    }
}
