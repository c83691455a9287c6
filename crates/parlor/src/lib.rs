//! # Parlor
//!
//! Room-coded mini-game server. Players create a session for one of six
//! small games, share its six-character code, and play over a WebSocket.
//!
//! All game state lives in one coordinator task that handles connection
//! events, client requests, fired timers, and the idle sweep strictly one
//! at a time. Connection tasks only decode, encode, and forward.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parlor::prelude::*;
//!
//! # async fn run() -> Result<(), ParlorError> {
//! let server = ParlorServerBuilder::new()
//!     .bind("0.0.0.0:3000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod coordinator;
mod dispatcher;
mod error;
mod gateway;
mod handler;
mod server;

pub use config::{EffectTimings, RegistryConfig};
pub use dispatcher::{Dispatcher, ScheduledEffect};
pub use error::ParlorError;
pub use gateway::{Frame, FrameSender, Gateway, Hub};
pub use server::{DEFAULT_HANDSHAKE_TIMEOUT, ParlorServer, ParlorServerBuilder};

/// Commonly used types, for `use parlor::prelude::*`.
pub mod prelude {
    pub use crate::{EffectTimings, ParlorError, ParlorServer, ParlorServerBuilder, RegistryConfig};
    pub use parlor_protocol::{ClientMessage, GameType, PlayerId, RoomCode, ServerMessage};
    pub use parlor_session::{Session, SessionState};
}

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, defaulting to
/// `info`. Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
