//! Unified error type for Parlor.

use parlor_protocol::ProtocolError;
use parlor_session::{GameError, SessionError};
use parlor_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors. `Display` is forwarded untouched, so a `Session` or `Game`
/// error renders as the player-facing text it was written with.
#[derive(Debug, thiserror::Error)]
pub enum ParlorError {
    /// Binding, accepting, or moving frames failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A lifecycle request was refused (unknown code, full, started...).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A move was refused by the game's rules.
    #[error(transparent)]
    Game(#[from] GameError),
}

impl ParlorError {
    /// Whether the error was caused by what a player sent, as opposed to
    /// the server failing. Player errors are answered privately.
    pub fn is_player_error(&self) -> bool {
        matches!(self, Self::Session(_) | Self::Game(_))
    }
}
