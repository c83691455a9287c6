//! Error types for the session layer.
//!
//! Every variant here is caused by a player and is recoverable: the
//! dispatcher turns it into a private `error` message using the
//! `Display` text, so the messages are written for people.

use parlor_protocol::{GameType, RoomCode};

/// Errors from registry and lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No live session has this code.
    #[error("session {0} not found")]
    NotFound(RoomCode),

    /// The session already holds as many players as its game allows.
    #[error("session {0} is full")]
    Full(RoomCode),

    /// Joining is only possible before the game starts.
    #[error("session {0} has already started")]
    AlreadyStarted(RoomCode),

    /// The connection is already seated in this session.
    #[error("you are already in session {0}")]
    AlreadyJoined(RoomCode),

    /// `create_session` named a game this server does not host.
    #[error("invalid game type: {0}")]
    InvalidGameType(String),

    /// Only the first player in a session may start it.
    #[error("only the host can start the game")]
    NotHost,

    #[error("at least 2 players are needed to start")]
    NotEnoughPlayers,

    /// Two-player games start on their own when the second player joins.
    #[error("{0} starts automatically")]
    NotPartyGame(GameType),
}

/// Errors from game engines. Raised before any mutation happens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// The session is not in the `playing` state.
    #[error("game is not active")]
    NotPlaying,

    /// A winner (or a draw) has already been decided.
    #[error("game is over")]
    GameOver,

    #[error("not your turn")]
    NotYourTurn,

    /// The move names a cell, column, card, or letter that cannot be
    /// played right now.
    #[error("invalid move: {0}")]
    InvalidTarget(&'static str),

    /// The rps round already resolved; wait for the next one.
    #[error("round already resolved")]
    AlreadyResolved,

    /// Two memory cards are face up and about to be turned back.
    #[error("wait for the cards to turn back")]
    RevealPending,

    /// The player jumped the gun in reflex and cannot win this round.
    #[error("false start, you are out this round")]
    Disqualified,

    /// The action name matched but its payload did not decode.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The action belongs to a different game than the session hosts.
    #[error("action does not apply to {0}")]
    WrongGame(GameType),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_display_names_the_code() {
        let err = SessionError::NotFound(RoomCode::from("abc234"));
        assert_eq!(err.to_string(), "session ABC234 not found");
    }

    #[test]
    fn test_game_error_display_is_player_facing() {
        assert_eq!(GameError::NotYourTurn.to_string(), "not your turn");
        assert_eq!(
            GameError::InvalidTarget("cell is taken").to_string(),
            "invalid move: cell is taken"
        );
    }
}
