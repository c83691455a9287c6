//! Identifiers and message shapes that travel on the wire.
//!
//! Every frame is one JSON object tagged by a snake_case `type` field,
//! with camelCase payload fields, e.g.
//! `{"type":"join_session","code":"K7WQ2M","playerName":"Bob"}`.

use std::fmt;
use std::str::FromStr;

use parlor_transport::ConnectionId;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's identity. Always equal to the id of the connection the
/// player joined from, so it lives exactly as long as that connection.
///
/// Serialized as the bare number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl From<ConnectionId> for PlayerId {
    fn from(id: ConnectionId) -> Self {
        Self(id.into_inner())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// Characters a room code is drawn from. `I`, `O`, `0` and `1` are left out
/// because people read codes aloud and copy them by hand.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Number of characters in a room code.
pub const CODE_LEN: usize = 6;

/// A human-shareable session code such as `K7WQ2M`.
///
/// Codes are canonically upper case. Every way of constructing a
/// `RoomCode` (including deserialization) upper-cases its input, so
/// `"k7wq2m"` and `"K7WQ2M"` compare equal and hash identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Returns the canonical (upper-case) text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoomCode {
    fn from(raw: String) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }
}

impl From<&str> for RoomCode {
    fn from(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// GameType
// ---------------------------------------------------------------------------

/// The fixed set of games a session can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    TicTacToe,
    Rps,
    Memory,
    #[serde(rename = "connect4")]
    ConnectFour,
    Reflex,
    Hangman,
}

impl GameType {
    /// Every supported game, in menu order.
    pub const ALL: [GameType; 6] = [
        GameType::TicTacToe,
        GameType::Rps,
        GameType::Memory,
        GameType::ConnectFour,
        GameType::Reflex,
        GameType::Hangman,
    ];

    /// The wire name, e.g. `"connect4"`.
    pub fn as_str(self) -> &'static str {
        match self {
            GameType::TicTacToe => "tictactoe",
            GameType::Rps => "rps",
            GameType::Memory => "memory",
            GameType::ConnectFour => "connect4",
            GameType::Reflex => "reflex",
            GameType::Hangman => "hangman",
        }
    }

    /// Maximum number of players a session of this game accepts.
    pub fn capacity(self) -> usize {
        if self.is_party() { 10 } else { 2 }
    }

    /// Whether players are assigned an `X`/`O` side on joining.
    pub fn is_two_sided(self) -> bool {
        matches!(self, GameType::TicTacToe | GameType::ConnectFour)
    }

    /// Party games are started manually by the host; the others start on
    /// their own once the second player joins.
    pub fn is_party(self) -> bool {
        matches!(self, GameType::Rps | GameType::Reflex | GameType::Hangman)
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameType::ALL
            .into_iter()
            .find(|game| game.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownGameType(s.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Everything a client can ask the server to do.
///
/// `game_type` stays a plain string so that an unknown game is reported
/// back to the player as an error instead of failing the whole frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    CreateSession {
        game_type: String,
        #[serde(default)]
        player_name: String,
    },
    JoinSession {
        code: RoomCode,
        #[serde(default)]
        player_name: String,
    },
    StartGame {
        code: RoomCode,
    },
    /// A game move. `action` and `payload` are interpreted per game type.
    GameAction {
        code: RoomCode,
        action: String,
        #[serde(default)]
        payload: serde_json::Value,
    },
    PlayAgain {
        code: RoomCode,
    },
}

impl ClientMessage {
    /// The wire name of this message, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::CreateSession { .. } => "create_session",
            ClientMessage::JoinSession { .. } => "join_session",
            ClientMessage::StartGame { .. } => "start_game",
            ClientMessage::GameAction { .. } => "game_action",
            ClientMessage::PlayAgain { .. } => "play_again",
        }
    }
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Everything the server sends. `S` is the session snapshot type, kept
/// generic so this crate does not depend on the session model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage<S> {
    /// Private reply to the creator.
    SessionCreated {
        code: RoomCode,
        player_id: PlayerId,
        session: S,
    },
    /// Private reply to a joiner.
    SessionJoined {
        code: RoomCode,
        player_id: PlayerId,
        session: S,
    },
    /// Roster changed.
    SessionUpdate { session: S },
    GameStart { session: S },
    GameUpdate { session: S },
    /// An rps round resolved; the next round follows after a pause.
    RoundResult { session: S },
    GameReset { session: S },
    /// A player disconnected while a game was in progress.
    PlayerLeft { player_id: PlayerId },
    /// Private, human-readable rejection.
    Error { message: String },
}

impl<S> ServerMessage<S> {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_room_code_normalizes_case_and_whitespace() {
        assert_eq!(RoomCode::from(" k7wq2m "), RoomCode::from("K7WQ2M"));
        assert_eq!(RoomCode::from("k7wq2m").as_str(), "K7WQ2M");
    }

    #[test]
    fn test_room_code_deserialize_upper_cases() {
        let code: RoomCode = serde_json::from_value(json!("abcdef")).unwrap();
        assert_eq!(code.as_str(), "ABCDEF");
        assert_eq!(serde_json::to_value(&code).unwrap(), json!("ABCDEF"));
    }

    #[test]
    fn test_code_alphabet_excludes_confusables() {
        assert_eq!(CODE_ALPHABET.len(), 32);
        for c in b"IO01" {
            assert!(!CODE_ALPHABET.contains(c));
        }
    }

    #[test]
    fn test_game_type_from_str_round_trips_wire_names() {
        for game in GameType::ALL {
            assert_eq!(game.as_str().parse::<GameType>().unwrap(), game);
            assert_eq!(serde_json::to_value(game).unwrap(), json!(game.as_str()));
        }
    }

    #[test]
    fn test_game_type_from_str_unknown_returns_error() {
        let err = "chess".parse::<GameType>().unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownGameType(ref s) if s == "chess"));
    }

    #[test]
    fn test_game_type_capacity() {
        assert_eq!(GameType::TicTacToe.capacity(), 2);
        assert_eq!(GameType::Memory.capacity(), 2);
        assert_eq!(GameType::ConnectFour.capacity(), 2);
        assert_eq!(GameType::Rps.capacity(), 10);
        assert_eq!(GameType::Reflex.capacity(), 10);
        assert_eq!(GameType::Hangman.capacity(), 10);
    }

    #[test]
    fn test_player_id_from_connection_id() {
        let id = PlayerId::from(ConnectionId::new(9));
        assert_eq!(id, PlayerId(9));
        assert_eq!(id.to_string(), "P-9");
    }

    #[test]
    fn test_client_message_create_session_camel_case_fields() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "create_session",
            "gameType": "tictactoe",
            "playerName": "Alice",
        }))
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::CreateSession {
                game_type: "tictactoe".into(),
                player_name: "Alice".into(),
            }
        );
    }

    #[test]
    fn test_client_message_game_action_payload_defaults_to_null() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "game_action",
            "code": "abcdef",
            "action": "click",
        }))
        .unwrap();
        let ClientMessage::GameAction { code, action, payload } = msg else {
            panic!("expected game_action");
        };
        assert_eq!(code.as_str(), "ABCDEF");
        assert_eq!(action, "click");
        assert!(payload.is_null());
    }

    #[test]
    fn test_server_message_session_created_shape() {
        let msg = ServerMessage::SessionCreated {
            code: RoomCode::from("ABCDEF"),
            player_id: PlayerId(3),
            session: json!({"state": "waiting"}),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "type": "session_created",
                "code": "ABCDEF",
                "playerId": 3,
                "session": {"state": "waiting"},
            })
        );
    }

    #[test]
    fn test_server_message_player_left_shape() {
        let msg: ServerMessage<()> = ServerMessage::PlayerLeft {
            player_id: PlayerId(5),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"type": "player_left", "playerId": 5})
        );
    }
}
