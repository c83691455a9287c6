//! The `GameEngine` trait and the types every engine shares.
//!
//! An engine owns one game's state and nothing else. It sees the rest of
//! the session through a [`Table`]: the lifecycle state (so a decisive
//! move can finish the session) and the seated players (so it can name a
//! winner or add to a score). Engines never schedule anything themselves;
//! when a transition has to wait, `apply` returns
//! [`Applied::Deferred`] and the caller arms a timer that later feeds the
//! effect back through [`GameEngine::resolve`].

use parlor_protocol::{GameType, PlayerId};
use rand::Rng;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::time::Instant;

use crate::games::Hand;
use crate::{GameError, Player, SessionState};

// ---------------------------------------------------------------------------
// Table and Actor
// ---------------------------------------------------------------------------

/// The part of a session an engine is allowed to touch besides its own
/// state.
#[derive(Debug)]
pub struct Table<'a> {
    pub state: &'a mut SessionState,
    pub players: &'a mut [Player],
}

impl Table<'_> {
    /// Marks the session finished. Called by engines when a game is decided.
    pub fn finish(&mut self) {
        *self.state = SessionState::Finished;
    }

    /// Identity of the player seated at `index`.
    pub fn player_id(&self, index: usize) -> Option<PlayerId> {
        self.players.get(index).map(|p| p.id)
    }
}

/// The player performing an action.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    /// Seat index, which is also the player's turn position.
    pub index: usize,
    pub id: PlayerId,
    /// When the action was received.
    pub at: Instant,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A state transition that must wait so players can see what happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredEffect {
    /// Turn two mismatched memory cards back and pass the turn.
    RevealMismatch,
    /// Clear a resolved rps round and open the next one.
    NextRound { round: u32 },
    /// Flip reflex from `ready` to `go`.
    Countdown,
}

/// What a successful `apply` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The state changed and can be broadcast as is.
    Updated,
    /// The state changed, and a follow-up effect must be scheduled.
    Deferred(DeferredEffect),
}

// ---------------------------------------------------------------------------
// GameEngine
// ---------------------------------------------------------------------------

/// A game's rules.
///
/// Every check in `apply` runs before any mutation: an `Err` always
/// leaves both the engine and the table untouched.
pub trait GameEngine: Sized {
    /// The decoded move this engine accepts.
    type Action;

    /// Fresh state for a new game.
    fn initialize<R: Rng + ?Sized>(rng: &mut R) -> Self;

    /// Validates and applies one move.
    fn apply(
        &mut self,
        table: &mut Table<'_>,
        actor: &Actor,
        action: Self::Action,
    ) -> Result<Applied, GameError>;

    /// Called when the session moves to `playing`. Returns an effect to
    /// schedule, if the game needs one to get going.
    fn on_start(&mut self) -> Option<DeferredEffect> {
        None
    }

    /// Applies a fired effect. Returns `false` if the effect no longer
    /// applies to the current state and nothing changed.
    fn resolve(
        &mut self,
        _table: &mut Table<'_>,
        _effect: DeferredEffect,
        _now: Instant,
    ) -> bool {
        false
    }

    /// Called after the player at `removed` has left. `table.players`
    /// no longer contains them. Returns an effect if the departure
    /// completed something that needs one.
    fn on_player_left(
        &mut self,
        _table: &mut Table<'_>,
        _removed: usize,
        _id: PlayerId,
    ) -> Option<DeferredEffect> {
        None
    }
}

// ---------------------------------------------------------------------------
// Shared checks
// ---------------------------------------------------------------------------

/// A decided game reports `GameOver`, even though deciding it also
/// finished the session.
pub(crate) fn ensure_open(table: &Table<'_>, decided: bool) -> Result<(), GameError> {
    if decided {
        return Err(GameError::GameOver);
    }
    if !table.state.is_playing() {
        return Err(GameError::NotPlaying);
    }
    Ok(())
}

pub(crate) fn ensure_turn(turn_index: usize, actor: &Actor) -> Result<(), GameError> {
    if turn_index == actor.index {
        Ok(())
    } else {
        Err(GameError::NotYourTurn)
    }
}

pub(crate) fn next_turn(turn_index: usize, players: usize) -> usize {
    if players == 0 { 0 } else { (turn_index + 1) % players }
}

/// Keeps `turn_index` pointing at the same player after a removal, or at
/// the next one when the current player is the one who left.
pub(crate) fn turn_after_leave(turn_index: usize, removed: usize, remaining: usize) -> usize {
    if remaining == 0 {
        return 0;
    }
    let shifted = if removed < turn_index { turn_index - 1 } else { turn_index };
    shifted % remaining
}

// ---------------------------------------------------------------------------
// GameAction
// ---------------------------------------------------------------------------

/// A move, decoded from the wire `action` name and its JSON payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameAction {
    /// Tic-tac-toe: claim a cell (0..9).
    Move { cell: usize },
    /// Rock-paper-scissors: pick a hand for this round.
    Choice(Hand),
    /// Memory: turn a card face up.
    Flip { card: usize },
    /// Connect-4: drop a piece into a column (0..7).
    Drop { column: usize },
    /// Reflex: the one button.
    Click,
    /// Hangman: guess a letter.
    Guess(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CellPayload {
    cell_index: usize,
}

#[derive(Deserialize)]
struct ChoicePayload {
    choice: Hand,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardPayload {
    card_index: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColumnPayload {
    col_index: usize,
}

#[derive(Deserialize)]
struct LetterPayload {
    letter: String,
}

fn decode<T: DeserializeOwned>(payload: serde_json::Value) -> Result<T, GameError> {
    serde_json::from_value(payload).map_err(|e| GameError::InvalidPayload(e.to_string()))
}

impl GameAction {
    /// Maps `(game, action)` to the one move it may mean.
    ///
    /// Returns `None` when the pair names no move of that game; callers
    /// ignore such requests. Returns `Some(Err(..))` when the pair matches
    /// but the payload does not decode.
    pub fn parse(
        game: GameType,
        action: &str,
        payload: serde_json::Value,
    ) -> Option<Result<Self, GameError>> {
        let parsed = match (game, action) {
            (GameType::TicTacToe, "move") => {
                decode::<CellPayload>(payload).map(|p| Self::Move { cell: p.cell_index })
            }
            (GameType::Rps, "choice") => {
                decode::<ChoicePayload>(payload).map(|p| Self::Choice(p.choice))
            }
            (GameType::Memory, "flip") => {
                decode::<CardPayload>(payload).map(|p| Self::Flip { card: p.card_index })
            }
            (GameType::ConnectFour, "droppiece") => {
                decode::<ColumnPayload>(payload).map(|p| Self::Drop { column: p.col_index })
            }
            (GameType::Reflex, "click") => Ok(Self::Click),
            (GameType::Hangman, "guess") => {
                decode::<LetterPayload>(payload).map(|p| Self::Guess(p.letter))
            }
            _ => return None,
        };
        Some(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_matching_pairs() {
        assert_eq!(
            GameAction::parse(GameType::TicTacToe, "move", json!({"cellIndex": 4})),
            Some(Ok(GameAction::Move { cell: 4 }))
        );
        assert_eq!(
            GameAction::parse(GameType::Rps, "choice", json!({"choice": "paper"})),
            Some(Ok(GameAction::Choice(Hand::Paper)))
        );
        assert_eq!(
            GameAction::parse(GameType::Memory, "flip", json!({"cardIndex": 15})),
            Some(Ok(GameAction::Flip { card: 15 }))
        );
        assert_eq!(
            GameAction::parse(GameType::ConnectFour, "droppiece", json!({"colIndex": 6})),
            Some(Ok(GameAction::Drop { column: 6 }))
        );
        assert_eq!(
            GameAction::parse(GameType::Reflex, "click", serde_json::Value::Null),
            Some(Ok(GameAction::Click))
        );
        assert_eq!(
            GameAction::parse(GameType::Hangman, "guess", json!({"letter": "e"})),
            Some(Ok(GameAction::Guess("e".into())))
        );
    }

    #[test]
    fn test_parse_unmatched_pair_returns_none() {
        assert_eq!(
            GameAction::parse(GameType::TicTacToe, "flip", json!({"cardIndex": 0})),
            None
        );
        assert_eq!(GameAction::parse(GameType::Reflex, "move", json!({})), None);
    }

    #[test]
    fn test_parse_bad_payload_returns_invalid_payload() {
        let result = GameAction::parse(GameType::TicTacToe, "move", json!({"cellIndex": -1}));
        assert!(matches!(result, Some(Err(GameError::InvalidPayload(_)))));

        let result = GameAction::parse(GameType::Rps, "choice", json!({"choice": "lizard"}));
        assert!(matches!(result, Some(Err(GameError::InvalidPayload(_)))));
    }

    #[test]
    fn test_turn_after_leave_keeps_current_player() {
        // Seats [a, b, c], c to move, a leaves: c is now seat 1.
        assert_eq!(turn_after_leave(2, 0, 2), 1);
        // b to move and leaves: c (formerly 2, now 1) moves next.
        assert_eq!(turn_after_leave(1, 1, 2), 1);
        // c to move and leaves: wrap to a.
        assert_eq!(turn_after_leave(2, 2, 2), 0);
        assert_eq!(turn_after_leave(0, 0, 0), 0);
    }

    #[test]
    fn test_next_turn_wraps() {
        assert_eq!(next_turn(0, 2), 1);
        assert_eq!(next_turn(1, 2), 0);
        assert_eq!(next_turn(2, 3), 0);
        assert_eq!(next_turn(0, 0), 0);
    }
}
