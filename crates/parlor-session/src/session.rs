//! Session and player types.
//!
//! A session is one match, addressed by its room code. It serializes to
//! the snapshot every client receives; bookkeeping fields (timestamps,
//! generation) stay server-side.

use parlor_protocol::{GameType, PlayerId, RoomCode};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::{Duration, Instant};

use crate::engine::{Actor, Applied, DeferredEffect, GameAction, Table};
use crate::games::GameState;
use crate::{GameError, SessionState};

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// The side a player takes in tic-tac-toe and connect-4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn opposite(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// A seated participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Equal to the id of the connection the player joined from.
    pub id: PlayerId,
    pub name: String,
    /// Cumulative score, used by rps.
    pub score: u32,
    /// Side in two-sided games, `None` elsewhere.
    pub symbol: Option<Mark>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One match: who is playing what, and how far along it is.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub code: RoomCode,
    pub game_type: GameType,
    /// Seat order. Index 0 is the host.
    pub players: Vec<Player>,
    pub state: SessionState,
    #[serde(rename = "gameState")]
    pub game: GameState,

    /// Changes on every reset. Scheduled effects compare against it so
    /// that a timer armed for an earlier game does nothing.
    #[serde(skip)]
    pub generation: u64,
    #[serde(skip)]
    pub created_at: Instant,
    #[serde(skip)]
    pub last_activity: Instant,
}

impl Session {
    pub(crate) fn new<R: Rng + ?Sized>(
        code: RoomCode,
        game_type: GameType,
        generation: u64,
        now: Instant,
        rng: &mut R,
    ) -> Self {
        Self {
            code,
            game_type,
            players: Vec::new(),
            state: SessionState::Waiting,
            game: GameState::new(game_type, rng),
            generation,
            created_at: now,
            last_activity: now,
        }
    }

    /// The seat of the player with this id.
    pub fn player_index(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    pub fn is_host(&self, id: PlayerId) -> bool {
        self.players.first().is_some_and(|p| p.id == id)
    }

    /// Builds the [`Actor`] for a seated player.
    pub fn actor(&self, id: PlayerId, at: Instant) -> Option<Actor> {
        self.player_index(id).map(|index| Actor { index, id, at })
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    /// Whether the session has been quiet for longer than `timeout`.
    pub fn is_idle(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_activity) > timeout
    }

    /// Moves to `playing`.
    pub fn start(&mut self, now: Instant) -> Option<DeferredEffect> {
        self.state = SessionState::Playing;
        self.touch(now);
        self.game.on_start()
    }

    /// Applies one move. Touches `last_activity` only if it was accepted.
    pub fn apply(&mut self, actor: &Actor, action: GameAction) -> Result<Applied, GameError> {
        let (game, mut table) = self.split();
        let applied = game.apply(&mut table, actor, action)?;
        self.touch(actor.at);
        Ok(applied)
    }

    /// Replaces the game with a fresh one and starts it.
    pub(crate) fn reset<R: Rng + ?Sized>(
        &mut self,
        generation: u64,
        now: Instant,
        rng: &mut R,
    ) -> Option<DeferredEffect> {
        self.game = GameState::new(self.game_type, rng);
        self.generation = generation;
        self.start(now)
    }

    pub(crate) fn resolve(&mut self, effect: DeferredEffect, now: Instant) -> bool {
        let (game, mut table) = self.split();
        game.resolve(&mut table, effect, now)
    }

    /// Removes a player and lets the game react. The caller deletes the
    /// session if this leaves it empty.
    pub(crate) fn remove_player(
        &mut self,
        index: usize,
        now: Instant,
    ) -> (Player, Option<DeferredEffect>) {
        let player = self.players.remove(index);
        self.touch(now);
        if self.players.is_empty() {
            return (player, None);
        }
        let (game, mut table) = self.split();
        let effect = game.on_player_left(&mut table, index, player.id);
        (player, effect)
    }

    fn split(&mut self) -> (&mut GameState, Table<'_>) {
        (
            &mut self.game,
            Table {
                state: &mut self.state,
                players: &mut self.players,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;

    fn session(game_type: GameType) -> Session {
        let mut rng = StdRng::seed_from_u64(7);
        let mut session = Session::new(
            RoomCode::from("ABCDEF"),
            game_type,
            1,
            Instant::now(),
            &mut rng,
        );
        for id in [1, 2] {
            session.players.push(Player {
                id: PlayerId(id),
                name: format!("p{id}"),
                score: 0,
                symbol: None,
            });
        }
        session
    }

    #[test]
    fn test_snapshot_hides_bookkeeping_and_uses_camel_case() {
        let session = session(GameType::TicTacToe);
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["code"], "ABCDEF");
        assert_eq!(value["gameType"], "tictactoe");
        assert_eq!(value["state"], "waiting");
        assert_eq!(value["players"][0], json!({"id": 1, "name": "p1", "score": 0, "symbol": null}));
        assert!(value["gameState"]["board"].is_array());
        assert!(value.get("generation").is_none());
        assert!(value.get("lastActivity").is_none());
    }

    #[test]
    fn test_apply_rejected_does_not_touch_last_activity() {
        let mut session = session(GameType::TicTacToe);
        let before = session.last_activity;
        let actor = Actor {
            index: 0,
            id: PlayerId(1),
            at: before + Duration::from_secs(5),
        };
        // Still waiting: the move is rejected.
        let result = session.apply(&actor, GameAction::Move { cell: 0 });
        assert_eq!(result, Err(GameError::NotPlaying));
        assert_eq!(session.last_activity, before);
    }

    #[test]
    fn test_apply_accepted_touches_last_activity() {
        let mut session = session(GameType::TicTacToe);
        session.start(session.created_at);
        let at = session.created_at + Duration::from_secs(5);
        let actor = session.actor(PlayerId(1), at).unwrap();
        session.apply(&actor, GameAction::Move { cell: 0 }).unwrap();
        assert_eq!(session.last_activity, at);
    }

    #[test]
    fn test_is_host_is_first_seat() {
        let session = session(GameType::Rps);
        assert!(session.is_host(PlayerId(1)));
        assert!(!session.is_host(PlayerId(2)));
    }

    #[test]
    fn test_is_idle_after_timeout() {
        let session = session(GameType::Rps);
        let timeout = Duration::from_secs(60);
        assert!(!session.is_idle(session.last_activity + timeout, timeout));
        assert!(session.is_idle(session.last_activity + timeout + Duration::from_millis(1), timeout));
    }

    #[test]
    fn test_mark_opposite() {
        assert_eq!(Mark::X.opposite(), Mark::O);
        assert_eq!(Mark::O.opposite(), Mark::X);
    }
}
