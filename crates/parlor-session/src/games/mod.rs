//! The six game engines and the sum type that holds whichever one a
//! session is playing.

mod connect4;
mod hangman;
mod memory;
mod reflex;
mod rps;
mod tictactoe;

pub use connect4::{COLS, ConnectFour, Position, ROWS};
pub use hangman::{Hangman, HangmanOutcome, LIVES, WORDS};
pub use memory::{Card, Memory, SYMBOLS};
pub use reflex::{Phase, Reflex};
pub use rps::{Hand, RoundResult, Rps};
pub use tictactoe::{LINES, TicTacToe};

use parlor_protocol::{GameType, PlayerId};
use rand::Rng;
use serde::{Serialize, Serializer};
use tokio::time::Instant;

use crate::GameError;
use crate::engine::{Actor, Applied, DeferredEffect, GameAction, GameEngine, Table};

/// How a competitive game ended. Serialized as the winner's id, or the
/// string `"draw"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Winner(PlayerId),
    Draw,
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Outcome::Winner(id) => id.serialize(serializer),
            Outcome::Draw => serializer.serialize_str("draw"),
        }
    }
}

/// Per-game state. Exactly one variant exists per [`GameType`], and only
/// that game's engine reads or writes it.
///
/// Serialized without a tag: the session snapshot already carries
/// `gameType`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum GameState {
    TicTacToe(TicTacToe),
    Rps(Rps),
    Memory(Memory),
    ConnectFour(ConnectFour),
    Reflex(Reflex),
    Hangman(Hangman),
}

impl GameState {
    pub fn new<R: Rng + ?Sized>(game_type: GameType, rng: &mut R) -> Self {
        match game_type {
            GameType::TicTacToe => Self::TicTacToe(TicTacToe::initialize(rng)),
            GameType::Rps => Self::Rps(Rps::initialize(rng)),
            GameType::Memory => Self::Memory(Memory::initialize(rng)),
            GameType::ConnectFour => Self::ConnectFour(ConnectFour::initialize(rng)),
            GameType::Reflex => Self::Reflex(Reflex::initialize(rng)),
            GameType::Hangman => Self::Hangman(Hangman::initialize(rng)),
        }
    }

    pub fn game_type(&self) -> GameType {
        match self {
            Self::TicTacToe(_) => GameType::TicTacToe,
            Self::Rps(_) => GameType::Rps,
            Self::Memory(_) => GameType::Memory,
            Self::ConnectFour(_) => GameType::ConnectFour,
            Self::Reflex(_) => GameType::Reflex,
            Self::Hangman(_) => GameType::Hangman,
        }
    }

    /// Routes a decoded move to the engine. A move for a different game
    /// is rejected with [`GameError::WrongGame`].
    pub fn apply(
        &mut self,
        table: &mut Table<'_>,
        actor: &Actor,
        action: GameAction,
    ) -> Result<Applied, GameError> {
        match (self, action) {
            (Self::TicTacToe(g), GameAction::Move { cell }) => g.apply(table, actor, cell),
            (Self::Rps(g), GameAction::Choice(hand)) => g.apply(table, actor, hand),
            (Self::Memory(g), GameAction::Flip { card }) => g.apply(table, actor, card),
            (Self::ConnectFour(g), GameAction::Drop { column }) => g.apply(table, actor, column),
            (Self::Reflex(g), GameAction::Click) => g.apply(table, actor, ()),
            (Self::Hangman(g), GameAction::Guess(letter)) => g.apply(table, actor, letter),
            (game, _) => Err(GameError::WrongGame(game.game_type())),
        }
    }

    pub fn on_start(&mut self) -> Option<DeferredEffect> {
        match self {
            Self::TicTacToe(g) => g.on_start(),
            Self::Rps(g) => g.on_start(),
            Self::Memory(g) => g.on_start(),
            Self::ConnectFour(g) => g.on_start(),
            Self::Reflex(g) => g.on_start(),
            Self::Hangman(g) => g.on_start(),
        }
    }

    pub fn resolve(&mut self, table: &mut Table<'_>, effect: DeferredEffect, now: Instant) -> bool {
        match self {
            Self::TicTacToe(g) => g.resolve(table, effect, now),
            Self::Rps(g) => g.resolve(table, effect, now),
            Self::Memory(g) => g.resolve(table, effect, now),
            Self::ConnectFour(g) => g.resolve(table, effect, now),
            Self::Reflex(g) => g.resolve(table, effect, now),
            Self::Hangman(g) => g.resolve(table, effect, now),
        }
    }

    pub fn on_player_left(
        &mut self,
        table: &mut Table<'_>,
        removed: usize,
        id: PlayerId,
    ) -> Option<DeferredEffect> {
        match self {
            Self::TicTacToe(g) => g.on_player_left(table, removed, id),
            Self::Rps(g) => g.on_player_left(table, removed, id),
            Self::Memory(g) => g.on_player_left(table, removed, id),
            Self::ConnectFour(g) => g.on_player_left(table, removed, id),
            Self::Reflex(g) => g.on_player_left(table, removed, id),
            Self::Hangman(g) => g.on_player_left(table, removed, id),
        }
    }
}

/// Fixtures shared by the engine tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use parlor_protocol::PlayerId;
    use tokio::time::Instant;

    use crate::engine::{Actor, Table};
    use crate::{Mark, Player, SessionState};

    pub(crate) fn players(n: u64) -> Vec<Player> {
        (1..=n)
            .map(|id| Player {
                id: PlayerId(id),
                name: format!("p{id}"),
                score: 0,
                symbol: Some(if id % 2 == 1 { Mark::X } else { Mark::O }),
            })
            .collect()
    }

    /// A `playing` session's state plus `n` seated players.
    pub(crate) struct Seats {
        pub state: SessionState,
        pub players: Vec<Player>,
    }

    impl Seats {
        pub(crate) fn new(n: u64) -> Self {
            Self {
                state: SessionState::Playing,
                players: players(n),
            }
        }

        pub(crate) fn table(&mut self) -> Table<'_> {
            Table {
                state: &mut self.state,
                players: &mut self.players,
            }
        }

        pub(crate) fn actor(&self, index: usize) -> Actor {
            Actor {
                index,
                id: self.players[index].id,
                at: Instant::now(),
            }
        }
    }
}
