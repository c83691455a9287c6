use parlor_protocol::PlayerId;
use rand::Rng;
use serde::Serialize;

use super::Outcome;
use crate::engine::{
    Actor, Applied, DeferredEffect, GameEngine, Table, ensure_open, ensure_turn, next_turn,
    turn_after_leave,
};
use crate::{GameError, Mark};

/// The eight winning lines: rows, columns, diagonals.
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Tic-tac-toe on a 3×3 board indexed 0..9, row-major.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicTacToe {
    pub board: [Option<Mark>; 9],
    pub turn_index: usize,
    pub winner: Option<Outcome>,
    pub winning_line: Option<[usize; 3]>,
}

impl TicTacToe {
    fn line_of(&self, mark: Mark) -> Option<[usize; 3]> {
        LINES
            .into_iter()
            .find(|line| line.iter().all(|&cell| self.board[cell] == Some(mark)))
    }
}

impl GameEngine for TicTacToe {
    type Action = usize;

    fn initialize<R: Rng + ?Sized>(_rng: &mut R) -> Self {
        Self::default()
    }

    fn apply(
        &mut self,
        table: &mut Table<'_>,
        actor: &Actor,
        cell: usize,
    ) -> Result<Applied, GameError> {
        ensure_open(table, self.winner.is_some())?;
        ensure_turn(self.turn_index, actor)?;
        let slot = self
            .board
            .get_mut(cell)
            .ok_or(GameError::InvalidTarget("no such cell"))?;
        if slot.is_some() {
            return Err(GameError::InvalidTarget("cell is taken"));
        }

        let mark = table
            .players
            .get(actor.index)
            .and_then(|p| p.symbol)
            .unwrap_or(if actor.index == 0 { Mark::X } else { Mark::O });
        *slot = Some(mark);

        if let Some(line) = self.line_of(mark) {
            self.winner = Some(Outcome::Winner(actor.id));
            self.winning_line = Some(line);
            table.finish();
        } else if self.board.iter().all(Option::is_some) {
            self.winner = Some(Outcome::Draw);
            table.finish();
        } else {
            self.turn_index = next_turn(self.turn_index, table.players.len());
        }
        Ok(Applied::Updated)
    }

    fn on_player_left(
        &mut self,
        table: &mut Table<'_>,
        removed: usize,
        _id: PlayerId,
    ) -> Option<DeferredEffect> {
        self.turn_index = turn_after_leave(self.turn_index, removed, table.players.len());
        None
    }
}
