use parlor_protocol::PlayerId;
use rand::Rng;
use serde::Serialize;

use super::Outcome;
use crate::engine::{
    Actor, Applied, DeferredEffect, GameEngine, Table, ensure_open, ensure_turn, next_turn,
    turn_after_leave,
};
use crate::{GameError, Mark};

pub const ROWS: usize = 6;
pub const COLS: usize = 7;

/// Row 0 is the top; pieces settle at the highest row index available.
const AXES: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

/// Connect-4 on a 6×7 grid, `board[row][col]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectFour {
    pub board: [[Option<Mark>; COLS]; ROWS],
    pub turn_index: usize,
    pub winner: Option<Outcome>,
    pub winning_cells: Vec<Position>,
}

impl ConnectFour {
    fn mark_at(&self, row: isize, col: isize) -> Option<Mark> {
        let row = usize::try_from(row).ok()?;
        let col = usize::try_from(col).ok()?;
        self.board.get(row)?.get(col).copied().flatten()
    }

    /// Looks for four in a row through the piece just placed at `at`,
    /// counting outward in both directions along each axis.
    fn line_through(&self, at: Position, mark: Mark) -> Option<Vec<Position>> {
        for (dr, dc) in AXES {
            let mut cells = vec![at];
            for sign in [1, -1] {
                let (step_r, step_c) = (dr * sign, dc * sign);
                let mut r = at.row as isize + step_r;
                let mut c = at.col as isize + step_c;
                while self.mark_at(r, c) == Some(mark) {
                    cells.push(Position {
                        row: r as usize,
                        col: c as usize,
                    });
                    r += step_r;
                    c += step_c;
                }
            }
            if cells.len() >= 4 {
                cells.sort();
                return Some(cells);
            }
        }
        None
    }

    fn is_full(&self) -> bool {
        self.board.iter().flatten().all(Option::is_some)
    }
}

impl GameEngine for ConnectFour {
    type Action = usize;

    fn initialize<R: Rng + ?Sized>(_rng: &mut R) -> Self {
        Self::default()
    }

    fn apply(
        &mut self,
        table: &mut Table<'_>,
        actor: &Actor,
        col: usize,
    ) -> Result<Applied, GameError> {
        ensure_open(table, self.winner.is_some())?;
        ensure_turn(self.turn_index, actor)?;
        if col >= COLS {
            return Err(GameError::InvalidTarget("no such column"));
        }
        let row = (0..ROWS)
            .rev()
            .find(|&r| self.board[r][col].is_none())
            .ok_or(GameError::InvalidTarget("column is full"))?;

        let mark = table
            .players
            .get(actor.index)
            .and_then(|p| p.symbol)
            .unwrap_or(if actor.index == 0 { Mark::X } else { Mark::O });
        self.board[row][col] = Some(mark);

        if let Some(cells) = self.line_through(Position { row, col }, mark) {
            self.winner = Some(Outcome::Winner(actor.id));
            self.winning_cells = cells;
            table.finish();
        } else if self.is_full() {
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
