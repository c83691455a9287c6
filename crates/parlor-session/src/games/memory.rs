use parlor_protocol::PlayerId;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tokio::time::Instant;

use super::Outcome;
use crate::GameError;
use crate::engine::{
    Actor, Applied, DeferredEffect, GameEngine, Table, ensure_open, ensure_turn, next_turn,
    turn_after_leave,
};

/// Each symbol appears on exactly two cards.
pub const SYMBOLS: [&str; 8] = ["🐶", "🐱", "🐭", "🐹", "🐰", "🦊", "🐻", "🐼"];

/// Memory is always a two-seat game.
const SEATS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub id: usize,
    pub value: &'static str,
    pub flipped: bool,
    pub matched: bool,
}

/// Memory (pairs). A match keeps the turn; a mismatch stays face up
/// until the scheduled reveal turns it back and passes the turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    pub cards: Vec<Card>,
    pub turn_index: usize,
    /// Cards turned up this turn, at most two.
    pub flipped_indices: Vec<usize>,
    /// Pairs found, per seat.
    pub scores: Vec<u32>,
    pub winner: Option<Outcome>,
}

impl Memory {
    /// A game with the cards in the given order.
    pub(crate) fn with_values(values: &[&'static str]) -> Self {
        Self {
            cards: values
                .iter()
                .enumerate()
                .map(|(id, &value)| Card {
                    id,
                    value,
                    flipped: false,
                    matched: false,
                })
                .collect(),
            turn_index: 0,
            flipped_indices: Vec::new(),
            scores: vec![0; SEATS],
            winner: None,
        }
    }

    fn decide(&self, table: &Table<'_>) -> Outcome {
        let seated = table.players.len().min(self.scores.len());
        let best = self.scores[..seated].iter().copied().max().unwrap_or(0);
        let mut leaders = (0..seated).filter(|&i| self.scores[i] == best);
        match (leaders.next(), leaders.next()) {
            (Some(seat), None) => table
                .player_id(seat)
                .map_or(Outcome::Draw, Outcome::Winner),
            _ => Outcome::Draw,
        }
    }
}

impl GameEngine for Memory {
    type Action = usize;

    fn initialize<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut values: Vec<&'static str> = SYMBOLS.iter().chain(SYMBOLS.iter()).copied().collect();
        values.shuffle(rng);
        Self::with_values(&values)
    }

    fn apply(
        &mut self,
        table: &mut Table<'_>,
        actor: &Actor,
        index: usize,
    ) -> Result<Applied, GameError> {
        ensure_open(table, self.winner.is_some())?;
        ensure_turn(self.turn_index, actor)?;
        if self.flipped_indices.len() >= 2 {
            return Err(GameError::RevealPending);
        }
        let card = self
            .cards
            .get_mut(index)
            .ok_or(GameError::InvalidTarget("no such card"))?;
        if card.flipped || card.matched {
            return Err(GameError::InvalidTarget("card is already face up"));
        }

        card.flipped = true;
        self.flipped_indices.push(index);

        let &[first, second] = self.flipped_indices.as_slice() else {
            return Ok(Applied::Updated);
        };
        if self.cards[first].value != self.cards[second].value {
            return Ok(Applied::Deferred(DeferredEffect::RevealMismatch));
        }

        self.cards[first].matched = true;
        self.cards[second].matched = true;
        self.flipped_indices.clear();
        if let Some(score) = self.scores.get_mut(actor.index) {
            *score += 1;
        }
        if self.cards.iter().all(|c| c.matched) {
            self.winner = Some(self.decide(table));
            table.finish();
        }
        Ok(Applied::Updated)
    }

    fn resolve(&mut self, table: &mut Table<'_>, effect: DeferredEffect, _now: Instant) -> bool {
        if effect != DeferredEffect::RevealMismatch || self.flipped_indices.len() != 2 {
            return false;
        }
        for index in self.flipped_indices.drain(..) {
            self.cards[index].flipped = false;
        }
        self.turn_index = next_turn(self.turn_index, table.players.len());
        true
    }

    fn on_player_left(
        &mut self,
        table: &mut Table<'_>,
        removed: usize,
        _id: PlayerId,
    ) -> Option<DeferredEffect> {
        self.turn_index = turn_after_leave(self.turn_index, removed, table.players.len());
        if removed < self.scores.len() {
            self.scores.remove(removed);
            self.scores.push(0);
        }
        None
    }
}
