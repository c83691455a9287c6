use parlor_protocol::PlayerId;
use rand::Rng;
use serde::Serialize;
use tokio::time::Instant;

use crate::GameError;
use crate::engine::{Actor, Applied, DeferredEffect, GameEngine, Table, ensure_open};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Created, not started.
    Waiting,
    /// Started; the go signal is on a randomized timer.
    Ready,
    /// First click wins.
    Go,
    Finished,
}

/// Reflex: wait for the signal, click first. Clicking early is a false
/// start and rules the player out for the round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reflex {
    pub phase: Phase,
    #[serde(skip)]
    pub go_at: Option<Instant>,
    pub winner: Option<PlayerId>,
    /// Milliseconds from the go signal to the winning click.
    pub reaction_time: Option<u64>,
    pub false_starts: Vec<PlayerId>,
}

impl GameEngine for Reflex {
    type Action = ();

    fn initialize<R: Rng + ?Sized>(_rng: &mut R) -> Self {
        Self {
            phase: Phase::Waiting,
            go_at: None,
            winner: None,
            reaction_time: None,
            false_starts: Vec::new(),
        }
    }

    fn apply(&mut self, table: &mut Table<'_>, actor: &Actor, (): ()) -> Result<Applied, GameError> {
        ensure_open(table, self.phase == Phase::Finished)?;
        match self.phase {
            Phase::Ready => {
                if !self.false_starts.contains(&actor.id) {
                    self.false_starts.push(actor.id);
                }
                self.finish_if_nobody_eligible(table);
                Ok(Applied::Updated)
            }
            Phase::Go => {
                if self.false_starts.contains(&actor.id) {
                    return Err(GameError::Disqualified);
                }
                let elapsed = self
                    .go_at
                    .map(|go| actor.at.saturating_duration_since(go))
                    .unwrap_or_default();
                self.phase = Phase::Finished;
                self.winner = Some(actor.id);
                self.reaction_time = Some(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
                table.finish();
                Ok(Applied::Updated)
            }
            Phase::Waiting => Err(GameError::NotPlaying),
            Phase::Finished => Err(GameError::GameOver),
        }
    }

    fn on_start(&mut self) -> Option<DeferredEffect> {
        self.phase = Phase::Ready;
        Some(DeferredEffect::Countdown)
    }

    fn resolve(&mut self, table: &mut Table<'_>, effect: DeferredEffect, now: Instant) -> bool {
        if effect != DeferredEffect::Countdown
            || !table.state.is_playing()
            || self.phase != Phase::Ready
        {
            return false;
        }
        self.phase = Phase::Go;
        self.go_at = Some(now);
        self.finish_if_nobody_eligible(table);
        true
    }

    fn on_player_left(
        &mut self,
        table: &mut Table<'_>,
        _removed: usize,
        _id: PlayerId,
    ) -> Option<DeferredEffect> {
        if table.state.is_playing() && matches!(self.phase, Phase::Ready | Phase::Go) {
            self.finish_if_nobody_eligible(table);
        }
        None
    }
}

impl Reflex {
    /// Ends the round with no winner once every seated player has a false
    /// start.
    fn finish_if_nobody_eligible(&mut self, table: &mut Table<'_>) {
        let eligible = table
            .players
            .iter()
            .any(|p| !self.false_starts.contains(&p.id));
        if eligible {
            return;
        }
        self.phase = Phase::Finished;
        self.winner = None;
        table.finish();
    }
}
