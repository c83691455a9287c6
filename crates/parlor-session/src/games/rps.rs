use std::collections::BTreeMap;

use parlor_protocol::PlayerId;
use rand::Rng;
use serde::{Deserialize, Serialize, Serializer};
use tokio::time::Instant;

use crate::engine::{Actor, Applied, DeferredEffect, GameEngine, Table, ensure_open};
use crate::{GameError, Player};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Rock,
    Paper,
    Scissors,
}

impl Hand {
    pub fn beats(self, other: Hand) -> bool {
        matches!(
            (self, other),
            (Hand::Rock, Hand::Scissors) | (Hand::Paper, Hand::Rock) | (Hand::Scissors, Hand::Paper)
        )
    }
}

/// What everyone played in a resolved round, and what it earned them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    pub choices: BTreeMap<PlayerId, Hand>,
    pub round_scores: BTreeMap<PlayerId, u32>,
}

/// Rock-paper-scissors for any number of players.
///
/// Each pairing is scored on its own: a player earns one point for every
/// opponent their hand beats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rps {
    pub round: u32,
    /// Hands played this round. Only who has chosen is shown until the
    /// round resolves.
    #[serde(rename = "chosen", serialize_with = "chosen_players")]
    pub choices: BTreeMap<PlayerId, Hand>,
    pub results: Option<RoundResult>,
}

fn chosen_players<S: Serializer>(
    choices: &BTreeMap<PlayerId, Hand>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(choices.keys())
}

impl Rps {
    /// Scores the round if every seated player has chosen.
    fn try_resolve(&mut self, players: &mut [Player]) -> bool {
        if players.is_empty() || !players.iter().all(|p| self.choices.contains_key(&p.id)) {
            return false;
        }

        let mut round_scores: BTreeMap<PlayerId, u32> =
            players.iter().map(|p| (p.id, 0)).collect();
        for (i, a) in players.iter().enumerate() {
            for b in &players[i + 1..] {
                let (hand_a, hand_b) = (self.choices[&a.id], self.choices[&b.id]);
                if hand_a.beats(hand_b) {
                    *round_scores.entry(a.id).or_default() += 1;
                } else if hand_b.beats(hand_a) {
                    *round_scores.entry(b.id).or_default() += 1;
                }
            }
        }
        for player in players.iter_mut() {
            player.score += round_scores.get(&player.id).copied().unwrap_or(0);
        }

        self.results = Some(RoundResult {
            choices: self.choices.clone(),
            round_scores,
        });
        true
    }
}

impl GameEngine for Rps {
    type Action = Hand;

    fn initialize<R: Rng + ?Sized>(_rng: &mut R) -> Self {
        Self {
            round: 1,
            choices: BTreeMap::new(),
            results: None,
        }
    }

    fn apply(
        &mut self,
        table: &mut Table<'_>,
        actor: &Actor,
        hand: Hand,
    ) -> Result<Applied, GameError> {
        ensure_open(table, false)?;
        if self.results.is_some() {
            return Err(GameError::AlreadyResolved);
        }
        self.choices.insert(actor.id, hand);
        if self.try_resolve(table.players) {
            Ok(Applied::Deferred(DeferredEffect::NextRound { round: self.round }))
        } else {
            Ok(Applied::Updated)
        }
    }

    /// Opens the next round, but only out of the round the timer was
    /// armed for.
    fn resolve(&mut self, table: &mut Table<'_>, effect: DeferredEffect, _now: Instant) -> bool {
        let DeferredEffect::NextRound { round } = effect else {
            return false;
        };
        if !table.state.is_playing() || round != self.round || self.results.is_none() {
            return false;
        }
        self.choices.clear();
        self.results = None;
        self.round += 1;
        true
    }

    /// A departure can leave everyone remaining already chosen, which
    /// resolves the round.
    fn on_player_left(
        &mut self,
        table: &mut Table<'_>,
        _removed: usize,
        id: PlayerId,
    ) -> Option<DeferredEffect> {
        self.choices.remove(&id);
        if self.results.is_some() || !table.state.is_playing() {
            return None;
        }
        self.try_resolve(table.players)
            .then_some(DeferredEffect::NextRound { round: self.round })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::fixtures::Seats;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn fresh() -> Rps {
        Rps::initialize(&mut StdRng::seed_from_u64(0))
    }

    fn choose(game: &mut Rps, seats: &mut Seats, seat: usize, hand: Hand) -> Result<Applied, GameError> {
        let actor = seats.actor(seat);
        game.apply(&mut seats.table(), &actor, hand)
    }

    #[test]
    fn test_hand_beats_is_cyclic() {
        assert!(Hand::Rock.beats(Hand::Scissors));
        assert!(Hand::Scissors.beats(Hand::Paper));
        assert!(Hand::Paper.beats(Hand::Rock));
        assert!(!Hand::Rock.beats(Hand::Rock));
        assert!(!Hand::Rock.beats(Hand::Paper));
    }

    #[test]
    fn test_apply_two_players_rock_beats_scissors() {
        let mut game = fresh();
        let mut seats = Seats::new(2);
        assert_eq!(choose(&mut game, &mut seats, 0, Hand::Rock), Ok(Applied::Updated));
        assert_eq!(
            choose(&mut game, &mut seats, 1, Hand::Scissors),
            Ok(Applied::Deferred(DeferredEffect::NextRound { round: 1 }))
        );
        let results = game.results.as_ref().unwrap();
        assert_eq!(results.round_scores[&PlayerId(1)], 1);
        assert_eq!(results.round_scores[&PlayerId(2)], 0);
        assert_eq!(seats.players[0].score, 1);
        assert_eq!(seats.players[1].score, 0);
    }

    #[test]
    fn test_apply_three_players_pairwise_points() {
        let mut game = fresh();
        let mut seats = Seats::new(3);
        choose(&mut game, &mut seats, 0, Hand::Rock).unwrap();
        choose(&mut game, &mut seats, 1, Hand::Rock).unwrap();
        choose(&mut game, &mut seats, 2, Hand::Scissors).unwrap();
        let scores = &game.results.as_ref().unwrap().round_scores;
        assert_eq!(scores[&PlayerId(1)], 1);
        assert_eq!(scores[&PlayerId(2)], 1);
        assert_eq!(scores[&PlayerId(3)], 0);
    }

    #[test]
    fn test_apply_after_resolution_returns_already_resolved() {
        let mut game = fresh();
        let mut seats = Seats::new(2);
        choose(&mut game, &mut seats, 0, Hand::Paper).unwrap();
        choose(&mut game, &mut seats, 1, Hand::Paper).unwrap();
        assert_eq!(
            choose(&mut game, &mut seats, 0, Hand::Rock),
            Err(GameError::AlreadyResolved)
        );
    }

    #[test]
    fn test_apply_choice_can_change_before_resolution() {
        let mut game = fresh();
        let mut seats = Seats::new(2);
        choose(&mut game, &mut seats, 0, Hand::Paper).unwrap();
        choose(&mut game, &mut seats, 0, Hand::Rock).unwrap();
        choose(&mut game, &mut seats, 1, Hand::Scissors).unwrap();
        assert_eq!(seats.players[0].score, 1);
    }

    #[test]
    fn test_resolve_next_round_clears_and_counts() {
        let mut game = fresh();
        let mut seats = Seats::new(2);
        choose(&mut game, &mut seats, 0, Hand::Rock).unwrap();
        choose(&mut game, &mut seats, 1, Hand::Paper).unwrap();

        let stale = DeferredEffect::NextRound { round: 7 };
        assert!(!game.resolve(&mut seats.table(), stale, Instant::now()));

        let effect = DeferredEffect::NextRound { round: 1 };
        assert!(game.resolve(&mut seats.table(), effect, Instant::now()));
        assert_eq!(game.round, 2);
        assert!(game.choices.is_empty());
        assert!(game.results.is_none());
        // Cumulative scores survive the round change.
        assert_eq!(seats.players[1].score, 1);

        // The same timer firing twice does nothing.
        assert!(!game.resolve(&mut seats.table(), effect, Instant::now()));
    }

    #[test]
    fn test_on_player_left_resolves_when_rest_have_chosen() {
        let mut game = fresh();
        let mut seats = Seats::new(3);
        choose(&mut game, &mut seats, 0, Hand::Rock).unwrap();
        choose(&mut game, &mut seats, 1, Hand::Scissors).unwrap();

        let gone = seats.players.remove(2);
        let effect = game.on_player_left(&mut seats.table(), 2, gone.id);
        assert_eq!(effect, Some(DeferredEffect::NextRound { round: 1 }));
        assert_eq!(seats.players[0].score, 1);
    }

    #[test]
    fn test_snapshot_hides_pending_hands() {
        let mut game = fresh();
        let mut seats = Seats::new(2);
        choose(&mut game, &mut seats, 0, Hand::Rock).unwrap();
        let value = serde_json::to_value(&game).unwrap();
        assert_eq!(value["chosen"], serde_json::json!([1]));
        assert!(value["results"].is_null());
        assert_eq!(value["round"], 1);
    }
}
