use parlor_protocol::PlayerId;
use rand::Rng;
use serde::Serialize;

use crate::GameError;
use crate::engine::{
    Actor, Applied, DeferredEffect, GameEngine, Table, ensure_open, ensure_turn, next_turn,
    turn_after_leave,
};

pub const WORDS: [&str; 10] = [
    "ELEPHANT",
    "GIRAFFE",
    "COMPUTER",
    "PROGRAM",
    "JAVASCRIPT",
    "BANANA",
    "BICYCLE",
    "MUSIC",
    "PLANET",
    "OCEAN",
];

/// Shared lives at the start of a game.
pub const LIVES: u8 = 6;

const BLANK: char = '_';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HangmanOutcome {
    /// The group revealed the word.
    Players,
    /// The group ran out of lives.
    Hangman,
}

/// Cooperative hangman. Players guess in turn; a hit keeps the turn, a
/// miss costs a shared life and passes it on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hangman {
    #[serde(skip)]
    word: String,
    pub hidden_word: Vec<char>,
    pub guessed_letters: Vec<char>,
    pub lives: u8,
    pub turn_index: usize,
    pub winner: Option<HangmanOutcome>,
    pub game_over: bool,
    /// The word, once the game is over.
    pub answer: Option<String>,
}

impl Hangman {
    pub(crate) fn with_word(word: &str) -> Self {
        let word = word.to_ascii_uppercase();
        Self {
            hidden_word: vec![BLANK; word.chars().count()],
            word,
            guessed_letters: Vec::new(),
            lives: LIVES,
            turn_index: 0,
            winner: None,
            game_over: false,
            answer: None,
        }
    }

    fn end(&mut self, table: &mut Table<'_>, outcome: HangmanOutcome) {
        self.winner = Some(outcome);
        self.game_over = true;
        self.answer = Some(self.word.clone());
        table.finish();
    }
}

/// Accepts exactly one ASCII letter, in either case.
fn parse_letter(guess: &str) -> Option<char> {
    let mut chars = guess.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Some(c.to_ascii_uppercase()),
        _ => None,
    }
}

impl GameEngine for Hangman {
    type Action = String;

    fn initialize<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::with_word(WORDS[rng.random_range(0..WORDS.len())])
    }

    fn apply(
        &mut self,
        table: &mut Table<'_>,
        actor: &Actor,
        guess: String,
    ) -> Result<Applied, GameError> {
        ensure_open(table, self.game_over)?;
        ensure_turn(self.turn_index, actor)?;
        let letter =
            parse_letter(&guess).ok_or(GameError::InvalidTarget("guess a single letter"))?;
        if self.guessed_letters.contains(&letter) {
            return Err(GameError::InvalidTarget("letter already guessed"));
        }
        self.guessed_letters.push(letter);

        let mut hit = false;
        for (slot, c) in self.hidden_word.iter_mut().zip(self.word.chars()) {
            if c == letter {
                *slot = c;
                hit = true;
            }
        }

        if hit {
            if !self.hidden_word.contains(&BLANK) {
                self.end(table, HangmanOutcome::Players);
            }
        } else {
            self.lives = self.lives.saturating_sub(1);
            if self.lives == 0 {
                self.end(table, HangmanOutcome::Hangman);
            }
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
