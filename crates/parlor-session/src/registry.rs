//! The session registry: every live session, keyed by room code.
//!
//! # Concurrency note
//!
//! `SessionRegistry` is a plain `HashMap` with no locking. It is owned by
//! the server's coordinator task, which handles one command at a time,
//! so no two operations on a session ever interleave.

use std::collections::HashMap;

use parlor_protocol::{CODE_ALPHABET, CODE_LEN, GameType, PlayerId, RoomCode};
use rand::Rng;
use tokio::time::Instant;

use crate::engine::DeferredEffect;
use crate::{Mark, Player, RegistryConfig, Session, SessionError};

/// What [`SessionRegistry::remove`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    /// The player was the last one; the session is gone.
    Deleted { code: RoomCode },
    /// The session lives on without the player.
    Left {
        code: RoomCode,
        player: Player,
        /// Set when the departure completed something that needs a
        /// follow-up, e.g. the last outstanding rps hand.
        effect: Option<DeferredEffect>,
    },
}

/// Owns all live sessions.
///
/// ```text
/// create() ──→ join() ──→ start()/apply()/reset() ──→ remove() ──→ [deleted when empty]
///                                   │
///                                   └──(idle)──→ sweep()
/// ```
pub struct SessionRegistry {
    sessions: HashMap<RoomCode, Session>,
    config: RegistryConfig,
    /// Last generation handed out. Shared by all sessions, so a
    /// generation is never reused even across a delete and re-create of
    /// the same code.
    generation: u64,
}

impl SessionRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            config,
            generation: 0,
        }
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Creates an empty, waiting session under a fresh code.
    pub fn create(&mut self, game_type: GameType) -> &mut Session {
        let mut rng = rand::rng();
        let code = loop {
            let candidate = generate_code(&mut rng);
            if !self.sessions.contains_key(&candidate) {
                break candidate;
            }
        };
        let generation = self.next_generation();
        let session = Session::new(code.clone(), game_type, generation, Instant::now(), &mut rng);

        tracing::info!(%code, game = %game_type, "session created");
        self.sessions.entry(code).or_insert(session)
    }

    /// Looks a session up by code, in any case.
    pub fn get(&self, code: &str) -> Option<&Session> {
        self.sessions.get(&RoomCode::from(code))
    }

    pub fn get_mut(&mut self, code: &str) -> Option<&mut Session> {
        self.sessions.get_mut(&RoomCode::from(code))
    }

    /// Seats a player.
    ///
    /// A blank name becomes `Player N`. In two-sided games the first
    /// player takes `X` and the next one the opposite of the host.
    ///
    /// # Errors
    /// Checked in order: [`SessionError::NotFound`],
    /// [`SessionError::AlreadyJoined`], [`SessionError::Full`],
    /// [`SessionError::AlreadyStarted`].
    pub fn join(
        &mut self,
        code: &str,
        id: PlayerId,
        name: &str,
    ) -> Result<&mut Session, SessionError> {
        let key = RoomCode::from(code);
        let session = self
            .sessions
            .get_mut(&key)
            .ok_or_else(|| SessionError::NotFound(key.clone()))?;

        if session.player_index(id).is_some() {
            return Err(SessionError::AlreadyJoined(key));
        }
        if session.players.len() >= session.game_type.capacity() {
            return Err(SessionError::Full(key));
        }
        if !session.state.is_joinable() {
            return Err(SessionError::AlreadyStarted(key));
        }

        let seat = session.players.len();
        let name = match name.trim() {
            "" => format!("Player {}", seat + 1),
            name => name.to_owned(),
        };
        let symbol = session.game_type.is_two_sided().then(|| {
            session
                .players
                .first()
                .and_then(|host| host.symbol)
                .map_or(Mark::X, Mark::opposite)
        });
        session.players.push(Player {
            id,
            name,
            score: 0,
            symbol,
        });
        session.touch(Instant::now());

        tracing::info!(code = %key, player_id = %id, seat, "player joined");
        Ok(session)
    }

    /// Replaces a session's game with a fresh one under a new generation
    /// and starts it. Returns the effect the new game needs armed, if any.
    pub fn reset(&mut self, code: &str) -> Result<Option<DeferredEffect>, SessionError> {
        let generation = self.next_generation();
        let key = RoomCode::from(code);
        let session = self
            .sessions
            .get_mut(&key)
            .ok_or(SessionError::NotFound(key))?;
        let effect = session.reset(generation, Instant::now(), &mut rand::rng());
        tracing::info!(code = %session.code, generation, "session reset");
        Ok(effect)
    }

    /// Applies a fired effect, if the session still exists and is still
    /// on the generation the effect was armed for. Returns the session
    /// when something changed.
    pub fn resolve(
        &mut self,
        code: &RoomCode,
        generation: u64,
        effect: DeferredEffect,
        now: Instant,
    ) -> Option<&Session> {
        let session = self.sessions.get_mut(code)?;
        if session.generation != generation {
            tracing::debug!(%code, generation, current = session.generation, "stale effect dropped");
            return None;
        }
        if !session.resolve(effect, now) {
            return None;
        }
        Some(&*session)
    }

    /// Removes the player with this id from the first session that seats
    /// them. An emptied session is deleted on the spot.
    pub fn remove(&mut self, id: PlayerId) -> Option<Removal> {
        let (code, index) = self
            .sessions
            .iter()
            .find_map(|(code, s)| s.player_index(id).map(|index| (code.clone(), index)))?;
        let session = self.sessions.get_mut(&code)?;
        let (player, effect) = session.remove_player(index, Instant::now());

        if session.players.is_empty() {
            self.sessions.remove(&code);
            tracing::info!(%code, player_id = %id, "session deleted (empty)");
            return Some(Removal::Deleted { code });
        }
        tracing::info!(%code, player_id = %id, "player left");
        Some(Removal::Left {
            code,
            player,
            effect,
        })
    }

    /// Deletes every session idle for longer than the configured timeout.
    pub fn sweep(&mut self, now: Instant) -> Vec<RoomCode> {
        let timeout = self.config.idle_timeout;
        let mut swept = Vec::new();
        self.sessions.retain(|code, session| {
            if session.is_idle(now, timeout) {
                swept.push(code.clone());
                false
            } else {
                true
            }
        });
        for code in &swept {
            tracing::info!(%code, "session swept (idle)");
        }
        swept
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

/// Draws a code uniformly from [`CODE_ALPHABET`].
fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> RoomCode {
    let code: String = (0..CODE_LEN)
        .map(|_| char::from(CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())]))
        .collect();
    RoomCode::from(code)
}

// =========================================================================
// Tests
// =========================================================================
