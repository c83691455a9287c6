//! Request handling: one method per client message, plus the hooks the
//! coordinator calls for disconnects, fired timers, and sweeps.
//!
//! Every handler follows the same shape: validate against the registry,
//! mutate, then tell the affected players. Rejections produced by a
//! player go back to that player alone as an `error` message and change
//! nothing.

use std::time::Duration;

use parlor_protocol::{ClientMessage, GameType, PlayerId, RoomCode, ServerMessage};
use parlor_session::{
    Applied, DeferredEffect, GameAction, GameError, Removal, SessionError, SessionRegistry,
};
use parlor_tick::{EffectTimer, random_delay};
use tokio::time::Instant;

use crate::ParlorError;
use crate::config::{EffectTimings, RegistryConfig};
use crate::gateway::Gateway;

/// A [`DeferredEffect`] bound to the session and game it was armed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEffect {
    pub code: RoomCode,
    pub generation: u64,
    pub effect: DeferredEffect,
}

/// Owns the registry and turns client requests into state changes and
/// outbound messages.
pub struct Dispatcher<G: Gateway> {
    registry: SessionRegistry,
    gateway: G,
    timers: EffectTimer<ScheduledEffect>,
    timings: EffectTimings,
}

impl<G: Gateway> Dispatcher<G> {
    pub fn new(config: RegistryConfig, timings: EffectTimings, gateway: G) -> Self {
        Self {
            registry: SessionRegistry::new(config),
            gateway,
            timers: EffectTimer::new(),
            timings,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    /// Timers armed and not yet fired.
    pub fn pending_effects(&self) -> usize {
        self.timers.len()
    }

    /// Handles one decoded client message.
    pub fn handle(&mut self, from: PlayerId, msg: ClientMessage) {
        let kind = msg.kind();
        tracing::trace!(player_id = %from, kind, "client message");

        let result = match msg {
            ClientMessage::CreateSession {
                game_type,
                player_name,
            } => self.create(from, &game_type, &player_name),
            ClientMessage::JoinSession { code, player_name } => {
                self.join(from, &code, &player_name)
            }
            ClientMessage::StartGame { code } => self.start(from, &code),
            ClientMessage::GameAction {
                code,
                action,
                payload,
            } => self.game_action(from, &code, &action, payload),
            ClientMessage::PlayAgain { code } => self.play_again(from, &code),
        };

        if let Err(e) = result {
            if e.is_player_error() {
                tracing::debug!(player_id = %from, kind, error = %e, "request rejected");
            } else {
                tracing::warn!(player_id = %from, kind, error = %e, "request failed");
            }
            self.gateway.reply(from, &ServerMessage::error(e.to_string()));
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Creates a session and seats its creator.
    fn create(&mut self, from: PlayerId, game_type: &str, name: &str) -> Result<(), ParlorError> {
        let game_type: GameType = game_type
            .parse()
            .map_err(|_| SessionError::InvalidGameType(game_type.to_owned()))?;
        let code = self.registry.create(game_type).code.clone();
        let session = self.registry.join(code.as_str(), from, name)?;
        let session = &*session;

        self.gateway.reply(
            from,
            &ServerMessage::SessionCreated {
                code,
                player_id: from,
                session,
            },
        );
        Ok(())
    }

    /// Seats a player, and starts a two-player game once both seats are
    /// taken.
    fn join(&mut self, from: PlayerId, code: &RoomCode, name: &str) -> Result<(), ParlorError> {
        let session = self.registry.join(code.as_str(), from, name)?;
        {
            let view = &*session;
            self.gateway.reply(
                from,
                &ServerMessage::SessionJoined {
                    code: view.code.clone(),
                    player_id: from,
                    session: view,
                },
            );
            self.gateway
                .broadcast(view, &ServerMessage::SessionUpdate { session: view });
        }

        let game_type = session.game_type;
        if game_type.is_party() || session.players.len() < game_type.capacity() {
            return Ok(());
        }
        let effect = session.start(Instant::now());
        let session = &*session;
        tracing::info!(code = %session.code, game = %game_type, "game started");
        self.gateway
            .broadcast(session, &ServerMessage::GameStart { session });

        let (key, generation) = (session.code.clone(), session.generation);
        if let Some(effect) = effect {
            self.schedule(key, generation, effect);
        }
        Ok(())
    }

    /// Host-initiated start of a party game.
    fn start(&mut self, from: PlayerId, code: &RoomCode) -> Result<(), ParlorError> {
        let session = self
            .registry
            .get_mut(code.as_str())
            .ok_or_else(|| SessionError::NotFound(code.clone()))?;

        if !session.is_host(from) {
            return Err(SessionError::NotHost.into());
        }
        if !session.game_type.is_party() {
            return Err(SessionError::NotPartyGame(session.game_type).into());
        }
        if !session.state.is_joinable() {
            return Err(SessionError::AlreadyStarted(session.code.clone()).into());
        }
        if session.players.len() < 2 {
            return Err(SessionError::NotEnoughPlayers.into());
        }

        let effect = session.start(Instant::now());
        let session = &*session;
        tracing::info!(code = %session.code, game = %session.game_type, players = session.players.len(), "game started");
        self.gateway
            .broadcast(session, &ServerMessage::GameStart { session });

        let (key, generation) = (session.code.clone(), session.generation);
        if let Some(effect) = effect {
            self.schedule(key, generation, effect);
        }
        Ok(())
    }

    /// Replaces the game with a fresh one for the same players.
    fn play_again(&mut self, from: PlayerId, code: &RoomCode) -> Result<(), ParlorError> {
        let session = self
            .registry
            .get(code.as_str())
            .ok_or_else(|| SessionError::NotFound(code.clone()))?;
        if session.player_index(from).is_none() {
            tracing::debug!(%code, player_id = %from, "play_again from non-member ignored");
            return Ok(());
        }
        if session.state.is_joinable() {
            return Err(GameError::NotPlaying.into());
        }

        let effect = self.registry.reset(code.as_str())?;
        let Some(session) = self.registry.get(code.as_str()) else {
            return Ok(());
        };
        self.gateway
            .broadcast(session, &ServerMessage::GameReset { session });

        let (key, generation) = (session.code.clone(), session.generation);
        if let Some(effect) = effect {
            self.schedule(key, generation, effect);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Moves
    // -----------------------------------------------------------------------

    /// Routes a move to the session's engine.
    ///
    /// Requests for unknown sessions, from non-members, or naming an
    /// action the game does not have are dropped without a reply.
    fn game_action(
        &mut self,
        from: PlayerId,
        code: &RoomCode,
        action: &str,
        payload: serde_json::Value,
    ) -> Result<(), ParlorError> {
        let Some(session) = self.registry.get_mut(code.as_str()) else {
            tracing::debug!(%code, player_id = %from, "action for unknown session ignored");
            return Ok(());
        };
        let Some(actor) = session.actor(from, Instant::now()) else {
            tracing::debug!(%code, player_id = %from, "action from non-member ignored");
            return Ok(());
        };
        let Some(parsed) = GameAction::parse(session.game_type, action, payload) else {
            tracing::debug!(%code, game = %session.game_type, action, "unknown action ignored");
            return Ok(());
        };

        let applied = session.apply(&actor, parsed?)?;
        let session = &*session;

        let effect = match applied {
            Applied::Updated => None,
            Applied::Deferred(effect) => Some(effect),
        };
        let msg = match effect {
            Some(DeferredEffect::NextRound { .. }) => ServerMessage::RoundResult { session },
            _ => ServerMessage::GameUpdate { session },
        };
        self.gateway.broadcast(session, &msg);

        let (key, generation) = (session.code.clone(), session.generation);
        if let Some(effect) = effect {
            self.schedule(key, generation, effect);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Connection loss, timers, housekeeping
    // -----------------------------------------------------------------------

    /// Removes a closed connection from every session that seats it.
    pub fn disconnect(&mut self, id: PlayerId) {
        while let Some(removal) = self.registry.remove(id) {
            let Removal::Left {
                code,
                player,
                effect,
            } = removal
            else {
                continue;
            };
            let Some(session) = self.registry.get(code.as_str()) else {
                continue;
            };

            self.gateway
                .broadcast(session, &ServerMessage::SessionUpdate { session });
            if session.state.is_playing() {
                self.gateway.broadcast(
                    session,
                    &ServerMessage::PlayerLeft {
                        player_id: player.id,
                    },
                );
            }
            if let Some(effect) = effect {
                // The departure completed an rps round.
                self.gateway
                    .broadcast(session, &ServerMessage::RoundResult { session });
                let generation = session.generation;
                self.schedule(code, generation, effect);
            }
        }
    }

    /// Waits for the next armed effect to fire. Pends forever when none
    /// is armed.
    pub async fn next_effect(&mut self) -> ScheduledEffect {
        self.timers.next().await
    }

    /// Applies a fired effect and broadcasts the result. Effects for a
    /// deleted session, a replaced game, or a state that has moved on do
    /// nothing.
    pub fn fire(&mut self, fired: ScheduledEffect) {
        let ScheduledEffect {
            code,
            generation,
            effect,
        } = fired;
        match self
            .registry
            .resolve(&code, generation, effect, Instant::now())
        {
            Some(session) => {
                tracing::debug!(%code, ?effect, "effect applied");
                self.gateway
                    .broadcast(session, &ServerMessage::GameUpdate { session });
            }
            None => tracing::debug!(%code, generation, ?effect, "effect no longer applies"),
        }
    }

    /// Deletes idle sessions. Returns how many were removed.
    pub fn sweep(&mut self, now: Instant) -> usize {
        let swept = self.registry.sweep(now);
        tracing::debug!(
            sessions = self.registry.len(),
            pending_effects = self.timers.len(),
            effects_armed = self.timers.armed(),
            effects_fired = self.timers.fired(),
            "sweep tick"
        );
        if !swept.is_empty() {
            tracing::info!(count = swept.len(), remaining = self.registry.len(), "idle sessions swept");
        }
        swept.len()
    }

    fn schedule(&mut self, code: RoomCode, generation: u64, effect: DeferredEffect) {
        let delay = self.delay_for(effect);
        tracing::debug!(%code, generation, ?effect, delay_ms = delay.as_millis() as u64, "effect armed");
        self.timers.arm(
            delay,
            ScheduledEffect {
                code,
                generation,
                effect,
            },
        );
    }

    fn delay_for(&self, effect: DeferredEffect) -> Duration {
        match effect {
            DeferredEffect::RevealMismatch => self.timings.mismatch_reveal,
            DeferredEffect::NextRound { .. } => self.timings.round_pause,
            DeferredEffect::Countdown => random_delay(
                &mut rand::rng(),
                self.timings.countdown_min,
                self.timings.countdown_max,
            ),
        }
    }
}
