//! Sessions and game engines for Parlor.
//!
//! - [`SessionRegistry`]: room code → [`Session`], code generation,
//!   join eligibility, departures, idle sweep.
//! - [`GameEngine`]: the rules trait, implemented once per game in
//!   [`games`], and held by a session as one [`GameState`] variant.
//! - [`GameAction`]: a move decoded from the wire.
//!
//! Nothing here does I/O or spawns tasks. Delays are requested by
//! returning a [`DeferredEffect`]; the caller owns the timers and feeds
//! fired effects back through [`SessionRegistry::resolve`].

mod config;
mod engine;
mod error;
pub mod games;
mod registry;
mod session;

pub use config::{RegistryConfig, SessionState};
pub use engine::{Actor, Applied, DeferredEffect, GameAction, GameEngine, Table};
pub use error::{GameError, SessionError};
pub use games::{GameState, Outcome};
pub use registry::{Removal, SessionRegistry};
pub use session::{Mark, Player, Session};
