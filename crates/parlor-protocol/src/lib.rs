//! Wire protocol for Parlor.
//!
//! - **Types**: [`ClientMessage`], [`ServerMessage`], and the identifiers
//!   they carry ([`PlayerId`], [`RoomCode`], [`GameType`]).
//! - **Codec**: the [`Codec`] trait and [`JsonCodec`].
//! - **Errors**: [`ProtocolError`].
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Session (registry, engines)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    CODE_ALPHABET, CODE_LEN, ClientMessage, GameType, PlayerId, RoomCode, ServerMessage,
};
