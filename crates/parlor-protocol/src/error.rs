//! Error types for the protocol layer.
//!
//! A `ProtocolError` always means "these bytes, or this string, are not
//! something the wire format understands". It never carries game rules.

/// Errors that can occur while encoding, decoding, or parsing wire values.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed: malformed JSON, a missing field, or an
    /// unknown message `type`.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The string does not name one of the supported games.
    #[error("unknown game type: {0}")]
    UnknownGameType(String),
}
