//! Error types for the protocol layer.
//!
//! Each crate in Wineguessr defines its own error enum. A `ProtocolError`
//! always means the problem is in turning data into bytes or back, never
//! in room rules or storage.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing fields, wrong
    /// types, or a truncated value.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A wine list was empty or could not be parsed.
    #[error("invalid wine list: {0}")]
    InvalidWineList(String),
}
