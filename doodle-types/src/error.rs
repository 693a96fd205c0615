//! Error types for Doodle wire data.

use thiserror::Error;

/// Errors that can occur while encoding, decoding or validating wire data.
#[derive(Debug, Error)]
pub enum WireError {
    /// MessagePack serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[source] rmp_serde::encode::Error),

    /// MessagePack deserialization failed
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] rmp_serde::decode::Error),

    /// Color is neither `#RRGGBB` nor a palette name
    #[error("invalid color: {0:?}")]
    InvalidColor(String),

    /// Segment geometry or width is unusable
    #[error("invalid segment: {0}")]
    InvalidSegment(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = WireError::InvalidColor("chartreuse".into());
        assert_eq!(err.to_string(), "invalid color: \"chartreuse\"");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WireError>();
    }
}
