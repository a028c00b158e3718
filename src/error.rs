//! Errors raised by the text-parsing entry points.
//!
//! The layout core itself never fails; malformed musical input degrades
//! to unbeamed output instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BeamError {
    /// XML is not well-formed
    #[error("invalid XML: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Root element other than `score-partwise`
    #[error("unsupported MusicXML root element: <{0}>")]
    UnsupportedRoot(String),

    /// Layout configuration could not be read
    #[error("invalid layout configuration: {0}")]
    Config(#[source] serde_json::Error),

    /// Primitive list could not be serialized
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
