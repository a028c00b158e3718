//! beamlib: beam and stem layout for engraved music notation.
//!
//! Converts ordered note streams (pitch, start tick, duration, optional
//! `<beam>` hints) into the primitives a renderer needs to draw beamed
//! groups: bare or combined noteheads, stems, and one beam line per beam
//! level including partial hooks.
//!
//! Groups come from the source's beaming hints when present and from the
//! beat structure of the time signature otherwise. Malformed input never
//! fails a layout pass; it degrades to unbeamed (flagged) notes.
//!
//! # Example
//! ```
//! use beamlib::{layout_voice, LayoutConfig, NoteEvent, TimeSignature, VoiceInput};
//!
//! let notes = (0..4).map(|i| NoteEvent::note(67, i * 480, 480)).collect();
//! let input = VoiceInput::new(notes, TimeSignature::COMMON);
//! let layout = layout_voice(&input, &LayoutConfig::default());
//! assert_eq!(layout.groups.len(), 1);
//! ```

pub mod error;
pub mod hints;
pub mod layout;
pub mod meter;
pub mod model;
pub mod musicxml;

pub use error::BeamError;
pub use hints::{extract_hints, RawBeam};
pub use layout::{
    layout_voice, layout_voices, Beam, BeamGroup, BeamableNote, LayoutConfig, Notehead, NoteheadGlyph,
    Primitive, Stem, StemDirection, VoiceLayout,
};
pub use model::*;
pub use musicxml::voices_from_musicxml;

/// Parse a MusicXML document and lay out every voice it contains.
pub fn layout_musicxml(xml: &str, config: &LayoutConfig) -> Result<Vec<VoiceLayout>, BeamError> {
    let voices = voices_from_musicxml(xml)?;
    Ok(layout_voices(&voices, config))
}

/// Serialize a primitive list as pretty-printed JSON for a renderer.
pub fn primitives_to_json(primitives: &[Primitive]) -> Result<String, BeamError> {
    Ok(serde_json::to_string_pretty(primitives)?)
}
