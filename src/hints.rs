//! Beam hint extraction: normalizes raw `<beam>` annotations.
//!
//! Raw annotations carry a level number and the element text exactly as
//! found in the source document. Anything that cannot be understood is
//! dropped here so the rest of the crate only ever sees `BeamKind`.

use serde::{Deserialize, Serialize};

use crate::model::{BeamHint, BeamKind, MAX_BEAM_LEVEL};

/// A beam annotation as found in the source (`<beam number="N">text</beam>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBeam {
    /// Beam level as written (1 = eighth-note beam)
    pub number: i32,
    /// Element text: "begin", "continue", "end", "forward hook", "backward hook"
    pub beam_type: String,
}

impl RawBeam {
    pub fn new(number: i32, beam_type: impl Into<String>) -> Self {
        Self {
            number,
            beam_type: beam_type.into(),
        }
    }
}

impl BeamKind {
    /// Parse MusicXML `<beam>` element text. Surrounding whitespace and
    /// case are ignored; unknown values yield `None`.
    pub fn from_musicxml(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "begin" => Some(BeamKind::Begin),
            "continue" => Some(BeamKind::Continue),
            "end" => Some(BeamKind::End),
            "forward hook" => Some(BeamKind::ForwardHook),
            "backward hook" => Some(BeamKind::BackwardHook),
            _ => None,
        }
    }
}

/// Convert one note's raw annotations into normalized hints.
///
/// Levels outside `1..=8` and unrecognized kinds are dropped. A level
/// annotated more than once keeps its first usable annotation. The
/// result is ordered by level.
pub fn extract_hints(raw: &[RawBeam]) -> Vec<BeamHint> {
    let mut hints: Vec<BeamHint> = Vec::with_capacity(raw.len());

    for beam in raw {
        let level = match u8::try_from(beam.number) {
            Ok(l) if (1..=MAX_BEAM_LEVEL).contains(&l) => l,
            _ => {
                log::debug!("dropping beam hint with out-of-range level {}", beam.number);
                continue;
            }
        };
        let Some(kind) = BeamKind::from_musicxml(&beam.beam_type) else {
            log::debug!("dropping beam hint with unknown kind {:?} at level {level}", beam.beam_type);
            continue;
        };
        if hints.iter().any(|h| h.level == level) {
            log::debug!("dropping duplicate beam hint at level {level}");
            continue;
        }
        hints.push(BeamHint { level, kind });
    }

    hints.sort_by_key(|h| h.level);
    hints
}
