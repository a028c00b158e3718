//! Glyph selection for noteheads.
//!
//! Beamed notes get a bare notehead because their stem and beam are
//! emitted separately. Everything else keeps the single combined SMuFL
//! glyph (head, stem and flag in one), which is also what the
//! non-beamed baseline draws.

use serde::{Deserialize, Serialize};

use crate::model::MAX_BEAMED_DURATION;

use super::constants::*;
use super::stems::StemDirection;

/// Which notehead primitive a note renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteheadGlyph {
    /// Notehead only; stem and beam are separate primitives
    Bare,
    /// Head, stem and flag drawn as one glyph
    Combined,
}

/// Combined glyph codepoint for a duration and stem direction.
pub(super) fn combined_codepoint(duration_ticks: u32, direction: StemDirection) -> char {
    let up = direction == StemDirection::Up;
    let pick = |u: char, d: char| if up { u } else { d };
    match duration_ticks {
        3840.. => NOTE_WHOLE,
        1920.. => pick(NOTE_HALF_UP, NOTE_HALF_DOWN),
        960.. => pick(NOTE_QUARTER_UP, NOTE_QUARTER_DOWN),
        480.. => pick(NOTE_8TH_UP, NOTE_8TH_DOWN),
        240.. => pick(NOTE_16TH_UP, NOTE_16TH_DOWN),
        120.. => pick(NOTE_32ND_UP, NOTE_32ND_DOWN),
        60.. => pick(NOTE_64TH_UP, NOTE_64TH_DOWN),
        _ => pick(NOTE_128TH_UP, NOTE_128TH_DOWN),
    }
}

/// Choose the glyph for one note. `direction` is the group direction
/// for beamed notes and the natural direction otherwise.
pub(super) fn select_glyph(duration_ticks: u32, beamed: bool, direction: StemDirection) -> (NoteheadGlyph, char) {
    if beamed && duration_ticks <= MAX_BEAMED_DURATION {
        (NoteheadGlyph::Bare, NOTEHEAD_BLACK)
    } else {
        (NoteheadGlyph::Combined, combined_codepoint(duration_ticks, direction))
    }
}
