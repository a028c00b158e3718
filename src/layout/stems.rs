//! Stem direction and stem geometry for beamed notes.
//!
//! Coordinates are positive-y-down: a smaller y is visually higher.

use serde::{Deserialize, Serialize};

use super::constants::*;
use super::BeamableNote;

/// Stem direction relative to the notehead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StemDirection {
    Up,
    Down,
}

/// A stem line from a notehead to its beam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stem {
    /// X of the stem line (notehead edge)
    pub x: f64,
    /// Y at the notehead
    pub y_start: f64,
    /// Y at the beam
    pub y_end: f64,
    pub direction: StemDirection,
    pub thickness: f64,
}

/// Direction a lone note would take: above the middle line points down,
/// on or below it points up.
pub fn natural_direction(notehead_y: f64, middle_line_y: f64) -> StemDirection {
    if notehead_y < middle_line_y {
        StemDirection::Down
    } else {
        StemDirection::Up
    }
}

/// Majority vote over the natural directions of a group; ties go up.
pub fn resolve_group_direction<I>(notehead_ys: I, middle_line_y: f64) -> StemDirection
where
    I: IntoIterator<Item = f64>,
{
    let (mut up, mut total) = (0usize, 0usize);
    for y in notehead_ys {
        total += 1;
        if natural_direction(y, middle_line_y) == StemDirection::Up {
            up += 1;
        }
    }
    if up * 2 >= total {
        StemDirection::Up
    } else {
        StemDirection::Down
    }
}

/// Stem x: right edge of the notehead for up-stems, left edge for down.
pub(super) fn attachment_x(notehead_x: f64, direction: StemDirection, scale: f64) -> f64 {
    match direction {
        StemDirection::Up => notehead_x + NOTEHEAD_HALF_WIDTH * scale,
        StemDirection::Down => notehead_x - NOTEHEAD_HALF_WIDTH * scale,
    }
}

/// Stem tip before any beam fitting.
pub(super) fn natural_stem_end(notehead_y: f64, direction: StemDirection, scale: f64) -> f64 {
    match direction {
        StemDirection::Up => notehead_y - STEM_LENGTH * scale,
        StemDirection::Down => notehead_y + STEM_LENGTH * scale,
    }
}

pub(super) fn min_stem_length(on_ledger: bool, scale: f64) -> f64 {
    if on_ledger {
        MIN_LEDGER_STEM_LENGTH * scale
    } else {
        MIN_BEAMED_STEM_LENGTH * scale
    }
}

/// Length of a stem measured in its own direction (negative when the
/// tip is on the wrong side of the notehead).
pub(super) fn directed_length(notehead_y: f64, stem_end_y: f64, direction: StemDirection) -> f64 {
    match direction {
        StemDirection::Up => notehead_y - stem_end_y,
        StemDirection::Down => stem_end_y - notehead_y,
    }
}

pub(super) fn stem_for(note: &BeamableNote, direction: StemDirection, scale: f64) -> Stem {
    Stem {
        x: note.stem_x,
        y_start: note.notehead_y,
        y_end: note.stem_end_y,
        direction,
        thickness: STEM_THICKNESS * scale,
    }
}
