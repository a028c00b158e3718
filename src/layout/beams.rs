//! Beam geometry: primary beam fitting, secondary levels and hooks.
//!
//! The primary beam is a straight line through the stem tips. Its slope
//! is taken from the first and last natural stem ends, limited to half a
//! staff space per note step, and the whole line is then moved away
//! from the noteheads until every stem reaches its minimum length.
//! Secondary levels sit on parallel lines stacked toward the noteheads.

use serde::{Deserialize, Serialize};

use crate::model::BeamKind;

use super::constants::*;
use super::stems::{directed_length, StemDirection};
use super::{BeamGroup, BeamableNote};

/// One beam segment (full beam or hook) at one level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beam {
    pub x_start: f64,
    pub y_start: f64,
    pub x_end: f64,
    pub y_end: f64,
    pub thickness: f64,
    /// Beam level (1 = primary)
    pub level: u8,
    /// True for a partial beam anchored to a single stem
    pub is_hook: bool,
}

/// Line of the primary beam: `y = y0 + slope * (x - x0)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct BeamLine {
    pub(super) x0: f64,
    pub(super) y0: f64,
    pub(super) slope: f64,
}

impl BeamLine {
    pub(super) fn y_at(&self, x: f64) -> f64 {
        self.y0 + self.slope * (x - self.x0)
    }
}

/// Largest rise or fall per note step, in layout units.
pub(super) fn max_step_slope(scale: f64) -> f64 {
    MAX_SLOPE_SPACES_PER_STEP * REFERENCE_UNITS_PER_SPACE * scale
}

/// Fit the primary beam over notes whose `stem_end_y` still holds the
/// natural (unbeamed) stem tip. `min_lengths` is parallel to `notes`.
pub(super) fn fit_primary_line(
    notes: &[BeamableNote],
    direction: StemDirection,
    min_lengths: &[f64],
    scale: f64,
) -> BeamLine {
    let (Some(first), Some(last)) = (notes.first(), notes.last()) else {
        return BeamLine { x0: 0.0, y0: 0.0, slope: 0.0 };
    };

    let steps = notes.len().saturating_sub(1).max(1) as f64;
    let max_step = max_step_slope(scale);
    let step = ((last.stem_end_y - first.stem_end_y) / steps).clamp(-max_step, max_step);
    let rise = step * steps;

    let dx = last.stem_x - first.stem_x;
    let slope = if dx.abs() > f64::EPSILON { rise / dx } else { 0.0 };
    let mut line = BeamLine {
        x0: first.stem_x,
        y0: first.stem_end_y,
        slope,
    };

    let deficit = notes
        .iter()
        .zip(min_lengths)
        .map(|(n, &min)| min - directed_length(n.notehead_y, line.y_at(n.stem_x), direction))
        .fold(0.0_f64, f64::max);
    if deficit > 0.0 {
        match direction {
            StemDirection::Up => line.y0 -= deficit,
            StemDirection::Down => line.y0 += deficit,
        }
    }

    line
}

/// Every beam segment and hook of a group, ordered by level then x.
pub(super) fn beams_for_group(group: &BeamGroup, line: &BeamLine, scale: f64) -> Vec<Beam> {
    let thickness = BEAM_THICKNESS * scale;
    let spacing = (BEAM_THICKNESS + INTER_BEAM_GAP) * scale;
    let hook_length = BEAM_HOOK_LENGTH * scale;
    let toward_heads = match group.stem_direction {
        StemDirection::Up => 1.0,
        StemDirection::Down => -1.0,
    };

    let mut beams: Vec<Beam> = Vec::new();

    for level in 1..=group.max_level {
        let offset = (level - 1) as f64 * spacing * toward_heads;
        let at = |x: f64| line.y_at(x) + offset;
        let level_start = beams.len();
        let mut open: Option<&BeamableNote> = None;

        for note in &group.notes {
            match note.hint_kinds_per_level[(level - 1) as usize] {
                Some(hook) if hook.is_hook() => {
                    let (x_start, x_end) = if hook == BeamKind::ForwardHook {
                        (note.stem_x, note.stem_x + hook_length)
                    } else {
                        (note.stem_x - hook_length, note.stem_x)
                    };
                    beams.push(Beam {
                        x_start,
                        y_start: at(x_start),
                        x_end,
                        y_end: at(x_end),
                        thickness,
                        level,
                        is_hook: true,
                    });
                }
                Some(BeamKind::Begin) => open = Some(note),
                Some(BeamKind::End) => {
                    if let Some(start) = open.take() {
                        beams.push(Beam {
                            x_start: start.stem_x,
                            y_start: at(start.stem_x),
                            x_end: note.stem_x,
                            y_end: at(note.stem_x),
                            thickness,
                            level,
                            is_hook: false,
                        });
                    }
                }
                Some(_) => {}
                None => open = None,
            }
        }

        beams[level_start..].sort_by(|a, b| a.x_start.total_cmp(&b.x_start));
    }

    beams
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::levels::LevelKinds;
    use BeamKind::*;

    fn note(i: usize, x: f64, y: f64, direction: StemDirection, kinds: LevelKinds) -> BeamableNote {
        BeamableNote {
            note_index: i,
            index_in_group: i,
            x,
            notehead_y: y,
            stem_x: x + if direction == StemDirection::Up { 11.8 } else { -11.8 },
            stem_end_y: if direction == StemDirection::Up { y - 35.0 } else { y + 35.0 },
            tick: i as u32 * 240,
            duration_ticks: 240,
            levels_participating: kinds.iter().filter(|k| k.is_some()).count() as u8,
            hint_kinds_per_level: kinds,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn kinds(per_level: &[Option<BeamKind>]) -> LevelKinds {
        let mut k: LevelKinds = [None; 8];
        k[..per_level.len()].copy_from_slice(per_level);
        k
    }

    #[test]
    fn flat_group_gets_horizontal_beam_at_minimum_length() {
        let notes: Vec<BeamableNote> = (0..4)
            .map(|i| note(i, i as f64 * 50.0, 60.0, StemDirection::Up, kinds(&[Some(Continue)])))
            .collect();
        let line = fit_primary_line(&notes, StemDirection::Up, &[50.0; 4], 1.0);
        assert_eq!(line.slope, 0.0);
        assert_eq!(line.y_at(0.0), 10.0);
        assert_eq!(line.y_at(500.0), 10.0);
    }

    #[test]
    fn steep_slope_is_clamped_per_step() {
        // Three notes rising 40 units each step; clamp allows 10 per step
        let notes: Vec<BeamableNote> = (0..3)
            .map(|i| note(i, i as f64 * 40.0, 120.0 - i as f64 * 40.0, StemDirection::Up, [None; 8]))
            .collect();
        let line = fit_primary_line(&notes, StemDirection::Up, &[0.0; 3], 1.0);
        let rise = line.y_at(notes[2].stem_x) - line.y_at(notes[0].stem_x);
        assert!((rise + 20.0).abs() < 1e-9, "rise was {rise}");
    }

    #[test]
    fn down_stems_push_beam_below() {
        let notes: Vec<BeamableNote> = (0..2)
            .map(|i| note(i, i as f64 * 50.0, 20.0, StemDirection::Down, [None; 8]))
            .collect();
        let line = fit_primary_line(&notes, StemDirection::Down, &[60.0, 50.0], 1.0);
        assert_eq!(line.y_at(notes[0].stem_x), 80.0);
    }

    #[test]
    fn secondary_levels_stack_toward_noteheads_with_hooks() {
        let group = BeamGroup {
            notes: vec![
                note(0, 0.0, 60.0, StemDirection::Up, kinds(&[Some(Begin), Some(ForwardHook)])),
                note(1, 50.0, 60.0, StemDirection::Up, kinds(&[Some(Continue)])),
                note(2, 100.0, 60.0, StemDirection::Up, kinds(&[Some(Continue), Some(Begin)])),
                note(3, 150.0, 60.0, StemDirection::Up, kinds(&[Some(End), Some(End)])),
            ],
            stem_direction: StemDirection::Up,
            max_level: 2,
        };
        let line = BeamLine { x0: 11.8, y0: 10.0, slope: 0.0 };
        let beams = beams_for_group(&group, &line, 1.0);

        assert_eq!(beams.len(), 3);
        assert_eq!((beams[0].level, beams[0].is_hook), (1, false));
        assert!(approx(beams[0].x_start, 11.8) && approx(beams[0].x_end, 161.8));
        assert_eq!(beams[0].y_start, 10.0);

        assert_eq!((beams[1].level, beams[1].is_hook), (2, true));
        assert!(approx(beams[1].x_start, 11.8) && approx(beams[1].x_end, 26.8));
        assert_eq!(beams[1].y_start, 25.0);

        assert_eq!((beams[2].level, beams[2].is_hook), (2, false));
        assert!(approx(beams[2].x_start, 111.8) && approx(beams[2].x_end, 161.8));
    }

    #[test]
    fn backward_hook_extends_left_and_down_stems_stack_up() {
        let group = BeamGroup {
            notes: vec![
                note(0, 0.0, 20.0, StemDirection::Down, kinds(&[Some(Begin)])),
                note(1, 50.0, 20.0, StemDirection::Down, kinds(&[Some(End), Some(BackwardHook)])),
            ],
            stem_direction: StemDirection::Down,
            max_level: 2,
        };
        let line = BeamLine { x0: -11.8, y0: 70.0, slope: 0.0 };
        let beams = beams_for_group(&group, &line, 1.0);
        let hook = &beams[1];
        assert!(hook.is_hook);
        assert!(approx(hook.x_end, 38.2));
        assert!(approx(hook.x_start, 23.2));
        assert_eq!(hook.y_start, 55.0);
    }
}
