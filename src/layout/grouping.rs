//! Beam group builder.
//!
//! Two strategies decide which notes share a primary beam:
//!
//! * **Hinted**: replays the begin/continue/end annotations of the
//!   source, one small state machine per beam level.
//! * **Metrical**: used when the voice carries no level-1 hints; groups
//!   eighths and shorter by the beat windows of the active meter.
//!
//! Both strategies hand their candidates to the same post-processing,
//! which splits at bar lines and non-beamable notes and drops anything
//! shorter than two notes. Groups are index ranges into the voice slice.

use std::ops::Range;

use crate::meter::{beat_boundaries, beat_index, half_bar_ticks, MeasureMap};
use crate::model::{BeamKind, NoteEvent, MAX_BEAMED_DURATION, MAX_BEAM_LEVEL};

use super::levels::{metrical_kinds, HintCursor, LevelKinds};

const LEVELS: usize = MAX_BEAM_LEVEL as usize;

/// A group that survived post-processing, with normalized per-level
/// beam kinds for each member (same order as `range`).
#[derive(Debug, Clone)]
pub(super) struct GroupPlan {
    pub(super) range: Range<usize>,
    pub(super) kinds: Vec<LevelKinds>,
}

/// Closed runs and hooks found at one beam level.
#[derive(Debug, Clone, Default)]
pub(super) struct LevelRuns {
    pub(super) runs: Vec<Range<usize>>,
    pub(super) hooks: Vec<(usize, BeamKind)>,
}

/// Result of replaying hints over a whole voice; index 0 is level 1.
#[derive(Debug, Clone)]
pub(super) struct HintScan {
    pub(super) levels: Vec<LevelRuns>,
}

/// True when any pitched note carries a level-1 hint.
pub(super) fn uses_hints(notes: &[NoteEvent]) -> bool {
    notes.iter().any(|n| !n.is_rest() && n.hint_at(1).is_some())
}

/// Plan every beam group of a voice.
pub(super) fn plan_groups(notes: &[NoteEvent], map: &MeasureMap) -> Vec<GroupPlan> {
    if uses_hints(notes) {
        let scan = scan_hints(notes);
        let mut cursor = HintCursor::default();
        scan.levels[0]
            .runs
            .iter()
            .flat_map(|run| split_range(notes, map, run.clone()))
            .map(|range| GroupPlan {
                kinds: cursor.kinds(&range, &scan),
                range,
            })
            .collect()
    } else {
        metrical_ranges(notes, map)
            .into_iter()
            .flat_map(|candidate| split_range(notes, map, candidate))
            .map(|range| {
                let measure_start = map.measure_of(notes[range.start].start_tick).start_tick;
                GroupPlan {
                    kinds: metrical_kinds(notes, &range, measure_start),
                    range,
                }
            })
            .collect()
    }
}

// ── Hinted strategy ─────────────────────────────────────────────────

fn close_run(runs: &mut LevelRuns, run: Range<usize>, level: usize, forced: bool) {
    if forced {
        log::debug!(
            "force-closing level {} beam at notes {}..{} (inconsistent hints)",
            level + 1, run.start, run.end
        );
    }
    if run.len() >= 2 {
        runs.runs.push(run);
    } else {
        log::debug!("discarding single-note level {} beam at note {}", level + 1, run.start);
    }
}

/// Replay begin/continue/end/hook annotations, one state machine per level.
pub(super) fn scan_hints(notes: &[NoteEvent]) -> HintScan {
    let mut levels: Vec<LevelRuns> = vec![LevelRuns::default(); LEVELS];
    // level index → in-progress run
    let mut open: [Option<Range<usize>>; LEVELS] = Default::default();

    for (i, note) in notes.iter().enumerate() {
        for level in 0..LEVELS {
            let kind = if note.is_rest() {
                None
            } else {
                note.hint_at(level as u8 + 1)
            };
            let pending = open[level].take();

            match (kind, pending) {
                (Some(BeamKind::Begin), pending) => {
                    if let Some(run) = pending {
                        close_run(&mut levels[level], run, level, true);
                    }
                    open[level] = Some(i..i + 1);
                }
                (Some(BeamKind::Continue), Some(run)) => {
                    open[level] = Some(run.start..i + 1);
                }
                (Some(BeamKind::End), Some(run)) => {
                    close_run(&mut levels[level], run.start..i + 1, level, false);
                }
                (Some(kind @ (BeamKind::Continue | BeamKind::End)), None) => {
                    log::debug!("ignoring {kind:?} without begin at level {} (note {i})", level + 1);
                }
                (Some(hook), pending) => {
                    if let Some(run) = pending {
                        close_run(&mut levels[level], run, level, true);
                    }
                    levels[level].hooks.push((i, hook));
                }
                (None, Some(run)) => close_run(&mut levels[level], run, level, true),
                (None, None) => {}
            }
        }
    }

    for (level, pending) in open.iter_mut().enumerate() {
        if let Some(run) = pending.take() {
            close_run(&mut levels[level], run, level, true);
        }
    }

    HintScan { levels }
}

// ── Metrical strategy ───────────────────────────────────────────────

/// Candidate ranges of consecutive beamable notes sharing a beat window.
fn metrical_ranges(notes: &[NoteEvent], map: &MeasureMap) -> Vec<Range<usize>> {
    let mut candidates: Vec<Range<usize>> = Vec::new();
    // (first index, measure index, beat index)
    let mut current: Option<(usize, usize, usize)> = None;
    let mut table: Vec<u32> = Vec::new();
    let mut table_measure: Option<usize> = None;

    for (i, note) in notes.iter().enumerate() {
        if !note.is_beamable() {
            if let Some((start, _, _)) = current.take() {
                candidates.push(start..i);
            }
            continue;
        }

        let span = map.measure_of(note.start_tick);
        if table_measure != Some(span.index) {
            table = beat_boundaries(span.time_signature);
            table_measure = Some(span.index);
        }
        let beat = beat_index(&table, note.start_tick.saturating_sub(span.start_tick));

        match current {
            Some((_, measure, b)) if measure == span.index && b == beat => {}
            Some((start, _, _)) => {
                candidates.push(start..i);
                current = Some((i, span.index, beat));
            }
            None => current = Some((i, span.index, beat)),
        }
    }
    if let Some((start, _, _)) = current {
        candidates.push(start..notes.len());
    }

    merge_half_bars(notes, map, candidates)
}

/// In common time, two beats of plain eighths that fill a half bar are
/// beamed as one group of four.
fn merge_half_bars(notes: &[NoteEvent], map: &MeasureMap, candidates: Vec<Range<usize>>) -> Vec<Range<usize>> {
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let mergeable = merged.last().is_some_and(|last| {
            last.end == candidate.start && fills_half_bar(notes, map, last.start..candidate.end)
        });
        match merged.last_mut() {
            Some(last) if mergeable => last.end = candidate.end,
            _ => merged.push(candidate),
        }
    }
    merged
}

fn fills_half_bar(notes: &[NoteEvent], map: &MeasureMap, range: Range<usize>) -> bool {
    let members = &notes[range];
    let Some(first) = members.first() else {
        return false;
    };
    let span = map.measure_of(first.start_tick);
    let Some(half) = half_bar_ticks(span.time_signature) else {
        return false;
    };
    let plain_eighths = members.iter().all(|n| n.duration_ticks == MAX_BEAMED_DURATION);
    let contiguous = members.windows(2).all(|w| w[1].start_tick == w[0].end_tick());
    let offset = first.start_tick.saturating_sub(span.start_tick);

    plain_eighths
        && contiguous
        && members.len() as u32 * MAX_BEAMED_DURATION == half
        && offset % half == 0
        && members.iter().all(|n| n.start_tick < span.end_tick)
}

// ── Shared post-processing ──────────────────────────────────────────

/// Split a candidate at bar lines and at rests or notes too long to beam;
/// drop pieces with fewer than two notes.
fn split_range(notes: &[NoteEvent], map: &MeasureMap, candidate: Range<usize>) -> Vec<Range<usize>> {
    fn flush(pieces: &mut Vec<Range<usize>>, from: usize, to: usize) {
        if to - from >= 2 {
            pieces.push(from..to);
        } else {
            log::debug!("discarding single-note beam group at note {from}");
        }
    }

    let mut pieces: Vec<Range<usize>> = Vec::new();
    let mut start: Option<(usize, usize)> = None;

    for i in candidate.clone() {
        let note = &notes[i];
        if !note.is_beamable() {
            if let Some((from, _)) = start.take() {
                flush(&mut pieces, from, i);
            }
            continue;
        }
        let measure = map.measure_of(note.start_tick).index;
        match start {
            Some((_, m)) if m == measure => {}
            Some((from, _)) => {
                log::debug!("splitting beam group at bar line before note {i}");
                flush(&mut pieces, from, i);
                start = Some((i, measure));
            }
            None => start = Some((i, measure)),
        }
    }
    if let Some((from, _)) = start {
        flush(&mut pieces, from, candidate.end);
    }

    pieces
}
