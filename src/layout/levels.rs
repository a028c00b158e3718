//! Per-level beam membership inside a group.
//!
//! Every group member gets one `Option<BeamKind>` per beam level.
//! Linked runs are normalized to Begin, Continue..., End and single
//! notes that need a partial beam carry a hook kind.

use std::ops::Range;

use crate::model::{BeamKind, NoteEvent, MAX_BEAM_LEVEL, TICKS_PER_QUARTER};

use super::grouping::HintScan;

/// Beam kind per level for one note; index 0 is level 1.
pub(super) type LevelKinds = [Option<BeamKind>; MAX_BEAM_LEVEL as usize];

const LEVELS: usize = MAX_BEAM_LEVEL as usize;

fn mark_run(kinds: &mut [LevelKinds], level_idx: usize, run: Range<usize>) {
    let last = run.end - 1;
    for j in run.clone() {
        kinds[j][level_idx] = Some(if j == run.start {
            BeamKind::Begin
        } else if j == last {
            BeamKind::End
        } else {
            BeamKind::Continue
        });
    }
}

/// Walks the secondary runs and hooks of a [`HintScan`] alongside the
/// hint-driven groups. Groups must be visited in index order; each level
/// keeps its own position so the whole voice is scanned once.
#[derive(Debug, Default)]
pub(super) struct HintCursor {
    runs: [usize; LEVELS],
    hooks: [usize; LEVELS],
}

impl HintCursor {
    /// Kinds for a hint-driven group. Secondary runs are clipped to the
    /// group; a run left with one note after clipping is dropped.
    pub(super) fn kinds(&mut self, range: &Range<usize>, scan: &HintScan) -> Vec<LevelKinds> {
        let mut kinds: Vec<LevelKinds> = vec![[None; LEVELS]; range.len()];
        mark_run(&mut kinds, 0, 0..range.len());

        for (level_idx, level) in scan.levels.iter().enumerate().skip(1) {
            let runs = &level.runs;
            let mut first = self.runs[level_idx];
            while first < runs.len() && runs[first].end <= range.start {
                first += 1;
            }
            let mut next = first;
            while next < runs.len() && runs[next].start < range.end {
                let run = &runs[next];
                let start = run.start.max(range.start);
                let end = run.end.min(range.end);
                if end >= start + 2 {
                    mark_run(&mut kinds, level_idx, start - range.start..end - range.start);
                } else {
                    log::debug!("dropping level {} beam clipped to one note ({start})", level_idx + 1);
                }
                next += 1;
            }
            // a run reaching past this group may continue into the next one
            while first < next && runs[first].end <= range.end {
                first += 1;
            }
            self.runs[level_idx] = first;

            let hooks = &level.hooks;
            let mut at = self.hooks[level_idx];
            while at < hooks.len() && hooks[at].0 < range.start {
                at += 1;
            }
            while at < hooks.len() && hooks[at].0 < range.end {
                let (i, hook) = hooks[at];
                if kinds[i - range.start][level_idx].is_none() {
                    kinds[i - range.start][level_idx] = Some(hook);
                }
                at += 1;
            }
            self.hooks[level_idx] = at;
        }

        kinds
    }
}

/// Longest duration that still carries a beam at `level`.
pub(super) fn level_threshold(level: u32) -> u32 {
    TICKS_PER_QUARTER.checked_shr(level).unwrap_or(0)
}

/// Kinds derived from durations: a note joins level k when it lasts at
/// most 960 / 2^k ticks. Runs of one note become hooks.
pub(super) fn metrical_kinds(notes: &[NoteEvent], range: &Range<usize>, measure_start: u32) -> Vec<LevelKinds> {
    let members = &notes[range.clone()];
    let n = members.len();
    let mut kinds: Vec<LevelKinds> = vec![[None; LEVELS]; n];
    mark_run(&mut kinds, 0, 0..n);

    for level_idx in 1..LEVELS {
        let level = level_idx as u32 + 1;
        let threshold = level_threshold(level);
        if threshold == 0 {
            break;
        }
        let joins: Vec<bool> = members.iter().map(|m| m.duration_ticks <= threshold).collect();
        if !joins.contains(&true) {
            break;
        }

        let mut j = 0;
        while j < n {
            if !joins[j] {
                j += 1;
                continue;
            }
            let start = j;
            while j < n && joins[j] {
                j += 1;
            }
            if j - start >= 2 {
                mark_run(&mut kinds, level_idx, start..j);
            } else {
                kinds[start][level_idx] = Some(hook_direction(members, start, level, measure_start));
            }
        }
    }

    kinds
}

/// Which way a lone note's partial beam points.
///
/// The first member hooks forward and the last hooks backward. An inner
/// note hooks forward when it starts a subdivision of the level above
/// (its partner follows it) and backward otherwise.
pub(super) fn hook_direction(members: &[NoteEvent], j: usize, level: u32, measure_start: u32) -> BeamKind {
    if j == 0 {
        return BeamKind::ForwardHook;
    }
    if j + 1 == members.len() {
        return BeamKind::BackwardHook;
    }
    let parent = level_threshold(level - 1).max(1);
    let offset = members[j].start_tick.saturating_sub(measure_start);
    if offset % parent == 0 {
        BeamKind::ForwardHook
    } else {
        BeamKind::BackwardHook
    }
}

/// Highest level any member beams at (at least 1).
pub(super) fn max_level(kinds: &[LevelKinds]) -> u8 {
    kinds
        .iter()
        .filter_map(|k| k.iter().rposition(Option::is_some))
        .max()
        .map_or(1, |idx| idx as u8 + 1)
}

pub(super) fn levels_participating(kinds: &LevelKinds) -> u8 {
    kinds.iter().filter(|k| k.is_some()).count() as u8
}
