//! Beam and stem layout pipeline.
//!
//! Turns one voice's notes into a flat list of engraving primitives:
//! noteheads for every pitched note, plus stems and beams for every beam
//! group. Each call is a pure function of its input and configuration,
//! so independent voices can be laid out in parallel by the caller.
//!
//! Coordinate system: layout units (20 per staff space at the reference
//! size), positive y pointing down.

mod beams;
mod constants;
mod glyphs;
mod grouping;
mod levels;
mod spacing;
mod staff;
mod stems;

use serde::{Deserialize, Serialize};

use crate::error::BeamError;
use crate::meter::MeasureMap;
use crate::model::{BeamKind, VoiceInput, MAX_BEAM_LEVEL};

pub use beams::Beam;
pub use glyphs::NoteheadGlyph;
pub use stems::{natural_direction, resolve_group_direction, Stem, StemDirection};

use constants::REFERENCE_UNITS_PER_SPACE;

// ═══════════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════════

/// Layout parameters. Missing fields take their default when loaded
/// from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// When false, nothing is beamed: every note keeps its combined glyph
    pub beaming_enabled: bool,
    /// Layout units per staff space
    pub units_per_space: f64,
    /// y of the top staff line
    pub staff_top_y: f64,
    /// Horizontal units allotted to each measure
    pub measure_width: f64,
    /// Left/right padding inside each measure
    pub measure_padding: f64,
    /// x of the first measure's left bar line
    pub origin_x: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            beaming_enabled: true,
            units_per_space: REFERENCE_UNITS_PER_SPACE,
            staff_top_y: 0.0,
            measure_width: 400.0,
            measure_padding: 20.0,
            origin_x: 0.0,
        }
    }
}

impl LayoutConfig {
    /// Parse a (possibly partial) JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, BeamError> {
        serde_json::from_str(json).map_err(BeamError::Config)
    }

    /// Factor applied to every geometry constant.
    pub fn scale(&self) -> f64 {
        self.units_per_space / REFERENCE_UNITS_PER_SPACE
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Output model
// ═══════════════════════════════════════════════════════════════════════

/// Working record for one member of a beam group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamableNote {
    /// Index into the voice's note list
    pub note_index: usize,
    pub index_in_group: usize,
    /// Notehead centre x
    pub x: f64,
    pub notehead_y: f64,
    /// x of the stem line
    pub stem_x: f64,
    /// y where the stem meets the primary beam
    pub stem_end_y: f64,
    pub tick: u32,
    pub duration_ticks: u32,
    pub levels_participating: u8,
    /// Beam kind at each level, index 0 = level 1
    pub hint_kinds_per_level: [Option<BeamKind>; MAX_BEAM_LEVEL as usize],
}

/// A resolved beam group: at least two notes, one measure, one direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamGroup {
    pub notes: Vec<BeamableNote>,
    pub stem_direction: StemDirection,
    /// Deepest beam level drawn (1 = eighths)
    pub max_level: u8,
}

/// A notehead (bare or combined) placed on the staff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notehead {
    pub note_index: usize,
    pub x: f64,
    pub y: f64,
    pub glyph: NoteheadGlyph,
    /// SMuFL codepoint to draw
    pub codepoint: char,
}

/// One drawable element handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Primitive {
    Notehead(Notehead),
    Stem(Stem),
    Beam(Beam),
}

/// Everything computed for one voice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceLayout {
    pub part_id: String,
    pub staff: u32,
    pub voice: u32,
    pub groups: Vec<BeamGroup>,
    /// Noteheads in input order, then per group its stems and beams
    pub primitives: Vec<Primitive>,
}

// ═══════════════════════════════════════════════════════════════════════
// Pipeline
// ═══════════════════════════════════════════════════════════════════════

/// Lay out one voice.
pub fn layout_voice(input: &VoiceInput, config: &LayoutConfig) -> VoiceLayout {
    let notes = &input.notes;
    let map = MeasureMap::new(&input.measures, input.time_signature);
    let scale = config.scale();
    let ups = config.units_per_space;
    let middle = staff::middle_line_y(config.staff_top_y, ups);

    let xs = spacing::note_x_positions(notes, &map, config);
    let ys: Vec<Option<f64>> = notes
        .iter()
        .map(|n| {
            n.pitch
                .map(|p| staff::pitch_to_y(p, input.clef_at(n.start_tick), config.staff_top_y, ups))
        })
        .collect();

    let mut plans = if config.beaming_enabled {
        grouping::plan_groups(notes, &map)
    } else {
        Vec::new()
    };
    plans.sort_by_key(|p| p.range.start);

    // note index → direction of the group it belongs to
    let mut membership: Vec<Option<StemDirection>> = vec![None; notes.len()];
    let mut groups: Vec<BeamGroup> = Vec::with_capacity(plans.len());
    let mut lines: Vec<beams::BeamLine> = Vec::with_capacity(plans.len());

    for plan in plans {
        let members: Vec<(usize, f64)> = plan
            .range
            .clone()
            .filter_map(|i| ys[i].map(|y| (i, y)))
            .collect();
        if members.len() != plan.range.len() {
            log::debug!("skipping beam group {:?} containing unpitched notes", plan.range);
            continue;
        }

        let direction = resolve_group_direction(members.iter().map(|&(_, y)| y), middle);
        let max_level = levels::max_level(&plan.kinds);

        let mut group_notes: Vec<BeamableNote> = members
            .iter()
            .zip(&plan.kinds)
            .enumerate()
            .map(|(index_in_group, (&(i, y), kinds))| {
                let stem_x = stems::attachment_x(xs[i], direction, scale);
                BeamableNote {
                    note_index: i,
                    index_in_group,
                    x: xs[i],
                    notehead_y: y,
                    stem_x,
                    stem_end_y: stems::natural_stem_end(y, direction, scale),
                    tick: notes[i].start_tick,
                    duration_ticks: notes[i].duration_ticks,
                    levels_participating: levels::levels_participating(kinds),
                    hint_kinds_per_level: *kinds,
                }
            })
            .collect();

        let min_lengths: Vec<f64> = group_notes
            .iter()
            .map(|n| {
                let on_ledger = staff::is_ledger_note(n.notehead_y, config.staff_top_y, ups);
                stems::min_stem_length(on_ledger, scale)
            })
            .collect();
        let line = beams::fit_primary_line(&group_notes, direction, &min_lengths, scale);
        for note in &mut group_notes {
            note.stem_end_y = line.y_at(note.stem_x);
            membership[note.note_index] = Some(direction);
        }

        lines.push(line);
        groups.push(BeamGroup {
            notes: group_notes,
            stem_direction: direction,
            max_level,
        });
    }

    let mut primitives: Vec<Primitive> = Vec::with_capacity(notes.len() * 3);

    for (i, note) in notes.iter().enumerate() {
        let Some(y) = ys[i] else { continue };
        let direction = membership[i].unwrap_or_else(|| natural_direction(y, middle));
        let (glyph, codepoint) = glyphs::select_glyph(note.duration_ticks, membership[i].is_some(), direction);
        primitives.push(Primitive::Notehead(Notehead {
            note_index: i,
            x: xs[i],
            y,
            glyph,
            codepoint,
        }));
    }

    for (group, line) in groups.iter().zip(&lines) {
        primitives.extend(
            group
                .notes
                .iter()
                .map(|n| Primitive::Stem(stems::stem_for(n, group.stem_direction, scale))),
        );
        primitives.extend(
            beams::beams_for_group(group, line, scale)
                .into_iter()
                .map(Primitive::Beam),
        );
    }

    log::trace!(
        "laid out {}/{}/{}: {} notes, {} groups, {} primitives",
        input.part_id,
        input.staff,
        input.voice,
        notes.len(),
        groups.len(),
        primitives.len()
    );

    VoiceLayout {
        part_id: input.part_id.clone(),
        staff: input.staff,
        voice: input.voice,
        groups,
        primitives,
    }
}

/// Lay out several independent voices.
pub fn layout_voices(inputs: &[VoiceInput], config: &LayoutConfig) -> Vec<VoiceLayout> {
    inputs.iter().map(|input| layout_voice(input, config)).collect()
}
