//! Horizontal placement: maps note onsets to x positions.
//!
//! Each measure gets the same width; inside a measure onsets are spread
//! proportionally between the left and right padding.

use crate::meter::MeasureMap;
use crate::model::NoteEvent;

use super::LayoutConfig;

/// x of a tick within the measure map.
pub(super) fn tick_to_x(tick: u32, map: &MeasureMap, config: &LayoutConfig) -> f64 {
    let span = map.measure_of(tick);
    let measure_x = config.origin_x + span.index as f64 * config.measure_width;
    let usable = (config.measure_width - 2.0 * config.measure_padding).max(0.0);
    let length = span.end_tick.saturating_sub(span.start_tick).max(1) as f64;
    let offset = tick.saturating_sub(span.start_tick) as f64;
    let frac = (offset / length).clamp(0.0, 1.0);
    measure_x + config.measure_padding + frac * usable
}

/// Notehead centre x for every event in the voice.
pub(super) fn note_x_positions(notes: &[NoteEvent], map: &MeasureMap, config: &LayoutConfig) -> Vec<f64> {
    notes
        .iter()
        .map(|n| tick_to_x(n.start_tick, map, config))
        .collect()
}
