//! Meter handling: beat windows for beaming and the bar-line map.
//!
//! Beat windows are expressed as tick offsets from the start of a
//! measure. The tables follow common engraving practice: quarter-note
//! beats in x/4, half-note beats in x/2, dotted-quarter beats in
//! compound x/8, and fixed sub-beat patterns for the asymmetric meters.

use serde::{Deserialize, Serialize};

use crate::model::{MeasureInfo, TimeSignature};

/// Broad classification of a meter for beaming purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeterClass {
    /// One beat per denominator unit (2/4, 3/4, 4/4)
    Simple,
    /// Dotted beats of three units (6/8, 9/8, 12/8)
    Compound,
    /// Half-note beats (2/2, 3/2)
    CutTime,
    /// Mixed sub-beats (5/8 = 3+2, 7/8 = 2+2+3)
    Asymmetric,
}

/// Replace an unusable time signature with common time.
pub fn effective_time_signature(ts: TimeSignature) -> TimeSignature {
    if ts.is_valid() {
        ts
    } else {
        log::debug!(
            "invalid time signature {}/{}, beaming as 4/4",
            ts.numerator, ts.denominator
        );
        TimeSignature::COMMON
    }
}

pub fn classify(ts: TimeSignature) -> MeterClass {
    let ts = effective_time_signature(ts);
    let n = ts.numerator;
    match ts.denominator {
        2 => MeterClass::CutTime,
        1 | 4 => MeterClass::Simple,
        _ if n > 3 && n % 3 == 0 => MeterClass::Compound,
        _ if n >= 5 && n % 2 == 1 => MeterClass::Asymmetric,
        _ => MeterClass::Simple,
    }
}

/// Beat lengths in denominator units, in order, for one measure.
fn beat_units(ts: TimeSignature) -> Vec<u32> {
    let n = ts.numerator as u32;
    match classify(ts) {
        MeterClass::CutTime => vec![1; n as usize],
        MeterClass::Simple if ts.denominator <= 4 => vec![1; n as usize],
        MeterClass::Simple if n <= 3 => vec![n],
        MeterClass::Simple => vec![2; (n / 2) as usize],
        MeterClass::Compound => vec![3; (n / 3) as usize],
        MeterClass::Asymmetric => match n {
            5 => vec![3, 2],
            7 => vec![2, 2, 3],
            _ => {
                let mut units = vec![2; ((n - 3) / 2) as usize];
                units.push(3);
                units
            }
        },
    }
}

/// Tick offsets (from the bar line) at which a new beat starts.
/// Always begins with 0.
pub fn beat_boundaries(ts: TimeSignature) -> Vec<u32> {
    let ts = effective_time_signature(ts);
    let unit = ts.unit_ticks();
    let mut boundaries = Vec::new();
    let mut offset = 0;
    for units in beat_units(ts) {
        boundaries.push(offset);
        offset += units * unit;
    }
    boundaries
}

/// Index of the beat window containing `offset` ticks into the measure.
pub fn beat_index(boundaries: &[u32], offset: u32) -> usize {
    boundaries.iter().rposition(|&b| offset >= b).unwrap_or(0)
}

/// Length of a half bar when the meter allows beaming two beats of
/// plain eighths together (common time only).
pub fn half_bar_ticks(ts: TimeSignature) -> Option<u32> {
    let ts = effective_time_signature(ts);
    (ts.numerator == 4 && ts.denominator == 4).then(|| ts.measure_ticks() / 2)
}

/// One measure resolved from the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasureSpan {
    /// 0-based measure index within the voice
    pub index: usize,
    pub start_tick: u32,
    pub end_tick: u32,
    pub time_signature: TimeSignature,
}

/// Bar-line positions for a voice.
///
/// Explicit bar lines are used where supplied; past the last one (or
/// when none are supplied) measures repeat at the length of the meter in
/// force. When the first explicit bar line is after tick 0, the ticks
/// before it form a pickup measure of their own (index 0), so the first
/// supplied bar line is measure 1.
#[derive(Debug, Clone)]
pub struct MeasureMap {
    measures: Vec<MeasureInfo>,
}

impl MeasureMap {
    pub fn new(measures: &[MeasureInfo], fallback: TimeSignature) -> Self {
        let mut measures: Vec<MeasureInfo> = measures
            .iter()
            .map(|m| MeasureInfo {
                start_tick: m.start_tick,
                time_signature: effective_time_signature(m.time_signature),
            })
            .collect();
        measures.sort_by_key(|m| m.start_tick);
        measures.dedup_by_key(|m| m.start_tick);

        match measures.first().map(|m| (m.start_tick, m.time_signature)) {
            None => measures.push(MeasureInfo {
                start_tick: 0,
                time_signature: effective_time_signature(fallback),
            }),
            Some((first_tick, time_signature)) if first_tick > 0 => {
                log::trace!("pickup measure before first bar line at {first_tick}");
                measures.insert(0, MeasureInfo { start_tick: 0, time_signature });
            }
            Some(_) => {}
        }
        Self { measures }
    }

    /// Uniform measures of one meter starting at tick 0.
    pub fn uniform(ts: TimeSignature) -> Self {
        Self::new(&[], ts)
    }

    pub fn measure_of(&self, tick: u32) -> MeasureSpan {
        // measures[0] always starts at tick 0
        let idx = self
            .measures
            .partition_point(|m| m.start_tick <= tick)
            .saturating_sub(1);
        let current = &self.measures[idx];

        match self.measures.get(idx + 1) {
            Some(next) => MeasureSpan {
                index: idx,
                start_tick: current.start_tick,
                end_tick: next.start_tick,
                time_signature: current.time_signature,
            },
            None => {
                let nominal = current.time_signature.measure_ticks().max(1);
                let past = tick.saturating_sub(current.start_tick) / nominal;
                // past * nominal never exceeds tick - start_tick
                let start_tick = current.start_tick + past * nominal;
                MeasureSpan {
                    index: idx + past as usize,
                    start_tick,
                    end_tick: start_tick.saturating_add(nominal),
                    time_signature: current.time_signature,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn simple_meters_beat_on_quarters() {
        assert_eq!(beat_boundaries(TimeSignature::new(4, 4)), vec![0, 960, 1920, 2880]);
        assert_eq!(beat_boundaries(TimeSignature::new(3, 4)), vec![0, 960, 1920]);
        assert_eq!(classify(TimeSignature::new(2, 4)), MeterClass::Simple);
    }

    #[test]
    fn compound_meters_beat_on_dotted_quarters() {
        assert_eq!(beat_boundaries(TimeSignature::new(6, 8)), vec![0, 1440]);
        assert_eq!(beat_boundaries(TimeSignature::new(9, 8)), vec![0, 1440, 2880]);
        assert_eq!(beat_boundaries(TimeSignature::new(12, 8)), vec![0, 1440, 2880, 4320]);
        assert_eq!(classify(TimeSignature::new(12, 8)), MeterClass::Compound);
    }

    #[test]
    fn cut_time_beats_on_halves() {
        assert_eq!(beat_boundaries(TimeSignature::new(2, 2)), vec![0, 1920]);
        assert_eq!(classify(TimeSignature::new(2, 2)), MeterClass::CutTime);
    }

    #[test]
    fn asymmetric_meters_use_sub_beat_tables() {
        assert_eq!(beat_boundaries(TimeSignature::new(5, 8)), vec![0, 1440]);
        assert_eq!(beat_boundaries(TimeSignature::new(7, 8)), vec![0, 960, 1920]);
        assert_eq!(beat_boundaries(TimeSignature::new(11, 8)), vec![0, 960, 1920, 2880]);
        assert_eq!(classify(TimeSignature::new(7, 8)), MeterClass::Asymmetric);
    }

    #[test]
    fn invalid_meter_defaults_to_common_time() {
        assert_eq!(beat_boundaries(TimeSignature::new(0, 4)), vec![0, 960, 1920, 2880]);
        assert_eq!(beat_boundaries(TimeSignature::new(3, 7)), vec![0, 960, 1920, 2880]);
    }

    #[test]
    fn beat_index_finds_window() {
        let b = beat_boundaries(TimeSignature::new(6, 8));
        assert_eq!(beat_index(&b, 0), 0);
        assert_eq!(beat_index(&b, 1439), 0);
        assert_eq!(beat_index(&b, 1440), 1);
    }

    #[test]
    fn half_bar_only_in_common_time() {
        assert_eq!(half_bar_ticks(TimeSignature::new(4, 4)), Some(1920));
        assert_eq!(half_bar_ticks(TimeSignature::new(3, 4)), None);
        assert_eq!(half_bar_ticks(TimeSignature::new(2, 2)), None);
    }

    #[test]
    fn uniform_map_repeats_measures() {
        let map = MeasureMap::uniform(TimeSignature::new(4, 4));
        let m = map.measure_of(4000);
        assert_eq!((m.index, m.start_tick, m.end_tick), (1, 3840, 7680));
    }

    #[test]
    fn explicit_map_handles_meter_change() {
        let map = MeasureMap::new(
            &[
                MeasureInfo { start_tick: 0, time_signature: TimeSignature::new(2, 4) },
                MeasureInfo { start_tick: 960, time_signature: TimeSignature::new(2, 4) },
                MeasureInfo { start_tick: 2880, time_signature: TimeSignature::new(6, 8) },
            ],
            TimeSignature::COMMON,
        );
        assert_eq!(map.measure_of(500).index, 0);
        assert_eq!(map.measure_of(960).end_tick, 2880);
        let late = map.measure_of(2880 + 2880 + 10);
        assert_eq!((late.index, late.start_tick), (3, 5760));
        assert_eq!(late.time_signature, TimeSignature::new(6, 8));
    }

    #[test]
    fn ticks_before_first_bar_line_form_a_pickup_measure() {
        let map = MeasureMap::new(
            &[MeasureInfo { start_tick: 960, time_signature: TimeSignature::new(3, 4) }],
            TimeSignature::COMMON,
        );
        let pickup = map.measure_of(480);
        assert_eq!((pickup.index, pickup.start_tick, pickup.end_tick), (0, 0, 960));
        assert_eq!(pickup.time_signature, TimeSignature::new(3, 4));

        let first = map.measure_of(960);
        assert_eq!((first.index, first.start_tick, first.end_tick), (1, 960, 3840));
        assert_eq!(map.measure_of(3840).index, 2);
    }

    #[test]
    fn last_measure_end_saturates_at_tick_limit() {
        let map = MeasureMap::uniform(TimeSignature::new(4, 4));
        for tick in [u32::MAX - 100, u32::MAX - 70, u32::MAX] {
            let span = map.measure_of(tick);
            assert!(span.start_tick <= tick, "tick {tick}");
            assert_eq!(span.end_tick, u32::MAX);
        }
    }

    #[test]
    fn beat_units_follow_meter_class() {
        assert_eq!(beat_units(TimeSignature::new(3, 2)), vec![1, 1, 1]);
        assert_eq!(beat_units(TimeSignature::new(4, 8)), vec![2, 2]);
        assert_eq!(beat_units(TimeSignature::new(3, 8)), vec![3]);
        assert_eq!(beat_units(TimeSignature::new(11, 16)), vec![2, 2, 2, 2, 3]);
    }
}
