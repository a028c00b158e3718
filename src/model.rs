//! Input data model for beam layout.
//!
//! These structures describe one staff/voice worth of timed notes as
//! delivered by the note-extraction stage: pitch, onset and length in
//! ticks (960 per quarter note), plus optional beaming hints.

use serde::{Deserialize, Serialize};

/// Pulses (ticks) per quarter note.
pub const TICKS_PER_QUARTER: u32 = 960;

/// Longest duration that can be beamed (an eighth note).
pub const MAX_BEAMED_DURATION: u32 = 480;

/// Highest beam level a hint may address (MusicXML allows 1–8).
pub const MAX_BEAM_LEVEL: u8 = 8;

/// Beam state of a note at one beam level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeamKind {
    Begin,
    Continue,
    End,
    ForwardHook,
    BackwardHook,
}

impl BeamKind {
    /// True for partial beams that attach to a single note.
    pub fn is_hook(self) -> bool {
        matches!(self, BeamKind::ForwardHook | BeamKind::BackwardHook)
    }
}

/// A normalized beaming hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeamHint {
    /// Beam level (1 = eighth-note beam, 2 = sixteenth-note beam, ...)
    pub level: u8,
    /// Beam state at this level
    pub kind: BeamKind,
}

impl BeamHint {
    pub fn new(level: u8, kind: BeamKind) -> Self {
        Self { level, kind }
    }
}

/// A single note or rest in a voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// MIDI pitch (None if this is a rest)
    pub pitch: Option<u8>,
    /// Onset in ticks from the start of the voice
    pub start_tick: u32,
    /// Length in ticks
    pub duration_ticks: u32,
    /// Beaming hints, at most one per level
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<BeamHint>,
}

impl NoteEvent {
    /// Create a pitched note without hints.
    pub fn note(pitch: u8, start_tick: u32, duration_ticks: u32) -> Self {
        Self {
            pitch: Some(pitch),
            start_tick,
            duration_ticks,
            hints: Vec::new(),
        }
    }

    /// Create a rest.
    pub fn rest(start_tick: u32, duration_ticks: u32) -> Self {
        Self {
            pitch: None,
            start_tick,
            duration_ticks,
            hints: Vec::new(),
        }
    }

    /// Attach beaming hints (builder pattern).
    pub fn with_hints(mut self, hints: Vec<BeamHint>) -> Self {
        self.hints = hints;
        self
    }

    pub fn is_rest(&self) -> bool {
        self.pitch.is_none()
    }

    pub fn end_tick(&self) -> u32 {
        self.start_tick.saturating_add(self.duration_ticks)
    }

    /// Pitched, non-zero and no longer than an eighth note.
    pub fn is_beamable(&self) -> bool {
        !self.is_rest() && self.duration_ticks > 0 && self.duration_ticks <= MAX_BEAMED_DURATION
    }

    /// Hint kind at a given level, if any. The first hint wins when a
    /// level is annotated twice.
    pub fn hint_at(&self, level: u8) -> Option<BeamKind> {
        self.hints.iter().find(|h| h.level == level).map(|h| h.kind)
    }
}

/// Time signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    /// Numerator (e.g., 3 in 3/4)
    pub numerator: u8,
    /// Denominator (e.g., 4 in 3/4)
    pub denominator: u8,
}

impl TimeSignature {
    pub const COMMON: TimeSignature = TimeSignature { numerator: 4, denominator: 4 };

    pub fn new(numerator: u8, denominator: u8) -> Self {
        Self { numerator, denominator }
    }

    /// A usable meter has a positive numerator and a power-of-two
    /// denominator no finer than a 64th.
    pub fn is_valid(&self) -> bool {
        self.numerator > 0 && self.denominator.is_power_of_two() && self.denominator <= 64
    }

    /// Ticks in one denominator unit (quarter = 960, eighth = 480, ...).
    pub fn unit_ticks(&self) -> u32 {
        TICKS_PER_QUARTER * 4 / self.denominator.max(1) as u32
    }

    /// Nominal measure length in ticks.
    pub fn measure_ticks(&self) -> u32 {
        self.numerator as u32 * self.unit_ticks()
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::COMMON
    }
}

/// Clef of the staff a voice is written on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Clef {
    #[default]
    Treble,
    Bass,
    Alto,
    Tenor,
}

/// Start of a measure (bar line position) and the meter in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureInfo {
    /// Tick of the bar line that opens the measure
    pub start_tick: u32,
    /// Active time signature
    pub time_signature: TimeSignature,
}

/// A clef that takes effect from `tick` onward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClefChange {
    pub tick: u32,
    pub clef: Clef,
}

/// Everything the layout needs for one staff/voice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceInput {
    /// Part identifier (e.g., "P1")
    #[serde(default)]
    pub part_id: String,
    /// Staff number (1-based)
    #[serde(default = "default_number")]
    pub staff: u32,
    /// Voice number (1-based)
    #[serde(default = "default_number")]
    pub voice: u32,
    /// Clef in force at the start of the voice
    #[serde(default)]
    pub clef: Clef,
    /// Later clef changes, ordered by tick
    #[serde(default)]
    pub clef_changes: Vec<ClefChange>,
    /// Meter used when `measures` is empty
    #[serde(default)]
    pub time_signature: TimeSignature,
    /// Explicit bar lines, ordered by tick (may be empty)
    #[serde(default)]
    pub measures: Vec<MeasureInfo>,
    /// Notes and rests ordered by start tick
    pub notes: Vec<NoteEvent>,
}

fn default_number() -> u32 {
    1
}

impl VoiceInput {
    /// A single-voice input in treble clef with uniform measures.
    pub fn new(notes: Vec<NoteEvent>, time_signature: TimeSignature) -> Self {
        Self {
            part_id: String::new(),
            staff: 1,
            voice: 1,
            clef: Clef::Treble,
            clef_changes: Vec::new(),
            time_signature,
            measures: Vec::new(),
            notes,
        }
    }

    pub fn with_clef(mut self, clef: Clef) -> Self {
        self.clef = clef;
        self
    }

    pub fn with_measures(mut self, measures: Vec<MeasureInfo>) -> Self {
        self.measures = measures;
        self
    }

    /// Switch to `clef` from `tick` onward.
    pub fn with_clef_change(mut self, tick: u32, clef: Clef) -> Self {
        self.set_clef_at(tick, clef);
        self
    }

    /// Record a clef change, keeping `clef_changes` ordered. A second
    /// change at the same tick replaces the first.
    pub fn set_clef_at(&mut self, tick: u32, clef: Clef) {
        let pos = self.clef_changes.partition_point(|c| c.tick < tick);
        match self.clef_changes.get_mut(pos) {
            Some(change) if change.tick == tick => change.clef = clef,
            _ => self.clef_changes.insert(pos, ClefChange { tick, clef }),
        }
    }

    /// Clef in force at `tick`.
    pub fn clef_at(&self, tick: u32) -> Clef {
        let pos = self.clef_changes.partition_point(|c| c.tick <= tick);
        match pos.checked_sub(1) {
            Some(last) => self.clef_changes[last].clef,
            None => self.clef,
        }
    }
}
