//! Shared geometry constants (layout units at 20 units per staff space).
//!
//! Every length here is scaled by `LayoutConfig::scale()` before use so
//! that a different staff size keeps the same proportions.

/// Staff space the constants below are expressed against.
pub(super) const REFERENCE_UNITS_PER_SPACE: f64 = 20.0;

// ── Stems ───────────────────────────────────────────────────────────
pub(super) const STEM_LENGTH: f64 = 35.0; // 3.5 spaces, unbeamed default
pub(super) const MIN_BEAMED_STEM_LENGTH: f64 = 50.0; // 2.5 spaces
pub(super) const MIN_LEDGER_STEM_LENGTH: f64 = 60.0; // 3 spaces
pub(super) const STEM_THICKNESS: f64 = 1.5;
pub(super) const NOTEHEAD_HALF_WIDTH: f64 = 11.8; // centre to edge of noteheadBlack

// ── Beams ───────────────────────────────────────────────────────────
pub(super) const BEAM_THICKNESS: f64 = 10.0; // 0.5 spaces
pub(super) const INTER_BEAM_GAP: f64 = 5.0; // 0.25 spaces
pub(super) const BEAM_HOOK_LENGTH: f64 = 15.0;
pub(super) const MAX_SLOPE_SPACES_PER_STEP: f64 = 0.5;

// ── Glyphs (SMuFL) ──────────────────────────────────────────────────
pub(super) const NOTEHEAD_BLACK: char = '\u{E0A4}';
pub(super) const NOTE_WHOLE: char = '\u{E1D2}';
pub(super) const NOTE_HALF_UP: char = '\u{E1D3}';
pub(super) const NOTE_HALF_DOWN: char = '\u{E1D4}';
pub(super) const NOTE_QUARTER_UP: char = '\u{E1D5}';
pub(super) const NOTE_QUARTER_DOWN: char = '\u{E1D6}';
pub(super) const NOTE_8TH_UP: char = '\u{E1D7}';
pub(super) const NOTE_8TH_DOWN: char = '\u{E1D8}';
pub(super) const NOTE_16TH_UP: char = '\u{E1D9}';
pub(super) const NOTE_16TH_DOWN: char = '\u{E1DA}';
pub(super) const NOTE_32ND_UP: char = '\u{E1DB}';
pub(super) const NOTE_32ND_DOWN: char = '\u{E1DC}';
pub(super) const NOTE_64TH_UP: char = '\u{E1DD}';
pub(super) const NOTE_64TH_DOWN: char = '\u{E1DE}';
pub(super) const NOTE_128TH_UP: char = '\u{E1DF}';
pub(super) const NOTE_128TH_DOWN: char = '\u{E1E0}';
