//! Vertical placement of noteheads on a five-line staff.

use crate::model::Clef;

/// Diatonic position (C = 0 ... B = 6) of each chromatic pitch class.
/// Altered pitches sit on the line or space of their natural.
const DIATONIC_POSITIONS: [i32; 12] = [0, 0, 1, 1, 2, 3, 3, 4, 4, 5, 5, 6];

/// Diatonic steps counted from MIDI 0, so MIDI 60 (C4) is 5 * 7.
fn diatonic_steps(pitch: u8) -> i32 {
    let octave = (pitch / 12) as i32;
    octave * 7 + DIATONIC_POSITIONS[(pitch % 12) as usize]
}

/// Diatonic step of the pitch on the top staff line for a clef.
fn top_line_steps(clef: Clef) -> i32 {
    match clef {
        Clef::Treble => 6 * 7 + 3, // F5
        Clef::Bass => 4 * 7 + 5,   // A3
        Clef::Alto => 5 * 7 + 4,   // G4
        Clef::Tenor => 5 * 7 + 2,  // E4
    }
}

/// Notehead centre y for a MIDI pitch (positive y points down).
pub(super) fn pitch_to_y(pitch: u8, clef: Clef, staff_top_y: f64, units_per_space: f64) -> f64 {
    let steps_below_top = top_line_steps(clef) - diatonic_steps(pitch);
    staff_top_y + steps_below_top as f64 * (units_per_space / 2.0)
}

pub(super) fn middle_line_y(staff_top_y: f64, units_per_space: f64) -> f64 {
    staff_top_y + 2.0 * units_per_space
}

/// True when the notehead needs at least one ledger line.
pub(super) fn is_ledger_note(notehead_y: f64, staff_top_y: f64, units_per_space: f64) -> bool {
    let tolerance = units_per_space * 0.75;
    let bottom = staff_top_y + 4.0 * units_per_space;
    notehead_y < staff_top_y - tolerance || notehead_y > bottom + tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn treble_reference_pitches() {
        assert_eq!(pitch_to_y(77, Clef::Treble, 0.0, 20.0), 0.0); // F5 top line
        assert_eq!(pitch_to_y(71, Clef::Treble, 0.0, 20.0), 40.0); // B4 middle line
        assert_eq!(pitch_to_y(64, Clef::Treble, 0.0, 20.0), 80.0); // E4 bottom line
        assert_eq!(pitch_to_y(60, Clef::Treble, 0.0, 20.0), 100.0); // C4 first ledger
    }

    #[test]
    fn other_clefs_and_accidentals() {
        assert_eq!(pitch_to_y(50, Clef::Bass, 0.0, 20.0), 40.0); // D3 middle line
        assert_eq!(pitch_to_y(60, Clef::Alto, 0.0, 20.0), 40.0); // C4 middle line
        assert_eq!(pitch_to_y(57, Clef::Tenor, 0.0, 20.0), 40.0); // A3 middle line
        assert_eq!(pitch_to_y(61, Clef::Treble, 0.0, 20.0), pitch_to_y(60, Clef::Treble, 0.0, 20.0));
    }

    #[test]
    fn ledger_detection() {
        assert!(!is_ledger_note(-10.0, 0.0, 20.0)); // G5 above the staff, no ledger
        assert!(is_ledger_note(-20.0, 0.0, 20.0)); // A5
        assert!(!is_ledger_note(90.0, 0.0, 20.0)); // D4 below the staff
        assert!(is_ledger_note(100.0, 0.0, 20.0)); // C4
    }
}
