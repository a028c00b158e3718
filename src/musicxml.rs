//! MusicXML adapter: extracts per-voice note streams for the layout core.
//!
//! Only the content beaming needs is read: pitches, rests, durations,
//! voices and staves, `<beam>` annotations, time signatures, clefs and
//! measure boundaries. A `<clef>` in a later `<attributes>` block becomes
//! a clef change on each voice of that staff, starting at the voice's
//! next note. Durations are rescaled from the document's
//! `<divisions>` to 960 ticks per quarter.

use std::collections::{BTreeMap, HashMap};

use roxmltree::{Document, Node};

use crate::error::BeamError;
use crate::hints::{extract_hints, RawBeam};
use crate::meter::effective_time_signature;
use crate::model::{Clef, MeasureInfo, NoteEvent, TimeSignature, VoiceInput, TICKS_PER_QUARTER};

/// Parse a `score-partwise` document into one `VoiceInput` per
/// (part, staff, voice), in document order of parts and ascending
/// staff/voice numbers within a part.
pub fn voices_from_musicxml(xml: &str) -> Result<Vec<VoiceInput>, BeamError> {
    // MusicXML files include a DOCTYPE declaration, so we must allow DTDs
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let doc = Document::parse_with_options(xml, options)?;
    let root = doc.root_element();

    if root.tag_name().name() != "score-partwise" {
        return Err(BeamError::UnsupportedRoot(root.tag_name().name().to_string()));
    }

    let mut voices = Vec::new();
    for part in root.children().filter(|n| n.is_element() && n.tag_name().name() == "part") {
        voices.extend(parse_part(&part));
    }
    Ok(voices)
}

// ─── Part ────────────────────────────────────────────────────────────

/// Running state while walking one part's measures.
struct PartCursor {
    divisions: u32,
    time_signature: TimeSignature,
    clefs: HashMap<u32, Clef>,
    measure_start: u32,
    /// Position inside the current measure, in 960 PPQ ticks
    offset: u32,
    /// Furthest position reached inside the current measure
    furthest: u32,
}

impl PartCursor {
    fn to_ticks(&self, duration: u32) -> u32 {
        let ticks = duration as u64 * TICKS_PER_QUARTER as u64 / self.divisions.max(1) as u64;
        u32::try_from(ticks).unwrap_or(u32::MAX)
    }

    fn advance(&mut self, ticks: u32) {
        self.offset = self.offset.saturating_add(ticks);
        self.furthest = self.furthest.max(self.offset);
    }
}

fn parse_part(node: &Node) -> Vec<VoiceInput> {
    let part_id = node.attribute("id").unwrap_or("").to_string();
    let mut cursor = PartCursor {
        divisions: 1,
        time_signature: TimeSignature::COMMON,
        clefs: HashMap::new(),
        measure_start: 0,
        offset: 0,
        furthest: 0,
    };
    let mut measures: Vec<MeasureInfo> = Vec::new();
    let mut voices: BTreeMap<(u32, u32), VoiceInput> = BTreeMap::new();

    for measure in node.children().filter(|n| n.is_element() && n.tag_name().name() == "measure") {
        cursor.offset = 0;
        cursor.furthest = 0;
        measures.push(MeasureInfo {
            start_tick: cursor.measure_start,
            time_signature: cursor.time_signature,
        });

        for child in measure.children().filter(|n| n.is_element()) {
            match child.tag_name().name() {
                "attributes" => {
                    parse_attributes(&child, &mut cursor);
                    if let Some(current) = measures.last_mut() {
                        current.time_signature = cursor.time_signature;
                    }
                }
                "note" => parse_note(&child, &mut cursor, &part_id, &mut voices),
                "backup" => {
                    let ticks = cursor.to_ticks(child_u32(&child, "duration").unwrap_or(0));
                    cursor.offset = cursor.offset.saturating_sub(ticks);
                }
                "forward" => {
                    let ticks = cursor.to_ticks(child_u32(&child, "duration").unwrap_or(0));
                    cursor.advance(ticks);
                }
                _ => {}
            }
        }

        // Empty measures still occupy a full bar
        let length = if cursor.furthest > 0 {
            cursor.furthest
        } else {
            effective_time_signature(cursor.time_signature).measure_ticks()
        };
        cursor.measure_start = cursor.measure_start.saturating_add(length);
    }

    let time_signature = measures.first().map_or(TimeSignature::COMMON, |m| m.time_signature);
    voices
        .into_values()
        .map(|mut voice| {
            voice.time_signature = time_signature;
            voice.measures = measures.clone();
            voice
        })
        .collect()
}

// ─── Attributes ──────────────────────────────────────────────────────

fn parse_attributes(node: &Node, cursor: &mut PartCursor) {
    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "divisions" => {
                if let Some(d) = parse_u32(&child).filter(|&d| d > 0) {
                    cursor.divisions = d;
                }
            }
            "time" => cursor.time_signature = parse_time(&child),
            "clef" => {
                let number = child
                    .attribute("number")
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(1);
                cursor.clefs.insert(number, parse_clef(&child));
            }
            _ => {}
        }
    }
}

fn parse_time(node: &Node) -> TimeSignature {
    let beats = child_u32(node, "beats").unwrap_or(4);
    let beat_type = child_u32(node, "beat-type").unwrap_or(4);
    // Out-of-range values become invalid signatures, which the meter
    // tables replace with common time.
    TimeSignature::new(
        u8::try_from(beats).unwrap_or(0),
        u8::try_from(beat_type).unwrap_or(0),
    )
}

fn parse_clef(node: &Node) -> Clef {
    let sign = child_text(node, "sign").unwrap_or("G");
    let line = child_u32(node, "line");
    match (sign, line) {
        ("F", _) => Clef::Bass,
        ("C", Some(4)) => Clef::Tenor,
        ("C", _) => Clef::Alto,
        _ => Clef::Treble,
    }
}

// ─── Note ────────────────────────────────────────────────────────────

fn parse_note(
    node: &Node,
    cursor: &mut PartCursor,
    part_id: &str,
    voices: &mut BTreeMap<(u32, u32), VoiceInput>,
) {
    let mut pitch = None;
    let mut rest = false;
    let mut chord = false;
    let mut grace = false;
    let mut duration = 0;
    let mut voice = 1;
    let mut staff = 1;
    let mut beams: Vec<RawBeam> = Vec::new();

    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "pitch" => pitch = parse_pitch(&child),
            "rest" => rest = true,
            "chord" => chord = true,
            "grace" => grace = true,
            "duration" => duration = parse_u32(&child).unwrap_or(0),
            "voice" => voice = parse_u32(&child).unwrap_or(1),
            "staff" => staff = parse_u32(&child).unwrap_or(1),
            "beam" => {
                let number = child
                    .attribute("number")
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(1);
                beams.push(RawBeam::new(number, child.text().unwrap_or("")));
            }
            _ => {}
        }
    }

    if grace {
        log::debug!("skipping grace note in part {part_id}");
        return;
    }
    if chord {
        // The first chord member already represents the stem
        return;
    }

    let ticks = cursor.to_ticks(duration);
    let start_tick = cursor.measure_start.saturating_add(cursor.offset);
    cursor.advance(ticks);

    if pitch.is_none() && !rest {
        log::debug!("unpitched note at tick {start_tick} in part {part_id} treated as a rest");
    }
    let event = match pitch {
        Some(p) if !rest => NoteEvent::note(p, start_tick, ticks).with_hints(extract_hints(&beams)),
        _ => NoteEvent::rest(start_tick, ticks),
    };

    let clef = cursor.clefs.get(&staff).copied().unwrap_or_default();
    let entry = voices.entry((staff, voice)).or_insert_with(|| VoiceInput {
        part_id: part_id.to_string(),
        staff,
        voice,
        clef,
        clef_changes: Vec::new(),
        time_signature: cursor.time_signature,
        measures: Vec::new(),
        notes: Vec::new(),
    });
    if entry.clef_at(start_tick) != clef {
        log::trace!("clef change to {clef:?} at tick {start_tick} on staff {staff}");
        entry.set_clef_at(start_tick, clef);
    }
    entry.notes.push(event);
}

/// MIDI number of a `<pitch>` element; `None` for an unknown step or a
/// result outside 0..=127.
fn parse_pitch(node: &Node) -> Option<u8> {
    let step = match child_text(node, "step")? {
        "C" => 0,
        "D" => 2,
        "E" => 4,
        "F" => 5,
        "G" => 7,
        "A" => 9,
        "B" => 11,
        _ => return None,
    };
    let octave: i32 = child_text(node, "octave")?.parse().ok()?;
    let alter = child_text(node, "alter")
        .and_then(|a| a.parse::<f64>().ok())
        .map_or(0, |a| a.round() as i32);
    u8::try_from((octave + 1) * 12 + step + alter).ok().filter(|&p| p <= 127)
}

// ─── Helpers ─────────────────────────────────────────────────────────

fn parse_u32(node: &Node) -> Option<u32> {
    node.text()?.trim().parse().ok()
}

fn child_text<'a>(node: &Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)?
        .text()
        .map(str::trim)
}

fn child_u32(node: &Node, name: &str) -> Option<u32> {
    child_text(node, name)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BeamHint, BeamKind, ClefChange};
    use pretty_assertions::assert_eq;

    fn wrap(measures: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE score-partwise PUBLIC "-//Recordare//DTD MusicXML 4.0 Partwise//EN" "http://www.musicxml.org/dtds/partwise.dtd">
<score-partwise version="4.0">
  <part-list><score-part id="P1"><part-name>Piano</part-name></score-part></part-list>
  <part id="P1">{measures}</part>
</score-partwise>"#
        )
    }

    #[test]
    fn reads_notes_hints_and_meter() {
        let xml = wrap(
            r#"<measure number="1">
              <attributes><divisions>2</divisions><time><beats>6</beats><beat-type>8</beat-type></time>
                <clef><sign>G</sign><line>2</line></clef></attributes>
              <note><pitch><step>C</step><octave>5</octave></pitch><duration>1</duration><voice>1</voice><beam number="1">begin</beam></note>
              <note><pitch><step>F</step><alter>1</alter><octave>4</octave></pitch><duration>1</duration><voice>1</voice><beam number="1">continue</beam><beam number="9">begin</beam></note>
              <note><pitch><step>A</step><octave>4</octave></pitch><duration>1</duration><voice>1</voice><beam number="1">end</beam></note>
              <note><rest/><duration>3</duration><voice>1</voice></note>
            </measure>"#,
        );
        let voices = voices_from_musicxml(&xml).unwrap();
        assert_eq!(voices.len(), 1);
        let v = &voices[0];
        assert_eq!(v.part_id, "P1");
        assert_eq!(v.time_signature, TimeSignature::new(6, 8));
        let pitches: Vec<Option<u8>> = v.notes.iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![Some(72), Some(66), Some(69), None]);
        let ticks: Vec<(u32, u32)> = v.notes.iter().map(|n| (n.start_tick, n.duration_ticks)).collect();
        assert_eq!(ticks, vec![(0, 480), (480, 480), (960, 480), (1440, 1440)]);
        assert_eq!(v.notes[1].hints, vec![BeamHint::new(1, BeamKind::Continue)]);
    }

    #[test]
    fn separates_voices_and_staves_with_backup() {
        let xml = wrap(
            r#"<measure number="1">
              <attributes><divisions>1</divisions><staves>2</staves>
                <clef number="1"><sign>G</sign><line>2</line></clef>
                <clef number="2"><sign>F</sign><line>4</line></clef></attributes>
              <note><pitch><step>E</step><octave>5</octave></pitch><duration>4</duration><voice>1</voice><staff>1</staff></note>
              <note><chord/><pitch><step>G</step><octave>5</octave></pitch><duration>4</duration><voice>1</voice><staff>1</staff></note>
              <backup><duration>4</duration></backup>
              <note><grace/><pitch><step>D</step><octave>3</octave></pitch><voice>5</voice><staff>2</staff></note>
              <note><pitch><step>C</step><octave>3</octave></pitch><duration>4</duration><voice>5</voice><staff>2</staff></note>
            </measure>
            <measure number="2">
              <note><pitch><step>C</step><octave>3</octave></pitch><duration>4</duration><voice>5</voice><staff>2</staff></note>
            </measure>"#,
        );
        let voices = voices_from_musicxml(&xml).unwrap();
        assert_eq!(voices.len(), 2);
        assert_eq!((voices[0].staff, voices[0].voice, voices[0].clef), (1, 1, Clef::Treble));
        assert_eq!(voices[0].notes.len(), 1);
        assert_eq!((voices[1].staff, voices[1].voice, voices[1].clef), (2, 5, Clef::Bass));
        let starts: Vec<u32> = voices[1].notes.iter().map(|n| n.start_tick).collect();
        assert_eq!(starts, vec![0, 3840]);
        let bar_lines: Vec<u32> = voices[1].measures.iter().map(|m| m.start_tick).collect();
        assert_eq!(bar_lines, vec![0, 3840]);
    }

    #[test]
    fn later_clef_becomes_a_clef_change() {
        let xml = wrap(
            r#"<measure number="1">
              <attributes><divisions>1</divisions><clef><sign>G</sign><line>2</line></clef></attributes>
              <note><pitch><step>C</step><octave>4</octave></pitch><duration>4</duration></note>
            </measure>
            <measure number="2">
              <attributes><clef><sign>F</sign><line>4</line></clef></attributes>
              <note><pitch><step>C</step><octave>4</octave></pitch><duration>4</duration></note>
            </measure>"#,
        );
        let voices = voices_from_musicxml(&xml).unwrap();
        let v = &voices[0];
        assert_eq!(v.clef, Clef::Treble);
        assert_eq!(v.clef_changes, vec![ClefChange { tick: 3840, clef: Clef::Bass }]);
        assert_eq!(v.clef_at(0), Clef::Treble);
        assert_eq!(v.clef_at(3840), Clef::Bass);
    }

    #[test]
    fn pickup_measure_uses_its_actual_length() {
        let xml = wrap(
            r#"<measure number="0" implicit="yes">
              <attributes><divisions>2</divisions><time><beats>3</beats><beat-type>4</beat-type></time></attributes>
              <note><pitch><step>G</step><octave>4</octave></pitch><duration>2</duration></note>
            </measure>
            <measure number="1">
              <note><pitch><step>C</step><octave>5</octave></pitch><duration>6</duration></note>
            </measure>"#,
        );
        let voices = voices_from_musicxml(&xml).unwrap();
        let bar_lines: Vec<u32> = voices[0].measures.iter().map(|m| m.start_tick).collect();
        assert_eq!(bar_lines, vec![0, 960]);
        assert_eq!(voices[0].notes[1].start_tick, 960);
    }

    #[test]
    fn rejects_other_roots_and_bad_xml() {
        assert!(matches!(
            voices_from_musicxml("<score-timewise/>"),
            Err(BeamError::UnsupportedRoot(root)) if root == "score-timewise"
        ));
        assert!(matches!(voices_from_musicxml("<score-partwise>"), Err(BeamError::Xml(_))));
    }
}
