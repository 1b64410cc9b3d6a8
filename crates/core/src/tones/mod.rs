use serde::{Deserialize, Serialize};

use crate::{Result, ToneMemoryError};

/// Frequency of the reference tone `A` (A3) in hertz.
pub const REFERENCE_FREQUENCY_HZ: f32 = 220.0;

/// Number of tones in the chromatic catalog.
pub const CATALOG_LEN: usize = 12;

/// A named pitch at a fixed distance, in semitones, above the reference tone.
///
/// The offset is the tone's position in [`CHROMATIC_TONES`], never its
/// position within the active subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Tone {
    pub name: &'static str,
    pub semitone_offset: u8,
}

impl Tone {
    const fn new(name: &'static str, semitone_offset: u8) -> Self {
        Self {
            name,
            semitone_offset,
        }
    }

    /// Equal-tempered frequency relative to [`REFERENCE_FREQUENCY_HZ`].
    pub fn frequency_hz(&self) -> f32 {
        self.frequency_with_reference(REFERENCE_FREQUENCY_HZ)
    }

    /// Equal-tempered frequency relative to an arbitrary reference pitch.
    pub fn frequency_with_reference(&self, reference_hz: f32) -> f32 {
        reference_hz * 2f32.powf(f32::from(self.semitone_offset) / 12.0)
    }
}

/// The twelve chromatic tones starting at the reference tone.
pub const CHROMATIC_TONES: [Tone; CATALOG_LEN] = [
    Tone::new("A", 0),
    Tone::new("A#/Bb", 1),
    Tone::new("B", 2),
    Tone::new("C", 3),
    Tone::new("C#/Db", 4),
    Tone::new("D", 5),
    Tone::new("D#/Eb", 6),
    Tone::new("E", 7),
    Tone::new("F", 8),
    Tone::new("F#/Gb", 9),
    Tone::new("G", 10),
    Tone::new("G#/Ab", 11),
];

/// Looks a tone up by its catalog name.
pub fn find(name: &str) -> Option<Tone> {
    CHROMATIC_TONES.iter().copied().find(|tone| tone.name == name)
}

/// Like [`find`] but reports unknown names as an error.
pub fn lookup(name: &str) -> Result<Tone> {
    find(name).ok_or_else(|| ToneMemoryError::UnknownTone(name.to_string()))
}

// Tones are `&'static` catalog entries, so deserialising goes through the
// name and resolves back into the catalog.
impl<'de> Deserialize<'de> for Tone {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            name: String,
        }

        let raw = Raw::deserialize(deserializer)?;
        find(&raw.name).ok_or_else(|| {
            serde::de::Error::custom(format!("unknown tone `{}`", raw.name))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_tone_is_exactly_220_hz() {
        let a = lookup("A").unwrap();
        assert_eq!(a.semitone_offset, 0);
        assert_eq!(a.frequency_hz(), 220.0);
    }

    #[test]
    fn twelve_semitones_is_one_octave() {
        let octave = Tone::new("A", 12);
        assert!((octave.frequency_hz() - 440.0).abs() < 1e-3);
    }

    #[test]
    fn offsets_follow_catalog_order() {
        for (i, tone) in CHROMATIC_TONES.iter().enumerate() {
            assert_eq!(usize::from(tone.semitone_offset), i);
        }
        let e = lookup("E").unwrap();
        // Perfect fifth above A3.
        assert!((e.frequency_hz() - 329.627_56).abs() < 1e-2);
    }

    #[test]
    fn custom_reference_scales_linearly() {
        let c = lookup("C").unwrap();
        let ratio = c.frequency_with_reference(440.0) / c.frequency_hz();
        assert!((ratio - 2.0).abs() < 1e-5);
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!(find("H").is_none());
        let err = lookup("H").unwrap_err();
        assert!(format!("{err}").contains('H'));
    }

    #[test]
    fn deserialises_back_into_catalog_entry() {
        let tone: Tone = serde_json::from_str(r#"{"name":"F#/Gb","semitone_offset":9}"#).unwrap();
        assert_eq!(tone, CHROMATIC_TONES[9]);
        assert!(serde_json::from_str::<Tone>(r#"{"name":"X"}"#).is_err());
    }
}
