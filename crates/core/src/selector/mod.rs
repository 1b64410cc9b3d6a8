use serde::{Deserialize, Serialize};

use crate::{
    tones::{self, Tone, CHROMATIC_TONES},
    Result, ToneMemoryError,
};

/// Result of a tone toggle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToggleOutcome {
    Enabled,
    Disabled,
    /// Turning the tone off would leave no tone enabled.
    RejectedLastTone,
    /// Tones cannot change while a game is in progress.
    RejectedWhileRunning,
}

impl ToggleOutcome {
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Enabled | Self::Disabled)
    }
}

/// The set of tones enabled for the next session, kept in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToneSelector {
    enabled: Vec<Tone>,
}

impl Default for ToneSelector {
    fn default() -> Self {
        Self {
            enabled: CHROMATIC_TONES.to_vec(),
        }
    }
}

impl ToneSelector {
    /// Builds a selector from tone names. The set must be non-empty and free
    /// of duplicates.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut enabled: Vec<Tone> = Vec::with_capacity(names.len());
        for name in names {
            let tone = tones::lookup(name.as_ref())?;
            if enabled.contains(&tone) {
                return Err(ToneMemoryError::DuplicateTone(tone.name.to_string()));
            }
            enabled.push(tone);
        }
        if enabled.is_empty() {
            return Err(ToneMemoryError::Configuration { pair_count: 0 });
        }
        enabled.sort_by_key(|tone| tone.semitone_offset);
        Ok(Self { enabled })
    }

    pub fn enabled(&self) -> &[Tone] {
        &self.enabled
    }

    pub fn len(&self) -> usize {
        self.enabled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.iter().any(|tone| tone.name == name)
    }

    /// Flips membership of `name`. Disabling the only enabled tone is
    /// rejected and leaves the set unchanged.
    pub fn toggle(&mut self, name: &str) -> Result<ToggleOutcome> {
        let tone = tones::lookup(name)?;
        match self.enabled.iter().position(|t| *t == tone) {
            Some(_) if self.enabled.len() == 1 => Ok(ToggleOutcome::RejectedLastTone),
            Some(position) => {
                self.enabled.remove(position);
                Ok(ToggleOutcome::Disabled)
            }
            None => {
                let position = self
                    .enabled
                    .partition_point(|t| t.semitone_offset < tone.semitone_offset);
                self.enabled.insert(position, tone);
                Ok(ToggleOutcome::Enabled)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(selector: &ToneSelector) -> Vec<&'static str> {
        selector.enabled().iter().map(|tone| tone.name).collect()
    }

    #[test]
    fn defaults_to_full_catalog() {
        assert_eq!(ToneSelector::default().len(), 12);
    }

    #[test]
    fn toggling_keeps_catalog_order() {
        let mut selector = ToneSelector::from_names(&["G", "A"]).unwrap();
        assert_eq!(names(&selector), vec!["A", "G"]);

        assert_eq!(selector.toggle("C").unwrap(), ToggleOutcome::Enabled);
        assert_eq!(names(&selector), vec!["A", "C", "G"]);
        assert!(selector.is_enabled("C"));

        assert_eq!(selector.toggle("A").unwrap(), ToggleOutcome::Disabled);
        assert_eq!(names(&selector), vec!["C", "G"]);
    }

    #[test]
    fn last_tone_cannot_be_disabled() {
        let mut selector = ToneSelector::from_names(&["D"]).unwrap();
        let before = selector.clone();
        assert_eq!(selector.toggle("D").unwrap(), ToggleOutcome::RejectedLastTone);
        assert_eq!(selector, before);
    }

    #[test]
    fn rejects_bad_initial_sets() {
        assert!(matches!(
            ToneSelector::from_names::<&str>(&[]),
            Err(ToneMemoryError::Configuration { pair_count: 0 })
        ));
        assert!(matches!(
            ToneSelector::from_names(&["A", "A"]),
            Err(ToneMemoryError::DuplicateTone(_))
        ));
        assert!(matches!(
            ToneSelector::from_names(&["Q"]),
            Err(ToneMemoryError::UnknownTone(_))
        ));
    }

    #[test]
    fn unknown_toggle_leaves_set_intact() {
        let mut selector = ToneSelector::default();
        assert!(selector.toggle("nope").is_err());
        assert_eq!(selector.len(), 12);
    }
}
