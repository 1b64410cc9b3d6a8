use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    selector::ToneSelector,
    tones::{CHROMATIC_TONES, REFERENCE_FREQUENCY_HZ},
    Result,
};

/// Construction-time settings for a [`GameEngine`](crate::GameEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Initial active tone set, by catalog name.
    pub tones: Vec<String>,
    /// Seed for reproducible boards. `None` draws from OS entropy.
    pub seed: Option<u64>,
    pub mismatch_delay_ms: u64,
    pub tick_interval_ms: u64,
    pub reference_frequency_hz: f32,
    /// Edge length of a rendered card. Passed through to renderers only.
    pub card_size_px: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tones: CHROMATIC_TONES
                .iter()
                .map(|tone| tone.name.to_string())
                .collect(),
            seed: None,
            mismatch_delay_ms: 1_000,
            tick_interval_ms: 10,
            reference_frequency_hz: REFERENCE_FREQUENCY_HZ,
            card_size_px: 96,
        }
    }
}

impl GameConfig {
    pub fn with_tones<S: Into<String>>(mut self, tones: impl IntoIterator<Item = S>) -> Self {
        self.tones = tones.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn mismatch_delay(&self) -> Duration {
        Duration::from_millis(self.mismatch_delay_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Validates the tone list and builds the matching selector.
    pub fn tone_selector(&self) -> Result<ToneSelector> {
        ToneSelector::from_names(&self.tones)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_whole_catalog() {
        let config = GameConfig::default();
        assert_eq!(config.tones.len(), 12);
        assert_eq!(config.mismatch_delay(), Duration::from_secs(1));
        assert_eq!(config.tick_interval(), Duration::from_millis(10));
        assert_eq!(config.tone_selector().unwrap().len(), 12);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: GameConfig = serde_json::from_str(r#"{"tones":["A","E"],"seed":9}"#).unwrap();
        assert_eq!(config.tones, vec!["A", "E"]);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.reference_frequency_hz, 220.0);
    }

    #[test]
    fn builder_helpers_override_fields() {
        let config = GameConfig::default().with_tones(["C", "D"]).with_seed(4);
        assert_eq!(config.tones, vec!["C", "D"]);
        assert_eq!(config.seed, Some(4));
        assert!(GameConfig::default().with_tones(["C", "C"]).tone_selector().is_err());
    }
}
