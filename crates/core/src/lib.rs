//! Core library for the Tone Memory game.
//!
//! A memory card game where every card carries a musical tone. The crate
//! holds the engine only: grid sizing, randomised pairing, the flip state
//! machine, timing, and tone frequencies. Rendering, input wiring and sound
//! synthesis are left to adapters that drive [`GameEngine`] and drain its
//! [`GameEvent`]s.

pub mod audio;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod layout;
pub mod pairing;
pub mod selector;
pub mod timeline;
pub mod tones;

pub use audio::{dispatch_tones, AudioPlayer, PlayRequest};
pub use clock::{format_elapsed, Clock};
pub use config::GameConfig;
pub use engine::{
    BoardSnapshot, Card, CardState, CardView, EngineState, FlipOutcome, GameEngine, GameEvent,
    GameSession, PaletteEntry,
};
pub use error::{Result, ToneMemoryError};
pub use layout::GridSize;
pub use pairing::Pairing;
pub use selector::{ToggleOutcome, ToneSelector};
pub use timeline::Scheduler;
pub use tones::{Tone, CHROMATIC_TONES, REFERENCE_FREQUENCY_HZ};
