use serde::{Deserialize, Serialize};

use crate::{engine::GameEvent, tones::Tone};

/// Fire-and-forget request to sound a card's tone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayRequest {
    pub index: usize,
    pub tone: Tone,
    pub frequency_hz: f32,
}

/// Audio backend contract. Playback length and timbre are up to the player;
/// the engine never waits on it.
pub trait AudioPlayer {
    fn play(&mut self, frequency_hz: f32);
}

impl<F: FnMut(f32)> AudioPlayer for F {
    fn play(&mut self, frequency_hz: f32) {
        self(frequency_hz)
    }
}

/// Forwards every tone request in `events` to `player`, returning how many
/// were sent.
pub fn dispatch_tones<'a, P>(events: impl IntoIterator<Item = &'a GameEvent>, player: &mut P) -> usize
where
    P: AudioPlayer + ?Sized,
{
    let mut sent = 0;
    for event in events {
        if let GameEvent::ToneRequested(request) = event {
            player.play(request.frequency_hz);
            sent += 1;
        }
    }
    sent
}
