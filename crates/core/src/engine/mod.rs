//! The flip state machine and session lifecycle.
//!
//! All mutation happens synchronously inside a call from the host: a flip,
//! a tone toggle, a reset, or [`GameEngine::advance`] firing due timers. The
//! engine never reads a wall clock; callers pass `now` as the time since an
//! epoch of their choosing, which must not go backwards between calls.
//!
//! State changes are buffered as [`GameEvent`]s for renderers, time displays
//! and audio players to drain.

mod session;

use std::time::Duration;

use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    audio::PlayRequest,
    clock::Clock,
    config::GameConfig,
    layout::{self, GridSize},
    pairing::Pairing,
    selector::{ToggleOutcome, ToneSelector},
    timeline::{MismatchToken, Scheduler, TimerKind},
    tones::{self, Tone, CHROMATIC_TONES},
    Result, ToneMemoryError,
};

pub use session::{Card, CardState, GameSession, PendingMismatch};

/// Lifecycle of the engine across one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngineState {
    NotStarted,
    Running,
    Ended,
}

/// What a single flip did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FlipOutcome {
    /// The card was already matched.
    Ignored,
    /// The card was the one already open; only its tone replayed.
    Replayed,
    Opened,
    Matched,
    Mismatched,
    /// The flip matched the last pair and ended the game.
    Completed,
}

/// Notifications for the collaborators around the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    BoardReady {
        rows: usize,
        columns: usize,
        card_count: usize,
    },
    CardChanged {
        index: usize,
        state: CardState,
    },
    ToneRequested(PlayRequest),
    TimeChanged(String),
    StateChanged(EngineState),
    PaletteChanged,
}

/// Status of one catalog tone for the palette display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaletteEntry {
    pub tone: Tone,
    pub enabled: bool,
    /// Its pair has been found in the current session.
    pub matched: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardView {
    pub index: usize,
    pub state: CardState,
    pub tone: &'static str,
}

/// Read-only view of the board for renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardSnapshot {
    pub state: EngineState,
    pub rows: usize,
    pub columns: usize,
    pub card_size_px: u32,
    pub elapsed: String,
    pub cards: Vec<CardView>,
}

impl BoardSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub struct GameEngine {
    config: GameConfig,
    selector: ToneSelector,
    rng: Pcg64,
    scheduler: Scheduler,
    clock: Clock,
    session: GameSession,
    state: EngineState,
    next_session_id: u64,
    events: Vec<GameEvent>,
}

impl GameEngine {
    /// Builds an engine and its first board from `config`.
    pub fn new(config: GameConfig) -> Result<Self> {
        let selector = config.tone_selector()?;
        let mut rng = match config.seed {
            Some(seed) => Pcg64::seed_from_u64(seed),
            None => Pcg64::from_entropy(),
        };
        let session = build_session(0, &selector, &mut rng)?;
        let clock = Clock::new(config.tick_interval());

        let mut engine = Self {
            config,
            selector,
            rng,
            scheduler: Scheduler::new(),
            clock,
            session,
            state: EngineState::NotStarted,
            next_session_id: 1,
            events: Vec::new(),
        };
        engine.announce_board();
        Ok(engine)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn cards(&self) -> &[Card] {
        self.session.cards()
    }

    pub fn grid(&self) -> GridSize {
        self.session.grid()
    }

    pub fn selector(&self) -> &ToneSelector {
        &self.selector
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn game_has_ended(&self) -> bool {
        self.session.all_matched()
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    pub fn elapsed_display(&self) -> String {
        self.clock.display()
    }

    /// When the next timer fires, for hosts that sleep between calls.
    pub fn next_timer_due(&self) -> Option<Duration> {
        self.scheduler.next_due()
    }

    /// Takes every event buffered since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Builds a fresh board for the active tone set, stops and zeroes the
    /// clock and returns the engine to [`EngineState::NotStarted`]. Timers
    /// belonging to the previous session are dropped.
    pub fn setup(&mut self) -> Result<()> {
        let session = build_session(self.next_session_id, &self.selector, &mut self.rng)?;
        self.next_session_id += 1;

        self.clock.reset(&mut self.scheduler);
        self.scheduler.clear();
        self.session = session;
        self.set_state(EngineState::NotStarted);
        self.announce_board();
        Ok(())
    }

    /// Stops any running game and deals a new board.
    pub fn reset(&mut self) -> Result<()> {
        if self.clock.is_running() {
            let shown = self.clock.stop(&mut self.scheduler);
            self.events.push(GameEvent::TimeChanged(shown));
        }
        self.setup()
    }

    /// Fires every timer due at or before `now`.
    pub fn advance(&mut self, now: Duration) {
        while let Some(event) = self.scheduler.pop_due(now) {
            match event.kind {
                TimerKind::ClockTick => {
                    if let Some(shown) = self.clock.on_tick(event.token, now, &mut self.scheduler) {
                        self.events.push(GameEvent::TimeChanged(shown));
                    }
                }
                TimerKind::MismatchReset(token) => self.expire_mismatch(token),
            }
        }
    }

    /// Handles a player's flip of card `index` at time `now`.
    ///
    /// Timers due before `now` fire first. An out-of-range index is rejected
    /// without touching any state.
    pub fn flip_card(&mut self, index: usize, now: Duration) -> Result<FlipOutcome> {
        let len = self.session.cards.len();
        if index >= len {
            warn!(index, len, "flip on a card outside the board");
            return Err(ToneMemoryError::IndexOutOfRange { index, len });
        }

        self.advance(now);

        if self.session.cards[index].state == CardState::Matched {
            return Ok(FlipOutcome::Ignored);
        }

        if self.state == EngineState::NotStarted {
            self.clock.start(now, &mut self.scheduler);
            self.set_state(EngineState::Running);
        }

        self.request_tone(index);

        let opened = self.session.opened;
        let outcome = match opened {
            Some(open) if open == index => FlipOutcome::Replayed,
            None => {
                self.resolve_pending_mismatch();
                self.session.opened = Some(index);
                self.change_card(index, CardState::Open);
                FlipOutcome::Opened
            }
            Some(open) if self.session.cards[open].pair_value == self.session.cards[index].pair_value => {
                self.session.opened = None;
                self.change_card(open, CardState::Matched);
                self.change_card(index, CardState::Matched);
                self.events.push(GameEvent::PaletteChanged);

                if self.session.all_matched() {
                    self.finish();
                    FlipOutcome::Completed
                } else {
                    FlipOutcome::Matched
                }
            }
            Some(open) => {
                self.session.opened = None;
                self.change_card(open, CardState::Mismatched);
                self.change_card(index, CardState::Mismatched);

                let token = self.session.next_mismatch_token();
                let due = now + self.config.mismatch_delay();
                let timer = self.scheduler.schedule(due, TimerKind::MismatchReset(token));
                self.session.pending_mismatch = Some(PendingMismatch {
                    cards: (index, open),
                    token,
                    timer,
                });
                FlipOutcome::Mismatched
            }
        };

        debug!(index, ?outcome, "card flipped");
        Ok(outcome)
    }

    /// Enables or disables a tone for the next session and deals a new board
    /// when the change is accepted. Refused while a game is running.
    pub fn toggle_tone(&mut self, name: &str) -> Result<ToggleOutcome> {
        tones::lookup(name)?;
        if self.state == EngineState::Running {
            warn!(tone = name, "tone toggle refused while a game is running");
            return Ok(ToggleOutcome::RejectedWhileRunning);
        }

        let previous = self.selector.clone();
        let outcome = self.selector.toggle(name)?;
        if !outcome.is_accepted() {
            warn!(tone = name, "refusing to disable the last enabled tone");
            return Ok(outcome);
        }

        if let Err(err) = self.setup() {
            self.selector = previous;
            return Err(err);
        }
        self.events.push(GameEvent::PaletteChanged);
        Ok(outcome)
    }

    /// Every catalog tone with its enabled and matched status.
    pub fn palette(&self) -> Vec<PaletteEntry> {
        CHROMATIC_TONES
            .iter()
            .map(|&tone| PaletteEntry {
                tone,
                enabled: self.selector.enabled().contains(&tone),
                matched: self
                    .session
                    .cards()
                    .iter()
                    .any(|card| card.tone == tone && card.state == CardState::Matched),
            })
            .collect()
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let grid = self.session.grid();
        BoardSnapshot {
            state: self.state,
            rows: grid.rows,
            columns: grid.columns,
            card_size_px: self.config.card_size_px,
            elapsed: self.clock.display(),
            cards: self
                .session
                .cards()
                .iter()
                .map(|card| CardView {
                    index: card.index,
                    state: card.state,
                    tone: card.tone.name,
                })
                .collect(),
        }
    }

    fn request_tone(&mut self, index: usize) {
        let tone = self.session.cards[index].tone;
        let frequency_hz = tone.frequency_with_reference(self.config.reference_frequency_hz);
        self.events.push(GameEvent::ToneRequested(PlayRequest {
            index,
            tone,
            frequency_hz,
        }));
    }

    fn change_card(&mut self, index: usize, state: CardState) {
        self.session.set_state(index, state);
        self.events.push(GameEvent::CardChanged { index, state });
    }

    fn set_state(&mut self, state: EngineState) {
        if self.state != state {
            self.state = state;
            self.events.push(GameEvent::StateChanged(state));
        }
    }

    /// Turns a pending mismatch face down ahead of its timer.
    fn resolve_pending_mismatch(&mut self) {
        if let Some(pending) = self.session.pending_mismatch.take() {
            self.scheduler.cancel(pending.timer);
            self.hide_pair(pending.cards);
        }
    }

    fn expire_mismatch(&mut self, token: MismatchToken) {
        match self.session.pending_mismatch {
            Some(pending) if pending.token == token => {
                self.session.pending_mismatch = None;
                self.hide_pair(pending.cards);
            }
            _ => debug!(?token, "stale mismatch reset ignored"),
        }
    }

    fn hide_pair(&mut self, (first, second): (usize, usize)) {
        self.change_card(first, CardState::Hidden);
        self.change_card(second, CardState::Hidden);
    }

    fn finish(&mut self) {
        let shown = self.clock.stop(&mut self.scheduler);
        info!(elapsed = %shown, pairs = self.session.pair_count(), "all pairs matched");
        self.events.push(GameEvent::TimeChanged(shown));
        self.set_state(EngineState::Ended);
    }

    fn announce_board(&mut self) {
        let grid = self.session.grid();
        info!(
            session = self.session.id(),
            pairs = self.session.pair_count(),
            rows = grid.rows,
            columns = grid.columns,
            "board dealt"
        );
        self.events.push(GameEvent::BoardReady {
            rows: grid.rows,
            columns: grid.columns,
            card_count: self.session.cards().len(),
        });
        self.events.push(GameEvent::TimeChanged(self.clock.display()));
    }
}

impl std::fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameEngine")
            .field("state", &self.state)
            .field("session", &self.session.id())
            .field("elapsed", &self.clock.display())
            .finish()
    }
}

fn build_session(id: u64, selector: &ToneSelector, rng: &mut Pcg64) -> Result<GameSession> {
    let tones_in_play = selector.enabled().to_vec();
    let grid = layout::size_for(tones_in_play.len())?;
    let pairing = Pairing::generate(rng, &tones_in_play)?;
    Ok(GameSession::new(id, tones_in_play, grid, &pairing))
}
