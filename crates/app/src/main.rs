use std::{
    collections::HashMap,
    io::{self, BufRead, Write},
    time::{Duration, Instant},
};

use clap::{Parser, Subcommand};
use tone_memory_core::{
    dispatch_tones, layout, AudioPlayer, CardState, EngineState, FlipOutcome, GameConfig,
    GameEngine, ToneMemoryError, CHROMATIC_TONES,
};
use tracing_subscriber::EnvFilter;

fn main() -> tone_memory_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Tones { reference } => {
            run_tones(reference);
            Ok(())
        }
        Commands::Layouts => run_layouts(),
        Commands::Autoplay { game, step_ms } => {
            run_autoplay(game.into_config(), Duration::from_millis(step_ms))
        }
        Commands::Play { game, json } => run_play(game.into_config(), json),
    }
}

fn run_tones(reference: f32) {
    for tone in CHROMATIC_TONES {
        println!(
            "{:>6}  +{:<2}  {:>8.2} Hz",
            tone.name,
            tone.semitone_offset,
            tone.frequency_with_reference(reference)
        );
    }
}

fn run_layouts() -> tone_memory_core::Result<()> {
    for pairs in 1..=CHROMATIC_TONES.len() {
        let grid = layout::size_for(pairs)?;
        println!(
            "{pairs:>2} pairs  {}x{}  {} empty",
            grid.rows,
            grid.columns,
            grid.slack(pairs)
        );
    }
    Ok(())
}

/// Plays a whole game with simulated time, remembering every tone it hears.
fn run_autoplay(config: GameConfig, step: Duration) -> tone_memory_core::Result<()> {
    let mut engine = GameEngine::new(config)?;
    let mut player = LoggingPlayer;
    let mut bot = Bot {
        now: Duration::ZERO,
        step,
        flips: 0,
        mismatches: 0,
    };
    tracing::info!(pairs = engine.session().pair_count(), "starting autoplay");

    let mut heard: HashMap<&'static str, usize> = HashMap::new();
    let mut unseen = 0..engine.cards().len();

    while engine.state() != EngineState::Ended {
        let Some(first) = unseen.next() else {
            return Err(ToneMemoryError::msg("autoplay ran out of cards before the game ended"));
        };
        if engine.cards()[first].state == CardState::Matched {
            continue;
        }

        let first_tone = bot.flip(&mut engine, &mut player, first)?;
        if let Some(known) = heard.remove(first_tone) {
            bot.flip(&mut engine, &mut player, known)?;
            continue;
        }

        let Some(second) = unseen.next() else {
            return Err(ToneMemoryError::msg("autoplay found an unpaired card"));
        };
        let second_tone = bot.flip(&mut engine, &mut player, second)?;
        if second_tone == first_tone {
            continue;
        }

        heard.insert(first_tone, first);
        if let Some(known) = heard.remove(second_tone) {
            bot.flip(&mut engine, &mut player, second)?;
            bot.flip(&mut engine, &mut player, known)?;
        } else {
            heard.insert(second_tone, second);
        }
    }

    println!(
        "cleared {} pairs in {} flips ({} mismatches), time {}",
        engine.session().pair_count(),
        bot.flips,
        bot.mismatches,
        engine.elapsed_display()
    );
    Ok(())
}

struct Bot {
    now: Duration,
    step: Duration,
    flips: usize,
    mismatches: usize,
}

impl Bot {
    fn flip(
        &mut self,
        engine: &mut GameEngine,
        player: &mut LoggingPlayer,
        index: usize,
    ) -> tone_memory_core::Result<&'static str> {
        self.now += self.step;
        let outcome = engine.flip_card(index, self.now)?;
        self.flips += 1;
        if outcome == FlipOutcome::Mismatched {
            self.mismatches += 1;
        }
        dispatch_tones(&engine.drain_events(), player);
        Ok(engine.cards()[index].tone.name)
    }
}

/// Interactive terminal session: card numbers flip, `t <tone>` toggles a
/// tone, `r` resets, `q` quits.
fn run_play(config: GameConfig, json: bool) -> tone_memory_core::Result<()> {
    let mut engine = GameEngine::new(config)?;
    let mut player = LoggingPlayer;
    let epoch = Instant::now();
    let stdin = io::stdin();

    render(&mut engine, &mut player, json)?;
    for line in stdin.lock().lines() {
        let line = line?;
        let now = epoch.elapsed();
        engine.advance(now);

        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (Some("q"), _) => break,
            (Some("r"), _) => engine.reset()?,
            (Some("t"), Some(name)) => match engine.toggle_tone(name) {
                Ok(outcome) => println!("{name}: {outcome:?}"),
                Err(err) => println!("{err}"),
            },
            (Some(word), None) => match word.parse::<usize>() {
                Ok(index) => {
                    if let Err(err) = engine.flip_card(index, now) {
                        println!("{err}");
                    }
                }
                Err(_) => println!("unknown command `{word}`"),
            },
            _ => println!("commands: <card>, t <tone>, r, q"),
        }
        render(&mut engine, &mut player, json)?;
    }
    Ok(())
}

fn render(
    engine: &mut GameEngine,
    player: &mut LoggingPlayer,
    json: bool,
) -> tone_memory_core::Result<()> {
    let events = engine.drain_events();
    dispatch_tones(&events, player);
    for event in &events {
        tracing::debug!(?event, "engine event");
    }

    let mut out = io::stdout().lock();
    if json {
        writeln!(out, "{}", engine.snapshot().to_json()?)?;
        return Ok(());
    }

    let grid = engine.grid();
    let cards = engine.cards();
    let cells: Vec<Option<usize>> = grid.cells(cards.len()).collect();
    for row in cells.chunks(grid.columns) {
        let line: Vec<String> = row
            .iter()
            .map(|cell| match cell {
                None => " ".repeat(9),
                Some(index) => {
                    let card = &cards[*index];
                    match card.state {
                        CardState::Hidden => format!("[{index:^7}]"),
                        CardState::Open => format!("<{:^7}>", card.tone.name),
                        CardState::Mismatched => format!("!{:^7}!", card.tone.name),
                        CardState::Matched => format!("({:^7})", card.tone.name),
                    }
                }
            })
            .collect();
        writeln!(out, "{}", line.join(" "))?;
    }

    let palette: Vec<String> = engine
        .palette()
        .iter()
        .filter(|entry| entry.enabled)
        .map(|entry| {
            if entry.matched {
                format!("{}*", entry.tone.name)
            } else {
                entry.tone.name.to_string()
            }
        })
        .collect();
    writeln!(
        out,
        "{:?}  {}  tones: {}",
        engine.state(),
        engine.elapsed_display(),
        palette.join(" ")
    )?;
    Ok(())
}

/// Stand-in audio backend that records play requests in the log.
struct LoggingPlayer;

impl AudioPlayer for LoggingPlayer {
    fn play(&mut self, frequency_hz: f32) {
        tracing::info!(frequency_hz, "play tone");
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Memory card game played by ear", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug)]
struct GameArgs {
    /// Comma separated tone names to play with (defaults to all twelve).
    #[arg(short, long, value_delimiter = ',')]
    tones: Vec<String>,
    /// Seed for a reproducible board.
    #[arg(short, long)]
    seed: Option<u64>,
    /// How long mismatched cards stay face up.
    #[arg(long, default_value_t = 1_000)]
    mismatch_delay_ms: u64,
}

impl GameArgs {
    fn into_config(self) -> GameConfig {
        let mut config = GameConfig {
            seed: self.seed,
            mismatch_delay_ms: self.mismatch_delay_ms,
            ..GameConfig::default()
        };
        if !self.tones.is_empty() {
            config.tones = self.tones;
        }
        config
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the chromatic tones and their frequencies.
    Tones {
        /// Frequency of the reference tone `A`.
        #[arg(long, default_value_t = tone_memory_core::REFERENCE_FREQUENCY_HZ)]
        reference: f32,
    },
    /// Print the grid shape used for every pair count.
    Layouts,
    /// Let a perfect-memory bot play a game with simulated time.
    Autoplay {
        #[command(flatten)]
        game: GameArgs,
        /// Simulated time between two flips.
        #[arg(long, default_value_t = 350)]
        step_ms: u64,
    },
    /// Play in the terminal.
    Play {
        #[command(flatten)]
        game: GameArgs,
        /// Print a JSON snapshot of the board instead of the text grid.
        #[arg(long)]
        json: bool,
    },
}
