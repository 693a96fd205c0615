//! Interactive round loop.
//!
//! Each stdin line is either a slash command or a guess:
//!
//! ```text
//! /start [secs]                 start a round
//! /draw <color> <width> x,y...  draw a stroke through the points
//! /erase <width> x,y...         erase along the points
//! /clear                        clear the canvas
//! /word                         show the secret word (drawer only)
//! /status                       show round state
//! /lobby                        abandon the round, reset the score
//! /quit                         leave
//! anything else                 a guess
//! ```

use anyhow::{bail, Context, Result};
use doodle_client::{
    Collaborators, Coordinator, CoordinatorHandle, FileScoreStore, GameConfig, LoopbackChannel,
    SystemClock, WordList,
};
use doodle_core::{format_clock, BrushStyle};
use doodle_types::{RoundEvent, StrokeColor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use crate::config;
use crate::framelog::FrameLogWriter;

/// Options for the play command.
#[derive(Debug, Clone)]
pub struct PlayOptions {
    /// Round length used by a bare `/start`.
    pub duration: Option<u32>,
    /// Seed for word selection.
    pub seed: Option<u64>,
    /// Name guesses are submitted under.
    pub player: String,
    /// Frame log destination.
    pub record: Option<PathBuf>,
}

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Start a round.
    Start(Option<u32>),
    /// Draw a polyline.
    Draw {
        /// Brush to draw with.
        style: BrushStyle,
        /// Points of the stroke, at least two.
        points: Vec<(f32, f32)>,
    },
    /// Clear the canvas.
    Clear,
    /// Reveal the word to the drawer.
    Word,
    /// Print the round state.
    Status,
    /// Back to the lobby.
    Lobby,
    /// Leave the game.
    Quit,
    /// A guess.
    Guess(String),
    /// Blank line.
    Empty,
}

impl Input {
    /// Parse one line of input.
    pub fn parse(line: &str) -> Result<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Input::Empty);
        }
        if !trimmed.starts_with('/') {
            return Ok(Input::Guess(line.to_string()));
        }

        let mut words = trimmed.split_whitespace();
        let command = words.next().unwrap_or_default();
        let args: Vec<&str> = words.collect();

        match command {
            "/start" => match args.as_slice() {
                [] => Ok(Input::Start(None)),
                [secs] => {
                    let secs = secs
                        .parse()
                        .with_context(|| format!("Invalid duration '{}'", secs))?;
                    Ok(Input::Start(Some(secs)))
                }
                _ => bail!("Usage: /start [secs]"),
            },
            "/draw" => {
                let [color, width, points @ ..] = args.as_slice() else {
                    bail!("Usage: /draw <color> <width> x,y x,y ...");
                };
                let color: StrokeColor = color.parse()?;
                let style = BrushStyle::new(color, parse_width(width)?);
                Ok(Input::Draw {
                    style,
                    points: parse_points(points)?,
                })
            }
            "/erase" => {
                let [width, points @ ..] = args.as_slice() else {
                    bail!("Usage: /erase <width> x,y x,y ...");
                };
                Ok(Input::Draw {
                    style: BrushStyle::eraser(parse_width(width)?),
                    points: parse_points(points)?,
                })
            }
            "/clear" => Ok(Input::Clear),
            "/word" => Ok(Input::Word),
            "/status" => Ok(Input::Status),
            "/lobby" => Ok(Input::Lobby),
            "/quit" => Ok(Input::Quit),
            other => bail!("Unknown command {}", other),
        }
    }
}

fn parse_width(s: &str) -> Result<f32> {
    let width: f32 = s
        .parse()
        .with_context(|| format!("Invalid width '{}'", s))?;
    if !width.is_finite() {
        bail!("Invalid width '{}'", s);
    }
    Ok(width)
}

fn parse_points(args: &[&str]) -> Result<Vec<(f32, f32)>> {
    if args.len() < 2 {
        bail!("A stroke needs at least two points");
    }
    args.iter()
        .map(|arg| {
            let (x, y) = arg
                .split_once(',')
                .with_context(|| format!("Invalid point '{}'", arg))?;
            let x: f32 = x.parse().with_context(|| format!("Invalid point '{}'", arg))?;
            let y: f32 = y.parse().with_context(|| format!("Invalid point '{}'", arg))?;
            Ok((x, y))
        })
        .collect()
}

/// Run the play command until `/quit` or end of input.
pub async fn run(data_dir: &Path, game_config: &GameConfig, options: PlayOptions) -> Result<()> {
    let channel = LoopbackChannel::new(game_config.replication.channel_capacity);
    let recorder = match &options.record {
        Some(path) => {
            let writer = FrameLogWriter::create(path).await?;
            Some(tokio::spawn(record_frames(channel.subscribe(), writer)))
        }
        None => None,
    };

    let collaborators = Collaborators {
        words: Arc::new(WordList::builtin(options.seed)),
        scores: Arc::new(FileScoreStore::new(config::score_path(
            game_config,
            data_dir,
        ))),
        channel: Arc::new(channel.clone()),
        clock: Arc::new(SystemClock),
    };
    let handle = Coordinator::spawn(game_config, collaborators)
        .await
        .context("Failed to start coordinator")?;
    let printer = tokio::spawn(print_events(handle.subscribe()));

    println!("=== doodle ===");
    println!("Type /start to begin a round, /quit to leave.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let input = match Input::parse(&line) {
            Ok(input) => input,
            Err(e) => {
                eprintln!("error: {:#}", e);
                continue;
            }
        };
        if input == Input::Quit {
            break;
        }
        if let Err(e) = dispatch(&handle, &options, input).await {
            eprintln!("error: {:#}", e);
        }
    }

    handle.shutdown().await?;
    drop(handle);
    drop(channel);

    printer.await.context("Event printer failed")?;
    if let Some(recorder) = recorder {
        let frames = recorder.await.context("Frame recorder failed")??;
        println!("Recorded {} frames.", frames);
    }

    Ok(())
}

async fn dispatch(handle: &CoordinatorHandle, options: &PlayOptions, input: Input) -> Result<()> {
    match input {
        Input::Start(secs) => {
            handle.start_round(secs.or(options.duration)).await?;
        }
        Input::Draw { style, points } => {
            let mut points = points.into_iter();
            if let Some((x, y)) = points.next() {
                handle.begin_stroke(x, y).await?;
            }
            let mut result = Ok(());
            for (x, y) in points {
                if let Err(e) = handle.extend_stroke(x, y, style).await {
                    result = Err(e);
                    break;
                }
            }
            handle.end_stroke().await?;
            result?;
        }
        Input::Clear => handle.clear_canvas().await?,
        Input::Word => match handle.secret_word().await? {
            Some(word) => println!("Word: {}", word),
            None => println!("No word yet."),
        },
        Input::Status => {
            let snapshot = handle.snapshot().await?;
            println!("Phase: {}", snapshot.phase);
            println!("  Score:    {}", snapshot.score);
            println!("  Time:     {}", format_clock(snapshot.remaining_secs));
            println!("  Guesses:  {}", snapshot.guesses.len());
            println!("  checksum {:016x}", snapshot.surface_checksum);
        }
        Input::Lobby => handle.return_to_lobby().await?,
        Input::Guess(text) => {
            handle.submit_guess(options.player.as_str(), text).await?;
        }
        Input::Empty | Input::Quit => {}
    }
    Ok(())
}

async fn print_events(mut events: broadcast::Receiver<RoundEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => print_event(&event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Event printer skipped {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_event(event: &RoundEvent) {
    match event {
        RoundEvent::Started { duration_secs, .. } => {
            println!("Round started: {} to guess.", format_clock(*duration_secs));
        }
        RoundEvent::GuessRecorded { record, .. } => {
            println!("[{}] {}", record.author, record.text);
        }
        RoundEvent::Solved {
            author,
            word,
            score,
            ..
        } => {
            println!("{} solved it! The word was: {} (score {})", author, word, score);
        }
        RoundEvent::Expired { word, .. } => {
            println!("Time's up! The word was: {}", word);
        }
        RoundEvent::Warning { remaining_secs } => {
            println!("Hurry! {} left.", format_clock(*remaining_secs));
        }
        RoundEvent::Tick { remaining_secs, .. } => {
            tracing::trace!("Tick {}", remaining_secs);
        }
        RoundEvent::ReturnedToLobby => println!("Back in the lobby."),
    }
}

type FrameReceiver = broadcast::Receiver<Arc<Vec<u8>>>;

async fn record_frames(mut frames: FrameReceiver, mut writer: FrameLogWriter) -> Result<u64> {
    loop {
        match frames.recv().await {
            Ok(bytes) => writer.append(&bytes).await?,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Frame recorder dropped {} frames", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    writer.finish().await
}
