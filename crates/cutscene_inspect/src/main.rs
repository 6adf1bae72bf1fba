// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cutscene inspector
//!
//! Loads a cutscene document and prints what a playback host would
//! receive for every element at one frame.

use anyhow::{Context, Result};
use clap::Parser;
use cutscene_timeline::{load_document, Frame, Payload, PlayData, TimelineConfig};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "cutscene_inspect")]
#[command(about = "Print the per-element state of a cutscene at one frame")]
#[command(version)]
struct Cli {
    /// Cutscene document path
    document: PathBuf,

    /// Frame to sample
    #[arg(default_value_t = 0)]
    frame: Frame,

    /// Timeline config file (RON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also print the whole document as a RON snapshot
    #[arg(long)]
    ron: bool,
}

fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("cutscene_timeline=info".parse()?);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => TimelineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => TimelineConfig::default(),
    };
    let data = load_document(&cli.document, &config)
        .with_context(|| format!("Failed to load {}", cli.document.display()))?;

    print_summary(&data);
    print_frame(&data, cli.frame);

    if cli.ron {
        println!("{}", data.to_ron().context("Failed to snapshot document")?);
    }
    Ok(())
}

fn print_summary(data: &PlayData) {
    println!(
        "{} frames, {} elements, {} comments",
        data.total_frames(),
        data.element_count(),
        data.comments().len()
    );
    for (priority, element) in data.elements().enumerate() {
        println!(
            "  [{priority}] {:<14} {:<20} frames {}..{} flags {:?}",
            element.kind().label(),
            element.name,
            element.start_frame(),
            element.end_frame(),
            element.flags()
        );
    }
    for comment in data.comments() {
        println!("  #{} {}", comment.frame, comment.text);
    }
}

fn print_frame(data: &PlayData, frame: Frame) {
    if frame < 0 || frame >= data.total_frames() {
        tracing::warn!("Frame {} is outside the document (0..{})", frame, data.total_frames());
    }
    println!("Frame {frame}:");
    for ((_, frame_data), element) in data.frame_data(frame).iter().zip(data.elements()) {
        let state = if frame_data.is_active { "on " } else { "off" };
        println!("  {state} {:<20} {}", element.name, describe(&frame_data.payload));
    }
}

fn describe(payload: &Payload) -> String {
    match payload {
        Payload::Image(image) => format!(
            "pos {:?} rot {} scale {:?} color {:?} transition {} raycast {}",
            image.position,
            image.rotation,
            image.scale,
            image.color,
            image.transition_no,
            image.raycast_target
        ),
        Payload::Panel(panel) => format!(
            "pos {:?} rot {} scale {:?} color {:?} raycast {}",
            panel.position, panel.rotation, panel.scale, panel.color, panel.raycast_target
        ),
        Payload::Text(text) => format!("label {:?}", text.label),
        Payload::Choices(choices) => choices
            .choices
            .iter()
            .map(|choice| format!("{:?} -> {:?}", choice.label, choice.flags))
            .collect::<Vec<_>>()
            .join(" | "),
        Payload::Sound(sound) => format!("volume {}", sound.volume),
        Payload::SoundOneShot => String::new(),
    }
}
