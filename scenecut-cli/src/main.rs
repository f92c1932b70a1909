//! scenecut - FCPXML timeline authoring tool
//!
//! Builds new FCPXML documents and extends existing ones: plain video
//! clips, timeless still images, stacked text overlays, and compound
//! video+audio clips. The library never prints or exits; this binary is
//! the only place errors become user-visible messages and exit codes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use scenecut_common::config::Config;
use scenecut_common::edits::{self, DEFAULT_DURATION_SECONDS};
use scenecut_common::model::Fcpxml;
use scenecut_common::{bookmark, probe, xml};

#[derive(Parser)]
#[command(name = "scenecut", version, about = "FCPXML timeline authoring")]
struct Cli {
    /// Optional TOML config with project naming and render profile
    #[arg(long, global = true, env = "SCENECUT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Create a new empty document
    New {
        /// Output document path
        output: PathBuf,
    },
    /// Append a video clip to the timeline
    AddVideo {
        /// Document to extend (created if missing)
        document: PathBuf,
        /// Video file to add
        video: PathBuf,
        /// Clip length in seconds; probed from the file when omitted
        #[arg(long)]
        duration: Option<f64>,
    },
    /// Append a still image to the timeline
    AddImage {
        document: PathBuf,
        /// Image file (png/jpg/jpeg) to add
        image: PathBuf,
        /// Display length in seconds
        #[arg(long, default_value_t = DEFAULT_DURATION_SECONDS)]
        duration: f64,
    },
    /// Stack text overlays over the clip at an offset
    AddText {
        document: PathBuf,
        /// Text file, one overlay line per non-empty line
        text_file: PathBuf,
        /// Timeline offset in seconds to attach the overlays at
        #[arg(long, default_value_t = 0.0)]
        offset: f64,
    },
    /// Append a video with a synchronized audio track as a compound clip
    AddClip {
        document: PathBuf,
        video: PathBuf,
        audio: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("scenecut v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        CliCommand::New { output } => {
            let doc = edits::empty_document(&config);
            xml::write_document(&doc, &output)?;
            info!("created {}", output.display());
        }
        CliCommand::AddVideo {
            document,
            video,
            duration,
        } => {
            let mut doc = load_or_create(&document, &config)?;
            let seconds = duration.unwrap_or_else(|| probed_duration(&video));
            edits::add_video(&mut doc, &video, seconds)?;
            attach_bookmark(&mut doc, &video);
            xml::write_document(&doc, &document)?;
            info!("added {} ({seconds}s) to {}", video.display(), document.display());
        }
        CliCommand::AddImage {
            document,
            image,
            duration,
        } => {
            let mut doc = load_or_create(&document, &config)?;
            edits::add_image(&mut doc, &image, duration)?;
            attach_bookmark(&mut doc, &image);
            xml::write_document(&doc, &document)?;
            info!("added {} ({duration}s) to {}", image.display(), document.display());
        }
        CliCommand::AddText {
            document,
            text_file,
            offset,
        } => {
            let text = std::fs::read_to_string(&text_file)
                .with_context(|| format!("reading {}", text_file.display()))?;
            let lines: Vec<String> = text.lines().map(str::to_string).collect();

            let mut doc = load_or_create(&document, &config)?;
            edits::add_text_overlays(&mut doc, &lines, offset)?;
            xml::write_document(&doc, &document)?;
            info!("added text overlays to {}", document.display());
        }
        CliCommand::AddClip {
            document,
            video,
            audio,
        } => {
            let mut doc = load_or_create(&document, &config)?;
            let audio_seconds = probed_duration(&audio);
            edits::add_clip_with_audio(&mut doc, &video, &audio, audio_seconds)?;
            attach_bookmark(&mut doc, &video);
            attach_bookmark(&mut doc, &audio);
            xml::write_document(&doc, &document)?;
            info!("added compound clip to {}", document.display());
        }
    }

    Ok(())
}

/// Load an existing document, or start a fresh one when the path does
/// not exist yet.
fn load_or_create(path: &Path, config: &Config) -> Result<Fcpxml> {
    if path.exists() {
        Ok(xml::read_document(path)?)
    } else {
        info!("{} not found, starting a new document", path.display());
        Ok(edits::empty_document(config))
    }
}

/// Probe a media file's duration, falling back to the documented
/// default length when the probe fails.
fn probed_duration(path: &Path) -> f64 {
    match probe::probe_duration(path) {
        Ok(seconds) => seconds,
        Err(e) => {
            warn!(
                "{e}; falling back to {DEFAULT_DURATION_SECONDS}s for {}",
                path.display()
            );
            DEFAULT_DURATION_SECONDS
        }
    }
}

/// Best-effort security bookmark for the asset backing `path`. Failure
/// leaves the document unchanged.
fn attach_bookmark(doc: &mut Fcpxml, path: &Path) {
    let Some(token) = bookmark::bookmark(path) else {
        return;
    };
    let src_suffix = format!("{}", path.display());
    for asset in &mut doc.resources.assets {
        if asset.media_rep.src.ends_with(&src_suffix) {
            asset.media_rep.bookmark = Some(token);
            return;
        }
    }
}
