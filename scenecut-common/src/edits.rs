//! Document-level editing operations
//!
//! Each operation wires the registry, a transaction, and the spine
//! assembler together: look up or create the resources it needs, commit
//! them as one batch, then place the timeline element and refresh the
//! sequence duration. Input problems (missing files, empty requests)
//! abort before any resource is reserved.

use std::path::Path;

use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::ids;
use crate::model::{
    AdjustTransform, AssetClip, Fcpxml, Format, Keyframe, KeyframeAnimation, Library,
    LibraryEvent, MatchRule, Param, Project, RatingRule, RefClip, Sequence, SmartCollection,
    Spine, SpineChild, Video,
};
use crate::registry::ResourceRegistry;
use crate::timeline;
use crate::timing;
use crate::transaction::{absolute_path, ResourceTransaction};

/// Document schema version written by this tool.
pub const FCPXML_VERSION: &str = "1.13";

/// Format profile name for still-image assets.
pub const STILL_FORMAT_NAME: &str = "FFVideoFormatRateUndefined";

/// Color space for still-image formats.
const STILL_COLOR_SPACE: &str = "1-13-1";

/// Built-in text title effect.
pub const TEXT_EFFECT_NAME: &str = "Text";
const TEXT_EFFECT_UID: &str =
    ".../Titles.localized/Basic Text.localized/Text.localized/Text.moti";

/// Standard `start` for still images placed as video elements.
const STILL_START: &str = "86399313/24000s";

/// Default display length when the caller supplies no duration and the
/// probe cannot help.
pub const DEFAULT_DURATION_SECONDS: f64 = 10.0;

/// Build a fresh, empty document: one sequence format, an empty spine,
/// and the standard library smart collections.
///
/// Event and project UIDs are derived from their names, so regenerating
/// the same project produces an identical document.
pub fn empty_document(cfg: &Config) -> Fcpxml {
    let format = Format {
        id: ids::resource_id(1),
        name: cfg.format.name.clone(),
        frame_duration: Some(cfg.format.frame_duration.clone()),
        width: cfg.format.width,
        height: cfg.format.height,
        color_space: cfg.format.color_space.clone(),
    };

    let sequence = Sequence {
        format: format.id.clone(),
        duration: "0s".to_string(),
        tc_start: "0s".to_string(),
        tc_format: "NDF".to_string(),
        audio_layout: "stereo".to_string(),
        audio_rate: "48k".to_string(),
        spine: Spine::default(),
    };

    let mut resources = crate::model::Resources::default();
    resources.formats.push(format);

    Fcpxml {
        version: FCPXML_VERSION.to_string(),
        resources,
        library: Library {
            location: cfg.library_location.clone(),
            events: vec![LibraryEvent {
                name: cfg.event.clone(),
                uid: Some(ids::media_uid(&format!("{}_event", cfg.event))),
                projects: vec![Project {
                    name: cfg.project.clone(),
                    uid: Some(ids::media_uid(&format!("{}_project", cfg.project))),
                    mod_date: None,
                    sequences: vec![sequence],
                }],
            }],
            smart_collections: standard_smart_collections(),
        },
    }
}

/// Add a video file to the timeline.
///
/// If the same file path is already registered, the existing asset is
/// reused and only a new timeline placement is appended.
pub fn add_video(doc: &mut Fcpxml, path: &Path, duration_seconds: f64) -> Result<()> {
    let abs = absolute_path(path)?;
    if !abs.exists() {
        return Err(Error::MissingFile(abs));
    }
    let base_name = base_name(&abs)?;
    let duration = timing::seconds_to_duration(duration_seconds);
    let seq_format = doc.sequence().ok_or(Error::NoSequence)?.format.clone();

    let (asset_id, asset_format, asset_name) = {
        let registry = ResourceRegistry::new(doc);
        match registry.find_asset_by_file_path(&abs) {
            Some(existing) => {
                debug!(id = %existing.id, "reusing existing asset");
                (existing.id, existing.format, existing.name)
            }
            None => {
                let mut tx = ResourceTransaction::new(&registry);
                let id = tx.reserve_ids(1)?.remove(0);
                let asset = tx.create_asset(&id, &abs, &base_name, &duration, &seq_format)?;
                tx.commit()?;
                (asset.id, asset.format, asset.name)
            }
        }
    };

    let seq = doc.sequence_mut().ok_or(Error::NoSequence)?;
    let offset = timeline::insertion_offset_ticks(&seq.spine)?;
    let clip = AssetClip {
        ref_id: asset_id,
        offset: timing::format_ticks(offset),
        name: asset_name,
        duration,
        format: Some(asset_format),
        tc_format: Some("NDF".to_string()),
        audio_role: Some("dialogue".to_string()),
        ..AssetClip::default()
    };
    timeline::append_child(&mut seq.spine, SpineChild::AssetClip(clip));
    seq.duration = timing::format_ticks(timeline::total_duration_ticks(&seq.spine)?);
    Ok(())
}

/// Add a still image to the timeline for `duration_seconds`.
///
/// The asset itself is timeless (`"0s"`); the display duration goes on
/// the spine `video` element. The still-image format is created once and
/// shared by every later image.
pub fn add_image(doc: &mut Fcpxml, path: &Path, duration_seconds: f64) -> Result<()> {
    let abs = absolute_path(path)?;
    if !abs.exists() {
        return Err(Error::MissingFile(abs));
    }
    if crate::model::MediaKind::from_path(&abs) != crate::model::MediaKind::Image {
        return Err(Error::InvalidInput(format!(
            "not a supported image file: {}",
            abs.display()
        )));
    }
    let base_name = base_name(&abs)?;
    let display_duration = timing::seconds_to_duration(duration_seconds);

    let (asset_id, asset_name) = {
        let registry = ResourceRegistry::new(doc);
        match registry.find_asset_by_file_path(&abs) {
            Some(existing) => {
                debug!(id = %existing.id, "reusing existing asset");
                (existing.id, existing.name)
            }
            None => {
                let mut tx = ResourceTransaction::new(&registry);
                let existing_format = registry.find_format_by_name(STILL_FORMAT_NAME);
                let (asset_id, format_id) = match &existing_format {
                    Some(f) => (tx.reserve_ids(1)?.remove(0), f.id.clone()),
                    None => {
                        let ids = tx.reserve_ids(2)?;
                        (ids[0].clone(), ids[1].clone())
                    }
                };
                if existing_format.is_none() {
                    tx.create_format(&format_id, STILL_FORMAT_NAME, 1280, 720, STILL_COLOR_SPACE)?;
                }
                let asset =
                    tx.create_asset(&asset_id, &abs, &base_name, &display_duration, &format_id)?;
                tx.commit()?;
                (asset.id, asset.name)
            }
        }
    };

    let seq = doc.sequence_mut().ok_or(Error::NoSequence)?;
    let offset = timeline::insertion_offset_ticks(&seq.spine)?;
    let video = Video {
        ref_id: asset_id,
        offset: timing::format_ticks(offset),
        name: asset_name,
        start: Some(STILL_START.to_string()),
        duration: display_duration,
        ..Video::default()
    };
    timeline::append_child(&mut seq.spine, SpineChild::Video(video));
    seq.duration = timing::format_ticks(timeline::total_duration_ticks(&seq.spine)?);
    Ok(())
}

/// Stack text overlays over the clip covering `offset_seconds`.
///
/// The "Text" effect is created on first use and shared afterwards.
/// Overlays nest inside the targeted clip and do not extend the
/// sequence duration.
pub fn add_text_overlays(doc: &mut Fcpxml, lines: &[String], offset_seconds: f64) -> Result<()> {
    let lines: Vec<&str> = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return Err(Error::InvalidInput("no text lines to add".to_string()));
    }
    doc.sequence().ok_or(Error::NoSequence)?;

    let effect_id = {
        let registry = ResourceRegistry::new(doc);
        match registry.find_effect_by_name(TEXT_EFFECT_NAME) {
            Some(effect) => effect.id,
            None => {
                let mut tx = ResourceTransaction::new(&registry);
                let id = tx.reserve_ids(1)?.remove(0);
                tx.create_effect(&id, TEXT_EFFECT_NAME, TEXT_EFFECT_UID)?;
                tx.commit()?;
                id
            }
        }
    };

    let target_ticks = timing::seconds_to_frames(offset_seconds) * timing::FRAME_TICKS;
    let seq = doc.sequence_mut().ok_or(Error::NoSequence)?;
    let video = timeline::overlay_target(&mut seq.spine, target_ticks).ok_or_else(|| {
        Error::InvalidInput("no clip on the spine to attach text overlays to".to_string())
    })?;

    let base_start = video
        .start
        .as_deref()
        .map(timing::ticks_or_zero)
        .unwrap_or(0);
    let duration = timing::seconds_to_duration(DEFAULT_DURATION_SECONDS);

    for (i, line) in lines.iter().enumerate() {
        let context = format!("line_{i}_offset_{offset_seconds:.1}");
        let title = timeline::staggered_title(
            line,
            i,
            lines.len(),
            &effect_id,
            &context,
            base_start,
            &duration,
        );
        video.nested_titles.push(title);
    }
    Ok(())
}

/// Add a video with a synchronized audio track as a compound clip.
///
/// One transaction creates the video asset, the audio asset, and the
/// compound media wrapping them, then a `ref-clip` places the bundle on
/// the spine. The clip runs for the audio's length.
pub fn add_clip_with_audio(
    doc: &mut Fcpxml,
    video_path: &Path,
    audio_path: &Path,
    audio_seconds: f64,
) -> Result<()> {
    let video_abs = absolute_path(video_path)?;
    if !video_abs.exists() {
        return Err(Error::MissingFile(video_abs));
    }
    let audio_abs = absolute_path(audio_path)?;
    if !audio_abs.exists() {
        return Err(Error::MissingFile(audio_abs));
    }
    let base = base_name(&video_abs)?;
    let duration = timing::seconds_to_duration(audio_seconds);
    let seq_format = doc.sequence().ok_or(Error::NoSequence)?.format.clone();

    let media_id = {
        let registry = ResourceRegistry::new(doc);
        let mut tx = ResourceTransaction::new(&registry);
        let reserved = tx.reserve_ids(3)?;
        let (video_id, audio_id, media_id) = (&reserved[0], &reserved[1], &reserved[2]);

        tx.create_asset(video_id, &video_abs, &base, &duration, &seq_format)?;
        tx.create_asset(audio_id, &audio_abs, &base, &duration, &seq_format)?;
        tx.create_compound_media(media_id, &base, &duration, video_id, audio_id, &seq_format)?;
        tx.commit()?;
        media_id.clone()
    };

    let seq = doc.sequence_mut().ok_or(Error::NoSequence)?;
    let offset = timeline::insertion_offset_ticks(&seq.spine)?;
    let ref_clip = RefClip {
        ref_id: media_id,
        offset: timing::format_ticks(offset),
        name: format!("{base} Clip"),
        duration,
        ..RefClip::default()
    };
    timeline::append_child(&mut seq.spine, SpineChild::RefClip(ref_clip));
    seq.duration = timing::format_ticks(timeline::total_duration_ticks(&seq.spine)?);
    Ok(())
}

/// Attach a one-second slide-in animation to the clip covering
/// `offset_seconds`.
pub fn add_slide_animation(doc: &mut Fcpxml, offset_seconds: f64) -> Result<()> {
    let target_ticks = timing::seconds_to_frames(offset_seconds) * timing::FRAME_TICKS;
    let seq = doc.sequence_mut().ok_or(Error::NoSequence)?;
    let video = timeline::overlay_target(&mut seq.spine, target_ticks).ok_or_else(|| {
        Error::InvalidInput(format!("no clip found at {offset_seconds} seconds"))
    })?;

    if let Some(transform) = &video.adjust_transform {
        let already_sliding = transform
            .params
            .iter()
            .any(|p| p.name == "position" && p.keyframe_animation.is_some());
        if already_sliding {
            return Err(Error::InvalidInput(format!(
                "clip '{}' already has a slide animation",
                video.name
            )));
        }
    }

    if video.start.is_none() {
        video.start = Some(STILL_START.to_string());
    }
    let start_ticks = timing::ticks_or_zero(video.start.as_deref().unwrap_or("0s"));
    video.adjust_transform = Some(slide_transform(start_ticks));
    Ok(())
}

/// Keyframed transform sliding a clip from rest to `51.3109 0` over the
/// first second. Anchor/rotation/scale pin their defaults with a single
/// linear keyframe at the end time.
fn slide_transform(start_ticks: i64) -> AdjustTransform {
    let end_ticks = start_ticks + timing::ONE_SECOND_TICKS;
    let start_time = timing::format_ticks(start_ticks);
    let end_time = timing::format_ticks(end_ticks);

    let pinned = |name: &str, value: &str| Param {
        name: name.to_string(),
        keyframe_animation: Some(KeyframeAnimation {
            keyframes: vec![Keyframe {
                time: end_time.clone(),
                value: value.to_string(),
                curve: Some("linear".to_string()),
            }],
        }),
        ..Param::default()
    };

    AdjustTransform {
        position: None,
        scale: None,
        params: vec![
            pinned("anchor", "0 0"),
            Param {
                name: "position".to_string(),
                keyframe_animation: Some(KeyframeAnimation {
                    keyframes: vec![
                        Keyframe {
                            time: start_time,
                            value: "0 0".to_string(),
                            curve: None,
                        },
                        Keyframe {
                            time: end_time.clone(),
                            value: "51.3109 0".to_string(),
                            curve: None,
                        },
                    ],
                }),
                ..Param::default()
            },
            pinned("rotation", "0"),
            pinned("scale", "1 1"),
        ],
    }
}

fn standard_smart_collections() -> Vec<SmartCollection> {
    fn media_rule(kind: &str) -> MatchRule {
        MatchRule {
            rule: "is".to_string(),
            kind: kind.to_string(),
        }
    }

    vec![
        SmartCollection {
            name: "Projects".to_string(),
            match_kind: "all".to_string(),
            clip_matches: vec![MatchRule {
                rule: "is".to_string(),
                kind: "project".to_string(),
            }],
            ..SmartCollection::default()
        },
        SmartCollection {
            name: "All Video".to_string(),
            match_kind: "any".to_string(),
            media_matches: vec![media_rule("videoOnly"), media_rule("videoWithAudio")],
            ..SmartCollection::default()
        },
        SmartCollection {
            name: "Audio Only".to_string(),
            match_kind: "all".to_string(),
            media_matches: vec![media_rule("audioOnly")],
            ..SmartCollection::default()
        },
        SmartCollection {
            name: "Stills".to_string(),
            match_kind: "all".to_string(),
            media_matches: vec![media_rule("stills")],
            ..SmartCollection::default()
        },
        SmartCollection {
            name: "Favorites".to_string(),
            match_kind: "all".to_string(),
            rating_matches: vec![RatingRule {
                value: "favorites".to_string(),
            }],
            ..SmartCollection::default()
        },
    ]
}

fn base_name(path: &Path) -> Result<String> {
    Ok(path
        .file_stem()
        .ok_or_else(|| Error::InvalidInput(format!("no file name in {}", path.display())))?
        .to_string_lossy()
        .to_string())
}
