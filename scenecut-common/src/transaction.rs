//! Transactional resource creation
//!
//! A transaction reserves IDs up front, builds typed resources that may
//! reference each other (a compound clip needs a video asset, an audio
//! asset, and a media wrapper committed together), and registers the
//! whole batch atomically. Rollback discards pending resources; the IDs
//! it reserved stay consumed, trading a little ID-space leakage for
//! never having to un-reserve.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{
    Asset, AssetClip, Effect, Format, Media, MediaKind, MediaRep, Sequence, Spine, SpineChild,
    Video,
};
use crate::registry::ResourceRegistry;

/// Video element `start` inside compound-clip media. A consumer
/// convention for compound sync anchors; fixed data, not computed.
pub const COMPOUND_VIDEO_START: &str = "86399313/24000s";

/// Offset of the audio lane inside compound-clip media, in the consumer's
/// 8000-denominator spelling of the same anchor instant.
pub const COMPOUND_AUDIO_OFFSET: &str = "28799771/8000s";

/// Pending resources, tagged by kind so commit dispatch is exhaustive.
enum PendingResource {
    Asset(Asset),
    Format(Format),
    Effect(Effect),
    Media(Media),
}

/// A short-lived batch of resource creations against one registry.
pub struct ResourceTransaction<'r, 'a> {
    registry: &'r ResourceRegistry<'a>,
    reserved: Vec<String>,
    pending: Vec<PendingResource>,
    rolled_back: bool,
}

impl<'r, 'a> ResourceTransaction<'r, 'a> {
    pub fn new(registry: &'r ResourceRegistry<'a>) -> ResourceTransaction<'r, 'a> {
        ResourceTransaction {
            registry,
            reserved: Vec::new(),
            pending: Vec::new(),
            rolled_back: false,
        }
    }

    fn guard(&self) -> Result<()> {
        if self.rolled_back {
            Err(Error::TransactionRolledBack)
        } else {
            Ok(())
        }
    }

    /// Reserve `count` IDs from the registry for use in this batch.
    pub fn reserve_ids(&mut self, count: usize) -> Result<Vec<String>> {
        self.guard()?;
        let ids = self.registry.reserve_ids(count);
        self.reserved.extend(ids.iter().cloned());
        Ok(ids)
    }

    /// Build a pending asset for a source file.
    ///
    /// File-kind rules:
    /// - still image: duration forced to `"0s"` whatever the caller
    ///   passed (display length belongs on the timeline placement),
    ///   `videoSources="1"`, no audio fields;
    /// - audio-only: video flag cleared, stereo 48 kHz audio fields,
    ///   caller duration kept;
    /// - video: both video and audio property sets, caller duration kept.
    pub fn create_asset(
        &mut self,
        id: &str,
        file_path: &Path,
        display_name: &str,
        duration: &str,
        format_id: &str,
    ) -> Result<Asset> {
        self.guard()?;
        let abs = absolute_path(file_path)?;
        let file_name = abs
            .file_name()
            .ok_or_else(|| Error::InvalidInput(format!("no file name in {}", abs.display())))?
            .to_string_lossy()
            .to_string();
        let uid = self.registry.uid_for(&file_name);

        let mut asset = Asset {
            id: id.to_string(),
            name: display_name.to_string(),
            uid: uid.clone(),
            start: "0s".to_string(),
            has_video: true,
            format: format_id.to_string(),
            video_sources: None,
            has_audio: false,
            audio_sources: None,
            audio_channels: None,
            audio_rate: None,
            duration: duration.to_string(),
            media_rep: MediaRep {
                kind: "original-media".to_string(),
                sig: uid,
                src: format!("file://{}", abs.display()),
                bookmark: None,
            },
        };

        match MediaKind::from_path(&abs) {
            MediaKind::Image => {
                asset.duration = "0s".to_string();
                asset.video_sources = Some("1".to_string());
            }
            MediaKind::Audio => {
                asset.has_video = false;
                asset.has_audio = true;
                asset.audio_sources = Some("1".to_string());
                asset.audio_channels = Some("2".to_string());
                asset.audio_rate = Some("48000".to_string());
            }
            MediaKind::Video => {
                asset.has_audio = true;
                asset.audio_sources = Some("1".to_string());
                asset.audio_channels = Some("2".to_string());
                asset.audio_rate = Some("48000".to_string());
            }
        }

        self.pending.push(PendingResource::Asset(asset.clone()));
        Ok(asset)
    }

    /// Build a pending format.
    ///
    /// No frame duration is set here: only sequence formats carry one,
    /// and still-image formats must not (a still format with a frame
    /// rate crashes the consumer's preflight check).
    pub fn create_format(
        &mut self,
        id: &str,
        name: &str,
        width: u32,
        height: u32,
        color_space: &str,
    ) -> Result<Format> {
        self.guard()?;
        let format = Format {
            id: id.to_string(),
            name: name.to_string(),
            frame_duration: None,
            width,
            height,
            color_space: color_space.to_string(),
        };
        self.pending.push(PendingResource::Format(format.clone()));
        Ok(format)
    }

    /// Build a pending effect from a well-known template UID.
    pub fn create_effect(&mut self, id: &str, name: &str, template_uid: &str) -> Result<Effect> {
        self.guard()?;
        let effect = Effect {
            id: id.to_string(),
            name: name.to_string(),
            uid: Some(template_uid.to_string()),
        };
        self.pending.push(PendingResource::Effect(effect.clone()));
        Ok(effect)
    }

    /// Build pending compound-clip media bundling a video and an audio
    /// asset behind one reference.
    ///
    /// The internal spine places the video reference at offset zero with
    /// the fixed sync-anchor `start`, and the audio reference nested on
    /// lane -1 at the matching fixed offset.
    pub fn create_compound_media(
        &mut self,
        id: &str,
        display_name: &str,
        duration: &str,
        video_asset_id: &str,
        audio_asset_id: &str,
        format_id: &str,
    ) -> Result<Media> {
        self.guard()?;
        let uid = self
            .registry
            .uid_for(&format!("{display_name}_compound"));

        let audio_clip = AssetClip {
            ref_id: audio_asset_id.to_string(),
            lane: Some(-1),
            offset: COMPOUND_AUDIO_OFFSET.to_string(),
            name: display_name.to_string(),
            duration: duration.to_string(),
            format: Some(format_id.to_string()),
            tc_format: Some("NDF".to_string()),
            audio_role: Some("dialogue".to_string()),
            ..AssetClip::default()
        };

        let video = Video {
            ref_id: video_asset_id.to_string(),
            offset: "0s".to_string(),
            name: display_name.to_string(),
            start: Some(COMPOUND_VIDEO_START.to_string()),
            duration: duration.to_string(),
            nested_asset_clips: vec![audio_clip],
            ..Video::default()
        };

        let media = Media {
            id: id.to_string(),
            name: format!("{display_name} Clip"),
            uid,
            mod_date: Some(chrono::Local::now().format("%Y-%m-%d %H:%M:%S %z").to_string()),
            sequence: Sequence {
                format: format_id.to_string(),
                duration: duration.to_string(),
                tc_start: "0s".to_string(),
                tc_format: "NDF".to_string(),
                audio_layout: "stereo".to_string(),
                audio_rate: "48k".to_string(),
                spine: Spine {
                    children: vec![SpineChild::Video(video)],
                },
            },
        };

        self.pending.push(PendingResource::Media(media.clone()));
        Ok(media)
    }

    /// Register every pending resource with the registry.
    pub fn commit(&mut self) -> Result<()> {
        self.guard()?;
        let count = self.pending.len();
        for resource in self.pending.drain(..) {
            match resource {
                PendingResource::Asset(a) => self.registry.register_asset(a),
                PendingResource::Format(f) => self.registry.register_format(f),
                PendingResource::Effect(e) => self.registry.register_effect(e),
                PendingResource::Media(m) => self.registry.register_media(m),
            }
        }
        debug!(count, "transaction committed");
        Ok(())
    }

    /// Discard pending resources without registering them. Reserved IDs
    /// remain consumed.
    pub fn rollback(&mut self) {
        self.rolled_back = true;
        self.pending.clear();
        debug!(reserved = self.reserved.len(), "transaction rolled back");
    }
}

/// Absolute form of a path without resolving symlinks, so the emitted
/// `file://` locator matches what the user pointed at.
pub(crate) fn absolute_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
