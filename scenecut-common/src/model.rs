//! Typed document model for FCPXML
//!
//! The whole document is an owned tree: a resources section plus the
//! library → event → project → sequence → spine hierarchy. Every edit
//! operates on this tree; markup exists only at the serializer boundary.
//! Spine children of all variants live in one ordered list so that no
//! code path can interleave per-variant collections out of order.

use std::path::Path;

/// Root aggregate: one FCPXML document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fcpxml {
    pub version: String,
    pub resources: Resources,
    pub library: Library,
}

impl Fcpxml {
    /// First sequence of the first project, where timeline edits land.
    pub fn sequence(&self) -> Option<&Sequence> {
        self.library
            .events
            .first()?
            .projects
            .first()?
            .sequences
            .first()
    }

    pub fn sequence_mut(&mut self) -> Option<&mut Sequence> {
        self.library
            .events
            .first_mut()?
            .projects
            .first_mut()?
            .sequences
            .first_mut()
    }
}

/// The four resource collections. IDs are unique across all of them
/// combined — one flat namespace, never per-collection counters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resources {
    pub assets: Vec<Asset>,
    pub formats: Vec<Format>,
    pub effects: Vec<Effect>,
    pub media: Vec<Media>,
}

impl Resources {
    pub fn count(&self) -> usize {
        self.assets.len() + self.formats.len() + self.effects.len() + self.media.len()
    }
}

/// A reference to one piece of source media.
///
/// The UID is permanent identity: it must be identical in every document
/// that references the same source file, and still-image assets always
/// carry duration `"0s"` — display length belongs to the timeline
/// placement, not to the asset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Asset {
    pub id: String,
    pub name: String,
    pub uid: String,
    pub start: String,
    pub has_video: bool,
    pub format: String,
    pub video_sources: Option<String>,
    pub has_audio: bool,
    pub audio_sources: Option<String>,
    pub audio_channels: Option<String>,
    pub audio_rate: Option<String>,
    pub duration: String,
    pub media_rep: MediaRep,
}

/// Location record for an asset's backing file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MediaRep {
    pub kind: String,
    pub sig: String,
    pub src: String,
    /// macOS security-scoped bookmark, optional and best-effort.
    pub bookmark: Option<String>,
}

/// A frame geometry/rate profile, shared by reference.
///
/// Sequence formats always carry `frame_duration`; still-image formats
/// must omit it (the consumer crashes on stills with a frame rate).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Format {
    pub id: String,
    pub name: String,
    pub frame_duration: Option<String>,
    pub width: u32,
    pub height: u32,
    pub color_space: String,
}

/// A built-in title/generator template, identified by a well-known UID.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Effect {
    pub id: String,
    pub name: String,
    pub uid: Option<String>,
}

/// Compound-clip media: a resource owning its own nested sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Media {
    pub id: String,
    pub name: String,
    pub uid: String,
    pub mod_date: Option<String>,
    pub sequence: Sequence,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Library {
    pub location: Option<String>,
    pub events: Vec<LibraryEvent>,
    pub smart_collections: Vec<SmartCollection>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LibraryEvent {
    pub name: String,
    pub uid: Option<String>,
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Project {
    pub name: String,
    pub uid: Option<String>,
    pub mod_date: Option<String>,
    pub sequences: Vec<Sequence>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sequence {
    pub format: String,
    pub duration: String,
    pub tc_start: String,
    pub tc_format: String,
    pub audio_layout: String,
    pub audio_rate: String,
    pub spine: Spine,
}

/// The ordered top-level timeline track.
///
/// Children must serialize in non-decreasing offset order regardless of
/// insertion order; [`crate::timeline::append_child`] keeps the list
/// sorted and the serializer re-sorts defensively on write.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Spine {
    pub children: Vec<SpineChild>,
}

/// One top-level timeline element.
#[derive(Debug, Clone, PartialEq)]
pub enum SpineChild {
    AssetClip(AssetClip),
    Video(Video),
    Title(Title),
    Gap(Gap),
    RefClip(RefClip),
}

impl SpineChild {
    pub fn offset(&self) -> &str {
        match self {
            SpineChild::AssetClip(c) => &c.offset,
            SpineChild::Video(v) => &v.offset,
            SpineChild::Title(t) => &t.offset,
            SpineChild::Gap(g) => &g.offset,
            SpineChild::RefClip(r) => &r.offset,
        }
    }

    pub fn duration(&self) -> &str {
        match self {
            SpineChild::AssetClip(c) => &c.duration,
            SpineChild::Video(v) => &v.duration,
            SpineChild::Title(t) => &t.duration,
            SpineChild::Gap(g) => &g.duration,
            SpineChild::RefClip(r) => &r.duration,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SpineChild::AssetClip(c) => &c.name,
            SpineChild::Video(v) => &v.name,
            SpineChild::Title(t) => &t.name,
            SpineChild::Gap(g) => &g.name,
            SpineChild::RefClip(r) => &r.name,
        }
    }
}

/// A placed media asset with audio (or a nested audio lane element).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssetClip {
    pub ref_id: String,
    pub lane: Option<i32>,
    pub offset: String,
    pub name: String,
    pub start: Option<String>,
    pub duration: String,
    pub format: Option<String>,
    pub tc_format: Option<String>,
    pub audio_role: Option<String>,
    pub adjust_transform: Option<AdjustTransform>,
    pub titles: Vec<Title>,
    pub videos: Vec<Video>,
}

/// A placed generator, shape, or still image. Carries nested children in
/// lanes: positive lanes render in front, negative behind.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Video {
    pub ref_id: String,
    pub lane: Option<i32>,
    pub offset: String,
    pub name: String,
    pub start: Option<String>,
    pub duration: String,
    pub params: Vec<Param>,
    pub adjust_transform: Option<AdjustTransform>,
    pub nested_videos: Vec<Video>,
    pub nested_asset_clips: Vec<AssetClip>,
    pub nested_titles: Vec<Title>,
}

/// A text overlay referencing a title effect.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Title {
    pub ref_id: String,
    pub lane: Option<i32>,
    pub offset: String,
    pub name: String,
    pub start: Option<String>,
    pub duration: String,
    pub params: Vec<Param>,
    pub text: Option<TitleText>,
    pub text_style_def: Option<TextStyleDef>,
}

/// An empty timeline placeholder; may carry title overlays.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Gap {
    pub name: String,
    pub offset: String,
    pub duration: String,
    pub titles: Vec<Title>,
}

/// A placed compound-clip reference.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RefClip {
    pub ref_id: String,
    pub offset: String,
    pub name: String,
    pub duration: String,
    pub adjust_transform: Option<AdjustTransform>,
    pub titles: Vec<Title>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Param {
    pub name: String,
    pub key: Option<String>,
    pub value: Option<String>,
    pub keyframe_animation: Option<KeyframeAnimation>,
    pub params: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyframeAnimation {
    pub keyframes: Vec<Keyframe>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Keyframe {
    pub time: String,
    pub value: String,
    pub curve: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AdjustTransform {
    pub position: Option<String>,
    pub scale: Option<String>,
    pub params: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TitleText {
    pub text_style: TextStyleRef,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextStyleRef {
    pub ref_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextStyleDef {
    pub id: String,
    pub text_style: TextStyle,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextStyle {
    pub font: String,
    pub font_size: String,
    pub font_face: Option<String>,
    pub font_color: String,
    pub bold: Option<String>,
    pub alignment: Option<String>,
    pub line_spacing: Option<String>,
}

/// A library smart collection (part of the standard empty template).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SmartCollection {
    pub name: String,
    pub match_kind: String,
    pub clip_matches: Vec<MatchRule>,
    pub media_matches: Vec<MatchRule>,
    pub rating_matches: Vec<RatingRule>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchRule {
    pub rule: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RatingRule {
    pub value: String,
}

// ============================================================================
// Media kind classification
// ============================================================================

/// Source-file classification driving asset property rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Timeless still image: asset duration is forced to `"0s"`.
    Image,
    /// Audio-only media: no video properties on the asset.
    Audio,
    /// Video (with audio properties assumed present).
    Video,
}

impl MediaKind {
    pub fn from_path(path: &Path) -> MediaKind {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" => MediaKind::Image,
            "wav" | "mp3" | "m4a" | "aac" | "caf" => MediaKind::Audio,
            _ => MediaKind::Video,
        }
    }
}
