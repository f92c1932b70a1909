//! FCPXML serialization
//!
//! Writing walks the typed document tree through an indent-aware event
//! writer — markup never exists as spliced fragments, and spine children
//! are re-sorted by offset at the emission boundary so no storage layout
//! can leak out of temporal order. Reading is the inverse event walk,
//! rebuilding the model with the same attribute coverage the writer
//! emits, which is what makes load + resave idempotent.

use std::path::Path;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event as XmlEvent};
use quick_xml::{Reader, Writer};

use crate::error::{Error, Result};
use crate::model::{
    AdjustTransform, Asset, AssetClip, Effect, Fcpxml, Format, Gap, Keyframe, KeyframeAnimation,
    Library, LibraryEvent, MatchRule, Media, MediaRep, Param, Project, RatingRule, RefClip,
    Resources, Sequence, SmartCollection, Spine, SpineChild, TextStyle, TextStyleDef,
    TextStyleRef, Title, TitleText, Video,
};
use crate::timing;

/// Fixed document preamble; the blank line after the doctype matches the
/// consumer's own export format.
const PREAMBLE: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE fcpxml>\n\n";

type W = Writer<Vec<u8>>;

// ============================================================================
// Public entry points
// ============================================================================

/// Serialize a document to its full on-disk representation.
pub fn document_to_string(doc: &Fcpxml) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
    write_fcpxml(&mut writer, doc)?;
    let body =
        String::from_utf8(writer.into_inner()).map_err(|e| Error::Serialize(e.to_string()))?;
    Ok(format!("{PREAMBLE}{body}"))
}

/// Serialize and write a document to `path`.
pub fn write_document(doc: &Fcpxml, path: &Path) -> Result<()> {
    std::fs::write(path, document_to_string(doc)?)?;
    Ok(())
}

/// Parse a document from its textual representation.
pub fn document_from_str(xml: &str) -> Result<Fcpxml> {
    let mut reader = Reader::from_str(xml);
    loop {
        match read(&mut reader)? {
            XmlEvent::Start(e) if e.name().as_ref() == b"fcpxml" => {
                return parse_fcpxml(&mut reader, &e);
            }
            XmlEvent::Eof => return Err(Error::Parse("missing fcpxml root element".to_string())),
            _ => {}
        }
    }
}

/// Read and parse a document from `path`.
pub fn read_document(path: &Path) -> Result<Fcpxml> {
    let text = std::fs::read_to_string(path)?;
    document_from_str(&text)
}

// ============================================================================
// Writer
// ============================================================================

fn emit(w: &mut W, event: XmlEvent) -> Result<()> {
    w.write_event(event)
        .map_err(|e| Error::Serialize(e.to_string()))
}

fn emit_start(w: &mut W, el: BytesStart) -> Result<()> {
    emit(w, XmlEvent::Start(el))
}

fn emit_empty(w: &mut W, el: BytesStart) -> Result<()> {
    emit(w, XmlEvent::Empty(el))
}

fn emit_end(w: &mut W, name: &str) -> Result<()> {
    emit(w, XmlEvent::End(BytesEnd::new(name)))
}

fn write_fcpxml(w: &mut W, doc: &Fcpxml) -> Result<()> {
    let mut el = BytesStart::new("fcpxml");
    el.push_attribute(("version", doc.version.as_str()));
    emit_start(w, el)?;
    write_resources(w, &doc.resources)?;
    write_library(w, &doc.library)?;
    emit_end(w, "fcpxml")
}

fn write_resources(w: &mut W, resources: &Resources) -> Result<()> {
    if resources.count() == 0 {
        return emit_empty(w, BytesStart::new("resources"));
    }
    emit_start(w, BytesStart::new("resources"))?;
    for asset in &resources.assets {
        write_asset(w, asset)?;
    }
    for format in &resources.formats {
        write_format(w, format)?;
    }
    for effect in &resources.effects {
        write_effect(w, effect)?;
    }
    for media in &resources.media {
        write_media(w, media)?;
    }
    emit_end(w, "resources")
}

fn write_asset(w: &mut W, asset: &Asset) -> Result<()> {
    let mut el = BytesStart::new("asset");
    el.push_attribute(("id", asset.id.as_str()));
    el.push_attribute(("name", asset.name.as_str()));
    el.push_attribute(("uid", asset.uid.as_str()));
    el.push_attribute(("start", asset.start.as_str()));
    if asset.has_video {
        el.push_attribute(("hasVideo", "1"));
    }
    el.push_attribute(("format", asset.format.as_str()));
    if let Some(v) = &asset.video_sources {
        el.push_attribute(("videoSources", v.as_str()));
    }
    if asset.has_audio {
        el.push_attribute(("hasAudio", "1"));
    }
    if let Some(v) = &asset.audio_sources {
        el.push_attribute(("audioSources", v.as_str()));
    }
    if let Some(v) = &asset.audio_channels {
        el.push_attribute(("audioChannels", v.as_str()));
    }
    if let Some(v) = &asset.audio_rate {
        el.push_attribute(("audioRate", v.as_str()));
    }
    el.push_attribute(("duration", asset.duration.as_str()));
    emit_start(w, el)?;
    write_media_rep(w, &asset.media_rep)?;
    emit_end(w, "asset")
}

fn write_media_rep(w: &mut W, rep: &MediaRep) -> Result<()> {
    let mut el = BytesStart::new("media-rep");
    el.push_attribute(("kind", rep.kind.as_str()));
    el.push_attribute(("sig", rep.sig.as_str()));
    el.push_attribute(("src", rep.src.as_str()));
    match &rep.bookmark {
        None => emit_empty(w, el),
        Some(bookmark) => {
            emit_start(w, el)?;
            emit_start(w, BytesStart::new("bookmark"))?;
            emit(w, XmlEvent::Text(BytesText::new(bookmark)))?;
            emit_end(w, "bookmark")?;
            emit_end(w, "media-rep")
        }
    }
}

fn write_format(w: &mut W, format: &Format) -> Result<()> {
    let mut el = BytesStart::new("format");
    el.push_attribute(("id", format.id.as_str()));
    el.push_attribute(("name", format.name.as_str()));
    if let Some(fd) = &format.frame_duration {
        el.push_attribute(("frameDuration", fd.as_str()));
    }
    if format.width > 0 {
        el.push_attribute(("width", format.width.to_string().as_str()));
    }
    if format.height > 0 {
        el.push_attribute(("height", format.height.to_string().as_str()));
    }
    if !format.color_space.is_empty() {
        el.push_attribute(("colorSpace", format.color_space.as_str()));
    }
    emit_empty(w, el)
}

fn write_effect(w: &mut W, effect: &Effect) -> Result<()> {
    let mut el = BytesStart::new("effect");
    el.push_attribute(("id", effect.id.as_str()));
    el.push_attribute(("name", effect.name.as_str()));
    if let Some(uid) = &effect.uid {
        el.push_attribute(("uid", uid.as_str()));
    }
    emit_empty(w, el)
}

fn write_media(w: &mut W, media: &Media) -> Result<()> {
    let mut el = BytesStart::new("media");
    el.push_attribute(("id", media.id.as_str()));
    el.push_attribute(("name", media.name.as_str()));
    el.push_attribute(("uid", media.uid.as_str()));
    if let Some(mod_date) = &media.mod_date {
        el.push_attribute(("modDate", mod_date.as_str()));
    }
    emit_start(w, el)?;
    write_sequence(w, &media.sequence)?;
    emit_end(w, "media")
}

fn write_library(w: &mut W, library: &Library) -> Result<()> {
    let mut el = BytesStart::new("library");
    if let Some(location) = &library.location {
        el.push_attribute(("location", location.as_str()));
    }
    if library.events.is_empty() && library.smart_collections.is_empty() {
        return emit_empty(w, el);
    }
    emit_start(w, el)?;
    for event in &library.events {
        write_event(w, event)?;
    }
    for collection in &library.smart_collections {
        write_smart_collection(w, collection)?;
    }
    emit_end(w, "library")
}

fn write_event(w: &mut W, event: &LibraryEvent) -> Result<()> {
    let mut el = BytesStart::new("event");
    el.push_attribute(("name", event.name.as_str()));
    if let Some(uid) = &event.uid {
        el.push_attribute(("uid", uid.as_str()));
    }
    emit_start(w, el)?;
    for project in &event.projects {
        write_project(w, project)?;
    }
    emit_end(w, "event")
}

fn write_project(w: &mut W, project: &Project) -> Result<()> {
    let mut el = BytesStart::new("project");
    el.push_attribute(("name", project.name.as_str()));
    if let Some(uid) = &project.uid {
        el.push_attribute(("uid", uid.as_str()));
    }
    if let Some(mod_date) = &project.mod_date {
        el.push_attribute(("modDate", mod_date.as_str()));
    }
    emit_start(w, el)?;
    for sequence in &project.sequences {
        write_sequence(w, sequence)?;
    }
    emit_end(w, "project")
}

fn write_sequence(w: &mut W, sequence: &Sequence) -> Result<()> {
    let mut el = BytesStart::new("sequence");
    el.push_attribute(("format", sequence.format.as_str()));
    el.push_attribute(("duration", sequence.duration.as_str()));
    el.push_attribute(("tcStart", sequence.tc_start.as_str()));
    el.push_attribute(("tcFormat", sequence.tc_format.as_str()));
    el.push_attribute(("audioLayout", sequence.audio_layout.as_str()));
    el.push_attribute(("audioRate", sequence.audio_rate.as_str()));
    emit_start(w, el)?;
    write_spine(w, &sequence.spine)?;
    emit_end(w, "sequence")
}

fn write_spine(w: &mut W, spine: &Spine) -> Result<()> {
    if spine.children.is_empty() {
        return emit_empty(w, BytesStart::new("spine"));
    }
    emit_start(w, BytesStart::new("spine"))?;

    // Emit in chronological order whatever order the children arrived in
    let mut order: Vec<usize> = (0..spine.children.len()).collect();
    order.sort_by_key(|&i| timing::ticks_or_zero(spine.children[i].offset()));

    for i in order {
        match &spine.children[i] {
            SpineChild::AssetClip(clip) => write_asset_clip(w, clip)?,
            SpineChild::Video(video) => write_video(w, video)?,
            SpineChild::Title(title) => write_title(w, title)?,
            SpineChild::Gap(gap) => write_gap(w, gap)?,
            SpineChild::RefClip(ref_clip) => write_ref_clip(w, ref_clip)?,
        }
    }
    emit_end(w, "spine")
}

fn write_asset_clip(w: &mut W, clip: &AssetClip) -> Result<()> {
    let mut el = BytesStart::new("asset-clip");
    el.push_attribute(("ref", clip.ref_id.as_str()));
    if let Some(lane) = clip.lane {
        el.push_attribute(("lane", lane.to_string().as_str()));
    }
    el.push_attribute(("offset", clip.offset.as_str()));
    el.push_attribute(("name", clip.name.as_str()));
    if let Some(start) = &clip.start {
        el.push_attribute(("start", start.as_str()));
    }
    el.push_attribute(("duration", clip.duration.as_str()));
    if let Some(format) = &clip.format {
        el.push_attribute(("format", format.as_str()));
    }
    if let Some(tc_format) = &clip.tc_format {
        el.push_attribute(("tcFormat", tc_format.as_str()));
    }
    if let Some(audio_role) = &clip.audio_role {
        el.push_attribute(("audioRole", audio_role.as_str()));
    }

    if clip.adjust_transform.is_none() && clip.titles.is_empty() && clip.videos.is_empty() {
        return emit_empty(w, el);
    }
    emit_start(w, el)?;
    if let Some(transform) = &clip.adjust_transform {
        write_adjust_transform(w, transform)?;
    }
    for title in &clip.titles {
        write_title(w, title)?;
    }
    for video in &clip.videos {
        write_video(w, video)?;
    }
    emit_end(w, "asset-clip")
}

fn write_video(w: &mut W, video: &Video) -> Result<()> {
    let mut el = BytesStart::new("video");
    el.push_attribute(("ref", video.ref_id.as_str()));
    if let Some(lane) = video.lane {
        el.push_attribute(("lane", lane.to_string().as_str()));
    }
    el.push_attribute(("offset", video.offset.as_str()));
    el.push_attribute(("name", video.name.as_str()));
    el.push_attribute(("duration", video.duration.as_str()));
    if let Some(start) = &video.start {
        el.push_attribute(("start", start.as_str()));
    }

    let childless = video.params.is_empty()
        && video.adjust_transform.is_none()
        && video.nested_videos.is_empty()
        && video.nested_asset_clips.is_empty()
        && video.nested_titles.is_empty();
    if childless {
        return emit_empty(w, el);
    }
    emit_start(w, el)?;
    for param in &video.params {
        write_param(w, param)?;
    }
    if let Some(transform) = &video.adjust_transform {
        write_adjust_transform(w, transform)?;
    }
    for nested in &video.nested_videos {
        write_video(w, nested)?;
    }
    for nested in &video.nested_asset_clips {
        write_asset_clip(w, nested)?;
    }
    for nested in &video.nested_titles {
        write_title(w, nested)?;
    }
    emit_end(w, "video")
}

fn write_title(w: &mut W, title: &Title) -> Result<()> {
    let mut el = BytesStart::new("title");
    el.push_attribute(("ref", title.ref_id.as_str()));
    if let Some(lane) = title.lane {
        el.push_attribute(("lane", lane.to_string().as_str()));
    }
    el.push_attribute(("offset", title.offset.as_str()));
    el.push_attribute(("name", title.name.as_str()));
    el.push_attribute(("duration", title.duration.as_str()));
    if let Some(start) = &title.start {
        el.push_attribute(("start", start.as_str()));
    }

    if title.params.is_empty() && title.text.is_none() && title.text_style_def.is_none() {
        return emit_empty(w, el);
    }
    emit_start(w, el)?;
    for param in &title.params {
        write_param(w, param)?;
    }
    if let Some(text) = &title.text {
        write_title_text(w, text)?;
    }
    if let Some(def) = &title.text_style_def {
        write_text_style_def(w, def)?;
    }
    emit_end(w, "title")
}

fn write_gap(w: &mut W, gap: &Gap) -> Result<()> {
    let mut el = BytesStart::new("gap");
    el.push_attribute(("name", gap.name.as_str()));
    el.push_attribute(("offset", gap.offset.as_str()));
    el.push_attribute(("duration", gap.duration.as_str()));
    if gap.titles.is_empty() {
        return emit_empty(w, el);
    }
    emit_start(w, el)?;
    for title in &gap.titles {
        write_title(w, title)?;
    }
    emit_end(w, "gap")
}

fn write_ref_clip(w: &mut W, ref_clip: &RefClip) -> Result<()> {
    let mut el = BytesStart::new("ref-clip");
    el.push_attribute(("ref", ref_clip.ref_id.as_str()));
    el.push_attribute(("offset", ref_clip.offset.as_str()));
    el.push_attribute(("name", ref_clip.name.as_str()));
    el.push_attribute(("duration", ref_clip.duration.as_str()));
    if ref_clip.adjust_transform.is_none() && ref_clip.titles.is_empty() {
        return emit_empty(w, el);
    }
    emit_start(w, el)?;
    if let Some(transform) = &ref_clip.adjust_transform {
        write_adjust_transform(w, transform)?;
    }
    for title in &ref_clip.titles {
        write_title(w, title)?;
    }
    emit_end(w, "ref-clip")
}

fn write_param(w: &mut W, param: &Param) -> Result<()> {
    let mut el = BytesStart::new("param");
    el.push_attribute(("name", param.name.as_str()));
    if let Some(key) = &param.key {
        el.push_attribute(("key", key.as_str()));
    }
    if let Some(value) = &param.value {
        el.push_attribute(("value", value.as_str()));
    }
    if param.keyframe_animation.is_none() && param.params.is_empty() {
        return emit_empty(w, el);
    }
    emit_start(w, el)?;
    if let Some(animation) = &param.keyframe_animation {
        write_keyframe_animation(w, animation)?;
    }
    for nested in &param.params {
        write_param(w, nested)?;
    }
    emit_end(w, "param")
}

fn write_keyframe_animation(w: &mut W, animation: &KeyframeAnimation) -> Result<()> {
    emit_start(w, BytesStart::new("keyframeAnimation"))?;
    for keyframe in &animation.keyframes {
        let mut el = BytesStart::new("keyframe");
        el.push_attribute(("time", keyframe.time.as_str()));
        el.push_attribute(("value", keyframe.value.as_str()));
        if let Some(curve) = &keyframe.curve {
            el.push_attribute(("curve", curve.as_str()));
        }
        emit_empty(w, el)?;
    }
    emit_end(w, "keyframeAnimation")
}

fn write_adjust_transform(w: &mut W, transform: &AdjustTransform) -> Result<()> {
    let mut el = BytesStart::new("adjust-transform");
    if let Some(position) = &transform.position {
        el.push_attribute(("position", position.as_str()));
    }
    if let Some(scale) = &transform.scale {
        el.push_attribute(("scale", scale.as_str()));
    }
    if transform.params.is_empty() {
        return emit_empty(w, el);
    }
    emit_start(w, el)?;
    for param in &transform.params {
        write_param(w, param)?;
    }
    emit_end(w, "adjust-transform")
}

fn write_title_text(w: &mut W, text: &TitleText) -> Result<()> {
    emit_start(w, BytesStart::new("text"))?;
    let mut el = BytesStart::new("text-style");
    el.push_attribute(("ref", text.text_style.ref_id.as_str()));
    emit_start(w, el)?;
    emit(w, XmlEvent::Text(BytesText::new(&text.text_style.text)))?;
    emit_end(w, "text-style")?;
    emit_end(w, "text")
}

fn write_text_style_def(w: &mut W, def: &TextStyleDef) -> Result<()> {
    let mut el = BytesStart::new("text-style-def");
    el.push_attribute(("id", def.id.as_str()));
    emit_start(w, el)?;

    let style = &def.text_style;
    let mut style_el = BytesStart::new("text-style");
    style_el.push_attribute(("font", style.font.as_str()));
    style_el.push_attribute(("fontSize", style.font_size.as_str()));
    if let Some(face) = &style.font_face {
        style_el.push_attribute(("fontFace", face.as_str()));
    }
    style_el.push_attribute(("fontColor", style.font_color.as_str()));
    if let Some(bold) = &style.bold {
        style_el.push_attribute(("bold", bold.as_str()));
    }
    if let Some(alignment) = &style.alignment {
        style_el.push_attribute(("alignment", alignment.as_str()));
    }
    if let Some(spacing) = &style.line_spacing {
        style_el.push_attribute(("lineSpacing", spacing.as_str()));
    }
    emit_empty(w, style_el)?;
    emit_end(w, "text-style-def")
}

fn write_smart_collection(w: &mut W, collection: &SmartCollection) -> Result<()> {
    let mut el = BytesStart::new("smart-collection");
    el.push_attribute(("name", collection.name.as_str()));
    el.push_attribute(("match", collection.match_kind.as_str()));
    emit_start(w, el)?;
    for rule in &collection.clip_matches {
        let mut rule_el = BytesStart::new("match-clip");
        rule_el.push_attribute(("rule", rule.rule.as_str()));
        rule_el.push_attribute(("type", rule.kind.as_str()));
        emit_empty(w, rule_el)?;
    }
    for rule in &collection.media_matches {
        let mut rule_el = BytesStart::new("match-media");
        rule_el.push_attribute(("rule", rule.rule.as_str()));
        rule_el.push_attribute(("type", rule.kind.as_str()));
        emit_empty(w, rule_el)?;
    }
    for rule in &collection.rating_matches {
        let mut rule_el = BytesStart::new("match-ratings");
        rule_el.push_attribute(("value", rule.value.as_str()));
        emit_empty(w, rule_el)?;
    }
    emit_end(w, "smart-collection")
}

// ============================================================================
// Reader
// ============================================================================

fn read<'a>(reader: &mut Reader<&'a [u8]>) -> Result<XmlEvent<'a>> {
    reader
        .read_event()
        .map_err(|e| Error::Parse(e.to_string()))
}

/// Consume and discard an element this model does not understand.
fn skip(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<()> {
    let end = start.to_end().into_owned();
    reader
        .read_to_end(end.name())
        .map_err(|e| Error::Parse(e.to_string()))?;
    Ok(())
}

fn attr(el: &BytesStart, name: &str) -> Result<Option<String>> {
    for attribute in el.attributes() {
        let attribute = attribute.map_err(|e| Error::Parse(e.to_string()))?;
        if attribute.key.as_ref() == name.as_bytes() {
            let value = attribute
                .unescape_value()
                .map_err(|e| Error::Parse(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn req_attr(el: &BytesStart, name: &str) -> Result<String> {
    attr(el, name)?.ok_or_else(|| {
        Error::Parse(format!(
            "missing attribute {name} on <{}>",
            String::from_utf8_lossy(el.name().as_ref())
        ))
    })
}

fn lane_attr(el: &BytesStart) -> Result<Option<i32>> {
    attr(el, "lane")?
        .map(|v| {
            v.parse::<i32>()
                .map_err(|_| Error::Parse(format!("invalid lane value: {v}")))
        })
        .transpose()
}

fn dim_attr(el: &BytesStart, name: &str) -> Result<u32> {
    match attr(el, name)? {
        None => Ok(0),
        Some(v) => v
            .parse::<u32>()
            .map_err(|_| Error::Parse(format!("invalid {name} value: {v}"))),
    }
}

fn parse_fcpxml(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<Fcpxml> {
    let mut doc = Fcpxml {
        version: attr(start, "version")?.unwrap_or_default(),
        ..Fcpxml::default()
    };
    loop {
        match read(reader)? {
            XmlEvent::Start(e) => match e.name().as_ref() {
                b"resources" => doc.resources = parse_resources(reader)?,
                b"library" => doc.library = parse_library(reader, &e)?,
                _ => skip(reader, &e)?,
            },
            XmlEvent::Empty(e) => {
                if e.name().as_ref() == b"library" {
                    doc.library.location = attr(&e, "location")?;
                }
            }
            XmlEvent::End(e) if e.name().as_ref() == b"fcpxml" => break,
            XmlEvent::Eof => return Err(Error::Parse("unexpected end of document".to_string())),
            _ => {}
        }
    }
    Ok(doc)
}

fn parse_resources(reader: &mut Reader<&[u8]>) -> Result<Resources> {
    let mut resources = Resources::default();
    loop {
        match read(reader)? {
            XmlEvent::Start(e) => match e.name().as_ref() {
                b"asset" => resources.assets.push(parse_asset(reader, &e, false)?),
                b"format" => {
                    resources.formats.push(parse_format(&e)?);
                    skip(reader, &e)?;
                }
                b"effect" => {
                    resources.effects.push(parse_effect(&e)?);
                    skip(reader, &e)?;
                }
                b"media" => resources.media.push(parse_media(reader, &e)?),
                _ => skip(reader, &e)?,
            },
            XmlEvent::Empty(e) => match e.name().as_ref() {
                b"asset" => resources.assets.push(parse_asset(reader, &e, true)?),
                b"format" => resources.formats.push(parse_format(&e)?),
                b"effect" => resources.effects.push(parse_effect(&e)?),
                _ => {}
            },
            XmlEvent::End(e) if e.name().as_ref() == b"resources" => break,
            XmlEvent::Eof => return Err(Error::Parse("unexpected end of resources".to_string())),
            _ => {}
        }
    }
    Ok(resources)
}

fn parse_asset(reader: &mut Reader<&[u8]>, start: &BytesStart, empty: bool) -> Result<Asset> {
    let mut asset = Asset {
        id: req_attr(start, "id")?,
        name: attr(start, "name")?.unwrap_or_default(),
        uid: attr(start, "uid")?.unwrap_or_default(),
        start: attr(start, "start")?.unwrap_or_else(|| "0s".to_string()),
        has_video: attr(start, "hasVideo")?.as_deref() == Some("1"),
        format: attr(start, "format")?.unwrap_or_default(),
        video_sources: attr(start, "videoSources")?,
        has_audio: attr(start, "hasAudio")?.as_deref() == Some("1"),
        audio_sources: attr(start, "audioSources")?,
        audio_channels: attr(start, "audioChannels")?,
        audio_rate: attr(start, "audioRate")?,
        duration: attr(start, "duration")?.unwrap_or_else(|| "0s".to_string()),
        media_rep: MediaRep::default(),
    };
    if empty {
        return Ok(asset);
    }
    loop {
        match read(reader)? {
            XmlEvent::Start(e) => match e.name().as_ref() {
                b"media-rep" => asset.media_rep = parse_media_rep(reader, &e, false)?,
                _ => skip(reader, &e)?,
            },
            XmlEvent::Empty(e) => {
                if e.name().as_ref() == b"media-rep" {
                    asset.media_rep = parse_media_rep(reader, &e, true)?;
                }
            }
            XmlEvent::End(e) if e.name().as_ref() == b"asset" => break,
            XmlEvent::Eof => return Err(Error::Parse("unexpected end of asset".to_string())),
            _ => {}
        }
    }
    Ok(asset)
}

fn parse_media_rep(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart,
    empty: bool,
) -> Result<MediaRep> {
    let mut rep = MediaRep {
        kind: attr(start, "kind")?.unwrap_or_default(),
        sig: attr(start, "sig")?.unwrap_or_default(),
        src: attr(start, "src")?.unwrap_or_default(),
        bookmark: None,
    };
    if empty {
        return Ok(rep);
    }
    loop {
        match read(reader)? {
            XmlEvent::Start(e) => match e.name().as_ref() {
                b"bookmark" => rep.bookmark = Some(parse_text_content(reader, "bookmark")?),
                _ => skip(reader, &e)?,
            },
            XmlEvent::End(e) if e.name().as_ref() == b"media-rep" => break,
            XmlEvent::Eof => return Err(Error::Parse("unexpected end of media-rep".to_string())),
            _ => {}
        }
    }
    Ok(rep)
}

fn parse_format(el: &BytesStart) -> Result<Format> {
    Ok(Format {
        id: req_attr(el, "id")?,
        name: attr(el, "name")?.unwrap_or_default(),
        frame_duration: attr(el, "frameDuration")?,
        width: dim_attr(el, "width")?,
        height: dim_attr(el, "height")?,
        color_space: attr(el, "colorSpace")?.unwrap_or_default(),
    })
}

fn parse_effect(el: &BytesStart) -> Result<Effect> {
    Ok(Effect {
        id: req_attr(el, "id")?,
        name: attr(el, "name")?.unwrap_or_default(),
        uid: attr(el, "uid")?,
    })
}

fn parse_media(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<Media> {
    let mut media = Media {
        id: req_attr(start, "id")?,
        name: attr(start, "name")?.unwrap_or_default(),
        uid: attr(start, "uid")?.unwrap_or_default(),
        mod_date: attr(start, "modDate")?,
        sequence: Sequence::default(),
    };
    loop {
        match read(reader)? {
            XmlEvent::Start(e) => match e.name().as_ref() {
                b"sequence" => media.sequence = parse_sequence(reader, &e)?,
                _ => skip(reader, &e)?,
            },
            XmlEvent::End(e) if e.name().as_ref() == b"media" => break,
            XmlEvent::Eof => return Err(Error::Parse("unexpected end of media".to_string())),
            _ => {}
        }
    }
    Ok(media)
}

fn parse_library(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<Library> {
    let mut library = Library {
        location: attr(start, "location")?,
        ..Library::default()
    };
    loop {
        match read(reader)? {
            XmlEvent::Start(e) => match e.name().as_ref() {
                b"event" => library.events.push(parse_event(reader, &e)?),
                b"smart-collection" => library
                    .smart_collections
                    .push(parse_smart_collection(reader, &e)?),
                _ => skip(reader, &e)?,
            },
            XmlEvent::Empty(e) => {
                if e.name().as_ref() == b"smart-collection" {
                    library.smart_collections.push(SmartCollection {
                        name: attr(&e, "name")?.unwrap_or_default(),
                        match_kind: attr(&e, "match")?.unwrap_or_default(),
                        ..SmartCollection::default()
                    });
                }
            }
            XmlEvent::End(e) if e.name().as_ref() == b"library" => break,
            XmlEvent::Eof => return Err(Error::Parse("unexpected end of library".to_string())),
            _ => {}
        }
    }
    Ok(library)
}

fn parse_event(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<LibraryEvent> {
    let mut event = LibraryEvent {
        name: attr(start, "name")?.unwrap_or_default(),
        uid: attr(start, "uid")?,
        projects: Vec::new(),
    };
    loop {
        match read(reader)? {
            XmlEvent::Start(e) => match e.name().as_ref() {
                b"project" => event.projects.push(parse_project(reader, &e)?),
                _ => skip(reader, &e)?,
            },
            XmlEvent::End(e) if e.name().as_ref() == b"event" => break,
            XmlEvent::Eof => return Err(Error::Parse("unexpected end of event".to_string())),
            _ => {}
        }
    }
    Ok(event)
}

fn parse_project(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<Project> {
    let mut project = Project {
        name: attr(start, "name")?.unwrap_or_default(),
        uid: attr(start, "uid")?,
        mod_date: attr(start, "modDate")?,
        sequences: Vec::new(),
    };
    loop {
        match read(reader)? {
            XmlEvent::Start(e) => match e.name().as_ref() {
                b"sequence" => project.sequences.push(parse_sequence(reader, &e)?),
                _ => skip(reader, &e)?,
            },
            XmlEvent::End(e) if e.name().as_ref() == b"project" => break,
            XmlEvent::Eof => return Err(Error::Parse("unexpected end of project".to_string())),
            _ => {}
        }
    }
    Ok(project)
}

fn parse_sequence(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<Sequence> {
    let mut sequence = Sequence {
        format: attr(start, "format")?.unwrap_or_default(),
        duration: attr(start, "duration")?.unwrap_or_else(|| "0s".to_string()),
        tc_start: attr(start, "tcStart")?.unwrap_or_else(|| "0s".to_string()),
        tc_format: attr(start, "tcFormat")?.unwrap_or_default(),
        audio_layout: attr(start, "audioLayout")?.unwrap_or_default(),
        audio_rate: attr(start, "audioRate")?.unwrap_or_default(),
        spine: Spine::default(),
    };
    loop {
        match read(reader)? {
            XmlEvent::Start(e) => match e.name().as_ref() {
                b"spine" => sequence.spine = parse_spine(reader)?,
                _ => skip(reader, &e)?,
            },
            XmlEvent::Empty(e) => {
                if e.name().as_ref() == b"spine" {
                    sequence.spine = Spine::default();
                }
            }
            XmlEvent::End(e) if e.name().as_ref() == b"sequence" => break,
            XmlEvent::Eof => return Err(Error::Parse("unexpected end of sequence".to_string())),
            _ => {}
        }
    }
    Ok(sequence)
}

fn parse_spine(reader: &mut Reader<&[u8]>) -> Result<Spine> {
    let mut spine = Spine::default();
    loop {
        match read(reader)? {
            XmlEvent::Start(e) => match e.name().as_ref() {
                b"asset-clip" => spine
                    .children
                    .push(SpineChild::AssetClip(parse_asset_clip(reader, &e, false)?)),
                b"video" => spine
                    .children
                    .push(SpineChild::Video(parse_video(reader, &e, false)?)),
                b"title" => spine
                    .children
                    .push(SpineChild::Title(parse_title(reader, &e, false)?)),
                b"gap" => spine
                    .children
                    .push(SpineChild::Gap(parse_gap(reader, &e, false)?)),
                b"ref-clip" => spine
                    .children
                    .push(SpineChild::RefClip(parse_ref_clip(reader, &e, false)?)),
                _ => skip(reader, &e)?,
            },
            XmlEvent::Empty(e) => match e.name().as_ref() {
                b"asset-clip" => spine
                    .children
                    .push(SpineChild::AssetClip(parse_asset_clip(reader, &e, true)?)),
                b"video" => spine
                    .children
                    .push(SpineChild::Video(parse_video(reader, &e, true)?)),
                b"title" => spine
                    .children
                    .push(SpineChild::Title(parse_title(reader, &e, true)?)),
                b"gap" => spine
                    .children
                    .push(SpineChild::Gap(parse_gap(reader, &e, true)?)),
                b"ref-clip" => spine
                    .children
                    .push(SpineChild::RefClip(parse_ref_clip(reader, &e, true)?)),
                _ => {}
            },
            XmlEvent::End(e) if e.name().as_ref() == b"spine" => break,
            XmlEvent::Eof => return Err(Error::Parse("unexpected end of spine".to_string())),
            _ => {}
        }
    }
    Ok(spine)
}

fn parse_asset_clip(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart,
    empty: bool,
) -> Result<AssetClip> {
    let mut clip = AssetClip {
        ref_id: req_attr(start, "ref")?,
        lane: lane_attr(start)?,
        offset: attr(start, "offset")?.unwrap_or_else(|| "0s".to_string()),
        name: attr(start, "name")?.unwrap_or_default(),
        start: attr(start, "start")?,
        duration: attr(start, "duration")?.unwrap_or_else(|| "0s".to_string()),
        format: attr(start, "format")?,
        tc_format: attr(start, "tcFormat")?,
        audio_role: attr(start, "audioRole")?,
        adjust_transform: None,
        titles: Vec::new(),
        videos: Vec::new(),
    };
    if empty {
        return Ok(clip);
    }
    loop {
        match read(reader)? {
            XmlEvent::Start(e) => match e.name().as_ref() {
                b"adjust-transform" => {
                    clip.adjust_transform = Some(parse_adjust_transform(reader, &e, false)?)
                }
                b"title" => clip.titles.push(parse_title(reader, &e, false)?),
                b"video" => clip.videos.push(parse_video(reader, &e, false)?),
                _ => skip(reader, &e)?,
            },
            XmlEvent::Empty(e) => match e.name().as_ref() {
                b"adjust-transform" => {
                    clip.adjust_transform = Some(parse_adjust_transform(reader, &e, true)?)
                }
                b"title" => clip.titles.push(parse_title(reader, &e, true)?),
                b"video" => clip.videos.push(parse_video(reader, &e, true)?),
                _ => {}
            },
            XmlEvent::End(e) if e.name().as_ref() == b"asset-clip" => break,
            XmlEvent::Eof => return Err(Error::Parse("unexpected end of asset-clip".to_string())),
            _ => {}
        }
    }
    Ok(clip)
}

fn parse_video(reader: &mut Reader<&[u8]>, start: &BytesStart, empty: bool) -> Result<Video> {
    let mut video = Video {
        ref_id: req_attr(start, "ref")?,
        lane: lane_attr(start)?,
        offset: attr(start, "offset")?.unwrap_or_else(|| "0s".to_string()),
        name: attr(start, "name")?.unwrap_or_default(),
        start: attr(start, "start")?,
        duration: attr(start, "duration")?.unwrap_or_else(|| "0s".to_string()),
        ..Video::default()
    };
    if empty {
        return Ok(video);
    }
    loop {
        match read(reader)? {
            XmlEvent::Start(e) => match e.name().as_ref() {
                b"param" => video.params.push(parse_param(reader, &e, false)?),
                b"adjust-transform" => {
                    video.adjust_transform = Some(parse_adjust_transform(reader, &e, false)?)
                }
                b"video" => video.nested_videos.push(parse_video(reader, &e, false)?),
                b"asset-clip" => video
                    .nested_asset_clips
                    .push(parse_asset_clip(reader, &e, false)?),
                b"title" => video.nested_titles.push(parse_title(reader, &e, false)?),
                _ => skip(reader, &e)?,
            },
            XmlEvent::Empty(e) => match e.name().as_ref() {
                b"param" => video.params.push(parse_param(reader, &e, true)?),
                b"adjust-transform" => {
                    video.adjust_transform = Some(parse_adjust_transform(reader, &e, true)?)
                }
                b"video" => video.nested_videos.push(parse_video(reader, &e, true)?),
                b"asset-clip" => video
                    .nested_asset_clips
                    .push(parse_asset_clip(reader, &e, true)?),
                b"title" => video.nested_titles.push(parse_title(reader, &e, true)?),
                _ => {}
            },
            XmlEvent::End(e) if e.name().as_ref() == b"video" => break,
            XmlEvent::Eof => return Err(Error::Parse("unexpected end of video".to_string())),
            _ => {}
        }
    }
    Ok(video)
}

fn parse_title(reader: &mut Reader<&[u8]>, start: &BytesStart, empty: bool) -> Result<Title> {
    let mut title = Title {
        ref_id: req_attr(start, "ref")?,
        lane: lane_attr(start)?,
        offset: attr(start, "offset")?.unwrap_or_else(|| "0s".to_string()),
        name: attr(start, "name")?.unwrap_or_default(),
        start: attr(start, "start")?,
        duration: attr(start, "duration")?.unwrap_or_else(|| "0s".to_string()),
        ..Title::default()
    };
    if empty {
        return Ok(title);
    }
    loop {
        match read(reader)? {
            XmlEvent::Start(e) => match e.name().as_ref() {
                b"param" => title.params.push(parse_param(reader, &e, false)?),
                b"text" => title.text = Some(parse_title_text(reader)?),
                b"text-style-def" => {
                    title.text_style_def = Some(parse_text_style_def(reader, &e)?)
                }
                _ => skip(reader, &e)?,
            },
            XmlEvent::Empty(e) => {
                if e.name().as_ref() == b"param" {
                    title.params.push(parse_param(reader, &e, true)?);
                }
            }
            XmlEvent::End(e) if e.name().as_ref() == b"title" => break,
            XmlEvent::Eof => return Err(Error::Parse("unexpected end of title".to_string())),
            _ => {}
        }
    }
    Ok(title)
}

fn parse_gap(reader: &mut Reader<&[u8]>, start: &BytesStart, empty: bool) -> Result<Gap> {
    let mut gap = Gap {
        name: attr(start, "name")?.unwrap_or_default(),
        offset: attr(start, "offset")?.unwrap_or_else(|| "0s".to_string()),
        duration: attr(start, "duration")?.unwrap_or_else(|| "0s".to_string()),
        titles: Vec::new(),
    };
    if empty {
        return Ok(gap);
    }
    loop {
        match read(reader)? {
            XmlEvent::Start(e) => match e.name().as_ref() {
                b"title" => gap.titles.push(parse_title(reader, &e, false)?),
                _ => skip(reader, &e)?,
            },
            XmlEvent::Empty(e) => {
                if e.name().as_ref() == b"title" {
                    gap.titles.push(parse_title(reader, &e, true)?);
                }
            }
            XmlEvent::End(e) if e.name().as_ref() == b"gap" => break,
            XmlEvent::Eof => return Err(Error::Parse("unexpected end of gap".to_string())),
            _ => {}
        }
    }
    Ok(gap)
}

fn parse_ref_clip(reader: &mut Reader<&[u8]>, start: &BytesStart, empty: bool) -> Result<RefClip> {
    let mut ref_clip = RefClip {
        ref_id: req_attr(start, "ref")?,
        offset: attr(start, "offset")?.unwrap_or_else(|| "0s".to_string()),
        name: attr(start, "name")?.unwrap_or_default(),
        duration: attr(start, "duration")?.unwrap_or_else(|| "0s".to_string()),
        adjust_transform: None,
        titles: Vec::new(),
    };
    if empty {
        return Ok(ref_clip);
    }
    loop {
        match read(reader)? {
            XmlEvent::Start(e) => match e.name().as_ref() {
                b"adjust-transform" => {
                    ref_clip.adjust_transform = Some(parse_adjust_transform(reader, &e, false)?)
                }
                b"title" => ref_clip.titles.push(parse_title(reader, &e, false)?),
                _ => skip(reader, &e)?,
            },
            XmlEvent::Empty(e) => match e.name().as_ref() {
                b"adjust-transform" => {
                    ref_clip.adjust_transform = Some(parse_adjust_transform(reader, &e, true)?)
                }
                b"title" => ref_clip.titles.push(parse_title(reader, &e, true)?),
                _ => {}
            },
            XmlEvent::End(e) if e.name().as_ref() == b"ref-clip" => break,
            XmlEvent::Eof => return Err(Error::Parse("unexpected end of ref-clip".to_string())),
            _ => {}
        }
    }
    Ok(ref_clip)
}

fn parse_param(reader: &mut Reader<&[u8]>, start: &BytesStart, empty: bool) -> Result<Param> {
    let mut param = Param {
        name: attr(start, "name")?.unwrap_or_default(),
        key: attr(start, "key")?,
        value: attr(start, "value")?,
        keyframe_animation: None,
        params: Vec::new(),
    };
    if empty {
        return Ok(param);
    }
    loop {
        match read(reader)? {
            XmlEvent::Start(e) => match e.name().as_ref() {
                b"keyframeAnimation" => {
                    param.keyframe_animation = Some(parse_keyframe_animation(reader)?)
                }
                b"param" => param.params.push(parse_param(reader, &e, false)?),
                _ => skip(reader, &e)?,
            },
            XmlEvent::Empty(e) => {
                if e.name().as_ref() == b"param" {
                    param.params.push(parse_param(reader, &e, true)?);
                }
            }
            XmlEvent::End(e) if e.name().as_ref() == b"param" => break,
            XmlEvent::Eof => return Err(Error::Parse("unexpected end of param".to_string())),
            _ => {}
        }
    }
    Ok(param)
}

fn parse_keyframe_animation(reader: &mut Reader<&[u8]>) -> Result<KeyframeAnimation> {
    let mut animation = KeyframeAnimation::default();
    loop {
        match read(reader)? {
            XmlEvent::Start(e) | XmlEvent::Empty(e) if e.name().as_ref() == b"keyframe" => {
                animation.keyframes.push(Keyframe {
                    time: attr(&e, "time")?.unwrap_or_default(),
                    value: attr(&e, "value")?.unwrap_or_default(),
                    curve: attr(&e, "curve")?,
                });
            }
            XmlEvent::Start(e) => skip(reader, &e)?,
            XmlEvent::End(e) if e.name().as_ref() == b"keyframeAnimation" => break,
            XmlEvent::Eof => {
                return Err(Error::Parse(
                    "unexpected end of keyframeAnimation".to_string(),
                ))
            }
            _ => {}
        }
    }
    Ok(animation)
}

fn parse_adjust_transform(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart,
    empty: bool,
) -> Result<AdjustTransform> {
    let mut transform = AdjustTransform {
        position: attr(start, "position")?,
        scale: attr(start, "scale")?,
        params: Vec::new(),
    };
    if empty {
        return Ok(transform);
    }
    loop {
        match read(reader)? {
            XmlEvent::Start(e) => match e.name().as_ref() {
                b"param" => transform.params.push(parse_param(reader, &e, false)?),
                _ => skip(reader, &e)?,
            },
            XmlEvent::Empty(e) => {
                if e.name().as_ref() == b"param" {
                    transform.params.push(parse_param(reader, &e, true)?);
                }
            }
            XmlEvent::End(e) if e.name().as_ref() == b"adjust-transform" => break,
            XmlEvent::Eof => {
                return Err(Error::Parse("unexpected end of adjust-transform".to_string()))
            }
            _ => {}
        }
    }
    Ok(transform)
}

fn parse_title_text(reader: &mut Reader<&[u8]>) -> Result<TitleText> {
    let mut text = TitleText::default();
    loop {
        match read(reader)? {
            XmlEvent::Start(e) if e.name().as_ref() == b"text-style" => {
                text.text_style = TextStyleRef {
                    ref_id: attr(&e, "ref")?.unwrap_or_default(),
                    text: parse_text_content(reader, "text-style")?,
                };
            }
            XmlEvent::Empty(e) if e.name().as_ref() == b"text-style" => {
                text.text_style = TextStyleRef {
                    ref_id: attr(&e, "ref")?.unwrap_or_default(),
                    text: String::new(),
                };
            }
            XmlEvent::Start(e) => skip(reader, &e)?,
            XmlEvent::End(e) if e.name().as_ref() == b"text" => break,
            XmlEvent::Eof => return Err(Error::Parse("unexpected end of text".to_string())),
            _ => {}
        }
    }
    Ok(text)
}

/// Collect the character content of an element up to its end tag.
fn parse_text_content(reader: &mut Reader<&[u8]>, element: &str) -> Result<String> {
    let mut content = String::new();
    loop {
        match read(reader)? {
            XmlEvent::Text(t) => {
                content.push_str(
                    &t.unescape().map_err(|e| Error::Parse(e.to_string()))?,
                );
            }
            XmlEvent::End(e) if e.name().as_ref() == element.as_bytes() => break,
            XmlEvent::Eof => {
                return Err(Error::Parse(format!("unexpected end of {element}")))
            }
            _ => {}
        }
    }
    Ok(content)
}

fn parse_text_style_def(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<TextStyleDef> {
    let mut def = TextStyleDef {
        id: req_attr(start, "id")?,
        text_style: TextStyle::default(),
    };
    loop {
        match read(reader)? {
            XmlEvent::Start(e) | XmlEvent::Empty(e) if e.name().as_ref() == b"text-style" => {
                def.text_style = TextStyle {
                    font: attr(&e, "font")?.unwrap_or_default(),
                    font_size: attr(&e, "fontSize")?.unwrap_or_default(),
                    font_face: attr(&e, "fontFace")?,
                    font_color: attr(&e, "fontColor")?.unwrap_or_default(),
                    bold: attr(&e, "bold")?,
                    alignment: attr(&e, "alignment")?,
                    line_spacing: attr(&e, "lineSpacing")?,
                };
            }
            XmlEvent::End(e) if e.name().as_ref() == b"text-style-def" => break,
            XmlEvent::Eof => {
                return Err(Error::Parse("unexpected end of text-style-def".to_string()))
            }
            _ => {}
        }
    }
    Ok(def)
}

fn parse_smart_collection(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart,
) -> Result<SmartCollection> {
    let mut collection = SmartCollection {
        name: attr(start, "name")?.unwrap_or_default(),
        match_kind: attr(start, "match")?.unwrap_or_default(),
        ..SmartCollection::default()
    };
    loop {
        match read(reader)? {
            XmlEvent::Start(e) | XmlEvent::Empty(e)
                if matches!(
                    e.name().as_ref(),
                    b"match-clip" | b"match-media" | b"match-ratings"
                ) =>
            {
                match e.name().as_ref() {
                    b"match-clip" => collection.clip_matches.push(MatchRule {
                        rule: attr(&e, "rule")?.unwrap_or_default(),
                        kind: attr(&e, "type")?.unwrap_or_default(),
                    }),
                    b"match-media" => collection.media_matches.push(MatchRule {
                        rule: attr(&e, "rule")?.unwrap_or_default(),
                        kind: attr(&e, "type")?.unwrap_or_default(),
                    }),
                    _ => collection.rating_matches.push(RatingRule {
                        value: attr(&e, "value")?.unwrap_or_default(),
                    }),
                }
            }
            XmlEvent::Start(e) => skip(reader, &e)?,
            XmlEvent::End(e) if e.name().as_ref() == b"smart-collection" => break,
            XmlEvent::Eof => {
                return Err(Error::Parse("unexpected end of smart-collection".to_string()))
            }
            _ => {}
        }
    }
    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_doc() -> Fcpxml {
        let cfg = crate::config::Config {
            project: "wiki".to_string(),
            event: "6-13-25".to_string(),
            library_location: None,
            ..crate::config::Config::default()
        };
        crate::edits::empty_document(&cfg)
    }

    #[test]
    fn test_preamble_and_root() {
        let xml = document_to_string(&sample_doc()).unwrap();
        assert!(xml.starts_with(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE fcpxml>\n\n<fcpxml version=\"1.13\">"
        ));
        assert!(xml.ends_with("</fcpxml>"));
    }

    #[test]
    fn test_empty_document_roundtrip() {
        let doc = sample_doc();
        let xml = document_to_string(&doc).unwrap();
        let parsed = document_from_str(&xml).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_title_text_escaping_roundtrip() {
        let mut doc = sample_doc();
        let seq = doc.sequence_mut().unwrap();
        seq.spine.children.push(SpineChild::Title(Title {
            ref_id: "r2".to_string(),
            offset: "0s".to_string(),
            name: "escaped".to_string(),
            duration: "24024/24000s".to_string(),
            text: Some(TitleText {
                text_style: TextStyleRef {
                    ref_id: "ts1".to_string(),
                    text: "a < b & \"c\"".to_string(),
                },
            }),
            ..Title::default()
        }));

        let xml = document_to_string(&doc).unwrap();
        let parsed = document_from_str(&xml).unwrap();
        let seq = parsed.sequence().unwrap();
        let SpineChild::Title(title) = &seq.spine.children[0] else {
            panic!("expected title child");
        };
        assert_eq!(title.text.as_ref().unwrap().text_style.text, "a < b & \"c\"");
    }

    #[test]
    fn test_spine_children_emitted_in_offset_order() {
        let mut doc = sample_doc();
        let seq = doc.sequence_mut().unwrap();
        // Deliberately bypass timeline::append_child to simulate an
        // insertion path that forgets to sort
        seq.spine.children.push(SpineChild::Video(Video {
            ref_id: "r3".to_string(),
            offset: "240240/24000s".to_string(),
            name: "late".to_string(),
            duration: "24024/24000s".to_string(),
            ..Video::default()
        }));
        seq.spine.children.push(SpineChild::Video(Video {
            ref_id: "r2".to_string(),
            offset: "0s".to_string(),
            name: "early".to_string(),
            duration: "24024/24000s".to_string(),
            ..Video::default()
        }));

        let xml = document_to_string(&doc).unwrap();
        let early = xml.find("name=\"early\"").unwrap();
        let late = xml.find("name=\"late\"").unwrap();
        assert!(early < late, "children must serialize in offset order");
    }

    #[test]
    fn test_parse_rejects_non_fcpxml_input() {
        assert!(document_from_str("<notfcpxml/>").is_err());
        assert!(document_from_str("").is_err());
    }

    #[test]
    fn test_parse_accepts_expanded_empty_elements() {
        // The consumer writes <format ...></format>; we write
        // <format .../>. Both shapes must parse identically.
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE fcpxml>

<fcpxml version="1.13">
    <resources>
        <format id="r1" name="FFVideoFormat720p2398" frameDuration="1001/24000s" width="1280" height="720" colorSpace="1-1-1 (Rec. 709)"></format>
    </resources>
    <library>
        <event name="e">
            <project name="p">
                <sequence format="r1" duration="0s" tcStart="0s" tcFormat="NDF" audioLayout="stereo" audioRate="48k">
                    <spine></spine>
                </sequence>
            </project>
        </event>
    </library>
</fcpxml>"#;
        let doc = document_from_str(xml).unwrap();
        assert_eq!(doc.resources.formats.len(), 1);
        assert_eq!(doc.resources.formats[0].width, 1280);
        assert!(doc.sequence().unwrap().spine.children.is_empty());
    }

    #[test]
    fn test_unknown_elements_are_skipped() {
        let xml = r#"<fcpxml version="1.13">
    <resources>
        <format id="r1" name="f" width="1280" height="720"/>
        <import-options><option value="x"/></import-options>
    </resources>
    <library>
        <event name="e"><project name="p"><sequence format="r1" duration="0s" tcStart="0s" tcFormat="NDF" audioLayout="stereo" audioRate="48k"><spine/></sequence></project></event>
    </library>
</fcpxml>"#;
        let doc = document_from_str(xml).unwrap();
        assert_eq!(doc.resources.formats.len(), 1);
        assert_eq!(doc.library.events.len(), 1);
    }
}
