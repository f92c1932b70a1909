//! End-to-end document construction tests
//!
//! Each test drives the public editing operations against a fresh
//! document and checks the resource and timeline state the consumer
//! would see: flat ID uniqueness, timeless image assets, exact offsets,
//! and duplicate-add reuse.

use std::collections::HashSet;
use std::path::PathBuf;

use scenecut_common::config::Config;
use scenecut_common::edits;
use scenecut_common::ids;
use scenecut_common::model::{Fcpxml, SpineChild};

fn test_config() -> Config {
    Config {
        project: "wiki".to_string(),
        event: "6-13-25".to_string(),
        library_location: None,
        ..Config::default()
    }
}

fn media_file(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"not real media, but present on disk").unwrap();
    path
}

fn all_resource_ids(doc: &Fcpxml) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    ids.extend(doc.resources.assets.iter().map(|a| a.id.clone()));
    ids.extend(doc.resources.formats.iter().map(|f| f.id.clone()));
    ids.extend(doc.resources.effects.iter().map(|e| e.id.clone()));
    ids.extend(doc.resources.media.iter().map(|m| m.id.clone()));
    ids
}

#[test]
fn test_image_with_text_overlay_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let image = media_file(&dir, "hello.png");

    let mut doc = edits::empty_document(&test_config());
    edits::add_image(&mut doc, &image, 9.0).unwrap();
    edits::add_text_overlays(&mut doc, &["Hello".to_string()], 0.0).unwrap();

    // Exactly one new asset and one new still-image format
    assert_eq!(doc.resources.assets.len(), 1);
    let asset = &doc.resources.assets[0];
    assert_eq!(asset.id, "r2");
    assert_eq!(asset.duration, "0s");
    assert_eq!(asset.video_sources.as_deref(), Some("1"));
    assert!(!asset.has_audio);
    assert_eq!(asset.uid, ids::media_uid("hello.png"));

    assert_eq!(doc.resources.formats.len(), 2);
    let still_format = &doc.resources.formats[1];
    assert_eq!(still_format.id, "r3");
    assert_eq!(still_format.name, "FFVideoFormatRateUndefined");
    assert!(still_format.frame_duration.is_none());

    // One "Text" effect backing the overlay
    assert_eq!(doc.resources.effects.len(), 1);
    let effect = &doc.resources.effects[0];
    assert_eq!(effect.name, "Text");

    // One spine video at offset zero carrying the nested title
    let seq = doc.sequence().unwrap();
    assert_eq!(seq.spine.children.len(), 1);
    let SpineChild::Video(video) = &seq.spine.children[0] else {
        panic!("image placement must be a video element");
    };
    assert_eq!(video.offset, "0s");
    assert_eq!(video.start.as_deref(), Some("86399313/24000s"));
    assert_eq!(video.nested_titles.len(), 1);
    assert_eq!(video.nested_titles[0].ref_id, effect.id);
}

#[test]
fn test_probed_video_duration_and_offsets_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let image = media_file(&dir, "cover.png");
    let video = media_file(&dir, "talk.mov");

    let mut doc = edits::empty_document(&test_config());
    edits::add_image(&mut doc, &image, 5.0).unwrap();
    edits::add_video(&mut doc, &video, 10.0).unwrap();

    // 10.0 s at 24000/1001 rounds to 240 frames exactly
    let asset = doc
        .resources
        .assets
        .iter()
        .find(|a| a.name == "talk")
        .unwrap();
    assert_eq!(asset.duration, "240240/24000s");
    assert!(asset.has_video);
    assert!(asset.has_audio);

    // The clip lands exactly at the prior total spine duration
    let seq = doc.sequence().unwrap();
    let SpineChild::AssetClip(clip) = &seq.spine.children[1] else {
        panic!("video placement must be an asset-clip");
    };
    assert_eq!(clip.offset, "120120/24000s"); // 5 s of image display
    assert_eq!(clip.duration, "240240/24000s");
    assert_eq!(seq.duration, "360360/24000s");
}

#[test]
fn test_duplicate_add_reuses_asset_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let video = media_file(&dir, "loop.mov");

    let mut doc = edits::empty_document(&test_config());
    edits::add_video(&mut doc, &video, 4.0).unwrap();
    edits::add_video(&mut doc, &video, 4.0).unwrap();

    // One asset, two placements
    assert_eq!(doc.resources.assets.len(), 1);
    let seq = doc.sequence().unwrap();
    assert_eq!(seq.spine.children.len(), 2);

    let offsets: Vec<&str> = seq.spine.children.iter().map(|c| c.offset()).collect();
    assert_eq!(offsets, vec!["0s", "96096/24000s"]);

    for child in &seq.spine.children {
        let SpineChild::AssetClip(clip) = child else {
            panic!("expected asset-clips");
        };
        assert_eq!(clip.ref_id, doc.resources.assets[0].id);
    }
}

#[test]
fn test_resource_ids_stay_unique_across_operations() {
    let dir = tempfile::tempdir().unwrap();
    let image = media_file(&dir, "a.png");
    let video = media_file(&dir, "b.mov");
    let clip_video = media_file(&dir, "c.mov");
    let clip_audio = media_file(&dir, "c.wav");

    let mut doc = edits::empty_document(&test_config());
    edits::add_image(&mut doc, &image, 3.0).unwrap();
    edits::add_video(&mut doc, &video, 6.0).unwrap();
    edits::add_clip_with_audio(&mut doc, &clip_video, &clip_audio, 7.5).unwrap();
    edits::add_text_overlays(
        &mut doc,
        &["one".to_string(), "two".to_string()],
        0.0,
    )
    .unwrap();

    let ids = all_resource_ids(&doc);
    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len(), "duplicate resource id in {ids:?}");

    for id in &ids {
        assert!(id.starts_with('r'));
        assert!(id[1..].parse::<u32>().is_ok(), "malformed id {id}");
    }
}

#[test]
fn test_compound_clip_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let video = media_file(&dir, "intro.mov");
    let audio = media_file(&dir, "intro.wav");

    let mut doc = edits::empty_document(&test_config());
    edits::add_clip_with_audio(&mut doc, &video, &audio, 8.0).unwrap();

    assert_eq!(doc.resources.assets.len(), 2);
    assert_eq!(doc.resources.media.len(), 1);
    let media = &doc.resources.media[0];

    // The media's internal spine wires both assets together
    let SpineChild::Video(inner) = &media.sequence.spine.children[0] else {
        panic!("compound media must contain a video element");
    };
    let video_asset = doc.resources.assets.iter().find(|a| a.has_video).unwrap();
    let audio_asset = doc.resources.assets.iter().find(|a| !a.has_video).unwrap();
    assert_eq!(inner.ref_id, video_asset.id);
    assert_eq!(inner.nested_asset_clips[0].ref_id, audio_asset.id);
    assert_eq!(inner.nested_asset_clips[0].lane, Some(-1));

    // The timeline placement references the media, not the assets
    let seq = doc.sequence().unwrap();
    let SpineChild::RefClip(ref_clip) = &seq.spine.children[0] else {
        panic!("compound placement must be a ref-clip");
    };
    assert_eq!(ref_clip.ref_id, media.id);
    assert_eq!(ref_clip.duration, "192192/24000s"); // 8 s
}

#[test]
fn test_four_text_lines_get_distinct_styles() {
    let dir = tempfile::tempdir().unwrap();
    let image = media_file(&dir, "bg.png");

    let mut doc = edits::empty_document(&test_config());
    edits::add_image(&mut doc, &image, 10.0).unwrap();
    let lines: Vec<String> = ["north", "south", "east", "west"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    edits::add_text_overlays(&mut doc, &lines, 0.0).unwrap();

    let seq = doc.sequence().unwrap();
    let SpineChild::Video(video) = &seq.spine.children[0] else {
        panic!("expected video element");
    };
    assert_eq!(video.nested_titles.len(), 4);

    let styles: HashSet<&String> = video
        .nested_titles
        .iter()
        .map(|t| &t.text_style_def.as_ref().unwrap().id)
        .collect();
    assert_eq!(styles.len(), 4);

    // Descending lanes: first line on top
    let lanes: Vec<i32> = video.nested_titles.iter().map(|t| t.lane.unwrap()).collect();
    assert_eq!(lanes, vec![4, 3, 2, 1]);
}

#[test]
fn test_same_line_on_two_clips_gets_distinct_styles() {
    let dir = tempfile::tempdir().unwrap();
    let first = media_file(&dir, "first.png");
    let second = media_file(&dir, "second.png");

    let mut doc = edits::empty_document(&test_config());
    edits::add_image(&mut doc, &first, 5.0).unwrap();
    edits::add_image(&mut doc, &second, 5.0).unwrap();

    edits::add_text_overlays(&mut doc, &["Chapter".to_string()], 0.0).unwrap();
    edits::add_text_overlays(&mut doc, &["Chapter".to_string()], 6.0).unwrap();

    let seq = doc.sequence().unwrap();
    let mut style_ids = Vec::new();
    for child in &seq.spine.children {
        let SpineChild::Video(video) = child else {
            panic!("expected video elements");
        };
        for title in &video.nested_titles {
            style_ids.push(title.text_style_def.as_ref().unwrap().id.clone());
        }
    }
    assert_eq!(style_ids.len(), 2);
    assert_ne!(style_ids[0], style_ids[1], "context must keep styles distinct");
}

#[test]
fn test_text_effect_created_once() {
    let dir = tempfile::tempdir().unwrap();
    let image = media_file(&dir, "bg.png");

    let mut doc = edits::empty_document(&test_config());
    edits::add_image(&mut doc, &image, 10.0).unwrap();
    edits::add_text_overlays(&mut doc, &["a".to_string()], 0.0).unwrap();
    edits::add_text_overlays(&mut doc, &["b".to_string()], 2.0).unwrap();

    let text_effects = doc
        .resources
        .effects
        .iter()
        .filter(|e| e.name == "Text")
        .count();
    assert_eq!(text_effects, 1);
}

#[test]
fn test_slide_animation_attaches_and_refuses_twice() {
    let dir = tempfile::tempdir().unwrap();
    let image = media_file(&dir, "pan.png");

    let mut doc = edits::empty_document(&test_config());
    edits::add_image(&mut doc, &image, 10.0).unwrap();

    edits::add_slide_animation(&mut doc, 0.0).unwrap();
    let seq = doc.sequence().unwrap();
    let SpineChild::Video(video) = &seq.spine.children[0] else {
        panic!("expected video element");
    };
    let transform = video.adjust_transform.as_ref().unwrap();
    assert!(transform
        .params
        .iter()
        .any(|p| p.name == "position" && p.keyframe_animation.is_some()));

    assert!(edits::add_slide_animation(&mut doc, 0.0).is_err());
}
