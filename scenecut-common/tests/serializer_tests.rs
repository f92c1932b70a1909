//! Serialization round-trip and output-shape tests

use std::path::PathBuf;

use scenecut_common::config::Config;
use scenecut_common::{edits, ids, xml};

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
    std::fs::write(&path, b"placeholder").unwrap();
    path
}

#[test]
fn test_empty_document_snapshot() {
    let doc = edits::empty_document(&test_config());
    let rendered = xml::document_to_string(&doc).unwrap();

    let expected = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE fcpxml>

<fcpxml version="1.13">
    <resources>
        <format id="r1" name="FFVideoFormat720p2398" frameDuration="1001/24000s" width="1280" height="720" colorSpace="1-1-1 (Rec. 709)"/>
    </resources>
    <library>
        <event name="6-13-25" uid="{event_uid}">
            <project name="wiki" uid="{project_uid}">
                <sequence format="r1" duration="0s" tcStart="0s" tcFormat="NDF" audioLayout="stereo" audioRate="48k">
                    <spine/>
                </sequence>
            </project>
        </event>
        <smart-collection name="Projects" match="all">
            <match-clip rule="is" type="project"/>
        </smart-collection>
        <smart-collection name="All Video" match="any">
            <match-media rule="is" type="videoOnly"/>
            <match-media rule="is" type="videoWithAudio"/>
        </smart-collection>
        <smart-collection name="Audio Only" match="all">
            <match-media rule="is" type="audioOnly"/>
        </smart-collection>
        <smart-collection name="Stills" match="all">
            <match-media rule="is" type="stills"/>
        </smart-collection>
        <smart-collection name="Favorites" match="all">
            <match-ratings value="favorites"/>
        </smart-collection>
    </library>
</fcpxml>"#,
        event_uid = ids::media_uid("6-13-25_event"),
        project_uid = ids::media_uid("wiki_project"),
    );

    assert_eq!(rendered, expected);
}

#[test]
fn test_load_and_resave_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let image = media_file(&dir, "cover.png");
    let video = media_file(&dir, "talk.mov");

    let mut doc = edits::empty_document(&test_config());
    edits::add_image(&mut doc, &image, 5.0).unwrap();
    edits::add_video(&mut doc, &video, 10.0).unwrap();
    edits::add_text_overlays(&mut doc, &["Hello".to_string()], 0.0).unwrap();

    let first = xml::document_to_string(&doc).unwrap();
    let reloaded = xml::document_from_str(&first).unwrap();
    let second = xml::document_to_string(&reloaded).unwrap();

    assert_eq!(first, second);
    assert_eq!(reloaded, doc);
}

#[test]
fn test_reload_preserves_ids_uids_and_durations() {
    let dir = tempfile::tempdir().unwrap();
    let video = media_file(&dir, "talk.mov");

    let mut doc = edits::empty_document(&test_config());
    edits::add_video(&mut doc, &video, 10.0).unwrap();

    let path = dir.path().join("talk.fcpxml");
    xml::write_document(&doc, &path).unwrap();
    let reloaded = xml::read_document(&path).unwrap();

    assert_eq!(reloaded.resources.assets[0].id, doc.resources.assets[0].id);
    assert_eq!(reloaded.resources.assets[0].uid, doc.resources.assets[0].uid);
    assert_eq!(
        reloaded.resources.assets[0].duration,
        doc.resources.assets[0].duration
    );
    assert_eq!(
        reloaded.sequence().unwrap().duration,
        doc.sequence().unwrap().duration
    );
}

#[test]
fn test_extending_a_reloaded_document_continues_ids() {
    let dir = tempfile::tempdir().unwrap();
    let first = media_file(&dir, "one.mov");
    let second = media_file(&dir, "two.mov");

    let mut doc = edits::empty_document(&test_config());
    edits::add_video(&mut doc, &first, 4.0).unwrap();

    // Round-trip through disk, then keep editing the reloaded document
    let rendered = xml::document_to_string(&doc).unwrap();
    let mut reloaded = xml::document_from_str(&rendered).unwrap();
    edits::add_video(&mut reloaded, &second, 4.0).unwrap();

    // r1 format, r2 first asset, r3 second asset: no collisions after reload
    let mut ids: Vec<&str> = reloaded
        .resources
        .assets
        .iter()
        .map(|a| a.id.as_str())
        .chain(reloaded.resources.formats.iter().map(|f| f.id.as_str()))
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["r1", "r2", "r3"]);

    let seq = reloaded.sequence().unwrap();
    assert_eq!(seq.spine.children.len(), 2);
    assert_eq!(seq.spine.children[1].offset(), "96096/24000s");
}
