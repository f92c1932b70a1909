//! Spine assembly: offsets, totals, ordered insertion, overlay targeting
//!
//! New clips append at the end of the existing timeline; the insertion
//! offset is the exact tick sum of what is already there. Children are
//! kept in non-decreasing offset order on every insertion path, and text
//! overlays nest inside the clip whose interval covers their target time
//! so their timing stays relative to that clip.

use tracing::debug;

use crate::error::Result;
use crate::ids;
use crate::model::{Keyframe, KeyframeAnimation, Param, Spine, SpineChild, TextStyle, TextStyleDef, TextStyleRef, Title, TitleText, Video};
use crate::timing;

/// Title element `start` for text overlays; consumer convention.
pub const TITLE_START: &str = "86486400/24000s";

/// Vertical layout step between stacked text overlays, in layout units.
const TITLE_Y_STEP: i64 = -300;

/// Exact total duration of the spine: the tick sum of every top-level
/// child's duration. Integer arithmetic only; a malformed duration in a
/// loaded document surfaces as an error rather than a silent zero.
pub fn total_duration_ticks(spine: &Spine) -> Result<i64> {
    let mut total = 0i64;
    for child in &spine.children {
        total += timing::ticks(child.duration())?;
    }
    Ok(total)
}

/// Offset at which the next appended clip starts: zero for an empty
/// spine, otherwise the current total duration.
pub fn insertion_offset_ticks(spine: &Spine) -> Result<i64> {
    if spine.children.is_empty() {
        Ok(0)
    } else {
        total_duration_ticks(spine)
    }
}

/// Insert a child and restore non-decreasing offset order.
///
/// The sort is stable, so children sharing an offset keep their
/// insertion order.
pub fn append_child(spine: &mut Spine, child: SpineChild) {
    debug!(name = child.name(), offset = child.offset(), "appending spine child");
    spine.children.push(child);
    sort_children(spine);
}

/// Stable-sort children by offset. The serializer calls this again
/// before emission so no storage layout can leak out of order.
pub fn sort_children(spine: &mut Spine) {
    spine
        .children
        .sort_by_key(|child| timing::ticks_or_zero(child.offset()));
}

/// Find the clip whose `[offset, offset+duration)` interval covers
/// `target_ticks` and return it as a video element, converting an
/// asset-clip in place when necessary so overlays can nest inside it.
/// Targets at or past the end of the timeline fall back to the last
/// clip. Returns `None` only when the spine holds no clip at all.
pub fn overlay_target(spine: &mut Spine, target_ticks: i64) -> Option<&mut Video> {
    let mut candidate = None;
    for (i, child) in spine.children.iter().enumerate() {
        if !matches!(child, SpineChild::Video(_) | SpineChild::AssetClip(_)) {
            continue;
        }
        let offset = timing::ticks_or_zero(child.offset());
        let end = offset + timing::ticks_or_zero(child.duration());
        if target_ticks >= offset && target_ticks < end {
            candidate = Some(i);
            break;
        }
        // Remember the last clip as the past-the-end fallback
        candidate = Some(i);
    }
    let index = candidate?;

    if let SpineChild::AssetClip(clip) = &spine.children[index] {
        let video = Video {
            ref_id: clip.ref_id.clone(),
            offset: clip.offset.clone(),
            name: clip.name.clone(),
            start: clip.start.clone(),
            duration: clip.duration.clone(),
            nested_titles: clip.titles.clone(),
            ..Video::default()
        };
        spine.children[index] = SpineChild::Video(video);
    }

    match &mut spine.children[index] {
        SpineChild::Video(video) => Some(video),
        _ => None,
    }
}

/// Build one staggered text overlay title.
///
/// Lanes descend from the line count so the first line renders on the
/// highest lane; each line starts one frame-aligned second after the
/// previous and steps down by a fixed layout offset. The position
/// parameter is omitted entirely for the first line — the consumer's
/// default centering is observably different from an explicit zero
/// vector.
pub fn staggered_title(
    line: &str,
    index: usize,
    line_count: usize,
    effect_id: &str,
    context: &str,
    base_start_ticks: i64,
    duration: &str,
) -> Title {
    let style_id = ids::text_style_id(line, context);
    let offset_ticks = base_start_ticks + index as i64 * timing::ONE_SECOND_TICKS;

    let mut params = text_layout_params();
    if index > 0 {
        params.insert(
            0,
            Param {
                name: "Position".to_string(),
                key: Some("9999/10003/13260/3296672360/1/100/101".to_string()),
                value: Some(format!("0 {}", index as i64 * TITLE_Y_STEP)),
                ..Param::default()
            },
        );
    }

    Title {
        ref_id: effect_id.to_string(),
        lane: Some((line_count - index) as i32),
        offset: timing::format_ticks(offset_ticks),
        name: format!("{line} - Text"),
        start: Some(TITLE_START.to_string()),
        duration: duration.to_string(),
        params,
        text: Some(TitleText {
            text_style: TextStyleRef {
                ref_id: style_id.clone(),
                text: line.to_string(),
            },
        }),
        text_style_def: Some(TextStyleDef {
            id: style_id,
            text_style: TextStyle {
                font: "Helvetica Neue".to_string(),
                font_size: "134".to_string(),
                font_face: None,
                font_color: "1 1 1 1".to_string(),
                bold: Some("1".to_string()),
                alignment: None,
                line_spacing: Some("-19".to_string()),
            },
        }),
    }
}

/// The title parameter block shared by every stacked overlay: paragraph
/// layout, full-frame margins, top-left anchoring, and the custom-speed
/// fade-in keyframes.
fn text_layout_params() -> Vec<Param> {
    fn value_param(name: &str, key: &str, value: &str) -> Param {
        Param {
            name: name.to_string(),
            key: Some(key.to_string()),
            value: Some(value.to_string()),
            ..Param::default()
        }
    }

    vec![
        value_param("Layout Method", "9999/10003/13260/3296672360/2/314", "1 (Paragraph)"),
        value_param("Left Margin", "9999/10003/13260/3296672360/2/323", "-1730"),
        value_param("Right Margin", "9999/10003/13260/3296672360/2/324", "1730"),
        value_param("Top Margin", "9999/10003/13260/3296672360/2/325", "960"),
        value_param("Bottom Margin", "9999/10003/13260/3296672360/2/326", "-960"),
        value_param(
            "Alignment",
            "9999/10003/13260/3296672360/2/354/3296667315/401",
            "0 (Left)",
        ),
        value_param(
            "Line Spacing",
            "9999/10003/13260/3296672360/2/354/3296667315/404",
            "-19",
        ),
        value_param("Auto-Shrink", "9999/10003/13260/3296672360/2/370", "3 (To All Margins)"),
        value_param("Alignment", "9999/10003/13260/3296672360/2/373", "0 (Left) 0 (Top)"),
        value_param(
            "Opacity",
            "9999/10003/13260/3296672360/4/3296673134/1000/1044",
            "0",
        ),
        value_param(
            "Speed",
            "9999/10003/13260/3296672360/4/3296673134/201/208",
            "6 (Custom)",
        ),
        Param {
            name: "Custom Speed".to_string(),
            key: Some("9999/10003/13260/3296672360/4/3296673134/201/209".to_string()),
            keyframe_animation: Some(KeyframeAnimation {
                keyframes: vec![
                    Keyframe {
                        time: "-469658744/1000000000s".to_string(),
                        value: "0".to_string(),
                        curve: None,
                    },
                    Keyframe {
                        time: "12328542033/1000000000s".to_string(),
                        value: "1".to_string(),
                        curve: None,
                    },
                ],
            }),
            ..Param::default()
        },
        value_param(
            "Apply Speed",
            "9999/10003/13260/3296672360/4/3296673134/201/211",
            "2 (Per Object)",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AssetClip, Gap};

    fn clip(offset: &str, duration: &str, name: &str) -> SpineChild {
        SpineChild::AssetClip(AssetClip {
            ref_id: "r2".into(),
            offset: offset.into(),
            name: name.into(),
            duration: duration.into(),
            ..AssetClip::default()
        })
    }

    #[test]
    fn test_total_duration_sums_all_variants() {
        let mut spine = Spine::default();
        spine.children.push(clip("0s", "24024/24000s", "a"));
        spine.children.push(SpineChild::Gap(Gap {
            name: "Gap".into(),
            offset: "24024/24000s".into(),
            duration: "24024/24000s".into(),
            titles: vec![],
        }));
        spine.children.push(clip("48048/24000s", "24024/24000s", "b"));
        assert_eq!(total_duration_ticks(&spine).unwrap(), 72_072);
    }

    #[test]
    fn test_insertion_offset_empty_spine_is_zero() {
        let spine = Spine::default();
        assert_eq!(insertion_offset_ticks(&spine).unwrap(), 0);
    }

    #[test]
    fn test_insertion_offset_is_total_duration() {
        let mut spine = Spine::default();
        spine.children.push(clip("0s", "240240/24000s", "a"));
        assert_eq!(insertion_offset_ticks(&spine).unwrap(), 240_240);
    }

    #[test]
    fn test_total_duration_rejects_malformed_child() {
        let mut spine = Spine::default();
        spine.children.push(clip("0s", "garbage", "a"));
        assert!(total_duration_ticks(&spine).is_err());
    }

    #[test]
    fn test_append_child_restores_offset_order() {
        let mut spine = Spine::default();
        append_child(&mut spine, clip("48048/24000s", "24024/24000s", "late"));
        append_child(&mut spine, clip("0s", "24024/24000s", "early"));
        append_child(&mut spine, clip("24024/24000s", "24024/24000s", "middle"));

        let names: Vec<&str> = spine.children.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["early", "middle", "late"]);
    }

    #[test]
    fn test_overlay_target_picks_covering_clip() {
        let mut spine = Spine::default();
        spine.children.push(clip("0s", "240240/24000s", "first"));
        spine.children.push(clip("240240/24000s", "240240/24000s", "second"));

        let video = overlay_target(&mut spine, 300_000).unwrap();
        assert_eq!(video.name, "second");
    }

    #[test]
    fn test_overlay_target_converts_asset_clip_to_video() {
        let mut spine = Spine::default();
        spine.children.push(clip("0s", "240240/24000s", "only"));

        overlay_target(&mut spine, 0).unwrap();
        assert!(matches!(spine.children[0], SpineChild::Video(_)));
    }

    #[test]
    fn test_overlay_target_past_end_falls_back_to_last_clip() {
        let mut spine = Spine::default();
        spine.children.push(clip("0s", "240240/24000s", "first"));
        spine.children.push(clip("240240/24000s", "240240/24000s", "last"));

        let video = overlay_target(&mut spine, 10_000_000).unwrap();
        assert_eq!(video.name, "last");
    }

    #[test]
    fn test_overlay_target_empty_spine_is_none() {
        let mut spine = Spine::default();
        assert!(overlay_target(&mut spine, 0).is_none());
    }

    #[test]
    fn test_staggered_titles_descend_lanes_and_stagger_offsets() {
        let lines = ["one", "two", "three"];
        let titles: Vec<Title> = lines
            .iter()
            .enumerate()
            .map(|(i, line)| staggered_title(line, i, lines.len(), "r5", "ctx", 0, "240240/24000s"))
            .collect();

        assert_eq!(titles[0].lane, Some(3));
        assert_eq!(titles[1].lane, Some(2));
        assert_eq!(titles[2].lane, Some(1));

        assert_eq!(titles[0].offset, "0s");
        assert_eq!(titles[1].offset, "24024/24000s");
        assert_eq!(titles[2].offset, "48048/24000s");

        // First line relies on the consumer's default position
        assert!(titles[0].params.iter().all(|p| p.name != "Position"));
        let second_position = titles[1]
            .params
            .iter()
            .find(|p| p.name == "Position")
            .expect("second line must carry an explicit position");
        assert_eq!(second_position.value.as_deref(), Some("0 -300"));
        let third_position = titles[2]
            .params
            .iter()
            .find(|p| p.name == "Position")
            .unwrap();
        assert_eq!(third_position.value.as_deref(), Some("0 -600"));

        // Style definitions stay distinct per line
        let style_ids: Vec<&str> = titles
            .iter()
            .map(|t| t.text_style_def.as_ref().unwrap().id.as_str())
            .collect();
        assert_eq!(style_ids.len(), 3);
        assert!(style_ids[0] != style_ids[1] && style_ids[1] != style_ids[2]);
    }
}
