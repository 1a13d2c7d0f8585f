use super::*;
use crate::plan::model::Plan;
use serde_json::json;

fn plan(extra: serde_json::Value) -> Plan {
    let mut v = json!({ "files": [{ "id": "a", "src": "/tmp/a.jpg" }] });
    if let (Some(obj), Some(extra)) = (v.as_object_mut(), extra.as_object()) {
        for (k, val) in extra {
            obj.insert(k.clone(), val.clone());
        }
    }
    Plan::from_json_value(v).unwrap()
}

fn rejects(extra: serde_json::Value) {
    let err = validate(&plan(extra.clone())).unwrap_err();
    assert!(
        matches!(err, ReelError::Validation(_)),
        "expected validation error for {extra}, got {err}"
    );
}

#[test]
fn accepts_minimal_plan() {
    validate(&plan(json!({}))).unwrap();
}

#[test]
fn rejects_empty_files() {
    rejects(json!({ "files": [] }));
}

#[test]
fn rejects_odd_canvas_and_zero_fps() {
    rejects(json!({ "width": 1081 }));
    rejects(json!({ "fps": 0 }));
}

#[test]
fn rejects_duplicate_and_unsafe_ids() {
    rejects(json!({ "files": [
        { "id": "a", "src": "1.jpg" },
        { "id": "a", "src": "2.jpg" }
    ]}));
    rejects(json!({ "files": [{ "id": "../x", "src": "1.jpg" }] }));
}

#[test]
fn rejects_inverted_video_trim() {
    rejects(json!({ "files": [
        { "id": "v", "src": "v.mp4", "type": "video", "trimStart": 3, "trimEnd": 2 }
    ]}));
}

#[test]
fn rejects_overlay_ending_before_start() {
    rejects(json!({ "overlays": [{ "target": "top", "text": "x", "start": 4, "end": 1 }] }));
}

#[test]
fn zero_length_overlay_is_allowed() {
    validate(&plan(
        json!({ "overlays": [{ "target": "top", "text": "x", "start": 2, "end": 2 }] }),
    ))
    .unwrap();
}

#[test]
fn arrow_needs_coordinates() {
    rejects(json!({ "overlays": [{ "target": "arrow", "start": 0 }] }));
    validate(&plan(json!({ "overlays": [{
        "target": "arrow",
        "shape": { "x1": 0, "y1": 0, "x2": 10, "y2": 10 }
    }]})))
    .unwrap();
}

#[test]
fn rejects_empty_effect_window_and_graph_syntax() {
    rejects(json!({ "effects": [{ "kind": "vhs", "start": 3, "end": 3 }] }));
    rejects(json!({ "effects": [{ "kind": "custom", "filter": "hue=s=0;[x]null" }] }));
    rejects(json!({ "effects": [{ "kind": "custom", "filter": "  " }] }));
}

#[test]
fn rejects_out_of_range_video_overlay_opacity() {
    rejects(json!({ "videoOverlays": [{ "file": "/x.mp4", "end": 2, "opacity": 1.5 }] }));
}

#[test]
fn rejects_empty_tts_text_and_bad_webhook() {
    rejects(json!({ "narration": { "source": "tts", "text": " " } }));
    rejects(json!({ "webhook": "ftp://example.com/hook" }));
}

#[test]
fn custom_filter_check_messages() {
    assert!(check_custom_filter("hue=s=0").is_ok());
    assert!(check_custom_filter("a]b").unwrap_err().contains("must not contain"));
}
