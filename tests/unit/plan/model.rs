use super::*;
use serde_json::json;

fn minimal() -> serde_json::Value {
    json!({ "files": [{ "id": "a", "src": "/tmp/a.jpg" }] })
}

#[test]
fn minimal_plan_gets_defaults() {
    let plan = Plan::from_json_value(minimal()).unwrap();
    assert_eq!((plan.width, plan.height, plan.fps), (1080, 1920, 30));
    assert_eq!(plan.output_format, OutputFormat::Mp4);
    assert_eq!(plan.fit, FitMode::Letterbox);
    assert!((plan.music_volume_db + 6.0).abs() < 1e-12);
    assert!(plan.ducking.enabled);
    assert_eq!(plan.whisper_model, "base");
    assert_eq!(plan.files[0].kind, MediaKind::Photo);
    assert!((plan.estimated_duration() - 2.0).abs() < 1e-12);
}

#[test]
fn unknown_overlay_target_is_rejected() {
    let mut v = minimal();
    v["overlays"] = json!([{ "target": "banner", "text": "hi" }]);
    let err = Plan::from_json_value(v).unwrap_err();
    assert!(err.to_string().starts_with("validation error:"), "{err}");
}

#[test]
fn unknown_effect_kind_is_rejected() {
    let mut v = minimal();
    v["effects"] = json!([{ "kind": "sparkle" }]);
    assert!(Plan::from_json_value(v).is_err());
}

#[test]
fn overlay_windows_use_family_defaults() {
    let mut v = minimal();
    v["overlays"] = json!([
        { "target": "top", "text": "T", "start": 1 },
        { "target": "circle", "startSec": 2 },
        { "target": "bottom", "text": "B", "start": 0, "end": 4 }
    ]);
    let plan = Plan::from_json_value(v).unwrap();
    assert_eq!(plan.overlays[0].window(), (1.0, 6.0));
    assert_eq!(plan.overlays[1].window(), (2.0, 5.0));
    assert_eq!(plan.overlays[2].window(), (0.0, 4.0));
    assert!(matches!(
        plan.overlays[1].variant(),
        OverlayVariant::Shape(ShapeVariant::Circle(_))
    ));
    assert!(matches!(
        plan.overlays[0].variant(),
        OverlayVariant::Text(TextAnchor::Top, _)
    ));
}

#[test]
fn narration_is_tagged_by_source() {
    let mut v = minimal();
    v["narration"] = json!({ "source": "tts", "text": "hello", "provider": "openai", "required": true });
    let plan = Plan::from_json_value(v).unwrap();
    match plan.narration.as_ref().unwrap() {
        Narration::Tts(t) => {
            assert_eq!(t.provider, TtsProvider::Openai);
            assert_eq!(t.voice, "alloy");
            assert_eq!(t.format, AudioFormat::Mp3);
        }
        other => panic!("unexpected narration {other:?}"),
    }
    assert!(plan.narration.unwrap().is_required());
}

#[test]
fn blend_modes_use_kebab_case() {
    let mut v = minimal();
    v["videoOverlays"] = json!([
        { "file": "/x/a.mov", "blendMode": "color-dodge", "start": 0, "end": 2 },
        { "file": "/x/b.mp4", "end": 2 }
    ]);
    let plan = Plan::from_json_value(v).unwrap();
    assert_eq!(plan.video_overlays[0].blend_mode, BlendMode::ColorDodge);
    assert_eq!(plan.video_overlays[0].blend_mode.engine_name(), "colordodge");
    assert_eq!(plan.video_overlays[1].blend_mode, BlendMode::Normal);
    assert!((plan.video_overlays[1].opacity - 1.0).abs() < 1e-12);
    assert!(plan.video_overlays[1].blend_mode.is_positional());
}

#[test]
fn estimated_duration_sums_photos_and_trimmed_videos() {
    let plan = Plan::from_json_value(json!({
        "durationPerPhoto": 2.5,
        "files": [
            { "id": "a", "src": "a.jpg", "duration": 3 },
            { "id": "b", "src": "b.jpg" },
            { "id": "c", "src": "c.mp4", "type": "video", "trimStart": 1, "trimEnd": 4 }
        ]
    }))
    .unwrap();
    assert!((plan.estimated_duration() - 8.5).abs() < 1e-12);

    let explicit = Plan {
        duration: Some(12.0),
        ..plan
    };
    assert!((explicit.estimated_duration() - 12.0).abs() < 1e-12);
}

#[test]
fn video_overlay_extension_check_is_case_insensitive() {
    let vo = VideoOverlay {
        file: "/x/FX.MOV".to_owned(),
        blend_mode: BlendMode::Screen,
        start: 0.0,
        end: 1.0,
        opacity: 1.0,
        scale: None,
        position: None,
    };
    assert!(vo.has_supported_extension());
    let gif = VideoOverlay {
        file: "/x/fx.gif".to_owned(),
        ..vo
    };
    assert!(!gif.has_supported_extension());
}
