use super::*;
use serde_json::json;
use std::collections::HashSet;

fn temp_dir(name: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "reelsmith_{name}_{}_{}",
        std::process::id(),
        nanos
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn plan(extra: serde_json::Value) -> Plan {
    let mut v = json!({ "files": [{ "id": "a", "src": "/a.jpg" }] });
    for (k, val) in extra.as_object().unwrap() {
        v[k] = val.clone();
    }
    Plan::from_json_value(v).unwrap()
}

fn compile(plan: &Plan, dir: &Path, prior: usize) -> ReelResult<CompiledFragment> {
    compile_with(plan, dir, prior, None, true)
}

fn compile_with(
    plan: &Plan,
    dir: &Path,
    prior: usize,
    srt: Option<&Path>,
    shapes_enabled: bool,
) -> ReelResult<CompiledFragment> {
    let defaults = RenderDefaults::default();
    let req = OverlayRequest {
        plan,
        work_dir: dir,
        base: "[0:v]",
        subtitle_file: srt,
        force_style: None,
        prior_inputs: prior,
        defaults: &defaults,
        shapes_enabled,
    };
    compile_overlays(&req, &mut LabelAllocator::new())
}

#[test]
fn empty_plan_only_normalizes_format() {
    let dir = temp_dir("ov_empty");
    let frag = compile(&plan(json!({})), &dir, 1).unwrap();
    assert_eq!(frag.chain, "[0:v]format=yuv420p[vout_1]");
    assert_eq!(frag.output, "[vout_1]");
    assert!(frag.extra_inputs.is_empty());
    assert_eq!(frag.input_offset, 1);
}

#[test]
fn top_text_five_seconds_fades_for_point_six() {
    let dir = temp_dir("ov_top");
    let p = plan(json!({
        "overlays": [{ "target": "top", "text": "Breaking news", "start": 0, "end": 5 }]
    }));
    let frag = compile(&p, &dir, 1).unwrap();
    let stage = frag.chain.split(';').next().unwrap();

    assert!(stage.starts_with("[0:v]drawtext="));
    assert!(stage.contains(":x=(w-text_w)/2:y=106:"));
    assert!(stage.contains(
        "alpha='if(lt(t,0),0,if(lt(t,0.6),(t-0)/0.6,if(lt(t,4.4),1,if(lt(t,5),(5-t)/0.6,0))))'"
    ));
    assert!(stage.ends_with(":enable='between(t,0,5)'[v1]"));
    assert!((fade_secs(5.0) - 0.6).abs() < 1e-12);

    let carrier = std::fs::read_to_string(dir.join("overlay_text_1.txt")).unwrap();
    assert_eq!(carrier, "BREAKING NEWS");
    assert_eq!(frag.output, "[vout_2]");
}

#[test]
fn bottom_text_is_measured_from_the_bottom_edge() {
    let dir = temp_dir("ov_bottom");
    let p = plan(json!({
        "overlays": [{ "target": "bottom", "text": "Line\r\nTwo", "start": 1, "end": 2 }]
    }));
    let frag = compile(&p, &dir, 1).unwrap();
    assert!(frag.chain.contains(":y=h-text_h-106:"));
    // One second visible: no animation.
    assert!(!frag.chain.contains("alpha="));
    let carrier = std::fs::read_to_string(dir.join("overlay_text_1.txt")).unwrap();
    assert_eq!(carrier, "Line\nTwo");
}

#[test]
fn custom_text_defaults_position_and_honours_transform() {
    let dir = temp_dir("ov_custom");
    let p = plan(json!({
        "overlays": [
            { "target": "custom", "text": "Hi There", "style": { "textTransform": "lowercase", "size": 20 } },
            { "target": "custom", "text": "At", "position": { "x": 12, "y": 34.5 } }
        ]
    }));
    let frag = compile(&p, &dir, 1).unwrap();
    let stages: Vec<&str> = frag.chain.split(';').collect();
    assert!(stages[0].contains(":fontsize=20:"));
    assert!(stages[0].contains(":x=540:y=192:"));
    assert!(stages[1].contains(":x=12:y=34.5:"));
    assert_eq!(
        std::fs::read_to_string(dir.join("overlay_text_1.txt")).unwrap(),
        "hi there"
    );
}

#[test]
fn typewriter_ramp_is_bounded_by_word_count() {
    let ov = TextOverlay {
        text: "one two three".to_owned(),
        animation: Some(crate::plan::model::TextAnimation {
            kind: AnimationKind::Typewriter,
            words_per_second: None,
        }),
        ..TextOverlay::default()
    };
    let alpha = text_alpha(&ov, &ov.text, TimeWindow::new(0.0, 5.0)).unwrap();
    assert_eq!(alpha, "if(lt(t,0),0,if(lt(t,1),(t-0)/1,1))");

    // Long text on a short span caps at 70% of the span.
    let long = TextOverlay {
        text: "a b c d e f g h i j k l m n o p q r s t".to_owned(),
        ..ov
    };
    let alpha = text_alpha(&long, &long.text, TimeWindow::new(0.0, 3.0)).unwrap();
    assert_eq!(alpha, "if(lt(t,0),0,if(lt(t,2.1),(t-0)/2.1,1))");
}

#[test]
fn empty_text_is_skipped_without_consuming_a_step() {
    let dir = temp_dir("ov_blank");
    let p = plan(json!({ "overlays": [{ "target": "top", "text": "  " }] }));
    let frag = compile(&p, &dir, 1).unwrap();
    assert_eq!(frag.chain, "[0:v]format=yuv420p[vout_1]");
}

#[test]
fn stages_follow_fixed_order_with_unique_labels() {
    let dir = temp_dir("ov_order");
    let srt = dir.join("narration.srt");
    std::fs::write(&srt, "1\n00:00:00,000 --> 00:00:01,000\nhi\n").unwrap();
    let clip = dir.join("grain_vhs.mp4");
    std::fs::write(&clip, b"").unwrap();

    let p = plan(json!({
        "burnSubtitles": true,
        "overlays": [
            { "target": "rect", "start": 0 },
            { "target": "top", "text": "Title", "start": 0, "end": 4 },
            { "target": "arrow", "shape": { "x1": 100, "y1": 100, "x2": 200, "y2": 150 } }
        ],
        "videoOverlays": [{ "file": clip.to_string_lossy(), "blendMode": "screen", "start": 0, "end": 3 }]
    }));
    let frag = compile_with(&p, &dir, 3, Some(&srt), true).unwrap();
    let stages: Vec<&str> = frag.chain.split(';').collect();

    assert!(stages[0].starts_with("[0:v]subtitles='"));
    assert!(stages[0].ends_with("[v1]"));
    assert_eq!(
        stages[1],
        "[#0:v]scale=1080:1920,hue=s=0,format=yuva420p,colorchannelmixer=aa=0.35[ovs_2]"
    );
    assert_eq!(
        stages[2],
        "[v1][ovs_2]blend=all_mode='screen':enable='between(t,0,3)'[vov_2]"
    );
    assert!(stages[3].starts_with("[vov_2]drawtext="));
    assert!(stages[3].ends_with("[v3]"));
    assert_eq!(
        stages[4],
        "[v3][#1:v]overlay=390:106:enable='between(t,0,3)'[v4]"
    );
    assert_eq!(
        stages[5],
        "[v4][#2:v]overlay=82:82:enable='between(t,0,3)'[v5]"
    );
    assert_eq!(stages[6], "[v5]format=yuv420p[vout_6]");

    assert_eq!(frag.extra_inputs.len(), 3);
    assert_eq!(frag.extra_inputs[0], clip);
    assert_eq!(frag.extra_inputs[1], dir.join("shape_rect_4.png"));
    assert_eq!(frag.extra_inputs[2], dir.join("shape_arrow_5.png"));
    assert!(dir.join("shape_rect_4.png").is_file());
    assert_eq!(frag.input_offset, 3);

    let written = frag.written_labels();
    let unique: HashSet<&str> = written.iter().copied().collect();
    assert_eq!(unique.len(), written.len());
}

#[test]
fn positional_overlay_keeps_user_scale_and_position() {
    let dir = temp_dir("ov_scale");
    let clip = dir.join("sparks.mov");
    std::fs::write(&clip, b"").unwrap();
    let p = plan(json!({
        "videoOverlays": [
            { "file": clip.to_string_lossy(), "start": 2, "end": 4, "scale": 0.5, "opacity": 0.8,
              "position": { "x": 10, "y": 20 } },
            { "file": clip.to_string_lossy(), "blendMode": "multiply", "start": 0, "end": 1, "scale": 0.5 }
        ]
    }));
    let frag = compile(&p, &dir, 1).unwrap();
    let stages: Vec<&str> = frag.chain.split(';').collect();
    // Sorted by start: the multiply clip comes first and ignores scale.
    assert_eq!(stages[0], "[#0:v]scale=1080:1920[ovs_1]");
    assert!(stages[1].contains("blend=all_mode='multiply'"));
    assert_eq!(
        stages[2],
        "[#1:v]scale=1080:1920,scale=iw*0.5:ih*0.5,format=yuva420p,colorchannelmixer=aa=0.8[ovs_2]"
    );
    assert_eq!(
        stages[3],
        "[vov_1][ovs_2]overlay=10:20:enable='between(t,2,4)'[vov_2]"
    );
}

#[test]
fn shapes_toggle_removes_shape_inputs() {
    let dir = temp_dir("ov_noshapes");
    let p = plan(json!({ "overlays": [{ "target": "circle" }] }));
    let frag = compile_with(&p, &dir, 1, None, false).unwrap();
    assert!(frag.extra_inputs.is_empty());
    assert_eq!(frag.chain, "[0:v]format=yuv420p[vout_1]");

    let frag = compile_with(&p, &dir, 1, None, true).unwrap();
    // Circle centred on the canvas: 540-56, 960-56.
    assert_eq!(
        frag.chain.split(';').next().unwrap(),
        "[0:v][#0:v]overlay=484:904:enable='between(t,0,3)'[v1]"
    );
}

#[test]
fn missing_video_overlay_is_an_asset_error() {
    let dir = temp_dir("ov_missing");
    let p = plan(json!({
        "videoOverlays": [{ "file": dir.join("nope.mp4").to_string_lossy(), "end": 2 }]
    }));
    let err = compile(&p, &dir, 1).unwrap_err();
    assert!(matches!(err, ReelError::Asset(_)), "{err}");
}

#[test]
fn missing_subtitle_file_is_an_asset_error() {
    let dir = temp_dir("ov_nosrt");
    let p = plan(json!({ "burnSubtitles": true }));
    let err = compile_with(&p, &dir, 1, Some(&dir.join("gone.srt")), true).unwrap_err();
    assert!(matches!(err, ReelError::Asset(_)));
}

#[test]
fn compiling_twice_is_byte_identical() {
    let dir = temp_dir("ov_idem");
    let p = plan(json!({
        "overlays": [
            { "target": "top", "text": "Same", "start": 0, "end": 5 },
            { "target": "rect", "shape": { "w": 40, "h": 20 } }
        ]
    }));
    let a = compile(&p, &dir, 2).unwrap();
    let b = compile(&p, &dir, 2).unwrap();
    assert_eq!(a, b);
}
