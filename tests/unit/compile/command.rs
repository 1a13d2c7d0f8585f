use super::*;
use crate::compile::audio::{AudioGraphInput, compile_audio};
use crate::graph::chain::FilterChain;
use crate::graph::label::Label;
use crate::plan::model::Ducking;

fn canvas() -> Canvas {
    Canvas::new(1080, 1920).unwrap()
}

fn overlay_fragment(offset: usize, inputs: usize) -> CompiledFragment {
    let mut chain = FilterChain::new("[0:v]", offset);
    for i in 0..inputs {
        let pad = chain.add_input(format!("/w/shape_{i}.png"));
        chain.merge(&pad, "overlay=0:0", Label::new(format!("v{}", i + 1)));
    }
    chain.then("format=yuv420p", Label::new(format!("vout_{}", inputs + 1)));
    chain.finish()
}

#[test]
fn layout_orders_music_before_voice() {
    let l = InputLayout::new(true, true);
    assert_eq!(l.music_ref().specifier(), "1:a");
    assert_eq!(l.voice_ref().specifier(), "2:a");
    assert_eq!(l.first_extra(), 3);

    let l = InputLayout::new(false, true);
    assert_eq!(l.voice_ref().specifier(), "1:a");
    assert_eq!(l.first_extra(), 2);
    assert_eq!(InputLayout::new(false, false).first_extra(), 1);
}

#[test]
fn video_only_invocation_has_one_map() {
    let effects = CompiledFragment::passthrough("[0:v]", 0);
    let overlays = overlay_fragment(1, 0);
    let audio = AudioGraph::silent();
    let inv = build_invocation(&InvocationRequest {
        base_clip: Path::new("/w/slides.mp4"),
        music: None,
        voice: None,
        effects: &effects,
        overlays: &overlays,
        audio: &audio,
        canvas: canvas(),
        fps: 30,
        output: Path::new("/out/final.mp4"),
    })
    .unwrap();

    assert_eq!(inv.args.iter().filter(|a| *a == "-map").count(), 1);
    assert!(inv.audio_map.is_none());
    assert!(!inv.args.iter().any(|a| a == "-c:a"));
    assert_eq!(
        inv.args,
        [
            "-y", "-i", "/w/slides.mp4",
            "-filter_complex", "[0:v]format=yuv420p[vout_1]",
            "-map", "[vout_1]",
            "-c:v", "libx264", "-pix_fmt", "yuv420p", "-r", "30",
            "-preset", "veryfast", "-crf", "26",
            "/out/final.mp4",
        ]
        .map(String::from)
    );
}

#[test]
fn placeholders_shift_past_music_and_voice() {
    let effects = CompiledFragment::passthrough("[0:v]", 0);
    let overlays = overlay_fragment(3, 2);
    let d = Ducking::default();
    let layout = InputLayout::new(true, true);
    let audio = compile_audio(&AudioGraphInput {
        has_music: true,
        has_voice: true,
        music_volume_db: -6.0,
        ducking: &d,
        music: layout.music_ref(),
        voice: layout.voice_ref(),
    });
    let inv = build_invocation(&InvocationRequest {
        base_clip: Path::new("/w/slides.mp4"),
        music: Some(Path::new("/m/song.mp3")),
        voice: Some(Path::new("/w/voice.mp3")),
        effects: &effects,
        overlays: &overlays,
        audio: &audio,
        canvas: Canvas::new(720, 1280).unwrap(),
        fps: 25,
        output: Path::new("/out/final.mp4"),
    })
    .unwrap();

    assert!(inv.filter_complex.contains("[0:v][3:v]overlay=0:0[v1]"));
    assert!(inv.filter_complex.contains("[v1][4:v]overlay=0:0[v2]"));
    assert!(!inv.filter_complex.contains("[#"));
    assert!(inv.filter_complex.ends_with("[amix]"));

    let inputs: Vec<&str> = inv
        .args
        .windows(2)
        .filter(|w| w[0] == "-i")
        .map(|w| w[1].as_str())
        .collect();
    assert_eq!(
        inputs,
        ["/w/slides.mp4", "/m/song.mp3", "/w/voice.mp3", "/w/shape_0.png", "/w/shape_1.png"]
    );
    assert_eq!(inv.audio_map.as_deref(), Some("[amix]"));
    assert!(inv.args.windows(2).any(|w| w[0] == "-b:a" && w[1] == "192k"));
    assert!(inv.args.iter().any(|a| a == "-shortest"));
    // 720 wide counts as low resolution.
    assert!(inv.args.windows(2).any(|w| w[0] == "-preset" && w[1] == "ultrafast"));
    assert!(inv.args.windows(2).any(|w| w[0] == "-crf" && w[1] == "28"));
}

#[test]
fn voice_only_maps_bare_stream() {
    let effects = CompiledFragment::passthrough("[0:v]", 0);
    let overlays = overlay_fragment(2, 0);
    let audio = AudioGraph {
        chain: None,
        map: Some("1:a".to_owned()),
    };
    let inv = build_invocation(&InvocationRequest {
        base_clip: Path::new("/w/slides.mp4"),
        music: None,
        voice: Some(Path::new("/w/voice.wav")),
        effects: &effects,
        overlays: &overlays,
        audio: &audio,
        canvas: canvas(),
        fps: 30,
        output: Path::new("/o.mp4"),
    })
    .unwrap();
    assert!(inv.args.windows(2).any(|w| w[0] == "-map" && w[1] == "1:a"));
    assert_eq!(inv.filter_complex, "[0:v]format=yuv420p[vout_1]");
}

#[test]
fn mismatched_offset_is_rejected() {
    let effects = CompiledFragment::passthrough("[0:v]", 0);
    let overlays = overlay_fragment(1, 1);
    let audio = AudioGraph::silent();
    let err = build_invocation(&InvocationRequest {
        base_clip: Path::new("/w/slides.mp4"),
        music: Some(Path::new("/m/song.mp3")),
        voice: None,
        effects: &effects,
        overlays: &overlays,
        audio: &audio,
        canvas: canvas(),
        fps: 30,
        output: Path::new("/o.mp4"),
    })
    .unwrap_err();
    assert!(err.to_string().contains("offset 1"));
}

#[test]
fn raw_input_pads_map_without_brackets() {
    assert_eq!(map_target("[0:v]"), "0:v");
    assert_eq!(map_target("[vout_3]"), "[vout_3]");
}
