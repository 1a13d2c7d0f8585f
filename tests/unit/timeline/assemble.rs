use super::*;
use crate::services::encoder::{EncoderOutput, ProbeInfo};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;

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

#[derive(Default)]
struct RecordingEncoder {
    calls: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl Encoder for RecordingEncoder {
    async fn run(&self, args: &[String], _cwd: &Path) -> ReelResult<EncoderOutput> {
        self.calls.lock().unwrap().push(args.to_vec());
        Ok(EncoderOutput::default())
    }

    async fn probe(&self, _path: &Path) -> ReelResult<ProbeInfo> {
        Ok(ProbeInfo::default())
    }
}

fn photo(path: &str, duration: Option<f64>) -> ConcatEntry {
    ConcatEntry {
        path: PathBuf::from(path),
        duration,
    }
}

#[test]
fn trailing_photo_is_repeated() {
    let list = build_concat_list(&[photo("/a.jpg", Some(2.0)), photo("/b.jpg", Some(1.5))]);
    assert_eq!(
        list,
        "file '/a.jpg'\nduration 2.000\nfile '/b.jpg'\nduration 1.500\nfile '/b.jpg'\n"
    );
}

#[test]
fn trailing_video_is_not_repeated() {
    let list = build_concat_list(&[photo("/a.jpg", Some(2.0)), photo("/c.mp4", None)]);
    assert_eq!(list, "file '/a.jpg'\nduration 2.000\nfile '/c.mp4'\n");
}

#[test]
fn quotes_in_paths_are_escaped() {
    let list = build_concat_list(&[photo("/it's.jpg", None)]);
    assert_eq!(list, "file '/it'\\''s.jpg'\n");
}

#[test]
fn empty_list_is_empty() {
    assert_eq!(build_concat_list(&[]), "");
}

#[test]
fn concat_args_use_fit_mode() {
    let plan = Plan::from_json_value(json!({
        "files": [{ "id": "a", "src": "/a.jpg" }],
        "width": 720, "height": 1280, "fps": 25, "fit": "crop"
    }))
    .unwrap();
    let args = concat_args(&plan).unwrap();
    let vf = args.iter().position(|a| a == "-vf").unwrap();
    assert_eq!(
        args[vf + 1],
        "scale=720:1280:force_original_aspect_ratio=increase,crop=720:1280,setsar=1"
    );
    assert_eq!(args[..3], ["-y", "-r", "25"]);
    assert_eq!(args.last().unwrap(), BASE_CLIP_FILE);
}

#[test]
fn trim_args_only_with_window() {
    let mut item = MediaItem {
        id: "v".into(),
        src: "/v.mp4".into(),
        kind: MediaKind::Video,
        duration: None,
        trim_start: None,
        trim_end: None,
    };
    assert!(trim_args(&item, Path::new("/v.mp4"), Path::new("/w/v_clip.mp4")).is_none());

    item.trim_start = Some(1.5);
    item.trim_end = Some(4.0);
    let args = trim_args(&item, Path::new("/v.mp4"), Path::new("/w/v_clip.mp4")).unwrap();
    assert_eq!(
        args,
        ["-y", "-ss", "1.5", "-to", "4", "-i", "/v.mp4", "-c", "copy", "/w/v_clip.mp4"]
    );
}

#[tokio::test]
async fn three_photos_make_four_file_lines() {
    let dir = temp_dir("tl_three");
    let mut files = Vec::new();
    for id in ["p1", "p2", "p3"] {
        let src = dir.join(format!("{id}.jpg"));
        std::fs::write(&src, b"not really a jpeg").unwrap();
        files.push(json!({ "id": id, "src": src }));
    }
    let plan = Plan::from_json_value(json!({ "files": files })).unwrap();

    let encoder = RecordingEncoder::default();
    let out = assemble_timeline(&plan, &dir.join("work"), &encoder)
        .await
        .unwrap();
    assert!(out.ends_with(BASE_CLIP_FILE));

    let list = std::fs::read_to_string(dir.join("work").join(CONCAT_LIST_FILE)).unwrap();
    assert_eq!(list.lines().filter(|l| l.starts_with("file ")).count(), 4);
    assert_eq!(
        list.lines().filter(|l| *l == "duration 2.000").count(),
        3
    );
    // Undecodable photos fall back to their source.
    assert!(list.contains("p3.jpg"));

    let calls = encoder.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains(&"concat".to_owned()));
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn decodable_photo_is_prepared() {
    let dir = temp_dir("tl_prepared");
    let src = dir.join("big.png");
    image::RgbaImage::from_pixel(64, 64, image::Rgba([1, 2, 3, 255]))
        .save(&src)
        .unwrap();
    let plan = Plan::from_json_value(json!({
        "files": [{ "id": "big", "src": src, "duration": 3.25 }],
        "width": 32, "height": 32
    }))
    .unwrap();

    let work = dir.join("work");
    assemble_timeline(&plan, &work, &RecordingEncoder::default())
        .await
        .unwrap();
    assert!(work.join("big_prepared.png").is_file());
    let list = std::fs::read_to_string(work.join(CONCAT_LIST_FILE)).unwrap();
    assert!(list.contains("big_prepared.png"));
    assert!(list.contains("duration 3.250"));
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn trimmed_video_is_copied_first() {
    let dir = temp_dir("tl_trim");
    let src = dir.join("clip.mp4");
    std::fs::write(&src, b"x").unwrap();
    let plan = Plan::from_json_value(json!({
        "files": [{ "id": "v1", "src": src, "type": "video", "trimStart": 1, "trimEnd": 3 }]
    }))
    .unwrap();

    let encoder = RecordingEncoder::default();
    let work = dir.join("work");
    assemble_timeline(&plan, &work, &encoder).await.unwrap();

    let calls = encoder.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0][..3], ["-y", "-ss", "1"]);
    let list = std::fs::read_to_string(work.join(CONCAT_LIST_FILE)).unwrap();
    assert_eq!(list.lines().count(), 1);
    assert!(list.contains("v1_clip.mp4"));
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn missing_source_fails_before_encoding() {
    let dir = temp_dir("tl_missing");
    let plan = Plan::from_json_value(json!({
        "files": [{ "id": "a", "src": dir.join("nope.jpg") }]
    }))
    .unwrap();
    let encoder = RecordingEncoder::default();
    let err = assemble_timeline(&plan, &dir, &encoder).await.unwrap_err();
    assert!(matches!(err, ReelError::Asset(_)));
    assert!(encoder.calls.lock().unwrap().is_empty());
    let _ = std::fs::remove_dir_all(dir);
}
