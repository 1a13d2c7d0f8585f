use super::*;

#[test]
fn allocator_steps_are_monotonic_and_shared_across_prefixes() {
    let mut alloc = LabelAllocator::new();
    assert_eq!(alloc.current(), 0);
    assert_eq!(alloc.next("vfx_").to_string(), "[vfx_1]");
    assert_eq!(alloc.next("v").to_string(), "[v2]");
    let step = alloc.next_step();
    assert_eq!(LabelAllocator::at("vout_", step).to_string(), "[vout_3]");
    assert_eq!(alloc.current(), 3);
}

#[test]
fn stream_refs_render_both_forms() {
    let r = StreamRef::audio(2);
    assert_eq!(r.specifier(), "2:a");
    assert_eq!(r.pad(), "[2:a]");
    assert_eq!(StreamRef::video(0).pad(), "[0:v]");
}

#[test]
fn placeholders_resolve_with_offset() {
    let chain = format!(
        "[v1]{}overlay=0:0[v2];[v2]{}overlay=5:5[v3]",
        placeholder(0),
        placeholder(1)
    );
    let resolved = resolve_placeholders(&chain, 3, 2).unwrap();
    assert_eq!(resolved, "[v1][3:v]overlay=0:0[v2];[v2][4:v]overlay=5:5[v3]");
}

#[test]
fn chain_without_placeholders_is_unchanged() {
    let chain = "[0:v]format=yuv420p[vout_1]";
    assert_eq!(resolve_placeholders(chain, 1, 0).unwrap(), chain);
}

#[test]
fn unbacked_or_malformed_placeholders_fail() {
    let err = resolve_placeholders("[v1][#2:v]overlay[v2]", 1, 2).unwrap_err();
    assert!(err.to_string().contains("#2"));
    assert!(resolve_placeholders("[v1][#x:v]overlay[v2]", 1, 2).is_err());
    assert!(resolve_placeholders("[v1][#0", 1, 2).is_err());
}
