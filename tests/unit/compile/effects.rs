use super::*;
use serde_json::json;

fn plan(effects: serde_json::Value) -> Plan {
    Plan::from_json_value(json!({
        "width": 720,
        "height": 1280,
        "files": [{ "id": "a", "src": "/a.jpg" }],
        "effects": effects
    }))
    .unwrap()
}

#[test]
fn no_effects_passes_base_through() {
    let mut labels = LabelAllocator::new();
    let frag = compile_effects(&plan(json!([])), "[0:v]", 10.0, &mut labels).unwrap();
    assert!(frag.is_empty());
    assert_eq!(frag.output, "[0:v]");
    assert_eq!(labels.current(), 0);
}

#[test]
fn effects_chain_from_base_and_end_in_format() {
    let mut labels = LabelAllocator::new();
    let frag = compile_effects(
        &plan(json!([
            { "kind": "zoom", "start": 0, "end": 4 },
            { "kind": "vhs", "start": 2 }
        ])),
        "[0:v]",
        10.0,
        &mut labels,
    )
    .unwrap();

    let stages: Vec<&str> = frag.chain.split(';').collect();
    assert_eq!(stages.len(), 3);
    assert!(stages[0].starts_with("[0:v]scale=w='iw*if(between(t,0,4),1+(1.2-1)"));
    assert!(stages[0].ends_with("[vfx_1]"));
    assert!(stages[1].starts_with("[vfx_1]format=yuv420p,eq=contrast=1.05"));
    assert!(stages[1].contains("enable='between(t,2,10)'"));
    assert!(stages[1].ends_with("[vfx_2]"));
    assert_eq!(stages[2], "[vfx_2]format=yuv420p[vfx_3]");
    assert_eq!(frag.output, "[vfx_3]");
}

#[test]
fn custom_filter_is_gated_unless_already_enabled() {
    let mut labels = LabelAllocator::new();
    let frag = compile_effects(
        &plan(json!([
            { "kind": "custom", "filter": "hue=s=0", "start": 1, "end": 2 },
            { "kind": "custom", "filter": "negate:enable='gte(t,3)'" }
        ])),
        "[0:v]",
        5.0,
        &mut labels,
    )
    .unwrap();
    assert!(frag.chain.contains("[0:v]hue=s=0:enable='between(t,1,2)'[vfx_1]"));
    assert!(frag.chain.contains("[vfx_1]negate:enable='gte(t,3)'[vfx_2]"));
}

#[test]
fn empty_window_after_defaulting_end_is_rejected() {
    let mut labels = LabelAllocator::new();
    let err = compile_effects(
        &plan(json!([{ "kind": "retro", "start": 6 }])),
        "[0:v]",
        5.0,
        &mut labels,
    )
    .unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
}

#[test]
fn labels_continue_from_shared_allocator() {
    let mut labels = LabelAllocator::new();
    labels.next_step();
    labels.next_step();
    let frag = compile_effects(
        &plan(json!([{ "kind": "retro" }])),
        "[0:v]",
        3.0,
        &mut labels,
    )
    .unwrap();
    assert!(frag.chain.contains("[vfx_3]"));
    assert_eq!(frag.output, "[vfx_4]");
}
