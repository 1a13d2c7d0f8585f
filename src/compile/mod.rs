//! Plan → filter graph → one encoder invocation.
//!
//! Effects run first, anchored at the base clip's video pad; overlays continue from the effects
//! output; audio is compiled independently. [`command::build_invocation`] joins the three.

pub mod audio;
pub mod command;
pub mod effects;
pub mod overlays;
pub mod subtitles;
pub mod video_overlays;

use std::path::Path;

use crate::config::RenderDefaults;
use crate::foundation::error::ReelResult;
use crate::graph::label::LabelAllocator;
use crate::plan::model::Plan;

pub use audio::{AudioGraph, AudioGraphInput, compile_audio};
pub use command::{InputLayout, Invocation, InvocationRequest, build_invocation};
pub use effects::compile_effects;
pub use overlays::{OverlayRequest, compile_overlays};

/// Everything the compiler needs once the timeline and narration are resolved.
#[derive(Clone, Debug)]
pub struct CompileInputs<'a> {
    pub plan: &'a Plan,
    pub work_dir: &'a Path,
    pub base_clip: &'a Path,
    pub music: Option<&'a Path>,
    pub voice: Option<&'a Path>,
    pub subtitles: Option<&'a Path>,
    /// Length of the base clip; open-ended effects run to it.
    pub total_duration: f64,
    pub defaults: &'a RenderDefaults,
    pub shapes_enabled: bool,
    pub output: &'a Path,
}

pub fn compile_plan(inputs: &CompileInputs<'_>) -> ReelResult<Invocation> {
    let plan = inputs.plan;
    let layout = InputLayout::new(inputs.music.is_some(), inputs.voice.is_some());
    let mut labels = LabelAllocator::new();

    let effects = compile_effects(
        plan,
        &layout.base().pad(),
        inputs.total_duration,
        &mut labels,
    )?;

    let overlays = compile_overlays(
        &OverlayRequest {
            plan,
            work_dir: inputs.work_dir,
            base: &effects.output,
            subtitle_file: inputs.subtitles,
            force_style: None,
            prior_inputs: layout.first_extra(),
            defaults: inputs.defaults,
            shapes_enabled: inputs.shapes_enabled,
        },
        &mut labels,
    )?;

    let audio = compile_audio(&AudioGraphInput {
        has_music: inputs.music.is_some(),
        has_voice: inputs.voice.is_some(),
        music_volume_db: plan.music_volume_db,
        ducking: &plan.ducking,
        music: layout.music_ref(),
        voice: layout.voice_ref(),
    });

    let invocation = build_invocation(&InvocationRequest {
        base_clip: inputs.base_clip,
        music: inputs.music,
        voice: inputs.voice,
        effects: &effects,
        overlays: &overlays,
        audio: &audio,
        canvas: plan.canvas()?,
        fps: plan.fps,
        output: inputs.output,
    })?;
    tracing::debug!(args = ?invocation.args, "encoder invocation");
    Ok(invocation)
}
