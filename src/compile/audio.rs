//! Audio graph: music gain, optional sidechain ducking under narration, and the final mix.
//!
//! Pure function of its input; output labels are fixed names that never collide with the
//! `[N:a]` input pads or the video-side labels.

use crate::foundation::core::fmt_num;
use crate::graph::expr::volume_db;
use crate::graph::label::StreamRef;
use crate::plan::model::Ducking;

#[derive(Clone, Debug)]
pub struct AudioGraphInput<'a> {
    pub has_music: bool,
    pub has_voice: bool,
    pub music_volume_db: f64,
    pub ducking: &'a Ducking,
    pub music: StreamRef,
    pub voice: StreamRef,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioGraph {
    /// Filter chain to append to `-filter_complex`, if any.
    pub chain: Option<String>,
    /// `-map` target: `[amix]` for a compiled chain, a bare `N:a` for pass-through.
    pub map: Option<String>,
}

impl AudioGraph {
    pub fn silent() -> Self {
        Self {
            chain: None,
            map: None,
        }
    }
}

const MIX: &str = "[amix]";

pub fn compile_audio(input: &AudioGraphInput<'_>) -> AudioGraph {
    let music = input.music.pad();
    let voice = input.voice.pad();
    let gain = volume_db(input.music_volume_db);

    match (input.has_music, input.has_voice) {
        (true, true) if input.ducking.enabled => {
            let d = input.ducking;
            let chain = format!(
                "{music}{gain}[music0];\
{voice}asplit=2[voice0][voice_sc];\
[music0][voice_sc]sidechaincompress=threshold={}:ratio={}:attack={}:release={}:makeup={}[ducked];\
[ducked][voice0]amix=inputs=2:normalize=0{MIX}",
                fmt_num(d.threshold),
                fmt_num(d.ratio),
                fmt_num(d.attack),
                fmt_num(d.release),
                fmt_num(d.music_duck_db),
            );
            mixed(chain)
        }
        (true, true) => mixed(format!(
            "{music}{gain}[music0];[music0]{voice}amix=inputs=2:normalize=0{MIX}"
        )),
        (true, false) => mixed(format!("{music}{gain}{MIX}")),
        (false, true) => AudioGraph {
            chain: None,
            map: Some(input.voice.specifier()),
        },
        (false, false) => AudioGraph::silent(),
    }
}

fn mixed(chain: String) -> AudioGraph {
    AudioGraph {
        chain: Some(chain),
        map: Some(MIX.to_owned()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/audio.rs"]
mod tests;
