//! Reelsmith turns a declarative JSON video plan into one ffmpeg render.
//!
//! A job runs in fixed stages:
//!
//! - Fetch remote sources and assemble the timeline into a base clip ([`timeline`])
//! - Resolve narration (file or TTS) and optionally transcribe it to subtitles
//! - Compile effects, overlays and audio into a single `-filter_complex` ([`compile`])
//! - Run the encoder once
//!
//! [`JobQueue`] runs jobs on a bounded worker pool and keeps their [`JobStatus`] queryable.
#![forbid(unsafe_code)]

pub mod assets;
pub mod compile;
pub mod config;
pub mod foundation;
pub mod graph;
pub mod jobs;
pub mod plan;
pub mod services;
pub mod timeline;

pub use crate::compile::{CompileInputs, Invocation, compile_plan};
pub use crate::config::{RenderDefaults, ServiceConfig};
pub use crate::foundation::core::Canvas;
pub use crate::foundation::error::{ReelError, ReelResult};
pub use crate::jobs::{JobQueue, JobSettings, JobState, JobStatus, Services};
pub use crate::plan::{Plan, validate};
pub use crate::plan::storyboard::Storyboard;
pub use crate::timeline::assemble_timeline;
