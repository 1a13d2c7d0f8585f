//! External collaborators behind async traits, each with one real adapter.

pub mod encoder;
pub mod fetch;
pub mod notify;
pub mod transcribe;
pub mod tts;

pub use encoder::{Encoder, EncoderOutput, FfmpegEncoder, ProbeInfo};
pub use fetch::{AssetFetcher, HttpFetcher, LocalAsset};
pub use notify::{Notifier, WebhookNotifier};
pub use transcribe::{Transcriber, WhisperCli};
pub use tts::{HttpSynthesizer, Synthesizer};
