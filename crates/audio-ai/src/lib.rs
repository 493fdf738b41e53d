//! Montage Audio Intelligence
//!
//! Local-first speech processing:
//! - **Transcription:** whisper.cpp speech-to-text over 16 kHz mono PCM
//! - **Captioning:** Turns transcript chunks into timeline captions
//! - **Subtitle Generation:** SRT/VTT output from captions

pub mod captioning;
pub mod subtitles;
pub mod transcription;

pub use captioning::*;
pub use subtitles::*;
pub use transcription::*;
