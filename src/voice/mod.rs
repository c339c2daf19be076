//! Speech backends: Whisper transcription and WAV synthesis

pub mod stt;
pub mod tts;

pub use stt::WhisperStt;
pub use tts::TextToSpeech;
