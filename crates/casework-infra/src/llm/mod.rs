//! OpenAI-backed adapters: chat completions and Whisper transcription.

pub mod openai;
pub mod whisper;
