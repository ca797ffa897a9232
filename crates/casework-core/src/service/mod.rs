//! Application services, generic over the repository and provider ports.

pub mod assessment;
pub mod billing;
pub mod case;
pub mod chat;
pub mod transcription;
pub mod user;
