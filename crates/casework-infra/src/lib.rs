//! Infrastructure implementations for Casework.
//!
//! SQLite repositories, the OpenAI and Whisper adapters, the Stripe gateway
//! and configuration loading. Implements the ports defined in `casework-core`.

pub mod billing;
pub mod config;
pub mod llm;
pub mod sqlite;
