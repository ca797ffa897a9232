//! Shared domain types for Casework.
//!
//! This crate contains the core domain types used across the Casework platform:
//! chats, cases, agent personas, assessments, subscriptions, users, and their
//! associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod assessment;
pub mod case;
pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod subscription;
pub mod user;
pub mod webhook;
