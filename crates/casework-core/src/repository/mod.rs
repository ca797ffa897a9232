//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (casework-infra) implements. The core crate never depends on any
//! specific storage technology.

pub mod case;
pub mod chat;
pub mod subscription;
pub mod user;
