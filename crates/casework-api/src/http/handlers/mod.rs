//! Route handlers, one module per resource.

pub mod billing;
pub mod case;
pub mod chat;
pub mod transcribe;
