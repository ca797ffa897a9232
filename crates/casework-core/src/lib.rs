//! Business logic and repository trait definitions for Casework.
//!
//! This crate defines the "ports" (repository, provider and gateway traits)
//! that the infrastructure layer implements. It depends only on
//! `casework-types` -- never on `casework-infra` or any database/IO crate.

pub mod assessment;
pub mod llm;
pub mod prompt;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;
