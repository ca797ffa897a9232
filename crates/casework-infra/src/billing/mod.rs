//! Payment provider adapters.

pub mod stripe;
