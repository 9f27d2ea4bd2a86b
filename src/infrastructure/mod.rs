//! Infrastructure layer - adapters for hashing, persistence and logging

pub mod logging;
pub mod user;
