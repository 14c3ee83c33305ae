//! Command implementations

pub mod export;
pub mod version;
