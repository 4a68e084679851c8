//! CLI command implementations

pub mod resources;
pub mod values;
