//! CLI command implementations.

pub mod cc_map;
pub mod common;
pub mod config;
pub mod params;
pub mod render;
