//! CLI command implementations.

pub mod cache;
pub mod common;
pub mod config;
pub mod tiles;
pub mod view;
