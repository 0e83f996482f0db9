//! Glue between the CLI and the library crates.

pub(crate) mod cache_manager;
pub(crate) mod series_loader;
