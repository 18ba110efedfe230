pub mod config;
pub mod constants;
pub mod datasets;
pub mod importers;
pub mod interactions;
pub mod split;
