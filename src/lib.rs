pub mod config;
pub mod dsl;
pub mod error;
pub mod generator;
pub mod graph;
