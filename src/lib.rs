//! Marquee: content-based movie similarity and recommendation engine.

pub mod cache;
pub mod catalog;
pub mod cluster;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod metrics;
pub mod recommend;
pub mod server;
pub mod similarity;
pub mod text;
pub mod types;
