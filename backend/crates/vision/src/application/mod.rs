//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.

pub mod analyze_image;
pub mod config;
