//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Durable key-value persistence (file-backed and in-memory)
//! - Injectable randomness for user-facing message selection

pub mod kv;
pub mod random;
