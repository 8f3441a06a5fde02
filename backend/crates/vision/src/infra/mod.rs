//! Infrastructure Layer
//!
//! Outbound model clients.

pub mod openai;
