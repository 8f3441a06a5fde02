//! Domain Services
//!
//! Pure rules with no I/O.

pub mod failure;
pub mod flavor;
