//! Cross-cutting request concerns: caller identity, booking throttling and
//! error-to-response mapping.

pub mod error_handling;
pub mod identity;
pub mod rate_limit;
