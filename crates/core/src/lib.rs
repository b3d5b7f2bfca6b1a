//! Domain types shared by the storage, engine and API crates.

pub mod clock;
pub mod errors;
pub mod events;
pub mod models;
