#[cfg(feature = "rusqlite")]
pub mod rusqlite;

pub mod memory;

mod config;
