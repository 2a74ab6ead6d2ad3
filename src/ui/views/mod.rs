//! Application views (screens).

pub mod detail;
pub mod list;
