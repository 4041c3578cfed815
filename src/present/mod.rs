//! Consumers of merged state. Nothing in here mutates a series or a table.

pub mod chart;
pub mod payload;

pub use chart::write_chart;
pub use payload::build_payload;
