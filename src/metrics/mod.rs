pub mod aggregator;
pub mod types;

pub use aggregator::*;
pub use types::*;
