pub mod config;
pub mod error;
pub mod merge;
pub mod metrics;
pub mod pipeline;
pub mod present;
pub mod services;
pub mod store;

pub use error::{Result, TrafficError};
pub use pipeline::{reconcile, run, Reconciled, RunReport};
