//! Application core: services over the record store plus the reactive
//! dashboard that ties their snapshots together.

pub mod dashboard;
pub mod services;

pub use dashboard::{BatchOutcome, Dashboard};
