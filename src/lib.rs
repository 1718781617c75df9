//! Loads UPD invoice bundles into MoySklad.
//!
//! `services` holds the engine (archive extraction, parsing, reconciliation),
//! `commands` the concurrent boundary used by the `upd-loader` binary.

pub mod commands;
pub mod services;
pub mod types;
#[cfg(test)]
pub mod test_utils;

pub use services::config::AppConfig;
pub use services::processor::UpdProcessor;
pub use types::outcome::ProcessingOutcome;
