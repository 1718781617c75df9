pub mod archive;
pub mod bundle;
pub mod config;
pub mod diagnostics;
pub mod moysklad;
pub mod parser;
pub mod processor;
pub mod reconcile;
pub mod report;
