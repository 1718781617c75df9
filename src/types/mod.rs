pub mod context;
pub mod document;
pub mod errors;
pub mod outcome;
