//! Structural parsing of the card and main UPD documents.
//!
//! Both payloads arrive already decoded to Unicode (see `services::bundle`).

mod card;
mod numbers;
mod upd;
pub mod xml_tree;

pub use card::parse_card;
pub use numbers::{first_digit_run, parse_card_timestamp, parse_decimal, parse_invoice_date};
pub use upd::{parse_main_document, ParsedMainDocument, STUB_THRESHOLD_CHARS};

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How the main-document pass treats payloads it cannot parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Degrade to a stub document and keep going.
    #[default]
    Lenient,
    /// Fail the request with `MalformedDocument`.
    Strict,
}

impl FromStr for ParseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(ParseMode::Lenient),
            "strict" => Ok(ParseMode::Strict),
            other => Err(format!("unknown parse mode '{other}' (expected lenient or strict)")),
        }
    }
}

#[cfg(test)]
#[path = "tests/card_tests.rs"]
mod card_tests;

#[cfg(test)]
#[path = "tests/upd_tests.rs"]
mod upd_tests;

#[cfg(test)]
#[path = "tests/numbers_tests.rs"]
mod numbers_tests;
