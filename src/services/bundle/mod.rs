//! Locating and decoding the payloads of an extracted UPD bundle.

mod decode;
mod locate;

pub use decode::{decode_cp1251, read_cp1251};
pub use locate::{locate_bundle, read_payload, INDEX_FILE};

#[cfg(test)]
#[path = "tests/bundle_tests.rs"]
mod tests;
