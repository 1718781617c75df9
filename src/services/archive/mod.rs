//! Archive extraction into a request-scoped scratch directory.
//!
//! The scratch directory is a `TempDir` unique to the request, so concurrent
//! uploads never share an extraction tree and the tree is removed on drop.

mod extract;
mod path_guard;

pub use extract::extract_archive;
pub use path_guard::resolve_inside;

#[cfg(test)]
#[path = "tests/extract_tests.rs"]
mod tests;
