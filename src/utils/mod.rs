//! Shared utility functions.
//!
//! - `filename`: sanitising user-supplied upload names

mod filename;

pub use filename::{extension_lowercase, secure_filename};
