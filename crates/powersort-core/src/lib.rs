//! Core functionality for sorting digitization output into catalog number
//! buckets.
//!
//! This library provides the components of the sort-and-log pipeline:
//! - Filename matching against configurable catalog patterns
//! - Deterministic bucket folder assignment
//! - File relocation under overwrite/dry-run policy
//! - The append-only CSV operation log
//! - URL reconstruction from a finished log
//! - Archive unpacking and image derivative generation

// -- Internal Modules --
mod error;

// -- Public Re-exports --
pub use config::*;
pub use error::{Error, Result};
pub use types::*;

// -- Public Modules --
pub mod bucket;
pub mod config;
pub mod derivatives;
pub mod oplog;
pub mod pipeline;
pub mod relocate;
pub mod scan;
pub mod sorter;
pub mod types;
pub mod unpack;
pub mod urlgen;
