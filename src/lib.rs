//! devinfra - repository maintenance tooling
//!
//! Merges pull requests according to a label-driven policy, tracks
//! long-term support branches and validates repository configuration.
//!
//! The merge pipeline is layered:
//! - [`config`] loads and validates the merge policy
//! - [`platform`] talks to GitHub, [`git`] to the local working copy
//! - [`merge`] validates a pull request, runs a strategy and reports the
//!   outcome as a [`merge::MergeResult`]

pub mod auth;
pub mod config;
pub mod error;
pub mod git;
pub mod merge;
pub mod ngbot;
pub mod platform;
pub mod prompt;
pub mod release;
pub mod types;

pub use error::{Error, Result};
