//! Command implementations

pub mod config;
pub mod context;
pub mod merge;
pub mod ngbot;
pub mod prompt;
pub mod release;
pub mod style;
