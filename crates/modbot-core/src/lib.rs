//! Core domain + moderation logic for the group moderation bot.
//!
//! This crate is framework-agnostic. The chat platform (Telegram today) lives
//! behind the [`ports::ChatPlatform`] trait implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod filter;
pub mod logging;
pub mod permissions;
pub mod pipeline;
pub mod ports;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};
