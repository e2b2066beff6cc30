//! Per-chat cache of the bot's delete capability, and the resolver that
//! fills it from the chat platform.

mod cache;
mod resolver;

pub use cache::PermissionCache;
pub use resolver::{PermissionPolicy, PermissionResolver};
