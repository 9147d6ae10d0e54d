//! `weknora-api`: typed wrappers over the request pipeline.
//!
//! Each function is one call through [`weknora_client::HttpClient`] plus the
//! payload types. Headers, error parsing and session invalidation all happen
//! in the client; nothing here repeats them.

pub mod auth;
pub mod department;
pub mod permission;
pub mod reply;

pub use reply::{ApiReply, CodeMessage};
