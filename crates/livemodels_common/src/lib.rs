//! Shared foundational types used across the livemodels crates.
//!
//! This crate provides the content digest used as the cache key for live model
//! builds and the case-insensitive content-type [`Alias`].

#![warn(missing_docs)]

pub mod alias;
pub mod hash;

pub use alias::Alias;
pub use hash::{ContentHash, ContentHasher, ParseHashError};
