#![warn(missing_docs, rust_2018_idioms)]
#![allow(missing_docs)]

//! # Recon-Feeds
//!
//! Pulls raw trade data from internal and external sources and normalizes it into the
//! canonical [`recon_core::Trade`] shape. Every adapter implements [`FeedAdapter`] and is
//! responsible only for getting bytes into rows; [`normalizer::normalize`] does the actual
//! field mapping, defaulting, and warning bookkeeping, so every adapter behaves the same way
//! on a malformed row: skip it, warn, keep going.

pub mod delimited;
pub mod feed;
pub mod internal;
pub mod normalizer;
pub mod tagvalue;

pub use delimited::DelimitedTextAdapter;
pub use feed::{FeedAdapter, FetchResult};
pub use internal::{InternalQueryAdapter, InternalQuerySource};
pub use normalizer::{normalize, NormalizeOutcome};
pub use tagvalue::TagValueAdapter;
