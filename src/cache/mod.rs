//! Memoized async lookups over the on-disk metadata package.
//!
//! [`MemoCache`] deduplicates concurrent loads of the same key by sharing
//! one in-flight future. [`MetadataLookup`] builds the name, pool-window
//! and manifest lookups on top of it.

pub mod lookup;
pub mod memo;

pub use lookup::{ItemNames, MetadataLookup, MetadataStatus};
pub use memo::MemoCache;
