//! Bucketscope: browse, search and edit nested-bucket key-value stores
//!
//! A store is a hierarchy of named buckets. Each bucket holds ordered entries
//! that are either opaque byte values or further buckets. This crate provides
//! key-based pagination, bounded recursive search, value previews, streaming
//! export and transactional mutation over that hierarchy, backed by `redb`.

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod listing;
pub mod logging;
pub mod meta;
pub mod mutation;
pub mod search;
pub mod store;
pub mod tree;
pub mod value;
pub mod wire;
