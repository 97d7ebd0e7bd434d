//! Bucket Hierarchy
//!
//! Addressing and traversal of the nested bucket tree: slash-separated paths
//! resolved to bucket handles, and a pre-order walker shared by search and
//! export.

pub mod path;
pub mod walker;

pub use path::{resolve, BucketPath};
pub use walker::{WalkControl, Walker};
