//! Filesystem primitives shared by the build and lifecycle commands.

pub mod perms;
pub mod tree_hash;

pub use perms::{ensure_readable, ensure_writable};
pub use tree_hash::hash_tree;
