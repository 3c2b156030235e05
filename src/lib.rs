//! An order-statistic 2-4 tree for Rust.
//!
//! This crate provides [`TwoFourTree`], a balanced multiway search tree where every node holds
//! one to three sorted keys. Each key owns a [`ValueList`] of every value inserted under it, so
//! the tree behaves as an ordered multimap. Every node caches the number of values in its
//! subtree, which makes two order-statistic queries logarithmic:
//!
//! - [`rank`](TwoFourTree::rank) - The 1-based position of a key's first value
//! - [`select`](TwoFourTree::select) - The key stored at a 1-based position
//! - Indexing by [`Position`] - e.g., `tree[Position(1)]` for the smallest key
//!
//! # Example
//!
//! ```
//! use two_four_tree::{Position, TwoFourTree};
//!
//! let mut tree = TwoFourTree::new();
//! for key in [10, 20, 5, 6, 12, 30, 7, 17] {
//!     tree.insert(key, key * 100);
//! }
//! tree.insert(12, 1201);
//!
//! assert_eq!(tree.size(), 9);
//! assert_eq!(tree.search(&12), Some(&1200));
//! assert_eq!(tree.duplicates(&12), 2);
//!
//! // Positions count values, so the second 12 occupies position 6.
//! assert_eq!(tree.rank(&12), Some(5));
//! assert_eq!(tree.select(6), Some(&12));
//! assert_eq!(tree[Position(7)], 1700);
//!
//! assert!(tree.remove(&10));
//! assert_eq!(tree.rank(&12), Some(4));
//! tree.verify();
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **`tracing`** - Logs structural events (splits, merges, rotations) through the `tracing` crate
//!
//! # Implementation
//!
//! Insertion splits every full node it meets on the way down, and deletion widens every
//! single-element node it meets on the way down, so neither ever walks back up to repair the
//! tree. Nodes live in an arena and refer to their children and parent by handle.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod error;
mod order_statistic;
mod raw;
mod tracing_helpers;

pub mod two_four_tree;
pub mod value_list;

pub use error::{Error, Result};
pub use order_statistic::Position;
pub use two_four_tree::TwoFourTree;
pub use value_list::ValueList;
