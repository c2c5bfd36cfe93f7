//! An ordered map backed by a plain, unbalanced binary search tree.
//!
//! This crate provides [`OrderedMap`], an ordered mapping from totally-ordered
//! keys to values with insertion, lookup, deletion, O(1) size tracking, and
//! in-order traversal:
//!
//! - [`insert`](OrderedMap::insert) - Add an entry, or overwrite the value of
//!   an existing key in place
//! - [`remove`](OrderedMap::remove) - Three-case BST deletion (leaf, single
//!   child, two children via in-order successor splice)
//! - [`for_each`](OrderedMap::for_each) - Visit every entry in ascending key
//!   order with a caller-supplied visitor
//!
//! # Example
//!
//! ```
//! use sapling_tree::OrderedMap;
//!
//! let mut population = OrderedMap::new();
//! population.insert("Lima", 10_000_000);
//! population.insert("Quito", 2_800_000);
//! population.insert("Bogota", 7_900_000);
//!
//! assert_eq!(population.len(), 3);
//! assert!(population.contains_key("Quito"));
//!
//! // Entries come back in key order.
//! let cities: Vec<_> = population.keys().copied().collect();
//! assert_eq!(cities, ["Bogota", "Lima", "Quito"]);
//!
//! population.remove("Lima");
//! assert_eq!(population.len(), 2);
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library
//!   dependency
//! - **Familiar API** - Mirrors the everyday surface of
//!   `std::collections::BTreeMap`, including the `Entry` API
//! - **Arena storage** - Nodes live in a slab arena addressed by
//!   niche-optimized handles; child slots are plain `Option<Handle>` values,
//!   so every subtree has exactly one owner and deletion is a single-owner
//!   splice
//!
//! # Implementation
//!
//! The tree is deliberately **unbalanced**: no rotations, no rebalancing on
//! insert or erase. Random insertion order gives the usual O(log n) expected
//! depth, while sorted insertion degrades the tree to a list and every
//! operation to O(n). Callers who need guaranteed bounds under adversarial
//! key order want a balanced tree instead; this crate trades that guarantee
//! for a small, fully transparent core.
//!
//! Traversal never recurses. Iteration, draining, and
//! [`for_each`](OrderedMap::for_each) all drive an explicit stack of pending
//! ancestors, so traversal depth is bounded by the tree's own shape rather
//! than the host call stack.
//!
//! `OrderedMap` is not safe for concurrent mutation from multiple threads
//! without external synchronization; no internal locking is provided.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
// NOTE: unsafe is confined to the mutable iterators, which hand out disjoint
// references into the node arena.
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]

extern crate alloc;

mod raw;

pub mod ordered_map;

pub use ordered_map::OrderedMap;
