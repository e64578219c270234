//! SKIPTTL - Skip List Key-Value Container with TTL
//!
//! An in-memory ordered map built as a probabilistic multi-level linked list,
//! with an optional expiry on every entry.
//!
//! ## Features
//! - **Skip list**: expected O(log n) insert, search and erase
//! - **Arena storage**: nodes addressed by stable handles, no `unsafe`
//! - **Injectable randomness**: seed the leveling policy for reproducible layouts
//! - **TTL Support**: expired entries are hidden from lookups and removed by sweeps
//! - **Metrics**: atomic counters for observability
//! - **Diagnostics**: per-level dump and an invariant checker
//!
//! ## Example
//! ```
//! use std::time::Duration;
//! use skipttl::engine::{Expiry, SkipList};
//!
//! let mut list: SkipList<u32, String> = SkipList::new(8).unwrap();
//!
//! list.insert(1, "one".to_string()).unwrap();
//! list.insert_with_expiry(2, "two".to_string(), Expiry::after(Duration::from_secs(60)))
//!     .unwrap();
//!
//! assert_eq!(list.search(&1), Some(&"one".to_string()));
//! assert!(list.remaining_ttl(&2).is_some());
//! assert_eq!(list.cleanup_expired_nodes(), 0);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod types;

pub use config::Config;
pub use engine::{Expiry, SkipList};
pub use error::{Result, SkipListError};
