//! SKIPTTL - Engine Module
//! The skip list and the pieces it is built from.

pub mod dump;
pub mod iter;
pub mod level;
pub mod metrics;
pub mod node;
pub mod skiplist;
pub mod ttl;

pub use self::dump::Dump;
pub use self::iter::Iter;
pub use self::level::LevelGenerator;
pub use self::metrics::EngineMetrics;
pub use self::skiplist::SkipList;
pub use self::ttl::Expiry;
