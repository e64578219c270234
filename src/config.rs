//! SKIPTTL - Engine Configuration
//! Defines tunable parameters for the skip list engine.

use crate::error::{Result, SkipListError};

/// Default upper bound on node height.
/// With p = 1/2 this keeps lookups logarithmic up to ~65K entries.
pub const DEFAULT_MAX_LEVEL: usize = 16;

/// Configuration for the skip list engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum node height. Fixed for the lifetime of the list; must be >= 1.
    pub max_level: usize,

    /// Seed for the leveling generator. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_level: DEFAULT_MAX_LEVEL,
            seed: None,
        }
    }
}

impl Config {
    /// Create a new Config with a custom maximum level.
    pub fn new(max_level: usize) -> Self {
        Self {
            max_level,
            ..Default::default()
        }
    }

    /// Use a fixed seed so node heights are reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_level == 0 {
            return Err(SkipListError::InvalidConfiguration(
                "max_level must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
