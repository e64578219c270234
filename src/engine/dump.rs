//! SKIPTTL - Diagnostic Dump
//! A read-only, printable view of every level in use, highest first.
//!
//! ```text
//! Level 2: (4, four)
//! Level 1: (2, two) (4, four)
//! Level 0: (1, one) (2, two) (4, four)
//! ```
//!
//! The dump only reads through the level iterators; building or printing
//! it never touches the list's state.

use std::fmt;

/// Snapshot of borrowed `(key, value)` pairs per level.
#[derive(Debug, Clone)]
pub struct Dump<'a, K, V> {
    /// `(level index, entries)` ordered from the highest level down to 0.
    levels: Vec<(usize, Vec<(&'a K, &'a V)>)>,
}

impl<'a, K, V> Dump<'a, K, V> {
    pub(crate) fn new(levels: Vec<(usize, Vec<(&'a K, &'a V)>)>) -> Self {
        Self { levels }
    }

    /// Number of levels in the dump.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Entries linked at `level`, or `None` if that level is not in use.
    pub fn level(&self, level: usize) -> Option<&[(&'a K, &'a V)]> {
        self.levels
            .iter()
            .find(|(idx, _)| *idx == level)
            .map(|(_, entries)| entries.as_slice())
    }

    /// Iterate `(level index, entries)` from the highest level down.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[(&'a K, &'a V)])> + '_ {
        self.levels
            .iter()
            .map(|(idx, entries)| (*idx, entries.as_slice()))
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for Dump<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.levels.is_empty() {
            return writeln!(f, "(empty)");
        }
        for (idx, entries) in self.iter() {
            write!(f, "Level {}:", idx)?;
            for (key, value) in entries {
                write!(f, " ({}, {})", key, value)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
