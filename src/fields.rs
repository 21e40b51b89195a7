//! Small value enums shared by the command line and the project model.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// What an import does with labels that already have a task group in the project.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ReimportPolicy {
    /// Always add new task groups, even for labels already present.
    #[default]
    Append,
    /// Leave labels that already name a task group alone.
    SkipExisting,
}

/// Direction for reordering categories and steps.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Target index when moving the item at `index` within a list of `len`, if in bounds.
    pub fn target(self, index: usize, len: usize) -> Option<usize> {
        let target = match self {
            Direction::Up => index.checked_sub(1)?,
            Direction::Down => index + 1,
        };
        (target < len && index < len).then_some(target)
    }
}
