// View filters and clear scopes

use crate::item::Item;
use eyre::{Result, eyre};
use std::str::FromStr;

/// Which items a view shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Completed,
    Incomplete,
}

impl Filter {
    pub fn matches(self, item: &Item) -> bool {
        match self {
            Filter::All => true,
            Filter::Completed => item.completed,
            Filter::Incomplete => !item.completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Completed => "completed",
            Filter::Incomplete => "incomplete",
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Filter {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(Filter::All),
            "completed" => Ok(Filter::Completed),
            "incomplete" => Ok(Filter::Incomplete),
            other => Err(eyre!(
                "Invalid filter: {} (expected all, completed or incomplete)",
                other
            )),
        }
    }
}

/// Which items a clear removes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearScope {
    All,
    Completed,
}

impl ClearScope {
    pub fn matches(self, item: &Item) -> bool {
        match self {
            ClearScope::All => true,
            ClearScope::Completed => item.completed,
        }
    }
}

impl std::fmt::Display for ClearScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClearScope::All => write!(f, "all"),
            ClearScope::Completed => write!(f, "completed"),
        }
    }
}
