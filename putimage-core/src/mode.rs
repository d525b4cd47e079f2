use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Policy applied to the selected index on each external generation trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceMode {
    #[default]
    Fixed,
    Increment,
    Decrement,
    Randomize,
}

impl AdvanceMode {
    pub const ALL: [AdvanceMode; 4] = [
        AdvanceMode::Fixed,
        AdvanceMode::Increment,
        AdvanceMode::Decrement,
        AdvanceMode::Randomize,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Increment => "increment",
            Self::Decrement => "decrement",
            Self::Randomize => "randomize",
        }
    }
}

impl fmt::Display for AdvanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AdvanceMode {
    type Err = std::convert::Infallible;

    /// Unknown names fall back to [`AdvanceMode::Fixed`], matching how an
    /// unmatched mode leaves the index unchanged.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "increment" => Self::Increment,
            "decrement" => Self::Decrement,
            "randomize" => Self::Randomize,
            _ => Self::Fixed,
        })
    }
}
