use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One stage of refinement. Data flows strictly bronze to silver to gold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Raw provider rows, values kept in source string form.
    Bronze,
    /// Weekly-aligned, numeric.
    Silver,
    /// Feature-ready.
    Gold,
}

impl Tier {
    /// Directory name under the data root, also used as the table-name prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bronze" => Ok(Tier::Bronze),
            "silver" => Ok(Tier::Silver),
            "gold" => Ok(Tier::Gold),
            other => Err(format!("unknown tier '{other}' (expected bronze, silver or gold)")),
        }
    }
}

/// A logical table within a tier. Owns zero or more snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableLocation {
    pub tier: Tier,
    pub table: String,
}

impl TableLocation {
    pub fn new(tier: Tier, table: impl Into<String>) -> Self {
        Self {
            tier,
            table: table.into(),
        }
    }
}

impl fmt::Display for TableLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tier, self.table)
    }
}
