//! CEFR proficiency levels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Common European Framework of Reference levels, ordered by increasing
/// proficiency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    /// All levels from lowest to highest.
    pub const ALL: [CefrLevel; 6] = [
        CefrLevel::A1,
        CefrLevel::A2,
        CefrLevel::B1,
        CefrLevel::B2,
        CefrLevel::C1,
        CefrLevel::C2,
    ];

    /// Position of this level in [`CefrLevel::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// The next level up, if any.
    pub fn next(self) -> Option<CefrLevel> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// The next level down, if any.
    pub fn prev(self) -> Option<CefrLevel> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    /// This level together with its immediate neighbours, lowest first.
    ///
    /// Content delivery offers material from the learner's band rather than
    /// from the exact level only.
    pub fn band(self) -> Vec<CefrLevel> {
        self.prev()
            .into_iter()
            .chain(std::iter::once(self))
            .chain(self.next())
            .collect()
    }

    /// Coarse stage name shown next to a result.
    pub fn stage(self) -> &'static str {
        match self {
            CefrLevel::A1 | CefrLevel::A2 => "basic",
            CefrLevel::B1 | CefrLevel::B2 => "independent",
            CefrLevel::C1 | CefrLevel::C2 => "proficient",
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
            CefrLevel::C2 => "C2",
        };
        f.write_str(code)
    }
}

impl FromStr for CefrLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A1" => Ok(CefrLevel::A1),
            "A2" => Ok(CefrLevel::A2),
            "B1" => Ok(CefrLevel::B1),
            "B2" => Ok(CefrLevel::B2),
            "C1" => Ok(CefrLevel::C1),
            "C2" => Ok(CefrLevel::C2),
            other => Err(format!("unknown CEFR level: {other}")),
        }
    }
}
