use std::fmt;

use serde::{Deserialize, Serialize};

/// Letter grade assigned to a supplier evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
}

impl Grade {
    const fn ordered() -> [Self; 5] {
        [Self::A, Self::B, Self::C, Self::D, Self::E]
    }

    /// Classify a score into its grade band. Lower bounds are inclusive and every input,
    /// including negatives and NaN, lands in a band.
    pub fn from_score(score: f64) -> Self {
        Self::ordered()
            .into_iter()
            .find(|grade| grade.min_score().map_or(true, |floor| score >= floor))
            .unwrap_or(Self::E)
    }

    /// Inclusive floor of the band; `E` has no floor.
    pub const fn min_score(self) -> Option<f64> {
        match self {
            Self::A => Some(90.0),
            Self::B => Some(80.0),
            Self::C => Some(70.0),
            Self::D => Some(60.0),
            Self::E => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::A => "Excellent",
            Self::B => "Good",
            Self::C => "Satisfactory",
            Self::D => "Needs Improvement",
            Self::E => "Unacceptable",
        }
    }

    pub const fn letter(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}
