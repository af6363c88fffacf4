use std::fmt;

use serde::{Deserialize, Serialize};

/// Externally assigned evaluation identifier (e.g. `PE-2025-Q3-001`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EvaluationNumber(pub String);

impl EvaluationNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EvaluationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of an evaluation item. Two items are the same item iff their ids match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item-{}", self.0)
    }
}

/// Opaque supplier reference. The supplier registry owns the record; evaluations only
/// keep enough to associate and display it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SupplierRef {
    pub supplier_id: String,
    pub name: String,
}

/// Classification tag for an evaluation item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    #[default]
    Quantitative,
    Qualitative,
}

impl ItemType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Quantitative => "quantitative",
            Self::Qualitative => "qualitative",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "quantitative" | "quant" => Some(Self::Quantitative),
            "qualitative" | "qual" => Some(Self::Qualitative),
            _ => None,
        }
    }
}

/// Approval lifecycle of a performance evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    #[default]
    Draft,
    PendingReview,
    Confirmed,
    Rejected,
}

impl EvaluationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingReview => "pending_review",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
        }
    }

    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Draft | Self::Rejected)
    }

    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Confirmed)
    }

    pub const fn is_approved(self) -> bool {
        matches!(self, Self::Confirmed)
    }

    pub const fn is_rejected(self) -> bool {
        matches!(self, Self::Rejected)
    }
}

impl fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
