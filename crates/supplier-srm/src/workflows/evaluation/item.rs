use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::domain::{EvaluationNumber, ItemId, ItemType};

pub const MAX_WEIGHT: f64 = 100.0;

static ITEM_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_item_id() -> ItemId {
    ItemId(ITEM_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

/// Move the sequence past `held` so items built afterwards cannot reuse an id loaded
/// from storage.
pub(crate) fn reserve_item_ids_through(held: ItemId) {
    ITEM_SEQUENCE.fetch_max(held.0.saturating_add(1), Ordering::Relaxed);
}

/// Input constraint violated while building or mutating an evaluation item.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ItemValidationError {
    #[error("item name must not be empty")]
    EmptyName,
    #[error("{field} must be a finite number (found {value})")]
    NonFinite { field: &'static str, value: f64 },
    #[error("weight must be between 0 and 100 percent (found {found})")]
    WeightOutOfRange { found: f64 },
    #[error("score must not be negative (found {found})")]
    NegativeScore { found: f64 },
    #[error("max score must be greater than zero (found {found})")]
    NonPositiveMaxScore { found: f64 },
}

fn finite(field: &'static str, value: f64) -> Result<f64, ItemValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ItemValidationError::NonFinite { field, value })
    }
}

fn validate_name(name: String) -> Result<String, ItemValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ItemValidationError::EmptyName);
    }
    if trimmed.len() == name.len() {
        Ok(name)
    } else {
        Ok(trimmed.to_string())
    }
}

fn validate_weight(weight: f64) -> Result<f64, ItemValidationError> {
    let weight = finite("weight", weight)?;
    if (0.0..=MAX_WEIGHT).contains(&weight) {
        Ok(weight)
    } else {
        Err(ItemValidationError::WeightOutOfRange { found: weight })
    }
}

fn validate_score(score: f64) -> Result<f64, ItemValidationError> {
    let score = finite("score", score)?;
    if score < 0.0 {
        return Err(ItemValidationError::NegativeScore { found: score });
    }
    Ok(score)
}

fn validate_max_score(max_score: f64) -> Result<f64, ItemValidationError> {
    let max_score = finite("max_score", max_score)?;
    if max_score <= 0.0 {
        return Err(ItemValidationError::NonPositiveMaxScore { found: max_score });
    }
    Ok(max_score)
}

/// A single weighted metric inside a performance evaluation.
///
/// Constructors and setters enforce the input constraints. Records materialized by a
/// persistence layer through serde are taken as-is, which is why the scoring math still
/// guards a zero max score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationItem {
    id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    evaluation: Option<EvaluationNumber>,
    item_name: String,
    #[serde(default)]
    item_type: ItemType,
    weight: f64,
    score: f64,
    max_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl EvaluationItem {
    pub fn new(
        item_name: impl Into<String>,
        item_type: ItemType,
        weight: f64,
        score: f64,
        max_score: f64,
    ) -> Result<Self, ItemValidationError> {
        Ok(Self {
            id: next_item_id(),
            evaluation: None,
            item_name: validate_name(item_name.into())?,
            item_type,
            weight: validate_weight(weight)?,
            score: validate_score(score)?,
            max_score: validate_max_score(max_score)?,
            unit: None,
            description: None,
        })
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Number of the evaluation currently holding this item, if any.
    pub fn evaluation(&self) -> Option<&EvaluationNumber> {
        self.evaluation.as_ref()
    }

    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn max_score(&self) -> f64 {
        self.max_score
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_quantitative(&self) -> bool {
        self.item_type == ItemType::Quantitative
    }

    pub fn is_qualitative(&self) -> bool {
        self.item_type == ItemType::Qualitative
    }

    /// `(score / max_score) * weight`, or zero when the max score is not positive.
    pub fn weighted_score(&self) -> f64 {
        if self.max_score > 0.0 {
            (self.score / self.max_score) * self.weight
        } else {
            0.0
        }
    }

    /// `(score / max_score) * 100`, or zero when the max score is not positive.
    pub fn score_percentage(&self) -> f64 {
        if self.max_score > 0.0 {
            (self.score / self.max_score) * 100.0
        } else {
            0.0
        }
    }

    pub fn rename(&mut self, item_name: impl Into<String>) -> Result<(), ItemValidationError> {
        self.item_name = validate_name(item_name.into())?;
        Ok(())
    }

    pub fn set_item_type(&mut self, item_type: ItemType) {
        self.item_type = item_type;
    }

    pub fn set_weight(&mut self, weight: f64) -> Result<(), ItemValidationError> {
        self.weight = validate_weight(weight)?;
        Ok(())
    }

    pub fn set_score(&mut self, score: f64) -> Result<(), ItemValidationError> {
        self.score = validate_score(score)?;
        Ok(())
    }

    pub fn set_max_score(&mut self, max_score: f64) -> Result<(), ItemValidationError> {
        self.max_score = validate_max_score(max_score)?;
        Ok(())
    }

    pub fn set_unit(&mut self, unit: Option<String>) {
        self.unit = unit;
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub(crate) fn attach_to(&mut self, number: &EvaluationNumber) {
        self.evaluation = Some(number.clone());
    }

    pub(crate) fn detach(&mut self) {
        self.evaluation = None;
    }
}

/// Unvalidated item payload accepted from collaborators (HTTP bodies, CSV rows).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvaluationItem {
    pub item_name: String,
    #[serde(default)]
    pub item_type: ItemType,
    pub weight: f64,
    pub score: f64,
    pub max_score: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewEvaluationItem {
    pub fn into_item(self) -> Result<EvaluationItem, ItemValidationError> {
        let mut item = EvaluationItem::new(
            self.item_name,
            self.item_type,
            self.weight,
            self.score,
            self.max_score,
        )?;
        item.set_unit(self.unit);
        item.set_description(self.description);
        Ok(item)
    }
}
