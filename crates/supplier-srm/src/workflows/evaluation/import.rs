use serde::{Deserialize, Deserializer};
use std::io::Read;

use super::domain::ItemType;
use super::item::{EvaluationItem, ItemValidationError, NewEvaluationItem};

/// Failure while reading an item breakdown sheet.
#[derive(Debug, thiserror::Error)]
pub enum ItemImportError {
    #[error("failed to read item sheet: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid item sheet data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: unknown item type '{value}' (expected quantitative or qualitative)")]
    UnknownItemType { row: usize, value: String },
    #[error("row {row}: {source}")]
    Invalid {
        row: usize,
        #[source]
        source: ItemValidationError,
    },
}

/// Parse an item sheet with headers `Item,Type,Weight,Score,Max Score,Unit,Description`.
/// Rows are numbered from 1, excluding the header.
pub fn parse_items<R: Read>(reader: R) -> Result<Vec<EvaluationItem>, ItemImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut items = Vec::new();

    for (index, record) in csv_reader.deserialize::<ItemRow>().enumerate() {
        let row_number = index + 1;
        let row = record?;
        let new_item = row.into_new_item(row_number)?;
        let item = new_item
            .into_item()
            .map_err(|source| ItemImportError::Invalid {
                row: row_number,
                source,
            })?;
        items.push(item);
    }

    Ok(items)
}

#[derive(Debug, Deserialize)]
struct ItemRow {
    #[serde(rename = "Item")]
    name: String,
    #[serde(rename = "Type", default, deserialize_with = "empty_string_as_none")]
    item_type: Option<String>,
    #[serde(rename = "Weight")]
    weight: f64,
    #[serde(rename = "Score")]
    score: f64,
    #[serde(rename = "Max Score")]
    max_score: f64,
    #[serde(rename = "Unit", default, deserialize_with = "empty_string_as_none")]
    unit: Option<String>,
    #[serde(
        rename = "Description",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    description: Option<String>,
}

impl ItemRow {
    fn into_new_item(self, row: usize) -> Result<NewEvaluationItem, ItemImportError> {
        let item_type = match self.item_type {
            None => ItemType::default(),
            Some(raw) => {
                ItemType::parse(&raw).ok_or(ItemImportError::UnknownItemType { row, value: raw })?
            }
        };

        Ok(NewEvaluationItem {
            item_name: self.name,
            item_type,
            weight: self.weight,
            score: self.score,
            max_score: self.max_score,
            unit: self.unit,
            description: self.description,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
