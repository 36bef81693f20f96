use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Brand: a box weight profile production is registered against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub id: i64,
    pub name: String,
    /// Kilograms per box
    pub box_weight: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Production batch: a number of boxes packed for a brand on a given day.
///
/// `box_weight` is copied from the brand when the batch is registered, so
/// later changes to the brand do not rewrite past production. `brand_name`
/// is a display cache refreshed when the brand is renamed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductionRecord {
    pub id: i64,
    pub date: NaiveDate,
    pub brand_id: i64,
    pub brand_name: String,
    pub boxes: i64,
    pub box_weight: f64,
    pub total_weight: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduction {
    pub date: NaiveDate,
    pub brand_id: i64,
    pub boxes: i64,
}

impl NewProduction {
    pub fn new(date: NaiveDate, brand_id: i64, boxes: i64) -> Self {
        Self {
            date,
            brand_id,
            boxes,
        }
    }
}

/// Partial update of a production batch.
///
/// Changing the brand re-copies the new brand's box weight; the total is
/// always recomputed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductionUpdate {
    pub date: Option<NaiveDate>,
    pub brand_id: Option<i64>,
    pub boxes: Option<i64>,
}

impl ProductionUpdate {
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn brand_id(mut self, brand_id: i64) -> Self {
        self.brand_id = Some(brand_id);
        self
    }

    pub fn boxes(mut self, boxes: i64) -> Self {
        self.boxes = Some(boxes);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductionFilter {
    pub date: Option<NaiveDate>,
    pub brand_id: Option<i64>,
}

impl ProductionFilter {
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn brand_id(mut self, brand_id: i64) -> Self {
        self.brand_id = Some(brand_id);
        self
    }
}

/// Totals over a set of production batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionSummary {
    pub total_boxes: i64,
    pub total_weight: f64,
}

impl ProductionSummary {
    pub fn from_records(records: &[ProductionRecord]) -> Self {
        records.iter().fold(Self::default(), |acc, record| Self {
            total_boxes: acc.total_boxes + record.boxes,
            total_weight: acc.total_weight + record.total_weight,
        })
    }
}

/// Weight of `boxes` boxes at `box_weight` kg each.
pub fn total_weight(boxes: i64, box_weight: f64) -> f64 {
    boxes as f64 * box_weight
}
