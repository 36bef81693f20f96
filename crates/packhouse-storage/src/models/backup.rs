use crate::error::{StorageError, StorageResult};
use crate::models::material::{default_min_stock, default_unit};
use crate::models::{Material, Movement};
use chrono::{DateTime, Utc};
use packhouse_core::{MovementType, human_date, lenient_timestamp, parse_timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Full copy of the inventory as produced by `export_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryExport {
    pub materials: Vec<Material>,
    pub movements: Vec<Movement>,
    pub export_date: DateTime<Utc>,
}

/// Backup snapshot: an immutable, timestamped copy of the inventory.
///
/// This is also the exact shape of an exported backup file:
///
/// ```json
/// {
///   "data": { "materials": [], "movements": [], "exportDate": "..." },
///   "timestamp": "2026-02-15T14:30:00.000000Z",
///   "version": "1.0.0"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub data: InventoryExport,
    pub timestamp: String,
    pub version: String,
}

impl Snapshot {
    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary::new(
            &self.timestamp,
            &self.version,
            self.data.materials.len() as i64,
            self.data.movements.len() as i64,
        )
    }

    /// Calendar day (UTC) used in exported file names.
    pub fn file_date(&self) -> String {
        match parse_timestamp(&self.timestamp) {
            Ok(ts) => ts.format("%Y-%m-%d").to_string(),
            Err(_) => self.data.export_date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Listing entry for one snapshot of the ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    pub timestamp: String,
    pub human_date: String,
    pub materials_count: i64,
    pub movements_count: i64,
    pub version: String,
}

impl SnapshotSummary {
    pub fn new(timestamp: &str, version: &str, materials_count: i64, movements_count: i64) -> Self {
        let human = parse_timestamp(timestamp)
            .map(|ts| human_date(&ts))
            .unwrap_or_else(|_| timestamp.to_string());

        Self {
            timestamp: timestamp.to_string(),
            human_date: human,
            materials_count,
            movements_count,
            version: version.to_string(),
        }
    }
}

/// Backup ring statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupStats {
    pub backups_count: usize,
    pub oldest_timestamp: Option<String>,
    pub newest_timestamp: Option<String>,
    pub auto_backup_enabled: bool,
    pub settings: Map<String, Value>,
}

/// Inventory payload accepted by `import_data`.
///
/// Parsing is lenient the way older backup files require: unknown fields are
/// ignored, derived fields (`status`) are dropped, defaults fill missing
/// units and thresholds, and legacy movement types and naive dates load.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ImportPayload {
    pub materials: Vec<ImportedMaterial>,
    pub movements: Vec<ImportedMovement>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedMaterial {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub quantity: i64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default = "default_min_stock")]
    pub min_stock: i64,
    #[serde(default, deserialize_with = "lenient_timestamp::option::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp::option::deserialize")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedMovement {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub material_id: Option<i64>,
    pub material_name: String,
    #[serde(rename = "type")]
    pub kind: MovementType,
    pub quantity: i64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp::option::deserialize")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp::option::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ImportPayload {
    /// Parse and validate the contents of a backup file.
    ///
    /// The document must be an object with a `data` object whose `materials`
    /// and `movements` members are arrays.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidFormat`] for malformed JSON, a missing or
    /// wrongly typed `data.materials` / `data.movements`, or records that do
    /// not deserialize.
    pub fn from_backup_json(contents: &str) -> StorageResult<Self> {
        let document: Value = serde_json::from_str(contents)
            .map_err(|e| StorageError::InvalidFormat(format!("not valid JSON: {}", e)))?;

        let data = document
            .get("data")
            .filter(|data| data.is_object())
            .ok_or_else(|| StorageError::InvalidFormat("missing 'data' object".to_string()))?;

        for member in ["materials", "movements"] {
            if !data.get(member).is_some_and(Value::is_array) {
                return Err(StorageError::InvalidFormat(format!(
                    "'data.{}' must be an array",
                    member
                )));
            }
        }

        Self::deserialize(data)
            .map_err(|e| StorageError::InvalidFormat(format!("invalid record: {}", e)))
    }
}

impl From<&InventoryExport> for ImportPayload {
    fn from(export: &InventoryExport) -> Self {
        Self {
            materials: export
                .materials
                .iter()
                .map(|m| ImportedMaterial {
                    id: Some(m.id),
                    name: m.name.clone(),
                    quantity: m.quantity,
                    unit: m.unit.clone(),
                    min_stock: m.min_stock,
                    created_at: Some(m.created_at),
                    updated_at: Some(m.updated_at),
                })
                .collect(),
            movements: export
                .movements
                .iter()
                .map(|m| ImportedMovement {
                    id: Some(m.id),
                    material_id: m.material_id,
                    material_name: m.material_name.clone(),
                    kind: m.kind,
                    quantity: m.quantity,
                    unit: Some(m.unit.clone()),
                    date: Some(m.date),
                    description: m.description.clone(),
                    created_at: Some(m.created_at),
                })
                .collect(),
        }
    }
}
