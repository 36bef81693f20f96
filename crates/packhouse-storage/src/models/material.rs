use chrono::{DateTime, Utc};
use packhouse_core::MaterialStatus;
use packhouse_core::constants::{DEFAULT_MIN_STOCK, DEFAULT_UNIT};
use serde::{Deserialize, Serialize};

/// Material entity: a tracked inventory item
///
/// # Fields
///
/// * `id` - Auto-increment primary key (never reused after deletion)
/// * `name` - Unique display name, used by operators to post movements
/// * `quantity` - Current stock; may go negative if more leaves than was recorded
/// * `unit` - Unit of measure (e.g. "unidade", "kg")
/// * `min_stock` - Low-stock threshold for this material
/// * `status` - Derived from `quantity` and `min_stock`, never set directly
/// * `created_at` / `updated_at` - Record timestamps
///
/// # Invariant
///
/// `status == Low` if and only if `quantity < min_stock`. Every write path
/// recomputes the status through [`MaterialStatus::for_quantity`].
///
/// # Examples
///
/// ```
/// use packhouse_storage::models::Material;
/// use packhouse_core::MaterialStatus;
/// use chrono::Utc;
///
/// let material = Material {
///     id: 1,
///     name: "Caixa Roxa".to_string(),
///     quantity: 250,
///     unit: "unidade".to_string(),
///     min_stock: 20,
///     status: MaterialStatus::Normal,
///     created_at: Utc::now(),
///     updated_at: Utc::now(),
/// };
///
/// assert!(!material.is_low_stock());
/// assert!(material.status_is_consistent());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: i64,
    pub name: String,
    pub quantity: i64,
    pub unit: String,
    pub min_stock: i64,
    #[sqlx(try_from = "String")]
    pub status: MaterialStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Material {
    /// Returns `true` while the quantity is below the minimum stock.
    pub fn is_low_stock(&self) -> bool {
        self.quantity < self.min_stock
    }

    /// Check that the stored status agrees with quantity and threshold.
    pub fn status_is_consistent(&self) -> bool {
        self.status == MaterialStatus::for_quantity(self.quantity, self.min_stock)
    }

    /// Merge a partial update into this material and recompute its status.
    ///
    /// Does not touch `updated_at`; the repository stamps it on write.
    pub fn apply(&mut self, update: &MaterialUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(quantity) = update.quantity {
            self.quantity = quantity;
        }
        if let Some(unit) = &update.unit {
            self.unit = unit.clone();
        }
        if let Some(min_stock) = update.min_stock {
            self.min_stock = min_stock;
        }
        self.status = MaterialStatus::for_quantity(self.quantity, self.min_stock);
    }
}

/// Fields required to register a new material.
///
/// The id, status and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMaterial {
    pub name: String,
    pub quantity: i64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default = "default_min_stock")]
    pub min_stock: i64,
}

impl NewMaterial {
    /// New material with the default unit and low-stock threshold.
    pub fn new(name: impl Into<String>, quantity: i64) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit: default_unit(),
            min_stock: default_min_stock(),
        }
    }

    /// Set the unit of measure
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Set the low-stock threshold
    pub fn min_stock(mut self, min_stock: i64) -> Self {
        self.min_stock = min_stock;
        self
    }

    /// Status the material will be created with.
    pub fn initial_status(&self) -> MaterialStatus {
        MaterialStatus::for_quantity(self.quantity, self.min_stock)
    }
}

/// Partial update of a material; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialUpdate {
    pub name: Option<String>,
    pub quantity: Option<i64>,
    pub unit: Option<String>,
    pub min_stock: Option<i64>,
}

impl MaterialUpdate {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn min_stock(mut self, min_stock: i64) -> Self {
        self.min_stock = Some(min_stock);
        self
    }

    /// Returns `true` if no field would change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.quantity.is_none()
            && self.unit.is_none()
            && self.min_stock.is_none()
    }
}

pub(crate) fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}

pub(crate) fn default_min_stock() -> i64 {
    DEFAULT_MIN_STOCK
}
