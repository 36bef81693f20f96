//! Cross-record consistency checks over materials and movements.
//!
//! The checker only reports. It never repairs data: negative stock, orphaned
//! movements and quantities that disagree with their movement history are
//! all legitimate states an operator may need to look at.

use crate::error::StorageResult;
use crate::models::{Material, Movement};
use crate::store::InventoryStore;
use packhouse_core::constants::QUANTITY_TOLERANCE;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, warn};

/// One consistency problem found by [`IntegrityChecker`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntegrityIssue {
    /// Stored quantity is below zero
    #[serde(rename_all = "camelCase")]
    NegativeQuantity { material: String, quantity: i64 },

    /// Movement whose material no longer exists
    #[serde(rename_all = "camelCase")]
    OrphanedMovement {
        movement_id: i64,
        material_name: String,
    },

    /// Stored quantity differs from the replayed movement history by more
    /// than the tolerance
    #[serde(rename_all = "camelCase")]
    QuantityMismatch {
        material: String,
        current_quantity: i64,
        calculated_quantity: i64,
    },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IntegrityIssue::NegativeQuantity { material, quantity } => {
                write!(f, "{material}: quantidade negativa ({quantity})")
            }
            IntegrityIssue::OrphanedMovement {
                movement_id,
                material_name,
            } => write!(
                f,
                "movimentação #{movement_id} sem material ({material_name})"
            ),
            IntegrityIssue::QuantityMismatch {
                material,
                current_quantity,
                calculated_quantity,
            } => write!(
                f,
                "{material}: quantidade {current_quantity}, histórico soma {calculated_quantity}"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub is_valid: bool,
    pub issues: Vec<IntegrityIssue>,
    pub materials_count: usize,
    pub movements_count: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct IntegrityChecker {
    tolerance: i64,
}

impl Default for IntegrityChecker {
    fn default() -> Self {
        Self {
            tolerance: QUANTITY_TOLERANCE,
        }
    }
}

impl IntegrityChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the allowed difference between stored and replayed quantity.
    pub fn with_tolerance(tolerance: i64) -> Self {
        Self { tolerance }
    }

    /// Read the whole store in one consistent view and evaluate it.
    pub async fn check(&self, store: &InventoryStore) -> StorageResult<IntegrityReport> {
        let data = store.export_data().await?;

        let report = self.evaluate(&data.materials, &data.movements);
        if report.is_valid {
            debug!(
                materials = report.materials_count,
                movements = report.movements_count,
                "Integrity check passed"
            );
        } else {
            warn!(issues = report.issues.len(), "Integrity check found issues");
        }
        Ok(report)
    }

    /// Evaluate materials and movements without touching storage
    ///
    /// Issues come out grouped: negative quantities in material order, then
    /// orphaned movements in movement order, then quantity mismatches in
    /// material order. The replayed quantity of a material is the signed sum
    /// of the movements linked to its id, saturating at the `i64` bounds.
    pub fn evaluate(&self, materials: &[Material], movements: &[Movement]) -> IntegrityReport {
        let known: HashSet<i64> = materials.iter().map(|m| m.id).collect();

        let mut replayed: HashMap<i64, i64> = HashMap::new();
        for movement in movements {
            if let Some(material_id) = movement.material_id {
                let total = replayed.entry(material_id).or_insert(0);
                *total = total.saturating_add(movement.signed_quantity());
            }
        }

        let negatives = materials
            .iter()
            .filter(|m| m.quantity < 0)
            .map(|m| IntegrityIssue::NegativeQuantity {
                material: m.name.clone(),
                quantity: m.quantity,
            });

        let orphans = movements
            .iter()
            .filter(|mv| mv.material_id.is_none_or(|id| !known.contains(&id)))
            .map(|mv| IntegrityIssue::OrphanedMovement {
                movement_id: mv.id,
                material_name: mv.material_name.clone(),
            });

        let tolerance = self.tolerance.max(0).unsigned_abs();
        let mismatches = materials.iter().filter_map(|m| {
            let calculated = replayed.get(&m.id).copied().unwrap_or(0);
            (m.quantity.abs_diff(calculated) > tolerance).then(|| {
                IntegrityIssue::QuantityMismatch {
                    material: m.name.clone(),
                    current_quantity: m.quantity,
                    calculated_quantity: calculated,
                }
            })
        });

        let issues: Vec<IntegrityIssue> = negatives.chain(orphans).chain(mismatches).collect();

        IntegrityReport {
            is_valid: issues.is_empty(),
            issues,
            materials_count: materials.len(),
            movements_count: movements.len(),
        }
    }
}
