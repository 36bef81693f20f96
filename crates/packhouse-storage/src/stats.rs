use crate::error::StorageResult;
use crate::models::{Material, Movement};
use crate::store::InventoryStore;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Dashboard counters derived from the store contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStats {
    pub total_materials: usize,
    pub total_quantity: i64,
    pub low_stock_count: usize,
    /// Movements dated on the reference day (local time)
    pub today_movements: usize,
}

impl InventoryStats {
    pub fn compute(materials: &[Material], movements: &[Movement], today: NaiveDate) -> Self {
        Self {
            total_materials: materials.len(),
            total_quantity: materials
                .iter()
                .fold(0i64, |total, m| total.saturating_add(m.quantity)),
            low_stock_count: materials.iter().filter(|m| m.is_low_stock()).count(),
            today_movements: movements.iter().filter(|m| m.day() == today).count(),
        }
    }

    /// Counters for the current store contents, "today" being the local date.
    pub async fn collect(store: &InventoryStore) -> StorageResult<Self> {
        let data = store.export_data().await?;

        Ok(Self::compute(
            &data.materials,
            &data.movements,
            Local::now().date_naive(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Database;
    use crate::models::{NewMaterial, NewMovement};
    use chrono::{Duration, TimeZone, Utc};
    use packhouse_core::{MaterialStatus, MovementType};
    use rstest::rstest;

    fn material(quantity: i64, min_stock: i64) -> Material {
        Material {
            id: 1,
            name: "Bolsão".to_string(),
            quantity,
            unit: "unidade".to_string(),
            min_stock,
            status: MaterialStatus::for_quantity(quantity, min_stock),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn movement_on(date: chrono::DateTime<Utc>) -> Movement {
        Movement {
            id: 1,
            material_id: Some(1),
            material_name: "Bolsão".to_string(),
            kind: MovementType::In,
            quantity: 1,
            unit: "unidade".to_string(),
            date,
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_compute_counters() {
        let noon = Local
            .with_ymd_and_hms(2026, 2, 15, 12, 0, 0)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        let today = NaiveDate::from_ymd_opt(2026, 2, 15).unwrap();

        let stats = InventoryStats::compute(
            &[material(250, 20), material(15, 20), material(-5, 20), material(20, 20)],
            &[
                movement_on(noon),
                movement_on(noon + Duration::hours(1)),
                movement_on(noon - Duration::days(1)),
            ],
            today,
        );

        assert_eq!(stats.total_materials, 4);
        assert_eq!(stats.total_quantity, 280);
        assert_eq!(stats.low_stock_count, 2);
        assert_eq!(stats.today_movements, 2);
    }

    #[rstest]
    #[case(vec![i64::MAX, 1], i64::MAX)]
    #[case(vec![i64::MIN, -1], i64::MIN)]
    #[case(vec![i64::MAX, i64::MIN], -1)]
    #[case(vec![i64::MAX, 5, -10], i64::MAX - 10)]
    fn test_total_quantity_saturates(#[case] quantities: Vec<i64>, #[case] expected: i64) {
        let today = NaiveDate::from_ymd_opt(2026, 2, 15).unwrap();
        let materials: Vec<Material> = quantities.into_iter().map(|q| material(q, 0)).collect();

        let stats = InventoryStats::compute(&materials, &[], today);
        assert_eq!(stats.total_quantity, expected);
    }

    #[test]
    fn test_empty_store() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 15).unwrap();
        assert_eq!(InventoryStats::compute(&[], &[], today), InventoryStats::default());
    }

    #[tokio::test]
    async fn test_collect_counts_movements_posted_now() {
        let db = Database::in_memory().await.unwrap();
        let store = InventoryStore::new(&db);
        store.add_material(&NewMaterial::new("Strado", 50)).await.unwrap();
        store.add_movement(&NewMovement::exit("Strado", 40)).await.unwrap();

        let stats = InventoryStats::collect(&store).await.unwrap();
        assert_eq!(stats.total_materials, 1);
        assert_eq!(stats.total_quantity, 10);
        assert_eq!(stats.low_stock_count, 1);
        assert_eq!(stats.today_movements, 1);
    }
}
