use chrono::{DateTime, NaiveDate, Utc};
use packhouse_core::{MovementType, local_day};
use serde::{Deserialize, Serialize};

/// Stock movement: an entry into or exit from a material's stock
///
/// Movements are append-mostly history. Posting one adjusts the referenced
/// material in the same transaction; see
/// [`MovementRepository::create`](crate::repositories::MovementRepository::create).
///
/// # Material Reference
///
/// `material_id` is the authoritative link to the material. `material_name`
/// is a display cache kept in sync when the material is renamed. A movement
/// whose `material_id` is `None` or points at a deleted material is an
/// orphan; orphans are tolerated and reported by the integrity checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub id: i64,
    pub material_id: Option<i64>,
    pub material_name: String,
    #[serde(rename = "type")]
    #[sqlx(try_from = "String")]
    pub kind: MovementType,
    pub quantity: i64,
    pub unit: String,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Movement {
    /// Quantity delta this movement applied to its material.
    pub fn signed_quantity(&self) -> i64 {
        self.kind.signed(self.quantity)
    }

    /// Local calendar day of the movement.
    pub fn day(&self) -> NaiveDate {
        local_day(&self.date)
    }
}

/// Fields required to post a movement.
///
/// `unit` falls back to the material's unit and `date` to the current time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovement {
    pub material_name: String,
    pub kind: MovementType,
    pub quantity: i64,
    pub unit: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

impl NewMovement {
    pub fn new(material_name: impl Into<String>, kind: MovementType, quantity: i64) -> Self {
        Self {
            material_name: material_name.into(),
            kind,
            quantity,
            unit: None,
            date: None,
            description: None,
        }
    }

    /// Stock entry of `quantity` units
    pub fn entry(material_name: impl Into<String>, quantity: i64) -> Self {
        Self::new(material_name, MovementType::In, quantity)
    }

    /// Stock exit of `quantity` units
    pub fn exit(material_name: impl Into<String>, quantity: i64) -> Self {
        Self::new(material_name, MovementType::Out, quantity)
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Movement filter; every provided field must match (logical AND).
///
/// # Examples
///
/// ```
/// use packhouse_storage::models::MovementFilter;
/// use packhouse_core::MovementType;
///
/// let filter = MovementFilter::default()
///     .material_name("Caixa Roxa")
///     .kind(MovementType::Out);
/// assert!(!filter.is_empty());
/// assert!(MovementFilter::default().is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementFilter {
    pub material_name: Option<String>,
    pub kind: Option<MovementType>,
    /// Local calendar day
    pub date: Option<NaiveDate>,
}

impl MovementFilter {
    pub fn material_name(mut self, name: impl Into<String>) -> Self {
        self.material_name = Some(name.into());
        self
    }

    pub fn kind(mut self, kind: MovementType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.material_name.is_none() && self.kind.is_none() && self.date.is_none()
    }

    pub fn matches(&self, movement: &Movement) -> bool {
        self.material_name
            .as_ref()
            .is_none_or(|name| &movement.material_name == name)
            && self.kind.is_none_or(|kind| movement.kind == kind)
            && self.date.is_none_or(|day| movement.day() == day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Local, TimeZone};

    fn create_test_movement(kind: MovementType, date: DateTime<Utc>) -> Movement {
        Movement {
            id: 1,
            material_id: Some(1),
            material_name: "Caixa Roxa".to_string(),
            kind,
            quantity: 15,
            unit: "unidade".to_string(),
            date,
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_signed_quantity() {
        assert_eq!(
            create_test_movement(MovementType::In, Utc::now()).signed_quantity(),
            15
        );
        assert_eq!(
            create_test_movement(MovementType::Out, Utc::now()).signed_quantity(),
            -15
        );
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let movement = create_test_movement(MovementType::In, Utc::now());
        assert!(MovementFilter::default().matches(&movement));
    }

    #[test]
    fn test_filter_is_conjunction() {
        let movement = create_test_movement(MovementType::Out, Utc::now());

        let matching = MovementFilter::default()
            .material_name("Caixa Roxa")
            .kind(MovementType::Out);
        assert!(matching.matches(&movement));

        let wrong_type = MovementFilter::default()
            .material_name("Caixa Roxa")
            .kind(MovementType::In);
        assert!(!wrong_type.matches(&movement));
    }

    #[test]
    fn test_filter_by_local_day() {
        let noon = Local
            .with_ymd_and_hms(2026, 2, 15, 12, 0, 0)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        let movement = create_test_movement(MovementType::In, noon);

        let same_day = MovementFilter::default().date(NaiveDate::from_ymd_opt(2026, 2, 15).unwrap());
        assert!(same_day.matches(&movement));

        let next_day = MovementFilter::default().date(NaiveDate::from_ymd_opt(2026, 2, 16).unwrap());
        assert!(!next_day.matches(&movement));

        let shifted = create_test_movement(MovementType::In, noon + Duration::days(1));
        assert!(next_day.matches(&shifted));
    }

    #[test]
    fn test_serialized_shape_uses_type_key() {
        let movement = create_test_movement(MovementType::In, Utc::now());
        let json = serde_json::to_value(&movement).unwrap();
        assert_eq!(json["type"], "in");
        assert_eq!(json["materialName"], "Caixa Roxa");
        assert!(json.get("kind").is_none());
    }
}
