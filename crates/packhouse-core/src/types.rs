use crate::{Result, error::Error};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stock level classification of a material.
///
/// A material is `Low` while its quantity is strictly below its minimum stock.
/// Legacy backup files spell the low state as `"Baixo"`; it is accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialStatus {
    Normal,
    #[serde(alias = "Baixo")]
    Low,
}

impl MaterialStatus {
    /// Classify a quantity against a minimum stock threshold.
    ///
    /// # Examples
    ///
    /// ```
    /// use packhouse_core::MaterialStatus;
    ///
    /// assert_eq!(MaterialStatus::for_quantity(19, 20), MaterialStatus::Low);
    /// assert_eq!(MaterialStatus::for_quantity(20, 20), MaterialStatus::Normal);
    /// ```
    #[inline]
    #[must_use]
    pub fn for_quantity(quantity: i64, min_stock: i64) -> Self {
        if quantity < min_stock {
            MaterialStatus::Low
        } else {
            MaterialStatus::Normal
        }
    }

    /// Storage representation.
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MaterialStatus::Normal => "Normal",
            MaterialStatus::Low => "Low",
        }
    }

    /// Returns `true` if the status is `Low`.
    #[inline]
    #[must_use]
    pub fn is_low(self) -> bool {
        matches!(self, MaterialStatus::Low)
    }
}

impl fmt::Display for MaterialStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MaterialStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Normal" => Ok(MaterialStatus::Normal),
            "Low" | "Baixo" => Ok(MaterialStatus::Low),
            other => Err(Error::InvalidStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for MaterialStatus {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Direction of a stock movement.
///
/// Serialized as `"in"` / `"out"`. The Portuguese spellings used by older
/// backup files (`"entrada"` / `"saida"`) are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementType {
    #[serde(rename = "in", alias = "entrada")]
    In,
    #[serde(rename = "out", alias = "saida")]
    Out,
}

impl MovementType {
    /// Storage representation.
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MovementType::In => "in",
            MovementType::Out => "out",
        }
    }

    /// Quantity delta this movement applies to its material.
    ///
    /// # Examples
    ///
    /// ```
    /// use packhouse_core::MovementType;
    ///
    /// assert_eq!(MovementType::In.signed(15), 15);
    /// assert_eq!(MovementType::Out.signed(15), -15);
    /// ```
    #[inline]
    #[must_use]
    pub fn signed(self, quantity: i64) -> i64 {
        match self {
            MovementType::In => quantity,
            MovementType::Out => -quantity,
        }
    }

    /// Display name in Portuguese.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            MovementType::In => "Entrada",
            MovementType::Out => "Saída",
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MovementType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "in" | "entrada" => Ok(MovementType::In),
            "out" | "saida" | "saída" => Ok(MovementType::Out),
            _ => Err(Error::InvalidMovementType(s.to_string())),
        }
    }
}

impl TryFrom<String> for MovementType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Parse a timestamp from a backup file or user input.
///
/// Accepts RFC 3339 (`2026-02-15T14:30:00Z`, `2026-02-15T14:30:00.123-03:00`)
/// and naive local times (`2026-02-15T14:30:00`, `2026-02-15 14:30`), the
/// format written by older versions of the tool.
///
/// # Errors
/// Returns `Error::InvalidTimestamp` if no format matches, or if the naive
/// time does not exist locally (DST "spring forward" gap).
///
/// # DST Handling
///
/// Ambiguous local times ("fall back") resolve to the earlier occurrence.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let value = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| Error::InvalidTimestamp {
            value: s.to_string(),
            reason: "unrecognized format".to_string(),
        })?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| Error::InvalidTimestamp {
            value: s.to_string(),
            reason: "local time does not exist (DST transition)".to_string(),
        })
}

/// Parse a calendar day in `YYYY-MM-DD` form.
///
/// # Errors
/// Returns `Error::InvalidDate` on any other format.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| Error::InvalidDate(s.to_string()))
}

/// Local calendar day a timestamp falls on.
#[must_use]
pub fn local_day(dt: &DateTime<Utc>) -> NaiveDate {
    dt.with_timezone(&Local).date_naive()
}

/// Human-readable local date in Brazilian format (`dd/mm/yyyy, hh:mm:ss`).
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use packhouse_core::human_date;
///
/// let formatted = human_date(&Utc.with_ymd_and_hms(2026, 2, 15, 12, 0, 0).unwrap());
/// assert_eq!(formatted.len(), "15/02/2026, 12:00:00".len());
/// ```
#[must_use]
pub fn human_date(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local)
        .format("%d/%m/%Y, %H:%M:%S")
        .to_string()
}

/// Serde helpers for timestamps read from backup files.
///
/// Serialization stays RFC 3339; deserialization goes through
/// [`parse_timestamp`] so legacy naive timestamps load.
pub mod lenient_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }

    /// Variant for optional fields (`null`, missing or empty means `None`).
    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer};

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) if !raw.trim().is_empty() => super::super::parse_timestamp(&raw)
                    .map(Some)
                    .map_err(serde::de::Error::custom),
                _ => Ok(None),
            }
        }
    }
}
