use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::period::Period;

pub type ForestryId = i64;
pub type IndicatorId = i64;
pub type SectionId = i64;
pub type UserId = i64;

/// How an indicator's raw value turns into a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    /// Peer-normalized against the period maximum, scaled to `max_weight`.
    #[default]
    Normal,
    /// Always non-positive: `-|value|`.
    Penalty,
    /// Always non-negative: `|value|`.
    Bonus,
}

impl IndicatorKind {
    /// Map the persisted `type` column. Anything other than "penalty" or
    /// "bonus" is Normal, including the store's own default "positive" and
    /// rows written before bonus indicators existed.
    pub fn from_persisted(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "penalty" => IndicatorKind::Penalty,
            "bonus" => IndicatorKind::Bonus,
            _ => IndicatorKind::Normal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorKind::Normal => "normal",
            IndicatorKind::Penalty => "penalty",
            IndicatorKind::Bonus => "bonus",
        }
    }
}

impl<'de> Deserialize<'de> for IndicatorKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .map(IndicatorKind::from_persisted)
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Engineer,
    Viewer,
}

impl Role {
    /// Unrecognized roles are read-only.
    pub fn from_persisted(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "engineer" => Role::Engineer,
            _ => Role::Viewer,
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Role::from_persisted).unwrap_or(Role::Viewer))
    }
}

/// The authenticated user a session acts as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub id: IndicatorId,
    pub section_id: SectionId,
    pub name: String,
    #[serde(deserialize_with = "number_from_any")]
    pub max_weight: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: IndicatorKind,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forestry {
    pub id: ForestryId,
    pub name: String,
}

/// One recorded value. Unique on (forestry, indicator, period).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMeasurement {
    #[serde(default)]
    pub id: Option<i64>,
    pub forestry_id: ForestryId,
    pub indicator_id: IndicatorId,
    #[serde(deserialize_with = "number_from_any")]
    pub value: f64,
    pub period: Period,
    #[serde(default)]
    pub created_by: Option<UserId>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResponsibilityAssignment {
    pub indicator_id: IndicatorId,
    pub user_id: UserId,
}

/// Postgres `numeric` columns arrive as JSON strings; plain numbers are
/// accepted too. Null reads as zero.
fn number_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(0.0),
        Some(NumberOrString::Number(n)) => Ok(n),
        Some(NumberOrString::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid number '{}': {}", s, e))),
    }
}
