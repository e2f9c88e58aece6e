//! Horse registration draft and its patch actions.

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use crate::core::wizard::allocation::OwnershipAllocation;
use crate::core::wizard::draft::DraftRecord;
use chrono::NaiveDate;
use paddock_types::{MediaAssetRef, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorseCategory {
    Sport,
    Breeding,
    Leisure,
    Racing,
    School,
    Patient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorseSex {
    Mare,
    Stallion,
    Gelding,
    Filly,
    Colt,
}

/// Scalar fields persisted on the parent row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorseProfile {
    pub name: String,
    pub category: Option<HorseCategory>,
    pub registration_number: Option<String>,
    pub microchip: Option<String>,
    pub breed: Option<String>,
    pub color: Option<String>,
    pub sex: Option<HorseSex>,
    pub birth_date: Option<NaiveDate>,
    pub height_cm: Option<u16>,
    pub weight_kg: Option<u16>,
    pub sire_id: Option<Uuid>,
    pub dam_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub housing_unit_id: Option<Uuid>,
    pub notes: Option<String>,
}

impl HorseProfile {
    /// Project a stored row. Unknown columns are ignored.
    pub fn from_row(row: &Row) -> Result<Self, AppError> {
        serde_json::from_value(Value::Object(row.clone())).map_err(|e| {
            AppError::new(
                ErrorCategory::SerializationError,
                format!("stored horse row is malformed: {}", e),
            )
            .with_code("WIZ-LOAD-002")
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HorseDraft {
    pub profile: HorseProfile,
    pub allocations: Vec<OwnershipAllocation>,
    pub media: Vec<MediaAssetRef>,
}

impl HorseDraft {
    /// Parent row payload: every scalar field plus the tenant.
    pub fn to_payload(&self, tenant_id: Uuid) -> Result<Row, AppError> {
        let mut row = match serde_json::to_value(&self.profile)? {
            Value::Object(map) => map,
            _ => {
                return Err(AppError::new(
                    ErrorCategory::InternalError,
                    "horse profile did not serialize to an object",
                ))
            }
        };
        let name = self.profile.name.trim().to_string();
        row.insert("name".to_string(), Value::String(name));
        row.insert("tenant_id".to_string(), Value::String(tenant_id.to_string()));
        Ok(row)
    }
}

/// A single field edit. Serialized as `{"field": "...", "value": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum HorsePatch {
    Name(String),
    Category(Option<HorseCategory>),
    RegistrationNumber(Option<String>),
    Microchip(Option<String>),
    Breed(Option<String>),
    Color(Option<String>),
    Sex(Option<HorseSex>),
    BirthDate(Option<NaiveDate>),
    HeightCm(Option<u16>),
    WeightKg(Option<u16>),
    SireId(Option<Uuid>),
    DamId(Option<Uuid>),
    LocationId(Option<Uuid>),
    HousingUnitId(Option<Uuid>),
    Notes(Option<String>),
    Allocations(Vec<OwnershipAllocation>),
    Media(Vec<MediaAssetRef>),
}

macro_rules! swap {
    ($slot:expr, $value:expr, $variant:ident) => {
        HorsePatch::$variant(std::mem::replace(&mut $slot, $value))
    };
}

impl DraftRecord for HorseDraft {
    type Patch = HorsePatch;

    fn apply(&mut self, patch: HorsePatch) -> HorsePatch {
        let p = &mut self.profile;
        match patch {
            HorsePatch::Name(v) => swap!(p.name, v, Name),
            HorsePatch::Category(v) => swap!(p.category, v, Category),
            HorsePatch::RegistrationNumber(v) => swap!(p.registration_number, v, RegistrationNumber),
            HorsePatch::Microchip(v) => swap!(p.microchip, v, Microchip),
            HorsePatch::Breed(v) => swap!(p.breed, v, Breed),
            HorsePatch::Color(v) => swap!(p.color, v, Color),
            HorsePatch::Sex(v) => swap!(p.sex, v, Sex),
            HorsePatch::BirthDate(v) => swap!(p.birth_date, v, BirthDate),
            HorsePatch::HeightCm(v) => swap!(p.height_cm, v, HeightCm),
            HorsePatch::WeightKg(v) => swap!(p.weight_kg, v, WeightKg),
            HorsePatch::SireId(v) => swap!(p.sire_id, v, SireId),
            HorsePatch::DamId(v) => swap!(p.dam_id, v, DamId),
            HorsePatch::LocationId(v) => swap!(p.location_id, v, LocationId),
            HorsePatch::HousingUnitId(v) => swap!(p.housing_unit_id, v, HousingUnitId),
            HorsePatch::Notes(v) => swap!(p.notes, v, Notes),
            HorsePatch::Allocations(v) => swap!(self.allocations, v, Allocations),
            HorsePatch::Media(v) => swap!(self.media, v, Media),
        }
    }

    /// Media mirrors staged blobs, which an undo cannot bring back or delete.
    fn is_undoable(patch: &HorsePatch) -> bool {
        !matches!(patch, HorsePatch::Media(_))
    }
}

impl HorsePatch {
    /// Patches produced only by the owner and media operations of the session.
    pub fn is_managed(&self) -> bool {
        matches!(self, HorsePatch::Allocations(_) | HorsePatch::Media(_))
    }
}
