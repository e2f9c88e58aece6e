//! Movement draft and its patch actions.

use crate::core::wizard::draft::DraftRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    In,
    Out,
    Transfer,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "in",
            MovementType::Out => "out",
            MovementType::Transfer => "transfer",
        }
    }
}

/// Housing decision for the destination.
///
/// `Skipped` and `Undecided` both leave the subject without a housing unit; only the
/// recorded status tells them apart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "unit_id", rename_all = "snake_case")]
pub enum HousingChoice {
    #[default]
    Undecided,
    Skipped,
    Assigned(Uuid),
}

impl HousingChoice {
    pub fn status(&self) -> &'static str {
        match self {
            HousingChoice::Undecided => "undecided",
            HousingChoice::Skipped => "skipped",
            HousingChoice::Assigned(_) => "assigned",
        }
    }

    pub fn unit_id(&self) -> Option<Uuid> {
        match self {
            HousingChoice::Assigned(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovementDraft {
    pub movement_type: Option<MovementType>,
    pub subject_id: Option<Uuid>,
    pub from_location_id: Option<Uuid>,
    pub to_location_id: Option<Uuid>,
    /// Required for a transfer whose source and destination are the same location.
    pub justification: String,
    pub housing: HousingChoice,
    pub moved_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

impl MovementDraft {
    pub fn is_internal_relocation(&self) -> bool {
        self.movement_type == Some(MovementType::Transfer)
            && self.from_location_id.is_some()
            && self.from_location_id == self.to_location_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum MovementPatch {
    MovementType(Option<MovementType>),
    SubjectId(Option<Uuid>),
    FromLocationId(Option<Uuid>),
    ToLocationId(Option<Uuid>),
    Justification(String),
    Housing(HousingChoice),
    MovedAt(Option<DateTime<Utc>>),
    Reason(Option<String>),
    Notes(Option<String>),
}

impl DraftRecord for MovementDraft {
    type Patch = MovementPatch;

    fn apply(&mut self, patch: MovementPatch) -> MovementPatch {
        use std::mem::replace;
        match patch {
            MovementPatch::MovementType(v) => {
                MovementPatch::MovementType(replace(&mut self.movement_type, v))
            }
            MovementPatch::SubjectId(v) => MovementPatch::SubjectId(replace(&mut self.subject_id, v)),
            MovementPatch::FromLocationId(v) => {
                MovementPatch::FromLocationId(replace(&mut self.from_location_id, v))
            }
            MovementPatch::ToLocationId(v) => {
                MovementPatch::ToLocationId(replace(&mut self.to_location_id, v))
            }
            MovementPatch::Justification(v) => {
                MovementPatch::Justification(replace(&mut self.justification, v))
            }
            MovementPatch::Housing(v) => MovementPatch::Housing(replace(&mut self.housing, v)),
            MovementPatch::MovedAt(v) => MovementPatch::MovedAt(replace(&mut self.moved_at, v)),
            MovementPatch::Reason(v) => MovementPatch::Reason(replace(&mut self.reason, v)),
            MovementPatch::Notes(v) => MovementPatch::Notes(replace(&mut self.notes, v)),
        }
    }
}
