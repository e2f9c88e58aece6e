use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a housing unit holds one occupant or several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccupancyPolicy {
    Single,
    Multi,
}

/// A stall, paddock or other unit an entity can be housed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HousingUnit {
    pub id: Uuid,
    pub code: String,
    pub location_id: Uuid,
    pub occupancy_policy: OccupancyPolicy,
    pub capacity: u32,
    pub current_occupant_count: u32,
}

impl HousingUnit {
    /// A single unit takes one occupant regardless of its declared capacity.
    pub fn is_assignable(&self) -> bool {
        match self.occupancy_policy {
            OccupancyPolicy::Single => self.current_occupant_count < 1,
            OccupancyPolicy::Multi => self.current_occupant_count < self.capacity,
        }
    }

    pub fn free_places(&self) -> u32 {
        let limit = match self.occupancy_policy {
            OccupancyPolicy::Single => 1,
            OccupancyPolicy::Multi => self.capacity,
        };
        limit.saturating_sub(self.current_occupant_count)
    }
}
