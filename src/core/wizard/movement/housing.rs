#![allow(clippy::result_large_err)]

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use paddock_types::{Filter, HousingUnit, RecordService};
use serde_json::Value;
use uuid::Uuid;

/// Housing units of one destination location.
#[derive(Debug, Clone, Default)]
pub struct HousingPicker {
    location_id: Option<Uuid>,
    units: Vec<HousingUnit>,
}

impl HousingPicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn location_id(&self) -> Option<Uuid> {
        self.location_id
    }

    pub fn units(&self) -> &[HousingUnit] {
        &self.units
    }

    pub async fn load(
        &mut self,
        records: &dyn RecordService,
        table: &str,
        location_id: Uuid,
    ) -> Result<usize, AppError> {
        let rows = records
            .list_where(table, &Filter::new().eq("location_id", location_id.to_string()))
            .await
            .map_err(|e| {
                AppError::from_service(
                    ErrorCategory::RecordServiceError,
                    "failed to load housing units",
                    e,
                )
            })?;
        let units = rows
            .into_iter()
            .map(|row| serde_json::from_value::<HousingUnit>(Value::Object(row)))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(location = %location_id, units = units.len(), "housing units loaded");
        self.location_id = Some(location_id);
        self.units = units;
        Ok(self.units.len())
    }

    pub fn clear(&mut self) {
        self.location_id = None;
        self.units.clear();
    }

    /// Units that can take one more occupant.
    pub fn selectable(&self) -> Vec<&HousingUnit> {
        self.units.iter().filter(|unit| unit.is_assignable()).collect()
    }

    pub fn select(&self, unit_id: Uuid) -> Result<&HousingUnit, AppError> {
        let unit = self
            .units
            .iter()
            .find(|unit| unit.id == unit_id)
            .ok_or_else(|| {
                AppError::new(
                    ErrorCategory::ValidationError,
                    format!("housing unit {} is not available at this location", unit_id),
                )
                .with_code("WIZ-HOUSING-001")
            })?;
        if !unit.is_assignable() {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                format!("housing unit {} is full", unit.code),
            )
            .with_code("WIZ-HOUSING-002"));
        }
        Ok(unit)
    }
}
