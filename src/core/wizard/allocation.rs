//! Ownership allocation rules.
//!
//! A list is valid when it is empty, or when its percentages sum to exactly 100 and exactly
//! one holder is primary. Adding or removing a holder redistributes shares evenly.

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

/// Upper bound that keeps an even split at one percent or more per holder.
pub const MAX_HOLDERS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipAllocation {
    pub holder_id: Uuid,
    pub percentage: u8,
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("ownership percentages sum to {sum}, expected 100")]
    SumMismatch { sum: u32 },

    #[error("expected exactly one primary owner, found {count}")]
    PrimaryCount { count: usize },

    #[error("owner {index} has a share of {percentage}%, expected 1 to 100")]
    PercentageOutOfRange { index: usize, percentage: u32 },

    #[error("owner {holder_id} is listed more than once")]
    DuplicateHolder { holder_id: Uuid },

    #[error("owner index {index} is out of range for {len} owners")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cannot split ownership between more than {max} owners")]
    TooManyHolders { max: usize },
}

impl AllocationError {
    pub fn code(&self) -> &'static str {
        match self {
            AllocationError::SumMismatch { .. } => "WIZ-ALLOC-001",
            AllocationError::PrimaryCount { .. } => "WIZ-ALLOC-002",
            AllocationError::PercentageOutOfRange { .. } => "WIZ-ALLOC-003",
            AllocationError::DuplicateHolder { .. } => "WIZ-ALLOC-004",
            AllocationError::IndexOutOfRange { .. } => "WIZ-ALLOC-005",
            AllocationError::TooManyHolders { .. } => "WIZ-ALLOC-006",
        }
    }
}

impl From<AllocationError> for AppError {
    fn from(error: AllocationError) -> Self {
        AppError::new(ErrorCategory::AllocationError, error.to_string()).with_code(error.code())
    }
}

pub fn total_percentage(list: &[OwnershipAllocation]) -> u32 {
    list.iter().map(|a| u32::from(a.percentage)).sum()
}

/// Check the sum/primary invariant. An empty list is valid.
pub fn validate(list: &[OwnershipAllocation]) -> Result<(), AllocationError> {
    if list.is_empty() {
        return Ok(());
    }
    for (index, allocation) in list.iter().enumerate() {
        if !(1..=100).contains(&allocation.percentage) {
            return Err(AllocationError::PercentageOutOfRange {
                index,
                percentage: u32::from(allocation.percentage),
            });
        }
    }
    let mut seen = HashSet::new();
    for allocation in list {
        if !seen.insert(allocation.holder_id) {
            return Err(AllocationError::DuplicateHolder {
                holder_id: allocation.holder_id,
            });
        }
    }
    let sum = total_percentage(list);
    if sum != 100 {
        return Err(AllocationError::SumMismatch { sum });
    }
    let count = list.iter().filter(|a| a.is_primary).count();
    if count != 1 {
        return Err(AllocationError::PrimaryCount { count });
    }
    Ok(())
}

/// Split 100% evenly; the remainder goes to the first holder.
///
/// Also normalizes the primary flag: the first flagged holder stays primary, or the first
/// holder becomes primary when none is flagged. Lists longer than [`MAX_HOLDERS`] are
/// rejected.
pub fn redistribute(list: &[OwnershipAllocation]) -> Result<Vec<OwnershipAllocation>, AllocationError> {
    let count = list.len();
    if count == 0 {
        return Ok(Vec::new());
    }
    if count > MAX_HOLDERS {
        return Err(AllocationError::TooManyHolders { max: MAX_HOLDERS });
    }
    let base = (100 / count) as u8;
    let remainder = (100 % count) as u8;
    let primary = list.iter().position(|a| a.is_primary).unwrap_or(0);
    Ok(list
        .iter()
        .enumerate()
        .map(|(index, allocation)| OwnershipAllocation {
            holder_id: allocation.holder_id,
            percentage: if index == 0 { base + remainder } else { base },
            is_primary: index == primary,
        })
        .collect())
}

pub fn add_holder(
    list: &[OwnershipAllocation],
    holder_id: Uuid,
) -> Result<Vec<OwnershipAllocation>, AllocationError> {
    if list.iter().any(|a| a.holder_id == holder_id) {
        return Err(AllocationError::DuplicateHolder { holder_id });
    }
    if list.len() >= MAX_HOLDERS {
        return Err(AllocationError::TooManyHolders { max: MAX_HOLDERS });
    }
    let mut next = list.to_vec();
    next.push(OwnershipAllocation {
        holder_id,
        percentage: 0,
        is_primary: list.is_empty(),
    });
    redistribute(&next)
}

/// Removing the primary holder promotes the new first holder.
pub fn remove_holder(
    list: &[OwnershipAllocation],
    index: usize,
) -> Result<Vec<OwnershipAllocation>, AllocationError> {
    check_index(list, index)?;
    let mut next = list.to_vec();
    next.remove(index);
    redistribute(&next)
}

pub fn set_primary(
    list: &[OwnershipAllocation],
    index: usize,
) -> Result<Vec<OwnershipAllocation>, AllocationError> {
    check_index(list, index)?;
    Ok(list
        .iter()
        .enumerate()
        .map(|(i, allocation)| OwnershipAllocation {
            is_primary: i == index,
            ..allocation.clone()
        })
        .collect())
}

/// Manual share edit. The sum is not rebalanced; the step gate reports a mismatch.
pub fn set_percentage(
    list: &[OwnershipAllocation],
    index: usize,
    percentage: u8,
) -> Result<Vec<OwnershipAllocation>, AllocationError> {
    check_index(list, index)?;
    if !(1..=100).contains(&percentage) {
        return Err(AllocationError::PercentageOutOfRange {
            index,
            percentage: u32::from(percentage),
        });
    }
    let mut next = list.to_vec();
    next[index].percentage = percentage;
    Ok(next)
}

fn check_index(list: &[OwnershipAllocation], index: usize) -> Result<(), AllocationError> {
    if index >= list.len() {
        return Err(AllocationError::IndexOutOfRange {
            index,
            len: list.len(),
        });
    }
    Ok(())
}
