//! Shared data model and collaborator contracts for Paddock workflows.

pub mod housing;
pub mod media;
pub mod records;
pub mod services;

pub use housing::{HousingUnit, OccupancyPolicy};
pub use media::{MediaAssetRef, MediaMetadataRow, OwnerKey};
pub use records::{Created, Filter, Row};
pub use services::{IdGenerator, ObjectStorage, RecordService, ServiceError, ServiceResult};
