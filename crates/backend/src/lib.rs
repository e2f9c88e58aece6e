//! In-memory record and object storage services.
//!
//! These back the replay CLI and the test suites; production hosts plug their own
//! implementations of the `paddock-types` service traits.

pub mod faults;
pub mod ids;
pub mod records;
pub mod storage;

pub use faults::{FaultInjector, ServiceOp};
pub use ids::{RandomIds, SequentialIds};
pub use records::MemoryRecordService;
pub use storage::MemoryObjectStorage;
