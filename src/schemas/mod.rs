use serde::{Deserialize, Deserializer};

pub mod assignment;
pub mod class;
pub mod file;
pub mod grading;

pub use assignment::{Assignment, NewAssignment};
pub use class::{Class, NewClass};
pub use file::{FileRecord, FileType, UploadFile};
pub use grading::{
    BatchCreated, BatchGradingResponse, BatchMembership, BatchStatus, GradingRequest,
    GradingResponse, HealthStatus, RubricGradingRequest, RubricGradingResponse, StudentFileIds,
};

/// Treats an explicit JSON `null` like a missing field.
pub(crate) fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
