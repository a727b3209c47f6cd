//! Row structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches
//!
//! Enum columns are TEXT and decode through `TryFrom<String>`.

pub mod device;
pub mod device_request;
pub mod report;
pub mod user;
pub mod warranty;
