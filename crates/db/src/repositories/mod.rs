//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod device_repo;
pub mod device_request_repo;
pub mod report_repo;
pub mod user_repo;
pub mod warranty_repo;

pub use device_repo::{
    AssignOutcome, DeleteOutcome, DeviceRepo, StatusChangeOutcome, UpdateOutcome,
};
pub use device_request_repo::{DeviceRequestRepo, TransitionOutcome};
pub use report_repo::ReportRepo;
pub use user_repo::UserRepo;
pub use warranty_repo::WarrantyRepo;
