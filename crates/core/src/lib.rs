//! Domain logic for the device inventory service.
//!
//! Nothing in this crate touches the database or the clock; callers pass
//! the current instant or date explicitly.

pub mod access;
pub mod credentials;
pub mod device_request;
pub mod error;
pub mod inventory;
pub mod lockout;
pub mod roles;
pub mod search;
pub mod statistics;
pub mod types;
pub mod warranty;
