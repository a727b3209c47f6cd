pub mod auth;
pub mod device_requests;
pub mod devices;
pub mod reports;
pub mod users;
