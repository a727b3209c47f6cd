//! Device request enumerations, payload validation and the status
//! state machine.
//!
//! ```text
//! Pending --approve--> Approved   (terminal)
//!    \------reject---> Rejected   (terminal, reason required)
//! ```
//!
//! The repository enforces single-fire transitions with a conditional
//! write on `status = 'pending'`; this module decides whether a requested
//! transition is legal in the first place.

use crate::error::CoreError;
use crate::types::{define_str_enum, DbId};

/// Upper bound on `notes` and `reason_for_rejection`.
pub const MAX_TEXT_LENGTH: usize = 2000;

define_str_enum! {
    /// What the requester is asking for.
    RequestType {
        /// Procure `quantity` new devices.
        NewDevice => "new_device",
        /// Hand an existing device to the requester.
        DeviceAssignment => "device_assignment",
    }
}

define_str_enum! {
    /// Lifecycle status of a request.
    RequestStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

define_str_enum! {
    /// Urgency of a request.
    RequestPriority (default = Medium) {
        Low => "low",
        Medium => "medium",
        High => "high",
        Urgent => "urgent",
    }
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

/// Check the type/payload pairing of a new request.
///
/// `DeviceAssignment` needs a device and no quantity; `NewDevice` needs a
/// quantity of at least 1 and no device.
pub fn validate_request_payload(
    request_type: RequestType,
    device_id: Option<DbId>,
    quantity: Option<i32>,
) -> Result<(), String> {
    match request_type {
        RequestType::DeviceAssignment => {
            if device_id.is_none() {
                return Err("Device assignment requests require a device".to_string());
            }
            if quantity.is_some() {
                return Err("Device assignment requests must not specify a quantity".to_string());
            }
        }
        RequestType::NewDevice => {
            match quantity {
                None => return Err("New device requests require a quantity".to_string()),
                Some(q) if q < 1 => return Err("Quantity must be at least 1".to_string()),
                Some(_) => {}
            }
            if device_id.is_some() {
                return Err("New device requests must not reference a device".to_string());
            }
        }
    }
    Ok(())
}

pub fn validate_notes(notes: Option<&str>) -> Result<(), String> {
    match notes {
        Some(n) if n.chars().count() > MAX_TEXT_LENGTH => Err(format!(
            "Notes cannot exceed {MAX_TEXT_LENGTH} characters"
        )),
        _ => Ok(()),
    }
}

/// A validated terminal decision on a pending request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject { reason: String },
}

impl Decision {
    pub fn status(&self) -> RequestStatus {
        match self {
            Decision::Approve => RequestStatus::Approved,
            Decision::Reject { .. } => RequestStatus::Rejected,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Decision::Approve => None,
            Decision::Reject { reason } => Some(reason),
        }
    }
}

/// Turn a status-update payload into a [`Decision`].
///
/// The target must be terminal; a rejection needs a non-blank reason. Any
/// reason sent with an approval is dropped.
pub fn plan_decision(target: RequestStatus, reason: Option<&str>) -> Result<Decision, CoreError> {
    match target {
        RequestStatus::Pending => Err(CoreError::Validation(
            "Status must be approved or rejected".into(),
        )),
        RequestStatus::Approved => Ok(Decision::Approve),
        RequestStatus::Rejected => {
            let reason = reason.map(str::trim).unwrap_or_default();
            if reason.is_empty() {
                return Err(CoreError::Validation(
                    "A reason is required when rejecting a request".into(),
                ));
            }
            if reason.chars().count() > MAX_TEXT_LENGTH {
                return Err(CoreError::Validation(format!(
                    "Reason cannot exceed {MAX_TEXT_LENGTH} characters"
                )));
            }
            Ok(Decision::Reject {
                reason: reason.to_string(),
            })
        }
    }
}

/// Fail with `Conflict` unless the request is still pending.
pub fn ensure_pending(request_id: DbId, current: RequestStatus) -> Result<(), CoreError> {
    if current.is_terminal() {
        Err(already_processed(request_id, current))
    } else {
        Ok(())
    }
}

pub fn already_processed(request_id: DbId, current: RequestStatus) -> CoreError {
    CoreError::Conflict(format!(
        "Request {request_id} is already processed ({current})"
    ))
}
