//! Warranty types, the derived warranty status and the expiry dashboard.
//!
//! Status is always computed from the stored dates and a caller-supplied
//! `as_of` date; it is never stored or cached.

use chrono::Duration;
use serde::Serialize;

use crate::error::CoreError;
use crate::types::{define_str_enum, Date, DbId};

pub const MAX_WARRANTY_CODE_LENGTH: usize = 50;

/// Window, in days, for "expiring soon" and "recently expired".
pub const DASHBOARD_WINDOW_DAYS: i64 = 31;

define_str_enum! {
    /// Coverage class of a warranty.
    WarrantyType {
        Standard => "standard",
        Extended => "extended",
        Premium => "premium",
        ThirdParty => "third_party",
    }
}

define_str_enum! {
    /// Derived status of a warranty relative to a given date.
    WarrantyStatus {
        Pending => "pending",
        Active => "active",
        Expired => "expired",
    }
}

/// Anything with a coverage period.
pub trait WarrantyPeriod {
    fn start_date(&self) -> Date;
    fn end_date(&self) -> Date;
}

/// `Pending` before `start`, `Expired` after `end`, `Active` otherwise
/// (both bounds inclusive).
pub fn warranty_status(start: Date, end: Date, as_of: Date) -> WarrantyStatus {
    if as_of < start {
        WarrantyStatus::Pending
    } else if as_of > end {
        WarrantyStatus::Expired
    } else {
        WarrantyStatus::Active
    }
}

/// Validate the fields of a warranty create/update payload.
pub fn validate_warranty(warranty_code: &str, start: Date, end: Date) -> Result<(), String> {
    if warranty_code.trim().is_empty() {
        return Err("Warranty ID is required".to_string());
    }
    if warranty_code.chars().count() > MAX_WARRANTY_CODE_LENGTH {
        return Err(format!(
            "Warranty ID cannot exceed {MAX_WARRANTY_CODE_LENGTH} characters"
        ));
    }
    if start > end {
        return Err(format!(
            "Warranty start date {start} must not be after end date {end}"
        ));
    }
    Ok(())
}

/// Fail with `NotOwned` unless the warranty belongs to `device_id`.
pub fn ensure_belongs_to(
    warranty_id: DbId,
    owner_device_id: DbId,
    device_id: DbId,
) -> Result<(), CoreError> {
    if owner_device_id == device_id {
        Ok(())
    } else {
        Err(CoreError::NotOwned {
            entity: "Warranty",
            id: warranty_id,
            parent: "device",
            parent_id: device_id,
        })
    }
}

/// Counts shown at the top of the warranty dashboard.
///
/// `active` excludes warranties counted in `expiring`. Pending warranties
/// appear only in the overall total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WarrantyStatusCounts {
    pub active: i64,
    pub expiring: i64,
    pub expired: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WarrantyDashboard<W> {
    pub status_counts: WarrantyStatusCounts,
    /// Active warranties ending within the window, soonest first.
    pub expiring_soon: Vec<W>,
    /// Expired warranties that ended within the window, most recent first.
    pub recently_expired: Vec<W>,
    pub total_warranties: i64,
}

/// Partition warranties into the dashboard buckets as of `today`.
pub fn build_warranty_dashboard<W: WarrantyPeriod>(
    warranties: Vec<W>,
    today: Date,
) -> WarrantyDashboard<W> {
    let window = Duration::days(DASHBOARD_WINDOW_DAYS);
    let soon_limit = today + window;
    let recent_limit = today - window;

    let total_warranties = warranties.len() as i64;
    let mut counts = WarrantyStatusCounts::default();
    let mut expiring_soon = Vec::new();
    let mut recently_expired = Vec::new();

    for w in warranties {
        match warranty_status(w.start_date(), w.end_date(), today) {
            WarrantyStatus::Expired => {
                counts.expired += 1;
                if w.end_date() > recent_limit {
                    recently_expired.push(w);
                }
            }
            WarrantyStatus::Active if w.end_date() < soon_limit => {
                counts.expiring += 1;
                expiring_soon.push(w);
            }
            WarrantyStatus::Active => counts.active += 1,
            WarrantyStatus::Pending => {}
        }
    }

    // Stable sorts keep input order among equal end dates.
    expiring_soon.sort_by_key(|w| w.end_date());
    recently_expired.sort_by(|a, b| b.end_date().cmp(&a.end_date()));

    WarrantyDashboard {
        status_counts: counts,
        expiring_soon,
        recently_expired,
        total_warranties,
    }
}
