//! Device and request statistics.
//!
//! Inputs are grouped counts in first-seen order (the repository orders
//! groups by the lowest id they contain). Every count map carries an entry
//! for each enum member, zero when absent. Percentage maps are empty when
//! there is nothing to count.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::device_request::{RequestStatus, RequestType};
use crate::inventory::{DeviceCondition, DeviceLocation, DeviceStatus};

/// Number of locations reported by [`build_device_overview`].
pub const TOP_LOCATIONS: usize = 3;

/// Devices sharing one status, condition and location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceFacetCount {
    pub status: DeviceStatus,
    pub condition: DeviceCondition,
    pub location: DeviceLocation,
    pub count: i64,
}

/// Requests sharing one type and status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestFacetCount {
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub count: i64,
}

/// Zero-filled count map over every member of `K`.
pub fn zeroed<K: Copy + Ord>(all: &[K]) -> BTreeMap<K, i64> {
    all.iter().map(|k| (*k, 0)).collect()
}

/// `count / total * 100`, rounded to two decimals. Empty when `total` is 0.
pub fn percentages<K: Copy + Ord>(counts: &BTreeMap<K, i64>, total: i64) -> BTreeMap<K, f64> {
    if total <= 0 {
        return BTreeMap::new();
    }
    counts
        .iter()
        .map(|(k, c)| (*k, percentage(*c, total)))
        .collect()
}

pub fn percentage(count: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let raw = (count as f64 * 100.0) / total as f64;
    (raw * 100.0).round() / 100.0
}

fn tally<K: Copy + Ord>(
    all: &[K],
    facets: &[DeviceFacetCount],
    key: impl Fn(&DeviceFacetCount) -> K,
) -> BTreeMap<K, i64> {
    let mut counts = zeroed(all);
    for f in facets {
        *counts.entry(key(f)).or_insert(0) += f.count;
    }
    counts
}

fn total(facets: &[DeviceFacetCount]) -> i64 {
    facets.iter().map(|f| f.count).sum()
}

// ---------------------------------------------------------------------------
// Device statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct DeviceStatistics {
    pub total_devices: i64,
    pub status_counts: BTreeMap<DeviceStatus, i64>,
    pub condition_counts: BTreeMap<DeviceCondition, i64>,
    pub location_counts: BTreeMap<DeviceLocation, i64>,
    pub status_percentages: BTreeMap<DeviceStatus, f64>,
    pub condition_percentages: BTreeMap<DeviceCondition, f64>,
    pub location_percentages: BTreeMap<DeviceLocation, f64>,
}

pub fn build_device_statistics(facets: &[DeviceFacetCount]) -> DeviceStatistics {
    let total_devices = total(facets);
    let status_counts = tally(DeviceStatus::ALL, facets, |f| f.status);
    let condition_counts = tally(DeviceCondition::ALL, facets, |f| f.condition);
    let location_counts = tally(DeviceLocation::ALL, facets, |f| f.location);

    DeviceStatistics {
        total_devices,
        status_percentages: percentages(&status_counts, total_devices),
        condition_percentages: percentages(&condition_counts, total_devices),
        location_percentages: percentages(&location_counts, total_devices),
        status_counts,
        condition_counts,
        location_counts,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    pub status: DeviceStatus,
    pub count: i64,
    pub percentage: f64,
    pub condition_breakdown: BTreeMap<DeviceCondition, i64>,
}

/// One entry per status, in declaration order.
pub fn build_status_summary(facets: &[DeviceFacetCount]) -> Vec<StatusSummary> {
    let total_devices = total(facets);
    DeviceStatus::ALL
        .iter()
        .map(|&status| {
            let subset: Vec<_> = facets.iter().copied().filter(|f| f.status == status).collect();
            let count = total(&subset);
            StatusSummary {
                status,
                count,
                percentage: percentage(count, total_devices),
                condition_breakdown: tally(DeviceCondition::ALL, &subset, |f| f.condition),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationSummary {
    pub location: DeviceLocation,
    pub count: i64,
    pub percentage: f64,
    pub status_breakdown: BTreeMap<DeviceStatus, i64>,
}

/// One entry per location, in declaration order.
pub fn build_location_summary(facets: &[DeviceFacetCount]) -> Vec<LocationSummary> {
    let total_devices = total(facets);
    DeviceLocation::ALL
        .iter()
        .map(|&location| {
            let subset: Vec<_> = facets
                .iter()
                .copied()
                .filter(|f| f.location == location)
                .collect();
            let count = total(&subset);
            LocationSummary {
                location,
                count,
                percentage: percentage(count, total_devices),
                status_breakdown: tally(DeviceStatus::ALL, &subset, |f| f.status),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LocationCount {
    pub location: DeviceLocation,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceOverview {
    pub total_devices: i64,
    pub available_devices: i64,
    pub assigned_devices: i64,
    pub maintenance_devices: i64,
    pub condition_distribution: BTreeMap<DeviceCondition, i64>,
    pub top_locations: Vec<LocationCount>,
}

pub fn build_device_overview(facets: &[DeviceFacetCount]) -> DeviceOverview {
    let status_counts = tally(DeviceStatus::ALL, facets, |f| f.status);
    let by_status = |s: DeviceStatus| status_counts.get(&s).copied().unwrap_or(0);

    DeviceOverview {
        total_devices: total(facets),
        available_devices: by_status(DeviceStatus::Available),
        assigned_devices: by_status(DeviceStatus::Assigned),
        maintenance_devices: by_status(DeviceStatus::Maintenance),
        condition_distribution: tally(DeviceCondition::ALL, facets, |f| f.condition),
        top_locations: top_locations(facets, TOP_LOCATIONS),
    }
}

/// The `n` most populated locations, count descending, ties in the order
/// the location first appears in `facets`.
pub fn top_locations(facets: &[DeviceFacetCount], n: usize) -> Vec<LocationCount> {
    let mut seen: Vec<LocationCount> = Vec::new();
    for f in facets {
        match seen.iter_mut().find(|lc| lc.location == f.location) {
            Some(lc) => lc.count += f.count,
            None => seen.push(LocationCount {
                location: f.location,
                count: f.count,
            }),
        }
    }
    // Stable sort preserves first-seen order among equal counts.
    seen.sort_by(|a, b| b.count.cmp(&a.count));
    seen.truncate(n);
    seen
}

// ---------------------------------------------------------------------------
// Request dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RequestDashboard<R> {
    pub type_counts: BTreeMap<RequestType, i64>,
    pub status_counts: BTreeMap<RequestStatus, i64>,
    pub recent_requests: Vec<R>,
    pub total_requests: i64,
}

pub fn build_request_dashboard<R>(
    facets: &[RequestFacetCount],
    recent_requests: Vec<R>,
) -> RequestDashboard<R> {
    let mut type_counts = zeroed(RequestType::ALL);
    let mut status_counts = zeroed(RequestStatus::ALL);
    let mut total_requests = 0;
    for f in facets {
        *type_counts.entry(f.request_type).or_insert(0) += f.count;
        *status_counts.entry(f.status).or_insert(0) += f.count;
        total_requests += f.count;
    }

    RequestDashboard {
        type_counts,
        status_counts,
        recent_requests,
        total_requests,
    }
}
