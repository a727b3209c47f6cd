//! Grouped counts for statistics and dashboards.
//!
//! Groups come back in first-seen order (lowest member id first), which the
//! top-locations ranking uses to break ties.

use inventory_core::search::RECENT_REQUESTS_LIMIT;
use sqlx::PgPool;

use crate::models::device_request::RecentRequest;
use crate::models::report::{DeviceFacetRow, RequestFacetRow};

pub struct ReportRepo;

impl ReportRepo {
    /// Device counts grouped by status, condition and location.
    pub async fn device_facets(pool: &PgPool) -> Result<Vec<DeviceFacetRow>, sqlx::Error> {
        sqlx::query_as::<_, DeviceFacetRow>(
            "SELECT status, condition, location, COUNT(*) AS count
             FROM devices
             GROUP BY status, condition, location
             ORDER BY MIN(id)",
        )
        .fetch_all(pool)
        .await
    }

    /// Request counts grouped by type and status.
    pub async fn request_facets(pool: &PgPool) -> Result<Vec<RequestFacetRow>, sqlx::Error> {
        sqlx::query_as::<_, RequestFacetRow>(
            "SELECT request_type, status, COUNT(*) AS count
             FROM device_requests
             GROUP BY request_type, status
             ORDER BY MIN(id)",
        )
        .fetch_all(pool)
        .await
    }

    /// The most recently created requests with the requester's email.
    pub async fn recent_requests(pool: &PgPool) -> Result<Vec<RecentRequest>, sqlx::Error> {
        sqlx::query_as::<_, RecentRequest>(
            "SELECT r.id, r.request_type, r.status, u.email AS requester_email,
                    r.created_at, r.updated_at
             FROM device_requests r
             JOIN users u ON u.id = r.requester_id
             ORDER BY r.created_at DESC, r.id DESC
             LIMIT $1",
        )
        .bind(RECENT_REQUESTS_LIMIT)
        .fetch_all(pool)
        .await
    }
}
