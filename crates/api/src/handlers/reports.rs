//! Read-only statistics and dashboards.
//!
//! Counts are grouped in SQL and shaped by `inventory_core::statistics`;
//! warranty status is derived here from today's date and never stored.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use inventory_core::statistics::{
    build_device_overview, build_device_statistics, build_location_summary,
    build_request_dashboard, build_status_summary, DeviceFacetCount, DeviceOverview,
    DeviceStatistics, LocationSummary, RequestDashboard, RequestFacetCount, StatusSummary,
};
use inventory_core::warranty::{build_warranty_dashboard, WarrantyDashboard};
use inventory_db::models::device_request::RecentRequest;
use inventory_db::models::warranty::WarrantyWithStatus;
use inventory_db::repositories::{ReportRepo, WarrantyRepo};

use crate::error::AppResult;
use crate::middleware::rbac::RequireViewReports;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/devices/statistics
pub async fn device_statistics(
    State(state): State<AppState>,
    RequireViewReports(_user): RequireViewReports,
) -> AppResult<Json<DataResponse<DeviceStatistics>>> {
    let facets = device_facets(&state).await?;
    Ok(Json(DataResponse {
        data: build_device_statistics(&facets),
    }))
}

/// GET /api/v1/devices/status-summary
pub async fn status_summary(
    State(state): State<AppState>,
    RequireViewReports(_user): RequireViewReports,
) -> AppResult<Json<DataResponse<Vec<StatusSummary>>>> {
    let facets = device_facets(&state).await?;
    Ok(Json(DataResponse {
        data: build_status_summary(&facets),
    }))
}

/// GET /api/v1/devices/location-summary
pub async fn location_summary(
    State(state): State<AppState>,
    RequireViewReports(_user): RequireViewReports,
) -> AppResult<Json<DataResponse<Vec<LocationSummary>>>> {
    let facets = device_facets(&state).await?;
    Ok(Json(DataResponse {
        data: build_location_summary(&facets),
    }))
}

/// GET /api/v1/devices/dashboard
pub async fn device_overview(
    State(state): State<AppState>,
    RequireViewReports(_user): RequireViewReports,
) -> AppResult<Json<DataResponse<DeviceOverview>>> {
    let facets = device_facets(&state).await?;
    Ok(Json(DataResponse {
        data: build_device_overview(&facets),
    }))
}

/// GET /api/v1/warranties/dashboard
pub async fn warranty_dashboard(
    State(state): State<AppState>,
    RequireViewReports(_user): RequireViewReports,
) -> AppResult<Json<DataResponse<WarrantyDashboard<WarrantyWithStatus>>>> {
    let today = Utc::now().date_naive();
    let warranties = WarrantyRepo::list_all(&state.pool)
        .await?
        .into_iter()
        .map(|w| WarrantyWithStatus::as_of(w, today))
        .collect();
    Ok(Json(DataResponse {
        data: build_warranty_dashboard(warranties, today),
    }))
}

/// GET /api/v1/device-requests/dashboard
pub async fn request_dashboard(
    State(state): State<AppState>,
    RequireViewReports(_user): RequireViewReports,
) -> AppResult<Json<DataResponse<RequestDashboard<RecentRequest>>>> {
    let facets: Vec<RequestFacetCount> = ReportRepo::request_facets(&state.pool)
        .await?
        .into_iter()
        .map(RequestFacetCount::from)
        .collect();
    let recent = ReportRepo::recent_requests(&state.pool).await?;
    Ok(Json(DataResponse {
        data: build_request_dashboard(&facets, recent),
    }))
}

async fn device_facets(state: &AppState) -> AppResult<Vec<DeviceFacetCount>> {
    Ok(ReportRepo::device_facets(&state.pool)
        .await?
        .into_iter()
        .map(DeviceFacetCount::from)
        .collect())
}
