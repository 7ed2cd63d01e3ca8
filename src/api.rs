// 🌐 REST API - dashboard views over the store
//
// Handlers fetch rows for the requested range, then run them through the
// calculation core. The router is built here so tests can drive it
// without binding a socket.

use crate::config::AppConfig;
use crate::dashboard::{Dashboard, DashboardFilter, DailyOperationsReport};
use crate::db::{
    get_attendance_on, get_equipment_usage_between, get_operations_on, get_production_between,
    get_vessels, StoreError,
};
use crate::error::CoreError;
use crate::report::{by_day, by_vessel, production_day_rows, DailyReport, VesselReport};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(conn: Connection, config: AppConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            config: Arc::new(config),
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".to_string()))
    }
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<StoreError>() {
            Some(StoreError::NotFound { .. }) => ApiError::NotFound(err.to_string()),
            Some(StoreError::Invalid(_)) => ApiError::BadRequest(err.to_string()),
            _ => ApiError::Internal(format!("{:#}", err)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Internal(m) => {
                tracing::error!(error = %m, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, m)
            }
        };

        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

// ============================================================================
// Queries
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(default)]
    pub vessel: Option<String>,
}

impl RangeQuery {
    fn checked(self) -> Result<Self, ApiError> {
        if self.from > self.to {
            return Err(ApiError::BadRequest(format!(
                "empty range: from {} is after to {}",
                self.from, self.to
            )));
        }
        Ok(self)
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/dashboard?from&to&vessel - every dashboard view for a range
async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Dashboard> {
    let query = query.checked()?;
    let conn = state.conn()?;

    let production = get_production_between(&conn, query.from, query.to)?;
    let usage = get_equipment_usage_between(&conn, query.from, query.to)?;

    let mut filter = DashboardFilter::new(query.from, query.to);
    filter.vessel = query.vessel;

    let dashboard = Dashboard::build(filter, &production, &usage, &state.config)?;
    Ok(Json(ApiResponse::ok(dashboard)))
}

/// GET /api/production/by-day?from&to - day totals across all vessels
async fn get_production_by_day(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<DailyReport> {
    let query = query.checked()?;
    let conn = state.conn()?;

    let production = get_production_between(&conn, query.from, query.to)?;
    let report = by_day(&production_day_rows(&production)?);
    Ok(Json(ApiResponse::ok(report)))
}

/// GET /api/vessels - vessels with recorded production
async fn list_vessels(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    let conn = state.conn()?;
    Ok(Json(ApiResponse::ok(get_vessels(&conn)?)))
}

/// GET /api/vessels/:vessel/report?from&to - one vessel's day-by-day report
async fn get_vessel_report(
    State(state): State<AppState>,
    Path(vessel): Path<String>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<VesselReport> {
    let query = query.checked()?;
    let conn = state.conn()?;
    let production: Vec<_> = get_production_between(&conn, query.from, query.to)?
        .into_iter()
        .filter(|r| r.vessel == vessel)
        .collect();

    let report = by_vessel(&production)?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::NotFound(format!("no production for vessel {:?}", vessel)))?;

    Ok(Json(ApiResponse::ok(report)))
}

/// GET /api/rdo/:date - daily operations report
async fn get_rdo(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> ApiResult<DailyOperationsReport> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|e| ApiError::BadRequest(format!("invalid date {:?}: {}", date, e)))?;

    let conn = state.conn()?;
    let operations = get_operations_on(&conn, date)?;
    let usage = get_equipment_usage_between(&conn, date, date)?;
    let production = get_production_between(&conn, date, date)?;
    let attendance = get_attendance_on(&conn, date)?;

    let rdo = DailyOperationsReport::build(
        date,
        &operations,
        &usage,
        &production,
        &attendance,
        &state.config,
    )?;
    Ok(Json(ApiResponse::ok(rdo)))
}

/// All `/api` routes
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/production/by-day", get(get_production_by_day))
        .route("/vessels", get(list_vessels))
        .route("/vessels/:vessel/report", get(get_vessel_report))
        .route("/rdo/:date", get(get_rdo))
        .with_state(state)
}
