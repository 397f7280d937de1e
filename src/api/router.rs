// HTTP API implementation
// This file provides the endpoints for sample ingestion, officer review,
// merit status and zone management
//
// Numan Thabit 2025 Nov

use super::error::ApiError;
use super::payloads::{
    AnalyzeLocationRequest, ConfirmRequest, DisputeRequest, EvaluateRequest, EvaluateResponse,
    IotSampleRequest, NearbyQuery, NearbyResponse, PendingQuery, RecoveryResponse,
    RegisterDriverRequest, ViolationStatsQuery, ZonesResponse, DEFAULT_NEARBY_RADIUS_M,
};
use crate::engine::{classify, SpeedSample};
use crate::geofence::{GeoPoint, SensitiveLocation};
use crate::metrics;
use crate::registry::{
    Confirmation, DriverHistory, DriverView, LocationAnalysis, MeritReport, MeritStatistics,
    NewVehicle, Registry, SampleOutcome, Vehicle, VehicleScan, ViolationCase, ViolationStatistics,
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header::CONTENT_TYPE, Method, StatusCode},
    response::Json,
    routing::{get, post},
    Router as AxumRouter,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

type ApiResult<T> = Result<Json<T>, ApiError>;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(inner)| inner).map_err(ApiError::from)
}

/// Create the HTTP router with API endpoints
pub fn create_api_router(registry: Arc<Registry>) -> AxumRouter {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    AxumRouter::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_text))
        .route("/api/v1/evaluate", post(evaluate))
        .route("/api/v1/vehicles", post(register_vehicle))
        .route("/api/v1/vehicles/:plate", get(get_vehicle))
        .route("/api/v1/vehicles/:plate/scan", get(scan_vehicle))
        .route("/api/v1/drivers", post(register_driver))
        .route("/api/v1/drivers/high-risk", get(high_risk_drivers))
        .route("/api/v1/drivers/:license", get(get_driver))
        .route("/api/v1/drivers/:license/merit", get(merit_report))
        .route("/api/v1/drivers/:license/violations", get(driver_violations))
        .route("/api/v1/iot/samples", post(ingest_sample))
        .route("/api/v1/violations/pending", get(pending_violations))
        .route("/api/v1/violations/high-severity", get(high_severity_violations))
        .route("/api/v1/violations/stats", get(violation_statistics))
        .route("/api/v1/violations/:id", get(get_violation))
        .route("/api/v1/violations/:id/confirm", post(confirm_violation))
        .route("/api/v1/violations/:id/dispute", post(dispute_violation))
        .route("/api/v1/violations/:id/cancel", post(cancel_violation))
        .route("/api/v1/violations/:id/pay", post(pay_violation))
        .route("/api/v1/merit/recovery", post(run_recovery))
        .route("/api/v1/statistics", get(statistics))
        .route("/api/v1/zones", get(list_zones).post(add_zone))
        .route("/api/v1/zones/analyze", post(analyze_location))
        .route("/api/v1/zones/nearby", get(nearby_zones))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(registry)
}

/// Health check endpoint
async fn health_check() -> StatusCode {
    StatusCode::OK
}

async fn metrics_text() -> Result<String, ApiError> {
    metrics::render().map_err(|e| ApiError::Internal(e.to_string()))
}

/// Classify a speed for a vehicle class without recording anything
async fn evaluate(
    State(registry): State<Arc<Registry>>,
    payload: Result<Json<EvaluateRequest>, JsonRejection>,
) -> ApiResult<EvaluateResponse> {
    let req = body(payload)?;
    let resolved = registry.resolver().resolve(&req.vehicle_class)?;
    let violation = classify(req.speed_kmh, resolved.speed_limit_kmh)?;
    Ok(Json(EvaluateResponse {
        vehicle_class: resolved.class,
        speed_limit_kmh: resolved.speed_limit_kmh,
        used_fallback: resolved.used_fallback,
        is_violation: violation.is_some(),
        violation,
    }))
}

async fn register_vehicle(
    State(registry): State<Arc<Registry>>,
    payload: Result<Json<NewVehicle>, JsonRejection>,
) -> Result<(StatusCode, Json<Vehicle>), ApiError> {
    let vehicle = registry.register_vehicle(body(payload)?, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

async fn get_vehicle(
    State(registry): State<Arc<Registry>>,
    Path(plate): Path<String>,
) -> ApiResult<Vehicle> {
    Ok(Json(registry.vehicle(&plate).await?))
}

/// QR scanner lookup for officers
async fn scan_vehicle(
    State(registry): State<Arc<Registry>>,
    Path(plate): Path<String>,
) -> ApiResult<VehicleScan> {
    Ok(Json(registry.scan_vehicle(&plate).await?))
}

async fn register_driver(
    State(registry): State<Arc<Registry>>,
    payload: Result<Json<RegisterDriverRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DriverView>), ApiError> {
    let req = body(payload)?;
    let driver = registry
        .register_driver(&req.driving_license_id, &req.full_name)
        .await?;
    Ok((StatusCode::CREATED, Json(driver)))
}

async fn get_driver(
    State(registry): State<Arc<Registry>>,
    Path(license): Path<String>,
) -> ApiResult<DriverView> {
    Ok(Json(registry.driver(&license).await?))
}

async fn merit_report(
    State(registry): State<Arc<Registry>>,
    Path(license): Path<String>,
) -> ApiResult<MeritReport> {
    Ok(Json(registry.merit_report(&license, Utc::now()).await?))
}

async fn high_risk_drivers(State(registry): State<Arc<Registry>>) -> ApiResult<Vec<DriverView>> {
    Ok(Json(registry.high_risk_drivers().await))
}

/// Violation history for the officer driver view
async fn driver_violations(
    State(registry): State<Arc<Registry>>,
    Path(license): Path<String>,
) -> ApiResult<DriverHistory> {
    Ok(Json(registry.driver_violations(&license).await?))
}

/// Device sample ingestion
async fn ingest_sample(
    State(registry): State<Arc<Registry>>,
    payload: Result<Json<IotSampleRequest>, JsonRejection>,
) -> ApiResult<SampleOutcome> {
    let req = body(payload)?;
    let sample = SpeedSample {
        speed_kmh: req.speed_kmh,
        timestamp: req.timestamp.unwrap_or_else(Utc::now),
    };
    Ok(Json(
        registry
            .record_sample(&req.device_id, sample, req.location)
            .await?,
    ))
}

async fn pending_violations(
    State(registry): State<Arc<Registry>>,
    Query(query): Query<PendingQuery>,
) -> ApiResult<Vec<ViolationCase>> {
    Ok(Json(registry.pending_violations(&query.into()).await))
}

async fn high_severity_violations(
    State(registry): State<Arc<Registry>>,
) -> ApiResult<Vec<ViolationCase>> {
    Ok(Json(registry.high_severity_violations().await))
}

async fn violation_statistics(
    State(registry): State<Arc<Registry>>,
    Query(query): Query<ViolationStatsQuery>,
) -> ApiResult<ViolationStatistics> {
    Ok(Json(
        registry
            .violation_statistics(query.officer_id.as_deref())
            .await,
    ))
}

async fn get_violation(
    State(registry): State<Arc<Registry>>,
    Path(id): Path<Uuid>,
) -> ApiResult<ViolationCase> {
    Ok(Json(registry.violation(id).await?))
}

/// Officer confirmation: attributes the violation and deducts merit points
async fn confirm_violation(
    State(registry): State<Arc<Registry>>,
    Path(id): Path<Uuid>,
    payload: Result<Json<ConfirmRequest>, JsonRejection>,
) -> ApiResult<Confirmation> {
    let req = body(payload)?;
    let confirmation = registry
        .confirm_violation(
            id,
            &req.driving_license_id,
            &req.officer_id,
            req.driver_name.as_deref(),
            Utc::now(),
        )
        .await?;
    Ok(Json(confirmation))
}

async fn dispute_violation(
    State(registry): State<Arc<Registry>>,
    Path(id): Path<Uuid>,
    payload: Result<Json<DisputeRequest>, JsonRejection>,
) -> ApiResult<ViolationCase> {
    let req = body(payload)?;
    Ok(Json(registry.dispute_violation(id, &req.reason, Utc::now()).await?))
}

async fn cancel_violation(
    State(registry): State<Arc<Registry>>,
    Path(id): Path<Uuid>,
) -> ApiResult<ViolationCase> {
    Ok(Json(registry.cancel_violation(id, Utc::now()).await?))
}

async fn pay_violation(
    State(registry): State<Arc<Registry>>,
    Path(id): Path<Uuid>,
) -> ApiResult<ViolationCase> {
    Ok(Json(registry.mark_paid(id, Utc::now()).await?))
}

/// Run merit recovery immediately, outside the weekly schedule
async fn run_recovery(State(registry): State<Arc<Registry>>) -> ApiResult<RecoveryResponse> {
    let entries = registry.run_recovery(Utc::now()).await;
    Ok(Json(RecoveryResponse {
        processed: entries.len(),
        entries,
    }))
}

async fn statistics(State(registry): State<Arc<Registry>>) -> ApiResult<MeritStatistics> {
    Ok(Json(registry.statistics().await))
}

async fn list_zones(State(registry): State<Arc<Registry>>) -> ApiResult<ZonesResponse> {
    let (zones, stats) = registry.zones().await;
    Ok(Json(ZonesResponse { zones, stats }))
}

async fn add_zone(
    State(registry): State<Arc<Registry>>,
    payload: Result<Json<SensitiveLocation>, JsonRejection>,
) -> Result<(StatusCode, Json<SensitiveLocation>), ApiError> {
    let zone = registry.add_zone(body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(zone)))
}

/// Zone placement for a point, with an optional priced violation
async fn analyze_location(
    State(registry): State<Arc<Registry>>,
    payload: Result<Json<AnalyzeLocationRequest>, JsonRejection>,
) -> ApiResult<LocationAnalysis> {
    let req = body(payload)?;
    let analysis = registry
        .analyze_location(req.location, req.speed_kmh, req.vehicle_class.as_deref())
        .await?;
    Ok(Json(analysis))
}

async fn nearby_zones(
    State(registry): State<Arc<Registry>>,
    Query(query): Query<NearbyQuery>,
) -> ApiResult<NearbyResponse> {
    let center = GeoPoint::new(query.lat, query.lng)?;
    let radius_m = query.radius_m.unwrap_or(DEFAULT_NEARBY_RADIUS_M);
    let zones = registry.nearby_zones(center, radius_m).await?;
    Ok(Json(NearbyResponse {
        center,
        radius_m,
        count: zones.len(),
        zones,
    }))
}
