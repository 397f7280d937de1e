// API request and response payloads
//
// Numan Thabit 2025 Nov

use crate::engine::{SeverityTier, VehicleClass, ViolationRecord};
use crate::geofence::{GeoPoint, NearbyZone, SensitiveLocation, ZoneStats};
use crate::registry::{PendingFilter, RecoveryEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub vehicle_class: String,
    pub speed_kmh: f64,
}

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub vehicle_class: Option<VehicleClass>,
    pub speed_limit_kmh: u32,
    pub used_fallback: bool,
    pub is_violation: bool,
    pub violation: Option<ViolationRecord>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterDriverRequest {
    pub driving_license_id: String,
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct IotSampleRequest {
    pub device_id: String,
    pub speed_kmh: f64,
    /// Defaults to the time the sample is received.
    pub timestamp: Option<DateTime<Utc>>,
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PendingQuery {
    pub plate: Option<String>,
    pub severity: Option<SeverityTier>,
    pub limit: Option<usize>,
}

impl From<PendingQuery> for PendingFilter {
    fn from(query: PendingQuery) -> Self {
        PendingFilter {
            plate_number: query.plate,
            severity: query.severity,
            limit: query.limit,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub driving_license_id: String,
    pub officer_id: String,
    pub driver_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DisputeRequest {
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct RecoveryResponse {
    pub processed: usize,
    pub entries: Vec<RecoveryEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ViolationStatsQuery {
    pub officer_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeLocationRequest {
    pub location: GeoPoint,
    pub speed_kmh: Option<f64>,
    pub vehicle_class: Option<String>,
}

/// Radius used by the nearby lookup when none is given.
pub const DEFAULT_NEARBY_RADIUS_M: f64 = 5_000.0;

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    pub radius_m: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct NearbyResponse {
    pub center: GeoPoint,
    pub radius_m: f64,
    pub count: usize,
    pub zones: Vec<NearbyZone>,
}

#[derive(Debug, Serialize)]
pub struct ZonesResponse {
    pub zones: Vec<SensitiveLocation>,
    pub stats: ZoneStats,
}
