// Registry entity types
// Vehicles, drivers and violation cases as held by the in-memory registry,
// plus the violation case lifecycle
//
// Numan Thabit 2025 Nov

use crate::engine::{DriverMeritAccount, MeritSnapshot, VehicleClass, ViolationRecord};
use crate::geofence::{GeoPoint, ZoneAnalysis};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vehicle {
    pub plate_number: String,
    /// Class name as supplied at registration.
    pub declared_class: String,
    /// `None` when the class was not recognised and the fallback limit applied.
    pub vehicle_class: Option<VehicleClass>,
    pub speed_limit_kmh: u32,
    pub device_id: String,
    pub owner_license_id: Option<String>,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVehicle {
    pub plate_number: String,
    pub vehicle_class: String,
    pub device_id: String,
    pub owner_license_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Driver {
    pub driving_license_id: String,
    pub full_name: String,
    pub account: DriverMeritAccount,
    pub confirmed_violations: Vec<Uuid>,
}

impl Driver {
    pub fn onboard(driving_license_id: String, full_name: String) -> Self {
        Self {
            driving_license_id,
            full_name,
            account: DriverMeritAccount::new(),
            confirmed_violations: Vec::new(),
        }
    }

    pub fn view(&self) -> DriverView {
        DriverView {
            driving_license_id: self.driving_license_id.clone(),
            full_name: self.full_name.clone(),
            merit: self.account.snapshot(),
            confirmed_violations: self.confirmed_violations.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverView {
    pub driving_license_id: String,
    pub full_name: String,
    pub merit: MeritSnapshot,
    pub confirmed_violations: Vec<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Pending,
    Confirmed,
    Disputed,
    Cancelled,
    Paid,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 5] = [
        CaseStatus::Pending,
        CaseStatus::Confirmed,
        CaseStatus::Disputed,
        CaseStatus::Cancelled,
        CaseStatus::Paid,
    ];

    pub fn can_transition_to(self, next: CaseStatus) -> bool {
        use CaseStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Disputed)
                | (Pending, Cancelled)
                | (Disputed, Confirmed)
                | (Disputed, Cancelled)
                | (Confirmed, Paid)
        )
    }

    /// Still awaiting an officer decision.
    pub fn is_open(self) -> bool {
        matches!(self, CaseStatus::Pending | CaseStatus::Disputed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CaseStatus::Pending => "pending",
            CaseStatus::Confirmed => "confirmed",
            CaseStatus::Disputed => "disputed",
            CaseStatus::Cancelled => "cancelled",
            CaseStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded violation and its review state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViolationCase {
    pub id: Uuid,
    pub plate_number: String,
    pub device_id: String,
    pub speed_kmh: f64,
    pub speed_limit_kmh: u32,
    pub location: Option<GeoPoint>,
    pub recorded_at: DateTime<Utc>,
    pub record: ViolationRecord,
    pub zone: Option<ZoneAnalysis>,
    pub status: CaseStatus,
    pub driving_license_id: Option<String>,
    pub confirmed_by: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub merit_points_applied: bool,
    pub dispute_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}
