// In-memory registry
// Holds vehicles, driver merit accounts and violation cases. Every mutation
// runs under one write lock so a read-compute-write on an account cannot
// interleave with another, and merit deductions are applied at most once.
//
// Numan Thabit 2025 Nov

pub mod models;

pub use models::{CaseStatus, Driver, DriverView, NewVehicle, Vehicle, ViolationCase};

use crate::config::AppConfig;
use crate::engine::{
    classify, classify_sample, DeductionOutcome, DriverMeritAccount, DrivingStatus, MeritSnapshot,
    SeverityTier, SpeedLimitResolver, SpeedSample, ViolationRecord, MAX_MERIT_POINTS, TIER_TABLE,
};
use crate::errors::{EngineError, ServiceError};
use crate::geofence::{GeoPoint, Geofence, NearbyZone, SensitiveLocation, ZoneAnalysis, ZoneStats};
use crate::metrics;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Default)]
struct Inner {
    vehicles: HashMap<String, Vehicle>,
    /// device id -> plate number
    devices: HashMap<String, String>,
    drivers: HashMap<String, Driver>,
    violations: HashMap<Uuid, ViolationCase>,
}

pub struct Registry {
    resolver: SpeedLimitResolver,
    pending_page_limit: usize,
    geofence: RwLock<Geofence>,
    inner: RwLock<Inner>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleOutcome {
    pub plate_number: String,
    pub speed_limit_kmh: u32,
    pub violation: Option<ViolationCase>,
}

#[derive(Debug, Clone, Default)]
pub struct PendingFilter {
    pub plate_number: Option<String>,
    pub severity: Option<SeverityTier>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Confirmation {
    pub violation: ViolationCase,
    pub deduction: DeductionOutcome,
    pub driver: DriverView,
    pub status_message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VehicleScan {
    pub vehicle: Vehicle,
    pub owner: Option<DriverView>,
    pub open_violations: Vec<ViolationCase>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnedVehicle {
    pub plate_number: String,
    pub speed_limit_kmh: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeritReport {
    pub driving_license_id: String,
    pub merit: MeritSnapshot,
    pub weeks_since_violation: u32,
    pub potential_recovery: u32,
    pub status_message: String,
    pub recommendations: Vec<&'static str>,
    pub vehicles: Vec<OwnedVehicle>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecoveryEntry {
    pub driving_license_id: String,
    pub recovered: u32,
    pub new_total: u32,
    pub driving_status: DrivingStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusBucket {
    pub driving_status: DrivingStatus,
    pub count: usize,
    pub avg_merit_points: f64,
    pub total_violations: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeritStatistics {
    pub total_drivers: usize,
    pub high_risk_drivers: usize,
    pub risk_percentage: f64,
    pub status_breakdown: Vec<StatusBucket>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DriverHistory {
    pub driver: DriverView,
    pub violation_count: usize,
    pub violations: Vec<ViolationCase>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: CaseStatus,
    pub count: usize,
    pub total_fines: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeverityCount {
    pub severity: SeverityTier,
    pub count: usize,
    pub total_fines: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViolationStatistics {
    pub officer_id: Option<String>,
    pub total_processed: usize,
    pub pending_confirmations: usize,
    pub high_severity_pending: usize,
    pub by_status: Vec<StatusCount>,
    pub by_severity: Vec<SeverityCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationAnalysis {
    pub zone: ZoneAnalysis,
    pub speed_limit_kmh: Option<u32>,
    pub violation: Option<ViolationRecord>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RegistryCounts {
    pub vehicles: usize,
    pub drivers: usize,
    pub violations: usize,
    pub pending: usize,
}

fn normalize_plate(plate: &str) -> String {
    plate.trim().to_ascii_uppercase()
}

fn require(value: &str, field: &str) -> Result<String, EngineError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Below the warning band, or already under review or suspended.
fn is_high_risk(account: &DriverMeritAccount) -> bool {
    account.merit_points() < 30
        || matches!(
            account.driving_status(),
            DrivingStatus::Review | DrivingStatus::Suspended
        )
}

fn newest_first(a: &ViolationCase, b: &ViolationCase) -> std::cmp::Ordering {
    b.recorded_at
        .cmp(&a.recorded_at)
        .then(b.record.severity_tier.cmp(&a.record.severity_tier))
}

impl Registry {
    pub fn new(
        resolver: SpeedLimitResolver,
        geofence: Geofence,
        pending_page_limit: usize,
    ) -> Self {
        Self {
            resolver,
            pending_page_limit: pending_page_limit.max(1),
            geofence: RwLock::new(geofence),
            inner: RwLock::new(Inner::default()),
        }
    }

    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let geofence = match &config.zones_file {
            Some(path) => {
                let geofence = Geofence::from_yaml_file(path)?;
                info!(zones = geofence.locations().len(), path = %path, "loaded sensitive zones");
                geofence
            }
            None => {
                warn!("no zones file configured; every location is a normal road");
                Geofence::default()
            }
        };
        Ok(Self::new(
            SpeedLimitResolver::new(config.unknown_vehicle_class),
            geofence,
            config.pending_page_limit,
        ))
    }

    pub fn resolver(&self) -> SpeedLimitResolver {
        self.resolver
    }

    pub async fn register_vehicle(
        &self,
        req: NewVehicle,
        now: DateTime<Utc>,
    ) -> ServiceResult<Vehicle> {
        let plate_number = normalize_plate(&require(&req.plate_number, "plate_number")?);
        let device_id = require(&req.device_id, "device_id")?;
        let owner_license_id = match req.owner_license_id.as_deref() {
            Some(id) => Some(require(id, "owner_license_id")?),
            None => None,
        };
        let resolved = self.resolver.resolve(&req.vehicle_class)?;

        let mut inner = self.inner.write().await;
        if inner.vehicles.contains_key(&plate_number) {
            return Err(ServiceError::conflict(format!(
                "vehicle {plate_number} already registered"
            )));
        }
        if let Some(existing) = inner.devices.get(&device_id) {
            return Err(ServiceError::conflict(format!(
                "device {device_id} already bound to {existing}"
            )));
        }

        let vehicle = Vehicle {
            plate_number: plate_number.clone(),
            declared_class: req.vehicle_class.trim().to_string(),
            vehicle_class: resolved.class,
            speed_limit_kmh: resolved.speed_limit_kmh,
            device_id: device_id.clone(),
            owner_license_id,
            registered_at: now,
        };
        inner.devices.insert(device_id, plate_number.clone());
        inner.vehicles.insert(plate_number, vehicle.clone());

        info!(
            plate = %vehicle.plate_number,
            device = %vehicle.device_id,
            speed_limit_kmh = vehicle.speed_limit_kmh,
            fallback = resolved.used_fallback,
            "vehicle registered"
        );
        Ok(vehicle)
    }

    pub async fn register_driver(
        &self,
        license_id: &str,
        full_name: &str,
    ) -> ServiceResult<DriverView> {
        let license_id = require(license_id, "driving_license_id")?;
        let full_name = require(full_name, "full_name")?;

        let mut inner = self.inner.write().await;
        if inner.drivers.contains_key(&license_id) {
            return Err(ServiceError::conflict(format!("driver {license_id} already registered")));
        }
        let driver = Driver::onboard(license_id.clone(), full_name);
        let view = driver.view();
        inner.drivers.insert(license_id, driver);
        info!(license = %view.driving_license_id, "driver onboarded");
        Ok(view)
    }

    pub async fn vehicle(&self, plate: &str) -> ServiceResult<Vehicle> {
        let plate = normalize_plate(plate);
        self.inner
            .read()
            .await
            .vehicles
            .get(&plate)
            .cloned()
            .ok_or_else(|| ServiceError::not_found(format!("vehicle {plate}")))
    }

    pub async fn driver(&self, license_id: &str) -> ServiceResult<DriverView> {
        let license_id = license_id.trim();
        self.inner
            .read()
            .await
            .drivers
            .get(license_id)
            .map(Driver::view)
            .ok_or_else(|| ServiceError::not_found(format!("driver {license_id}")))
    }

    pub async fn violation(&self, id: Uuid) -> ServiceResult<ViolationCase> {
        self.inner
            .read()
            .await
            .violations
            .get(&id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found(format!("violation {id}")))
    }

    /// Classify a device reading against its vehicle's limit and open a
    /// pending case when it is a violation.
    pub async fn record_sample(
        &self,
        device_id: &str,
        sample: SpeedSample,
        location: Option<GeoPoint>,
    ) -> ServiceResult<SampleOutcome> {
        let device_id = require(device_id, "device_id")?;
        if let Some(point) = &location {
            point.validate()?;
        }

        let vehicle = {
            let inner = self.inner.read().await;
            let plate = inner
                .devices
                .get(&device_id)
                .ok_or_else(|| ServiceError::not_found(format!("vehicle for device {device_id}")))?;
            inner
                .vehicles
                .get(plate)
                .cloned()
                .ok_or_else(|| ServiceError::not_found(format!("vehicle {plate}")))?
        };

        let Some(mut record) = classify_sample(&sample, vehicle.speed_limit_kmh)? else {
            metrics::SAMPLES_INGESTED.with_label_values(&["within_limit"]).inc();
            debug!(plate = %vehicle.plate_number, speed = sample.speed_kmh, "sample within limit");
            return Ok(SampleOutcome {
                plate_number: vehicle.plate_number,
                speed_limit_kmh: vehicle.speed_limit_kmh,
                violation: None,
            });
        };

        let zone = match location {
            Some(point) => {
                let analysis = self.geofence.read().await.analyze(point)?;
                record.apply_zone_multiplier(analysis.multiplier)?;
                Some(analysis)
            }
            None => None,
        };

        let case = ViolationCase {
            id: Uuid::new_v4(),
            plate_number: vehicle.plate_number.clone(),
            device_id,
            speed_kmh: sample.speed_kmh,
            speed_limit_kmh: vehicle.speed_limit_kmh,
            location,
            recorded_at: sample.timestamp,
            record,
            zone,
            status: CaseStatus::Pending,
            driving_license_id: None,
            confirmed_by: None,
            confirmed_at: None,
            merit_points_applied: false,
            dispute_reason: None,
            updated_at: sample.timestamp,
        };

        self.inner.write().await.violations.insert(case.id, case.clone());

        metrics::SAMPLES_INGESTED.with_label_values(&["violation"]).inc();
        metrics::VIOLATIONS_RECORDED
            .with_label_values(&[case.record.severity_tier.as_str()])
            .inc();
        info!(
            id = %case.id,
            plate = %case.plate_number,
            speed = case.speed_kmh,
            limit = case.speed_limit_kmh,
            severity = %case.record.severity_tier,
            final_fine = case.record.final_fine,
            "speed violation recorded"
        );

        Ok(SampleOutcome {
            plate_number: vehicle.plate_number,
            speed_limit_kmh: vehicle.speed_limit_kmh,
            violation: Some(case),
        })
    }

    pub async fn pending_violations(&self, filter: &PendingFilter) -> Vec<ViolationCase> {
        let plate = filter.plate_number.as_deref().map(normalize_plate);
        let limit = filter.limit.unwrap_or(self.pending_page_limit);

        let inner = self.inner.read().await;
        let mut cases: Vec<ViolationCase> = inner
            .violations
            .values()
            .filter(|case| case.status == CaseStatus::Pending)
            .filter(|case| plate.as_ref().map_or(true, |p| &case.plate_number == p))
            .filter(|case| filter.severity.map_or(true, |s| case.record.severity_tier == s))
            .cloned()
            .collect();
        cases.sort_by(newest_first);
        cases.truncate(limit);
        cases
    }

    /// Cases that carry an additional fine and are still pending or confirmed.
    pub async fn high_severity_violations(&self) -> Vec<ViolationCase> {
        let inner = self.inner.read().await;
        let mut cases: Vec<ViolationCase> = inner
            .violations
            .values()
            .filter(|case| case.record.requires_additional_fine)
            .filter(|case| matches!(case.status, CaseStatus::Pending | CaseStatus::Confirmed))
            .cloned()
            .collect();
        cases.sort_by(newest_first);
        cases
    }

    /// Attribute a violation to a driver and deduct merit points. The
    /// applied flag is checked and set under the same lock as the deduction.
    pub async fn confirm_violation(
        &self,
        id: Uuid,
        license_id: &str,
        officer_id: &str,
        driver_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> ServiceResult<Confirmation> {
        let license_id = require(license_id, "driving_license_id")?;
        let officer_id = require(officer_id, "officer_id")?;

        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        let case = inner
            .violations
            .get_mut(&id)
            .ok_or_else(|| ServiceError::not_found(format!("violation {id}")))?;
        if !case.status.can_transition_to(CaseStatus::Confirmed) || case.merit_points_applied {
            return Err(ServiceError::InvalidTransition {
                from: case.status.to_string(),
                to: CaseStatus::Confirmed.to_string(),
            });
        }

        let driver = inner.drivers.entry(license_id.clone()).or_insert_with(|| {
            info!(license = %license_id, "onboarding driver at confirmation");
            Driver::onboard(
                license_id.clone(),
                driver_name
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .unwrap_or("Unknown Driver")
                    .to_string(),
            )
        });

        let deduction = driver.account.apply_violation(&case.record, now)?;
        driver.confirmed_violations.push(case.id);

        case.status = CaseStatus::Confirmed;
        case.driving_license_id = Some(license_id.clone());
        case.confirmed_by = Some(officer_id.clone());
        case.confirmed_at = Some(now);
        case.merit_points_applied = true;
        case.updated_at = now;

        metrics::VIOLATIONS_CONFIRMED.inc();
        metrics::MERIT_POINTS_DEDUCTED.inc_by(u64::from(deduction.points_applied));
        info!(
            id = %case.id,
            license = %license_id,
            officer = %officer_id,
            deducted = deduction.points_applied,
            merit_points = deduction.new_total,
            status = %deduction.driving_status,
            "violation confirmed"
        );

        Ok(Confirmation {
            violation: case.clone(),
            deduction,
            driver: driver.view(),
            status_message: driver.account.status_message(),
        })
    }

    pub async fn dispute_violation(
        &self,
        id: Uuid,
        reason: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<ViolationCase> {
        let reason = require(reason, "reason")?;
        self.transition(id, CaseStatus::Disputed, now, |case| {
            case.dispute_reason = Some(reason);
        })
        .await
    }

    pub async fn cancel_violation(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> ServiceResult<ViolationCase> {
        self.transition(id, CaseStatus::Cancelled, now, |_| {}).await
    }

    pub async fn mark_paid(&self, id: Uuid, now: DateTime<Utc>) -> ServiceResult<ViolationCase> {
        self.transition(id, CaseStatus::Paid, now, |_| {}).await
    }

    async fn transition(
        &self,
        id: Uuid,
        next: CaseStatus,
        now: DateTime<Utc>,
        update: impl FnOnce(&mut ViolationCase),
    ) -> ServiceResult<ViolationCase> {
        let mut inner = self.inner.write().await;
        let case = inner
            .violations
            .get_mut(&id)
            .ok_or_else(|| ServiceError::not_found(format!("violation {id}")))?;
        if !case.status.can_transition_to(next) {
            return Err(ServiceError::InvalidTransition {
                from: case.status.to_string(),
                to: next.to_string(),
            });
        }
        let from = case.status;
        update(&mut *case);
        case.status = next;
        case.updated_at = now;
        info!(id = %id, from = %from, to = %next, "violation status changed");
        Ok(case.clone())
    }

    /// Officer lookup by plate, as used by the QR scanner.
    pub async fn scan_vehicle(&self, plate: &str) -> ServiceResult<VehicleScan> {
        let plate = normalize_plate(plate);
        let inner = self.inner.read().await;
        let vehicle = inner
            .vehicles
            .get(&plate)
            .cloned()
            .ok_or_else(|| ServiceError::not_found(format!("vehicle {plate}")))?;
        let owner = vehicle
            .owner_license_id
            .as_ref()
            .and_then(|id| inner.drivers.get(id))
            .map(Driver::view);
        let mut open_violations: Vec<ViolationCase> = inner
            .violations
            .values()
            .filter(|case| case.plate_number == plate && case.status.is_open())
            .cloned()
            .collect();
        open_violations.sort_by(newest_first);

        Ok(VehicleScan {
            vehicle,
            owner,
            open_violations,
        })
    }

    /// Current standing plus what a recovery run now would credit. The stored
    /// account is not modified.
    pub async fn merit_report(
        &self,
        license_id: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<MeritReport> {
        let license_id = license_id.trim();
        let inner = self.inner.read().await;
        let driver = inner
            .drivers
            .get(license_id)
            .ok_or_else(|| ServiceError::not_found(format!("driver {license_id}")))?;

        let weeks_since_violation = driver.account.weeks_since_violation(now)?.unwrap_or(0);
        let potential_recovery = driver.account.clone().recover(now)?.recovered;

        let mut vehicles: Vec<OwnedVehicle> = inner
            .vehicles
            .values()
            .filter(|v| v.owner_license_id.as_deref() == Some(license_id))
            .map(|v| OwnedVehicle {
                plate_number: v.plate_number.clone(),
                speed_limit_kmh: v.speed_limit_kmh,
            })
            .collect();
        vehicles.sort_by(|a, b| a.plate_number.cmp(&b.plate_number));

        Ok(MeritReport {
            driving_license_id: driver.driving_license_id.clone(),
            merit: driver.account.snapshot(),
            weeks_since_violation,
            potential_recovery,
            status_message: driver.account.status_message(),
            recommendations: driver.account.recommendations(),
            vehicles,
        })
    }

    /// Run the recovery transition over every account below full points.
    /// An account whose last violation is after `now` is skipped and logged.
    pub async fn run_recovery(&self, now: DateTime<Utc>) -> Vec<RecoveryEntry> {
        let mut inner = self.inner.write().await;
        let mut entries = Vec::new();

        for driver in inner.drivers.values_mut() {
            if driver.account.merit_points() >= MAX_MERIT_POINTS
                || driver.account.last_violation_date().is_none()
            {
                continue;
            }
            match driver.account.recover(now) {
                Ok(outcome) if outcome.recovered > 0 => {
                    metrics::MERIT_POINTS_RECOVERED.inc_by(u64::from(outcome.recovered));
                    info!(
                        license = %driver.driving_license_id,
                        recovered = outcome.recovered,
                        merit_points = outcome.new_total,
                        "merit points recovered"
                    );
                    entries.push(RecoveryEntry {
                        driving_license_id: driver.driving_license_id.clone(),
                        recovered: outcome.recovered,
                        new_total: outcome.new_total,
                        driving_status: driver.account.driving_status(),
                    });
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(
                        license = %driver.driving_license_id,
                        error = %err,
                        "skipping merit recovery"
                    );
                }
            }
        }

        entries.sort_by(|a, b| a.driving_license_id.cmp(&b.driving_license_id));
        entries
    }

    pub async fn statistics(&self) -> MeritStatistics {
        let inner = self.inner.read().await;
        let total_drivers = inner.drivers.len();

        let status_breakdown = DrivingStatus::ALL
            .into_iter()
            .map(|status| {
                let accounts: Vec<_> = inner
                    .drivers
                    .values()
                    .map(|d| &d.account)
                    .filter(|a| a.driving_status() == status)
                    .collect();
                let count = accounts.len();
                let points: u64 = accounts.iter().map(|a| u64::from(a.merit_points())).sum();
                StatusBucket {
                    driving_status: status,
                    count,
                    avg_merit_points: if count == 0 { 0.0 } else { points as f64 / count as f64 },
                    total_violations: accounts
                        .iter()
                        .map(|a| u64::from(a.total_violations()))
                        .sum(),
                }
            })
            .collect();

        let high_risk_drivers = inner
            .drivers
            .values()
            .filter(|d| is_high_risk(&d.account))
            .count();

        let risk_percentage = if total_drivers == 0 {
            0.0
        } else {
            (high_risk_drivers as f64 / total_drivers as f64 * 1000.0).round() / 10.0
        };

        MeritStatistics {
            total_drivers,
            high_risk_drivers,
            risk_percentage,
            status_breakdown,
        }
    }

    /// Drivers needing attention, lowest merit first.
    pub async fn high_risk_drivers(&self) -> Vec<DriverView> {
        let inner = self.inner.read().await;
        let mut drivers: Vec<&Driver> = inner
            .drivers
            .values()
            .filter(|d| is_high_risk(&d.account))
            .collect();
        drivers.sort_by(|a, b| {
            a.account
                .merit_points()
                .cmp(&b.account.merit_points())
                .then(b.account.total_violations().cmp(&a.account.total_violations()))
                .then(a.driving_license_id.cmp(&b.driving_license_id))
        });
        drivers.into_iter().map(Driver::view).collect()
    }

    /// Every case attributed to the driver, newest first.
    pub async fn driver_violations(&self, license_id: &str) -> ServiceResult<DriverHistory> {
        let license_id = license_id.trim();
        let inner = self.inner.read().await;
        let driver = inner
            .drivers
            .get(license_id)
            .ok_or_else(|| ServiceError::not_found(format!("driver {license_id}")))?;

        let mut violations: Vec<ViolationCase> = inner
            .violations
            .values()
            .filter(|case| case.driving_license_id.as_deref() == Some(license_id))
            .cloned()
            .collect();
        violations.sort_by(newest_first);

        Ok(DriverHistory {
            driver: driver.view(),
            violation_count: violations.len(),
            violations,
        })
    }

    /// Case counts and fine totals by status and severity. With an officer
    /// id only the cases that officer confirmed are grouped; the pending
    /// counts always cover the whole queue.
    pub async fn violation_statistics(&self, officer_id: Option<&str>) -> ViolationStatistics {
        let officer_id = officer_id.map(str::trim).filter(|id| !id.is_empty());
        let inner = self.inner.read().await;
        let cases: Vec<&ViolationCase> = inner
            .violations
            .values()
            .filter(|case| officer_id.map_or(true, |id| case.confirmed_by.as_deref() == Some(id)))
            .collect();

        let by_status = CaseStatus::ALL
            .into_iter()
            .map(|status| {
                let matching = cases.iter().filter(|case| case.status == status);
                StatusCount {
                    status,
                    count: matching.clone().count(),
                    total_fines: matching.map(|case| case.record.final_fine).sum(),
                }
            })
            .collect();

        let by_severity = TIER_TABLE
            .iter()
            .map(|rule| {
                let matching = cases.iter().filter(|case| case.record.severity_tier == rule.tier);
                SeverityCount {
                    severity: rule.tier,
                    count: matching.clone().count(),
                    total_fines: matching.map(|case| case.record.final_fine).sum(),
                }
            })
            .collect();

        let pending = inner
            .violations
            .values()
            .filter(|case| case.status == CaseStatus::Pending);

        ViolationStatistics {
            officer_id: officer_id.map(String::from),
            total_processed: cases.len(),
            pending_confirmations: pending.clone().count(),
            high_severity_pending: pending
                .filter(|case| case.record.requires_additional_fine)
                .count(),
            by_status,
            by_severity,
        }
    }

    /// Place a point against the zones and, when a speed and vehicle class
    /// are both given, price the violation that would be recorded there.
    pub async fn analyze_location(
        &self,
        point: GeoPoint,
        speed_kmh: Option<f64>,
        vehicle_class: Option<&str>,
    ) -> ServiceResult<LocationAnalysis> {
        let zone = self.geofence.read().await.analyze(point)?;

        let (speed_limit_kmh, violation) = match (speed_kmh, vehicle_class) {
            (Some(speed), Some(class)) => {
                let resolved = self.resolver.resolve(class)?;
                let mut violation = classify(speed, resolved.speed_limit_kmh)?;
                if let Some(record) = violation.as_mut() {
                    record.apply_zone_multiplier(zone.multiplier)?;
                }
                (Some(resolved.speed_limit_kmh), violation)
            }
            (None, None) => (None, None),
            _ => {
                return Err(EngineError::InvalidInput(
                    "speed_kmh and vehicle_class must be given together".into(),
                )
                .into())
            }
        };

        Ok(LocationAnalysis {
            zone,
            speed_limit_kmh,
            violation,
        })
    }

    pub async fn nearby_zones(
        &self,
        point: GeoPoint,
        radius_m: f64,
    ) -> ServiceResult<Vec<NearbyZone>> {
        Ok(self.geofence.read().await.nearby(point, radius_m)?)
    }

    pub async fn zones(&self) -> (Vec<SensitiveLocation>, ZoneStats) {
        let geofence = self.geofence.read().await;
        (geofence.locations().to_vec(), geofence.stats())
    }

    pub async fn add_zone(&self, location: SensitiveLocation) -> ServiceResult<SensitiveLocation> {
        self.geofence.write().await.add(location.clone())?;
        info!(name = %location.name, zone_type = %location.zone_type, "sensitive zone added");
        Ok(location)
    }

    pub async fn counts(&self) -> RegistryCounts {
        let inner = self.inner.read().await;
        RegistryCounts {
            vehicles: inner.vehicles.len(),
            drivers: inner.drivers.len(),
            violations: inner.violations.len(),
            pending: inner
                .violations
                .values()
                .filter(|c| c.status == CaseStatus::Pending)
                .count(),
        }
    }
}
