// Merit account updater
// Deduction and weekly recovery transitions for a driver's merit account,
// plus the status mapping and advisory text derived from it
//
// Numan Thabit 2025 Nov

use crate::engine::classifier::ViolationRecord;
use crate::errors::EngineError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_MERIT_POINTS: u32 = 100;
pub const RECOVERY_POINTS_PER_WEEK: u32 = 2;
const SECONDS_PER_WEEK: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrivingStatus {
    Suspended,
    Review,
    Warning,
    Active,
}

impl DrivingStatus {
    pub const ALL: [DrivingStatus; 4] = [
        DrivingStatus::Active,
        DrivingStatus::Warning,
        DrivingStatus::Review,
        DrivingStatus::Suspended,
    ];

    pub fn from_points(points: u32) -> Self {
        match points {
            0 => DrivingStatus::Suspended,
            1..=29 => DrivingStatus::Review,
            30..=49 => DrivingStatus::Warning,
            _ => DrivingStatus::Active,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DrivingStatus::Suspended => "suspended",
            DrivingStatus::Review => "review",
            DrivingStatus::Warning => "warning",
            DrivingStatus::Active => "active",
        }
    }

    pub fn message(self, points: u32) -> String {
        match self {
            DrivingStatus::Active => {
                format!("Your driving record is in good standing with {points} merit points.")
            }
            DrivingStatus::Warning => format!(
                "Warning: You have {points} merit points. \
                 Drive carefully to avoid further penalties."
            ),
            DrivingStatus::Review => format!(
                "Your license is flagged for review with {points} merit points. \
                 Contact DMT for guidance."
            ),
            DrivingStatus::Suspended => format!(
                "Your driving privileges are suspended. You have {points} merit points \
                 and must complete rehabilitation."
            ),
        }
    }
}

impl fmt::Display for DrivingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeductionOutcome {
    /// Points the violation asked for.
    pub points_requested: u32,
    /// Points actually removed after saturating at zero.
    pub points_applied: u32,
    pub new_total: u32,
    pub driving_status: DrivingStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecoveryOutcome {
    pub recovered: u32,
    pub new_total: u32,
}

/// A driver's merit standing. The driving status is derived from the points
/// on every read and is never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverMeritAccount {
    merit_points: u32,
    total_violations: u32,
    violation_free_weeks: u32,
    last_violation_date: Option<DateTime<Utc>>,
}

impl Default for DriverMeritAccount {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverMeritAccount {
    /// Fresh account at onboarding: full points, active.
    pub fn new() -> Self {
        Self {
            merit_points: MAX_MERIT_POINTS,
            total_violations: 0,
            violation_free_weeks: 0,
            last_violation_date: None,
        }
    }

    /// Rebuild an account from persisted values.
    pub fn from_parts(
        merit_points: u32,
        total_violations: u32,
        violation_free_weeks: u32,
        last_violation_date: Option<DateTime<Utc>>,
    ) -> Result<Self, EngineError> {
        if merit_points > MAX_MERIT_POINTS {
            return Err(EngineError::InvalidInput(format!(
                "merit points must be within 0..={MAX_MERIT_POINTS}, got {merit_points}"
            )));
        }
        Ok(Self {
            merit_points,
            total_violations,
            violation_free_weeks,
            last_violation_date,
        })
    }

    pub fn merit_points(&self) -> u32 {
        self.merit_points
    }

    pub fn driving_status(&self) -> DrivingStatus {
        DrivingStatus::from_points(self.merit_points)
    }

    pub fn total_violations(&self) -> u32 {
        self.total_violations
    }

    pub fn violation_free_weeks(&self) -> u32 {
        self.violation_free_weeks
    }

    pub fn last_violation_date(&self) -> Option<DateTime<Utc>> {
        self.last_violation_date
    }

    /// Apply a confirmed violation. Calling this twice for the same record
    /// deducts twice; the caller owns at-most-once delivery.
    pub fn apply_violation(
        &mut self,
        record: &ViolationRecord,
        now: DateTime<Utc>,
    ) -> Result<DeductionOutcome, EngineError> {
        self.deduct_points(i64::from(record.merit_points_deducted), now)
    }

    pub fn deduct_points(
        &mut self,
        points: i64,
        now: DateTime<Utc>,
    ) -> Result<DeductionOutcome, EngineError> {
        if points < 0 {
            return Err(EngineError::InvalidInput(format!(
                "merit point deduction must be non-negative, got {points}"
            )));
        }
        let requested = u32::try_from(points).unwrap_or(u32::MAX);
        let before = self.merit_points;

        self.merit_points = before.saturating_sub(requested);
        self.total_violations = self.total_violations.saturating_add(1);
        self.last_violation_date = Some(now);
        self.violation_free_weeks = 0;

        Ok(DeductionOutcome {
            points_requested: requested,
            points_applied: before - self.merit_points,
            new_total: self.merit_points,
            driving_status: self.driving_status(),
        })
    }

    /// Whole weeks elapsed since the last violation, if there was one.
    pub fn weeks_since_violation(&self, now: DateTime<Utc>) -> Result<Option<u32>, EngineError> {
        let Some(last) = self.last_violation_date else {
            return Ok(None);
        };
        let elapsed = now.signed_duration_since(last);
        if elapsed < Duration::zero() {
            return Err(EngineError::InvalidInput(format!(
                "evaluation time {now} precedes last violation {last}"
            )));
        }
        let weeks = elapsed.num_seconds() / SECONDS_PER_WEEK;
        Ok(Some(u32::try_from(weeks).unwrap_or(u32::MAX)))
    }

    /// Credit violation-free weeks not yet credited. Safe to call at any
    /// frequency: weeks already counted are never credited again.
    pub fn recover(&mut self, now: DateTime<Utc>) -> Result<RecoveryOutcome, EngineError> {
        let unchanged = RecoveryOutcome {
            recovered: 0,
            new_total: self.merit_points,
        };
        let Some(weeks) = self.weeks_since_violation(now)? else {
            return Ok(unchanged);
        };
        if weeks <= self.violation_free_weeks {
            return Ok(unchanged);
        }

        let weeks_to_recover = weeks - self.violation_free_weeks;
        let points = weeks_to_recover
            .saturating_mul(RECOVERY_POINTS_PER_WEEK)
            .min(MAX_MERIT_POINTS - self.merit_points);

        self.merit_points = (self.merit_points + points).min(MAX_MERIT_POINTS);
        self.violation_free_weeks = weeks;

        Ok(RecoveryOutcome {
            recovered: points,
            new_total: self.merit_points,
        })
    }

    pub fn status_message(&self) -> String {
        self.driving_status().message(self.merit_points)
    }

    pub fn recommendations(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.merit_points < 30 {
            out.push("Consider taking a defensive driving course");
            out.push("Review Sri Lankan traffic rules and regulations");
        }
        if self.merit_points < 50 {
            out.push("Drive within speed limits at all times");
            out.push("Be extra cautious in sensitive zones (schools, hospitals)");
        }
        if self.total_violations > 5 {
            out.push("Consider using speed monitoring apps");
            out.push("Plan routes to avoid high-traffic areas");
        }
        if self.violation_free_weeks >= 4 {
            out.push("Great job! Keep up the safe driving to recover more points");
        }
        out
    }

    pub fn snapshot(&self) -> MeritSnapshot {
        MeritSnapshot {
            merit_points: self.merit_points,
            max_points: MAX_MERIT_POINTS,
            driving_status: self.driving_status(),
            total_violations: self.total_violations,
            violation_free_weeks: self.violation_free_weeks,
            last_violation_date: self.last_violation_date,
        }
    }
}

/// Serialisable view of an account, status included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeritSnapshot {
    pub merit_points: u32,
    pub max_points: u32,
    pub driving_status: DrivingStatus,
    pub total_violations: u32,
    pub violation_free_weeks: u32,
    pub last_violation_date: Option<DateTime<Utc>>,
}
