// Violation classifier
// Computes the excess over the limit and buckets it into a severity tier
// using a single ordered rule table
//
// Numan Thabit 2025 Nov

use crate::errors::EngineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single speed reading from a device. Not retained by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedSample {
    pub speed_kmh: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityTier {
    Minor,
    Moderate,
    Serious,
    Severe,
}

impl SeverityTier {
    pub fn as_str(self) -> &'static str {
        match self {
            SeverityTier::Minor => "minor",
            SeverityTier::Moderate => "moderate",
            SeverityTier::Serious => "serious",
            SeverityTier::Severe => "severe",
        }
    }

    pub fn rule(self) -> &'static TierRule {
        TIER_TABLE
            .iter()
            .find(|rule| rule.tier == self)
            .unwrap_or(&TIER_TABLE[TIER_TABLE.len() - 1])
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the fine table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierRule {
    pub tier: SeverityTier,
    /// Inclusive upper bound on km/h over the limit; `None` for the open top tier.
    pub max_over_kmh: Option<u32>,
    pub base_fine: u64,
    pub merit_points: u32,
    pub requires_additional_fine: bool,
}

/// Ordered by ascending upper bound. The last row must be open-ended.
pub const TIER_TABLE: [TierRule; 4] = [
    TierRule {
        tier: SeverityTier::Minor,
        max_over_kmh: Some(10),
        base_fine: 1_000,
        merit_points: 5,
        requires_additional_fine: false,
    },
    TierRule {
        tier: SeverityTier::Moderate,
        max_over_kmh: Some(20),
        base_fine: 2_000,
        merit_points: 10,
        requires_additional_fine: false,
    },
    TierRule {
        tier: SeverityTier::Serious,
        max_over_kmh: Some(30),
        base_fine: 5_000,
        merit_points: 20,
        requires_additional_fine: false,
    },
    TierRule {
        tier: SeverityTier::Severe,
        max_over_kmh: None,
        base_fine: 10_000,
        merit_points: 30,
        requires_additional_fine: true,
    },
];

/// Outcome of classifying a speed sample that exceeded its limit.
///
/// `base_fine` and `final_fine` stay separate so a zone multiplier applied
/// later can be audited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationRecord {
    pub speed_over_limit: f64,
    pub severity_tier: SeverityTier,
    pub merit_points_deducted: u32,
    pub base_fine: u64,
    pub final_fine: u64,
    pub zone_multiplier: f64,
    pub requires_additional_fine: bool,
}

impl ViolationRecord {
    fn from_rule(speed_over_limit: f64, rule: &TierRule) -> Self {
        Self {
            speed_over_limit,
            severity_tier: rule.tier,
            merit_points_deducted: rule.merit_points,
            base_fine: rule.base_fine,
            final_fine: rule.base_fine,
            zone_multiplier: 1.0,
            requires_additional_fine: rule.requires_additional_fine,
        }
    }

    /// Scale the final fine by a zone multiplier. Always computed from the base
    /// fine, so applying the same multiplier twice is a no-op.
    pub fn apply_zone_multiplier(&mut self, multiplier: f64) -> Result<(), EngineError> {
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(EngineError::InvalidInput(format!(
                "zone multiplier must be finite and >= 1.0, got {multiplier}"
            )));
        }
        self.zone_multiplier = multiplier;
        self.final_fine = (self.base_fine as f64 * multiplier).round() as u64;
        Ok(())
    }
}

/// Classify a recorded speed against a limit. `Ok(None)` means no violation.
pub fn classify(
    speed_kmh: f64,
    speed_limit_kmh: u32,
) -> Result<Option<ViolationRecord>, EngineError> {
    if !speed_kmh.is_finite() || speed_kmh < 0.0 {
        return Err(EngineError::InvalidInput(format!(
            "speed must be a non-negative number, got {speed_kmh}"
        )));
    }

    let over = (speed_kmh - f64::from(speed_limit_kmh)).max(0.0);
    if over == 0.0 {
        return Ok(None);
    }

    let rule = TIER_TABLE
        .iter()
        .find(|rule| match rule.max_over_kmh {
            Some(max) => over <= f64::from(max),
            None => true,
        })
        .unwrap_or(&TIER_TABLE[TIER_TABLE.len() - 1]);

    Ok(Some(ViolationRecord::from_rule(over, rule)))
}

pub fn classify_sample(
    sample: &SpeedSample,
    speed_limit_kmh: u32,
) -> Result<Option<ViolationRecord>, EngineError> {
    classify(sample.speed_kmh, speed_limit_kmh)
}
