// Violation scoring engine
// Pure, synchronous rules for speed limits, violation tiers and merit points.
// Nothing in here performs I/O or holds shared state; callers pass the
// current time and account values in and persist what comes back.
//
// Numan Thabit 2025 Nov

pub mod classifier;
pub mod limits;
pub mod merit;

pub use classifier::{
    classify, classify_sample, SeverityTier, SpeedSample, TierRule, ViolationRecord, TIER_TABLE,
};
pub use limits::{
    ResolvedLimit, SpeedLimitResolver, UnknownClassPolicy, VehicleClass, FALLBACK_SPEED_LIMIT_KMH,
};
pub use merit::{
    DeductionOutcome, DriverMeritAccount, DrivingStatus, MeritSnapshot, RecoveryOutcome,
    MAX_MERIT_POINTS,
};
