// Speed limit resolver
// Maps a vehicle class to its legal speed limit, with an explicit policy
// for class names the table does not know
//
// Numan Thabit 2025 Nov

use crate::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Limit applied to unrecognised classes under [`UnknownClassPolicy::Fallback`].
pub const FALLBACK_SPEED_LIMIT_KMH: u32 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    Motorcycle,
    LightVehicle,
    ThreeWheeler,
    HeavyVehicle,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 4] = [
        VehicleClass::Motorcycle,
        VehicleClass::LightVehicle,
        VehicleClass::ThreeWheeler,
        VehicleClass::HeavyVehicle,
    ];

    pub fn speed_limit_kmh(self) -> u32 {
        match self {
            VehicleClass::Motorcycle | VehicleClass::LightVehicle => 70,
            VehicleClass::ThreeWheeler | VehicleClass::HeavyVehicle => 50,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleClass::Motorcycle => "motorcycle",
            VehicleClass::LightVehicle => "light_vehicle",
            VehicleClass::ThreeWheeler => "three_wheeler",
            VehicleClass::HeavyVehicle => "heavy_vehicle",
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleClass {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        VehicleClass::ALL
            .into_iter()
            .find(|class| class.as_str() == normalized)
            .ok_or_else(|| EngineError::InvalidVehicleClass(s.to_string()))
    }
}

/// What to do with a class name that is not in the limit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownClassPolicy {
    /// Fail with [`EngineError::InvalidVehicleClass`].
    #[default]
    Reject,
    /// Use [`FALLBACK_SPEED_LIMIT_KMH`] and flag the result.
    Fallback,
}

impl FromStr for UnknownClassPolicy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(UnknownClassPolicy::Reject),
            "fallback" => Ok(UnknownClassPolicy::Fallback),
            other => Err(EngineError::InvalidInput(format!(
                "unknown vehicle class policy {other:?} (expected reject or fallback)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedLimit {
    /// `None` when the fallback limit was used.
    pub class: Option<VehicleClass>,
    pub speed_limit_kmh: u32,
    pub used_fallback: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SpeedLimitResolver {
    policy: UnknownClassPolicy,
}

impl SpeedLimitResolver {
    pub fn new(policy: UnknownClassPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> UnknownClassPolicy {
        self.policy
    }

    pub fn resolve(&self, raw_class: &str) -> Result<ResolvedLimit, EngineError> {
        match raw_class.parse::<VehicleClass>() {
            Ok(class) => Ok(ResolvedLimit {
                class: Some(class),
                speed_limit_kmh: class.speed_limit_kmh(),
                used_fallback: false,
            }),
            Err(err) => match self.policy {
                UnknownClassPolicy::Reject => Err(err),
                UnknownClassPolicy::Fallback => {
                    warn!(
                        vehicle_class = %raw_class,
                        fallback_kmh = FALLBACK_SPEED_LIMIT_KMH,
                        "unrecognised vehicle class; applying fallback speed limit"
                    );
                    Ok(ResolvedLimit {
                        class: None,
                        speed_limit_kmh: FALLBACK_SPEED_LIMIT_KMH,
                        used_fallback: true,
                    })
                }
            },
        }
    }
}
