// Geofencing module
// Sensitive-zone lookup for violation locations and the fine multiplier
// that applies inside each zone type
//
// Numan Thabit 2025 Nov

use crate::errors::EngineError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Multiplier outside every sensitive zone.
pub const NORMAL_ROAD_MULTIPLIER: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneType {
    Hospital,
    School,
    University,
    Town,
    City,
}

impl ZoneType {
    pub fn fine_multiplier(self) -> f64 {
        match self {
            ZoneType::Hospital | ZoneType::School => 3.0,
            ZoneType::University | ZoneType::Town | ZoneType::City => 2.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ZoneType::Hospital => "hospital",
            ZoneType::School => "school",
            ZoneType::University => "university",
            ZoneType::Town => "town",
            ZoneType::City => "city",
        }
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Result<Self, EngineError> {
        let point = Self { lat, lng };
        point.validate()?;
        Ok(point)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(EngineError::InvalidInput(format!(
                "latitude must be within [-90, 90], got {}",
                self.lat
            )));
        }
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(EngineError::InvalidInput(format!(
                "longitude must be within [-180, 180], got {}",
                self.lng
            )));
        }
        Ok(())
    }

    /// Great-circle distance in meters (haversine).
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        let phi1 = self.lat.to_radians();
        let phi2 = other.lat.to_radians();
        let d_phi = (other.lat - self.lat).to_radians();
        let d_lambda = (other.lng - self.lng).to_radians();

        let a = (d_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitiveLocation {
    pub name: String,
    pub zone_type: ZoneType,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: f64,
}

impl SensitiveLocation {
    pub fn center(&self) -> GeoPoint {
        GeoPoint {
            lat: self.latitude,
            lng: self.longitude,
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.name.trim().is_empty() {
            return Err(EngineError::InvalidInput("zone name must not be empty".into()));
        }
        self.center().validate()?;
        if !self.radius_m.is_finite() || self.radius_m <= 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "zone radius must be positive, got {}",
                self.radius_m
            )));
        }
        Ok(())
    }
}

/// A sensitive location and its distance from a queried point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyZone {
    #[serde(flatten)]
    pub location: SensitiveLocation,
    pub distance_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosestZone {
    pub name: String,
    pub zone_type: ZoneType,
    pub distance_m: f64,
}

/// Result of placing a violation location against the configured zones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneAnalysis {
    pub in_zone: bool,
    pub zone_type: Option<ZoneType>,
    pub zone_name: Option<String>,
    pub distance_m: Option<f64>,
    pub zone_radius_m: Option<f64>,
    pub multiplier: f64,
    pub closest_zone: Option<ClosestZone>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ZoneStats {
    pub total: usize,
    pub by_type: BTreeMap<ZoneType, usize>,
}

#[derive(Debug, Clone, Default)]
pub struct Geofence {
    locations: Vec<SensitiveLocation>,
}

impl Geofence {
    pub fn new(locations: Vec<SensitiveLocation>) -> Result<Self, EngineError> {
        for location in &locations {
            location.validate()?;
        }
        Ok(Self { locations })
    }

    /// Load sensitive locations from a YAML list.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read zones file {}", path.display()))?;
        let locations: Vec<SensitiveLocation> = serde_yaml::from_str(&raw)
            .with_context(|| format!("parse zones file {}", path.display()))?;
        Ok(Self::new(locations)?)
    }

    pub fn add(&mut self, location: SensitiveLocation) -> Result<(), EngineError> {
        location.validate()?;
        self.locations.push(location);
        Ok(())
    }

    pub fn locations(&self) -> &[SensitiveLocation] {
        &self.locations
    }

    pub fn analyze(&self, point: GeoPoint) -> Result<ZoneAnalysis, EngineError> {
        point.validate()?;

        let mut closest: Option<(&SensitiveLocation, f64)> = None;
        for location in &self.locations {
            let distance = point.distance_m(&location.center());
            if distance <= location.radius_m {
                return Ok(ZoneAnalysis {
                    in_zone: true,
                    zone_type: Some(location.zone_type),
                    zone_name: Some(location.name.clone()),
                    distance_m: Some(distance),
                    zone_radius_m: Some(location.radius_m),
                    multiplier: location.zone_type.fine_multiplier(),
                    closest_zone: None,
                });
            }
            if closest.map_or(true, |(_, best)| distance < best) {
                closest = Some((location, distance));
            }
        }

        Ok(ZoneAnalysis {
            in_zone: false,
            zone_type: None,
            zone_name: None,
            distance_m: closest.map(|(_, d)| d),
            zone_radius_m: None,
            multiplier: NORMAL_ROAD_MULTIPLIER,
            closest_zone: closest.map(|(location, distance_m)| ClosestZone {
                name: location.name.clone(),
                zone_type: location.zone_type,
                distance_m,
            }),
        })
    }

    /// Locations whose center lies within `radius_m` of `point`, closest first.
    pub fn nearby(&self, point: GeoPoint, radius_m: f64) -> Result<Vec<NearbyZone>, EngineError> {
        point.validate()?;
        if !radius_m.is_finite() || radius_m <= 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "search radius must be positive, got {radius_m}"
            )));
        }

        let mut zones: Vec<NearbyZone> = self
            .locations
            .iter()
            .map(|location| NearbyZone {
                distance_m: point.distance_m(&location.center()).round(),
                location: location.clone(),
            })
            .filter(|zone| zone.distance_m <= radius_m)
            .collect();
        zones.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        Ok(zones)
    }

    pub fn stats(&self) -> ZoneStats {
        let mut by_type = BTreeMap::new();
        for location in &self.locations {
            *by_type.entry(location.zone_type).or_insert(0) += 1;
        }
        ZoneStats {
            total: self.locations.len(),
            by_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hospital() -> SensitiveLocation {
        SensitiveLocation {
            name: "Vavuniya General Hospital".into(),
            zone_type: ZoneType::Hospital,
            latitude: 8.7542,
            longitude: 80.4982,
            radius_m: 500.0,
        }
    }

    fn university() -> SensitiveLocation {
        SensitiveLocation {
            name: "University of Vavuniya".into(),
            zone_type: ZoneType::University,
            latitude: 8.7600,
            longitude: 80.4100,
            radius_m: 500.0,
        }
    }

    #[test]
    fn haversine_one_degree_latitude() {
        let a = GeoPoint::new(0.0, 0.0).unwrap();
        let b = GeoPoint::new(1.0, 0.0).unwrap();
        let d = a.distance_m(&b);
        assert!((d - 111_195.0).abs() < 10.0, "got {d}");
        assert_eq!(a.distance_m(&a), 0.0);
    }

    #[test]
    fn point_inside_zone_gets_zone_multiplier() {
        let geofence = Geofence::new(vec![university(), hospital()]).unwrap();
        let analysis = geofence.analyze(GeoPoint::new(8.7545, 80.4985).unwrap()).unwrap();
        assert!(analysis.in_zone);
        assert_eq!(analysis.zone_type, Some(ZoneType::Hospital));
        assert_eq!(analysis.multiplier, 3.0);
        assert!(analysis.distance_m.unwrap() < 500.0);
    }

    #[test]
    fn point_outside_reports_closest() {
        let geofence = Geofence::new(vec![university(), hospital()]).unwrap();
        let analysis = geofence.analyze(GeoPoint::new(8.7700, 80.5000).unwrap()).unwrap();
        assert!(!analysis.in_zone);
        assert_eq!(analysis.multiplier, NORMAL_ROAD_MULTIPLIER);
        let closest = analysis.closest_zone.unwrap();
        assert_eq!(closest.zone_type, ZoneType::Hospital);
        assert!(closest.distance_m > 500.0);
    }

    #[test]
    fn empty_geofence_is_normal_road() {
        let analysis = Geofence::default()
            .analyze(GeoPoint::new(8.75, 80.49).unwrap())
            .unwrap();
        assert!(!analysis.in_zone);
        assert_eq!(analysis.closest_zone, None);
        assert_eq!(analysis.multiplier, 1.0);
    }

    #[test]
    fn rejects_bad_coordinates_and_radius() {
        assert!(GeoPoint::new(91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -181.0).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());

        let mut zone = hospital();
        zone.radius_m = 0.0;
        assert!(Geofence::default().add(zone).is_err());
    }

    #[test]
    fn multipliers_by_type() {
        assert_eq!(ZoneType::School.fine_multiplier(), 3.0);
        assert_eq!(ZoneType::City.fine_multiplier(), 2.0);
        assert_eq!(ZoneType::Town.fine_multiplier(), 2.0);
    }

    #[test]
    fn stats_count_by_type() {
        let mut geofence = Geofence::new(vec![hospital()]).unwrap();
        geofence.add(university()).unwrap();
        geofence.add(hospital()).unwrap();
        let stats = geofence.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_type[&ZoneType::Hospital], 2);
        assert_eq!(stats.by_type[&ZoneType::University], 1);
    }

    #[test]
    fn parses_yaml_zone_list() {
        let yaml = r#"
- name: Central School
  zone_type: school
  latitude: 8.75
  longitude: 80.49
  radius_m: 300
"#;
        let locations: Vec<SensitiveLocation> = serde_yaml::from_str(yaml).unwrap();
        let geofence = Geofence::new(locations).unwrap();
        assert_eq!(geofence.locations()[0].zone_type, ZoneType::School);
    }

    #[test]
    fn nearby_sorts_by_distance_within_radius() {
        let geofence = Geofence::new(vec![university(), hospital()]).unwrap();
        let at_hospital = GeoPoint::new(8.7542, 80.4982).unwrap();

        let close = geofence.nearby(at_hospital, 5_000.0).unwrap();
        assert_eq!(close.len(), 1);
        assert_eq!(close[0].location.zone_type, ZoneType::Hospital);
        assert_eq!(close[0].distance_m, 0.0);

        let wide = geofence.nearby(at_hospital, 20_000.0).unwrap();
        let names: Vec<_> = wide.iter().map(|z| z.location.name.as_str()).collect();
        assert_eq!(names, ["Vavuniya General Hospital", "University of Vavuniya"]);
        assert!(wide[1].distance_m > 9_000.0);

        assert!(geofence.nearby(at_hospital, 0.0).is_err());
    }
}
