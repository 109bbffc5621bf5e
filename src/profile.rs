//! Deployment profiles for the factor model.
//!
//! A profile is the complete rule table for one deployment variant: per-km
//! rates, flat surcharges, urgency scales, the ceiling, and the extreme-mode
//! jitter. Variants differ in magnitudes and in which categories they offer,
//! so each one is its own profile rather than a patch on a shared default.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::EtaError;
use crate::model::{TimeOfDay, Traffic, Urgency, Vehicle, Weather};
use crate::traits::PrepTimeProvider;

/// Names accepted by [`FactorProfile::named`].
pub const PROFILE_NAMES: &[&str] = &["basic", "pro", "ultimate"];

/// Extreme-mode perturbation: `per_km * distance + U[0, jitter_max_minutes)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtremeRule {
    pub per_km: f64,
    pub jitter_max_minutes: u32,
}

/// Upper bounds (inclusive, minutes) for the display bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandThresholds {
    pub fast_max: f64,
    pub moderate_max: f64,
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            fast_max: 30.0,
            moderate_max: 120.0,
        }
    }
}

/// Display band for an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DelayBand {
    Fast,
    Moderate,
    Slow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorProfile {
    pub name: String,
    /// Hard upper bound on any estimate.
    pub ceiling_minutes: f64,
    pub max_distance_km: f64,
    /// Largest scenario count accepted per batch request.
    pub max_batch: usize,
    /// Prep time for restaurants missing from `restaurants`. Required.
    pub default_prep_minutes: Option<f64>,
    #[serde(default)]
    pub restaurants: BTreeMap<String, f64>,
    pub base_per_km: f64,
    pub traffic_per_km: BTreeMap<Traffic, f64>,
    pub weather_per_km: BTreeMap<Weather, f64>,
    pub vehicle_per_km: BTreeMap<Vehicle, f64>,
    pub festival_minutes: f64,
    /// Flat offset per bucket. `None` means the profile has no time-of-day factor.
    #[serde(default)]
    pub time_of_day_minutes: Option<BTreeMap<TimeOfDay, f64>>,
    pub urgency_scale: BTreeMap<Urgency, f64>,
    pub extreme: ExtremeRule,
    #[serde(default)]
    pub bands: BandThresholds,
}

impl Default for FactorProfile {
    fn default() -> Self {
        Self::basic()
    }
}

impl FactorProfile {
    /// Minimal deployment: three weathers, bike or car, no time-of-day.
    pub fn basic() -> Self {
        Self {
            name: "basic".to_string(),
            ceiling_minutes: 180.0,
            max_distance_km: 50.0,
            max_batch: 20,
            default_prep_minutes: Some(20.0),
            restaurants: BTreeMap::new(),
            base_per_km: 2.0,
            traffic_per_km: standard_traffic(),
            weather_per_km: BTreeMap::from([
                (Weather::Clear, 0.0),
                (Weather::Cloudy, 0.02),
                (Weather::Rainy, 0.05),
            ]),
            vehicle_per_km: BTreeMap::from([(Vehicle::Bike, 0.0), (Vehicle::Car, -0.3)]),
            festival_minutes: 10.0,
            time_of_day_minutes: None,
            urgency_scale: standard_urgency(),
            extreme: ExtremeRule {
                per_km: 0.5,
                jitter_max_minutes: 30,
            },
            bands: BandThresholds::default(),
        }
    }

    /// Adds storms, drones, a restaurant catalog and time-of-day offsets.
    pub fn pro() -> Self {
        Self {
            name: "pro".to_string(),
            ceiling_minutes: 600.0,
            max_distance_km: 200.0,
            restaurants: BTreeMap::from([
                ("Pizza Palace".to_string(), 15.0),
                ("Burger Hub".to_string(), 12.0),
                ("Sushi Central".to_string(), 25.0),
                ("Curry House".to_string(), 20.0),
            ]),
            weather_per_km: full_weather(),
            vehicle_per_km: BTreeMap::from([
                (Vehicle::Bike, 0.0),
                (Vehicle::Car, -0.3),
                (Vehicle::Drone, -0.8),
            ]),
            festival_minutes: 15.0,
            time_of_day_minutes: Some(standard_time_of_day()),
            ..Self::basic()
        }
    }

    /// Long-haul deployment: trucks, a 2000 minute ceiling, wider jitter.
    pub fn ultimate() -> Self {
        Self {
            name: "ultimate".to_string(),
            ceiling_minutes: 2000.0,
            max_distance_km: 1000.0,
            vehicle_per_km: BTreeMap::from([
                (Vehicle::Bike, 0.0),
                (Vehicle::Car, -0.3),
                (Vehicle::Drone, -0.8),
                (Vehicle::Truck, 0.4),
            ]),
            festival_minutes: 20.0,
            extreme: ExtremeRule {
                per_km: 1.0,
                jitter_max_minutes: 50,
            },
            bands: BandThresholds {
                fast_max: 45.0,
                moderate_max: 240.0,
            },
            ..Self::pro()
        }
    }

    /// Look up a shipped profile by name.
    pub fn named(name: &str) -> Result<Self, EtaError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::basic()),
            "pro" => Ok(Self::pro()),
            "ultimate" => Ok(Self::ultimate()),
            _ => Err(EtaError::configuration(
                name,
                format!("unknown profile, expected one of {}", PROFILE_NAMES.join(", ")),
            )),
        }
    }

    /// Parse a custom profile. Call [`FactorProfile::validate`] (or build a
    /// `FactorModel`) before use.
    pub fn from_json_str(json: &str) -> Result<Self, EtaError> {
        serde_json::from_str(json).map_err(|err| EtaError::configuration("<json>", err.to_string()))
    }

    pub fn offers_time_of_day(&self) -> bool {
        self.time_of_day_minutes.is_some()
    }

    /// Vehicles this deployment offers, in declaration order.
    pub fn vehicles(&self) -> Vec<Vehicle> {
        self.vehicle_per_km.keys().copied().collect()
    }

    pub fn weathers(&self) -> Vec<Weather> {
        self.weather_per_km.keys().copied().collect()
    }

    pub fn band(&self, minutes: f64) -> DelayBand {
        if minutes <= self.bands.fast_max {
            DelayBand::Fast
        } else if minutes <= self.bands.moderate_max {
            DelayBand::Moderate
        } else {
            DelayBand::Slow
        }
    }

    /// Check every rule shape the factor model relies on.
    pub fn validate(&self) -> Result<(), EtaError> {
        let fail = |detail: String| -> Result<(), EtaError> {
            Err(EtaError::configuration(&self.name, detail))
        };

        match self.default_prep_minutes {
            None => return fail("no default prep time configured".to_string()),
            Some(prep) if !is_non_negative(prep) => {
                return fail(format!("default prep time {prep} must be non-negative"));
            }
            Some(_) => {}
        }
        if let Some((restaurant, prep)) = self
            .restaurants
            .iter()
            .find(|(_, prep)| !is_non_negative(**prep))
        {
            return fail(format!("prep time {prep} for '{restaurant}' must be non-negative"));
        }
        if !(self.ceiling_minutes.is_finite() && self.ceiling_minutes > 0.0) {
            return fail(format!("ceiling {} must be positive", self.ceiling_minutes));
        }
        if !(self.max_distance_km.is_finite() && self.max_distance_km > 0.0) {
            return fail(format!("max distance {} must be positive", self.max_distance_km));
        }
        if self.max_batch == 0 {
            return fail("max batch must be at least 1".to_string());
        }
        if !is_non_negative(self.base_per_km) || !is_non_negative(self.festival_minutes) {
            return fail("base rate and festival surcharge must be non-negative".to_string());
        }

        for level in Traffic::ALL {
            if !self.traffic_per_km.contains_key(level) {
                return fail(format!("no traffic rate for {level}"));
            }
        }
        check_escalating("traffic", &self.traffic_per_km, Traffic::Low)
            .map_err(|detail| EtaError::configuration(&self.name, detail))?;
        check_escalating("weather", &self.weather_per_km, Weather::Clear)
            .map_err(|detail| EtaError::configuration(&self.name, detail))?;

        if self.vehicle_per_km.is_empty() {
            return fail("no vehicles offered".to_string());
        }
        if self.vehicle_per_km.values().any(|rate| !rate.is_finite()) {
            return fail("vehicle rates must be finite".to_string());
        }

        if let Some(table) = &self.time_of_day_minutes {
            if table.is_empty() || !table.values().any(|offset| *offset == 0.0) {
                return fail("time-of-day table needs a zero-offset baseline bucket".to_string());
            }
        }

        let scale = |urgency: Urgency| self.urgency_scale.get(&urgency).copied();
        match (scale(Urgency::Normal), scale(Urgency::Express), scale(Urgency::Priority)) {
            (Some(normal), Some(express), Some(priority)) => {
                if normal != 1.0 {
                    return fail(format!("normal urgency scale must be 1.0, got {normal}"));
                }
                if !(priority > 0.0 && priority < express && express < normal) {
                    return fail(format!(
                        "urgency scales need 0 < priority < express < 1, got {priority}/{express}"
                    ));
                }
            }
            _ => return fail("urgency scale missing for normal, express or priority".to_string()),
        }

        if !is_non_negative(self.extreme.per_km) {
            return fail("extreme per-km rate must be non-negative".to_string());
        }
        if self.bands.fast_max > self.bands.moderate_max {
            return fail("fast band must not exceed moderate band".to_string());
        }

        Ok(())
    }
}

impl PrepTimeProvider for FactorProfile {
    fn prep_minutes(&self, restaurant: &str) -> Option<f64> {
        self.restaurants.prep_minutes(restaurant)
    }
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Baseline level must be present at zero; configured levels must strictly
/// increase in domain order.
fn check_escalating<K: Ord + Copy + std::fmt::Display>(
    factor: &str,
    rates: &BTreeMap<K, f64>,
    baseline: K,
) -> Result<(), String> {
    match rates.get(&baseline) {
        Some(rate) if *rate == 0.0 => {}
        Some(rate) => return Err(format!("{factor} rate for {baseline} must be 0, got {rate}")),
        None => return Err(format!("no {factor} rate for {baseline}")),
    }
    let mut previous: Option<(K, f64)> = None;
    for (&key, &rate) in rates {
        if !rate.is_finite() {
            return Err(format!("{factor} rate for {key} must be finite"));
        }
        if let Some((prev_key, prev_rate)) = previous {
            if rate <= prev_rate {
                return Err(format!(
                    "{factor} rate for {key} ({rate}) must exceed {prev_key} ({prev_rate})"
                ));
            }
        }
        previous = Some((key, rate));
    }
    Ok(())
}

fn standard_traffic() -> BTreeMap<Traffic, f64> {
    BTreeMap::from([(Traffic::Low, 0.0), (Traffic::Medium, 0.05), (Traffic::High, 0.1)])
}

fn full_weather() -> BTreeMap<Weather, f64> {
    BTreeMap::from([
        (Weather::Clear, 0.0),
        (Weather::Cloudy, 0.02),
        (Weather::Rainy, 0.05),
        (Weather::Stormy, 0.12),
    ])
}

fn standard_urgency() -> BTreeMap<Urgency, f64> {
    BTreeMap::from([(Urgency::Normal, 1.0), (Urgency::Express, 0.85), (Urgency::Priority, 0.7)])
}

fn standard_time_of_day() -> BTreeMap<TimeOfDay, f64> {
    BTreeMap::from([
        (TimeOfDay::Morning, 0.0),
        (TimeOfDay::Lunch, 8.0),
        (TimeOfDay::Evening, 12.0),
        (TimeOfDay::Night, 5.0),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipped_profiles_validate() {
        for name in PROFILE_NAMES {
            let profile = FactorProfile::named(name).unwrap();
            assert_eq!(profile.name, *name);
            profile.validate().unwrap();
        }
    }

    #[test]
    fn test_default_is_basic() {
        assert_eq!(FactorProfile::default(), FactorProfile::basic());
    }

    #[test]
    fn test_profiles_differ_in_offered_categories() {
        assert_eq!(FactorProfile::basic().vehicles(), vec![Vehicle::Bike, Vehicle::Car]);
        assert!(!FactorProfile::basic().weathers().contains(&Weather::Stormy));
        assert!(FactorProfile::pro().vehicles().contains(&Vehicle::Drone));
        assert!(FactorProfile::ultimate().vehicles().contains(&Vehicle::Truck));
        assert!(!FactorProfile::basic().offers_time_of_day());
        assert!(FactorProfile::pro().offers_time_of_day());
    }

    #[test]
    fn test_ceilings_per_profile() {
        assert_eq!(FactorProfile::basic().ceiling_minutes, 180.0);
        assert_eq!(FactorProfile::pro().ceiling_minutes, 600.0);
        assert_eq!(FactorProfile::ultimate().ceiling_minutes, 2000.0);
    }

    #[test]
    fn test_unknown_profile_name() {
        let err = FactorProfile::named("deluxe").unwrap_err();
        assert!(matches!(err, EtaError::Configuration { ref profile, .. } if profile == "deluxe"));
    }

    #[test]
    fn test_missing_default_prep_is_configuration_error() {
        let profile = FactorProfile {
            default_prep_minutes: None,
            ..FactorProfile::basic()
        };
        let err = profile.validate().unwrap_err();
        assert_eq!(
            err,
            EtaError::configuration("basic", "no default prep time configured")
        );
    }

    #[test]
    fn test_non_escalating_traffic_rejected() {
        let mut profile = FactorProfile::basic();
        profile.traffic_per_km.insert(Traffic::High, 0.01);
        assert!(matches!(profile.validate(), Err(EtaError::Configuration { .. })));
    }

    #[test]
    fn test_non_zero_clear_weather_rejected() {
        let mut profile = FactorProfile::basic();
        profile.weather_per_km.insert(Weather::Clear, 0.01);
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_urgency_out_of_order_rejected() {
        let mut profile = FactorProfile::basic();
        profile.urgency_scale.insert(Urgency::Priority, 0.9);
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_time_of_day_needs_baseline() {
        let mut profile = FactorProfile::pro();
        profile.time_of_day_minutes = Some(BTreeMap::from([(TimeOfDay::Lunch, 5.0)]));
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_bands() {
        let profile = FactorProfile::basic();
        assert_eq!(profile.band(30.0), DelayBand::Fast);
        assert_eq!(profile.band(30.75), DelayBand::Moderate);
        assert_eq!(profile.band(120.0), DelayBand::Moderate);
        assert_eq!(profile.band(121.0), DelayBand::Slow);
    }

    #[test]
    fn test_json_roundtrip_of_custom_profile() {
        let mut custom = FactorProfile::pro();
        custom.name = "campus".to_string();
        custom.festival_minutes = 5.0;
        let json = serde_json::to_string(&custom).unwrap();
        let parsed = FactorProfile::from_json_str(&json).unwrap();
        assert_eq!(parsed, custom);
        parsed.validate().unwrap();
    }

    #[test]
    fn test_malformed_json_is_configuration_error() {
        let err = FactorProfile::from_json_str("{\"name\": 3}").unwrap_err();
        assert!(matches!(err, EtaError::Configuration { .. }));
    }

    #[test]
    fn test_restaurant_prep_lookup() {
        let profile = FactorProfile::pro();
        assert_eq!(profile.prep_minutes("Sushi Central"), Some(25.0));
        assert_eq!(profile.prep_minutes("Nowhere Diner"), None);
    }
}
