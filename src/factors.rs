//! Factor model: per-factor contributions and the combination rule.
//!
//! `estimate = clamp(urgency * (base + traffic + weather + vehicle + festival
//! + time_of_day + extreme), 0, ceiling)`. Additive terms are summed first,
//! the urgency scale is applied to the sum, and the clamp comes last.

use serde::Serialize;

use crate::error::EtaError;
use crate::model::{DeliveryInput, Urgency};
use crate::profile::FactorProfile;
use crate::traits::PrepTimeProvider;

/// One named contribution to total delivery time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Factor {
    Base,
    Traffic,
    Weather,
    Vehicle,
    Festival,
    TimeOfDay,
    Extreme,
}

impl Factor {
    /// Display order for breakdowns.
    pub const ALL: [Factor; 7] = [
        Factor::Base,
        Factor::Traffic,
        Factor::Weather,
        Factor::Vehicle,
        Factor::Festival,
        Factor::TimeOfDay,
        Factor::Extreme,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Factor::Base => "Base",
            Factor::Traffic => "Traffic",
            Factor::Weather => "Weather",
            Factor::Vehicle => "Vehicle",
            Factor::Festival => "Festival",
            Factor::TimeOfDay => "TimeOfDay",
            Factor::Extreme => "Extreme",
        }
    }
}

/// Signed minutes per factor, before urgency scaling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FactorBreakdown {
    pub base: f64,
    pub traffic: f64,
    pub weather: f64,
    pub vehicle: f64,
    pub festival: f64,
    pub time_of_day: f64,
    pub extreme: f64,
}

impl FactorBreakdown {
    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Base => self.base,
            Factor::Traffic => self.traffic,
            Factor::Weather => self.weather,
            Factor::Vehicle => self.vehicle,
            Factor::Festival => self.festival,
            Factor::TimeOfDay => self.time_of_day,
            Factor::Extreme => self.extreme,
        }
    }

    /// Factors paired with their minutes, in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Factor, f64)> + '_ {
        Factor::ALL.into_iter().map(move |factor| (factor, self.get(factor)))
    }

    /// Sum of all additive terms.
    pub fn total(&self) -> f64 {
        self.iter().map(|(_, minutes)| minutes).sum()
    }
}

/// A single evaluated estimate with everything needed to explain it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub input: DeliveryInput,
    pub breakdown: FactorBreakdown,
    pub urgency_scale: f64,
    /// Final duration in `[0, ceiling]`.
    pub minutes: f64,
}

/// A validated profile ready to evaluate inputs.
#[derive(Debug, Clone)]
pub struct FactorModel {
    profile: FactorProfile,
    default_prep: f64,
}

impl FactorModel {
    pub fn new(profile: FactorProfile) -> Result<Self, EtaError> {
        profile.validate()?;
        let default_prep = profile.default_prep_minutes.ok_or_else(|| {
            EtaError::configuration(&profile.name, "no default prep time configured")
        })?;
        Ok(Self {
            profile,
            default_prep,
        })
    }

    pub fn profile(&self) -> &FactorProfile {
        &self.profile
    }

    pub fn ceiling(&self) -> f64 {
        self.profile.ceiling_minutes
    }

    /// Preparation time for `restaurant`, falling back to the default.
    pub fn prep_for(&self, restaurant: Option<&str>) -> f64 {
        match restaurant {
            None => self.default_prep,
            Some(name) => self.profile.prep_minutes(name).unwrap_or_else(|| {
                tracing::debug!(restaurant = name, "unknown restaurant, using default prep time");
                self.default_prep
            }),
        }
    }

    /// Reject distances outside `[0, max_distance_km]`.
    pub fn check_distance(&self, distance_km: f64) -> Result<(), EtaError> {
        if distance_km.is_finite() && (0.0..=self.profile.max_distance_km).contains(&distance_km) {
            Ok(())
        } else {
            Err(EtaError::invalid("distance_km", distance_km))
        }
    }

    pub fn urgency_scale(&self, urgency: Urgency) -> Result<f64, EtaError> {
        self.profile
            .urgency_scale
            .get(&urgency)
            .copied()
            .ok_or_else(|| EtaError::invalid("urgency", urgency))
    }

    /// Per-factor contributions for `input`.
    ///
    /// `jitter` is the already-drawn random part of the extreme term; it is
    /// ignored when extreme mode is off, in which case the term is exactly 0.
    pub fn contributions(
        &self,
        input: &DeliveryInput,
        jitter: u32,
    ) -> Result<FactorBreakdown, EtaError> {
        self.check_distance(input.distance_km)?;
        let profile = &self.profile;
        let distance = input.distance_km;

        let traffic_rate = profile
            .traffic_per_km
            .get(&input.traffic)
            .ok_or_else(|| EtaError::invalid("traffic", input.traffic))?;
        let weather_rate = profile
            .weather_per_km
            .get(&input.weather)
            .ok_or_else(|| EtaError::invalid("weather", input.weather))?;
        let vehicle_rate = profile
            .vehicle_per_km
            .get(&input.vehicle)
            .ok_or_else(|| EtaError::invalid("vehicle", input.vehicle))?;

        let time_of_day = match (&profile.time_of_day_minutes, input.time_of_day) {
            (Some(table), Some(bucket)) => *table
                .get(&bucket)
                .ok_or_else(|| EtaError::invalid("time_of_day", bucket))?,
            _ => 0.0,
        };

        let extreme = if input.extreme_mode {
            profile.extreme.per_km * distance + f64::from(jitter)
        } else {
            0.0
        };

        Ok(FactorBreakdown {
            base: self.prep_for(input.restaurant.as_deref()) + profile.base_per_km * distance,
            traffic: traffic_rate * distance,
            weather: weather_rate * distance,
            vehicle: vehicle_rate * distance,
            festival: if input.festival { profile.festival_minutes } else { 0.0 },
            time_of_day,
            extreme,
        })
    }

    /// Scale the summed factors and clamp into `[0, ceiling]`.
    pub fn combine(&self, breakdown: &FactorBreakdown, urgency_scale: f64) -> f64 {
        (urgency_scale * breakdown.total()).clamp(0.0, self.ceiling())
    }

    /// Evaluate `input` with a pre-drawn extreme jitter.
    pub fn evaluate(&self, input: DeliveryInput, jitter: u32) -> Result<Evaluation, EtaError> {
        let breakdown = self.contributions(&input, jitter)?;
        let urgency_scale = self.urgency_scale(input.urgency)?;
        let minutes = self.combine(&breakdown, urgency_scale);

        tracing::debug!(
            profile = %self.profile.name,
            distance_km = input.distance_km,
            additive = breakdown.total(),
            urgency_scale,
            minutes,
            "evaluated delivery input"
        );

        Ok(Evaluation {
            input,
            breakdown,
            urgency_scale,
            minutes,
        })
    }
}
