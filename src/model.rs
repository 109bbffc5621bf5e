//! Input vector and its categorical domains.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EtaError;

/// Declares a categorical input with its full domain, display names and
/// case-insensitive parsing (extra aliases may follow the display name).
macro_rules! categorical {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($variant:ident => [$display:literal $(, $alias:literal)*]),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every value of the domain, in severity/display order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $display),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $name {
            type Err = EtaError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let trimmed = raw.trim();
                $(
                    if trimmed.eq_ignore_ascii_case($display)
                        $(|| trimmed.eq_ignore_ascii_case($alias))*
                    {
                        return Ok($name::$variant);
                    }
                )+
                Err(EtaError::invalid($field, raw))
            }
        }
    };
}

categorical! {
    /// Road congestion level.
    Traffic, "traffic" {
        Low => ["Low"],
        Medium => ["Medium"],
        High => ["High"],
    }
}

categorical! {
    /// Weather condition, clearest first.
    Weather, "weather" {
        Clear => ["Clear", "Sunny"],
        Cloudy => ["Cloudy"],
        Rainy => ["Rainy", "Rain"],
        Stormy => ["Stormy", "Storm"],
    }
}

categorical! {
    /// Delivery method.
    Vehicle, "vehicle" {
        Bike => ["Bike"],
        Car => ["Car", "EV", "EV/Car"],
        Drone => ["Drone"],
        Truck => ["Truck"],
    }
}

categorical! {
    /// Service level; scales the summed factors.
    Urgency, "urgency" {
        Normal => ["Normal"],
        Express => ["Express"],
        Priority => ["Priority"],
    }
}

categorical! {
    /// Time-of-day bucket.
    TimeOfDay, "time_of_day" {
        Morning => ["Morning"],
        Lunch => ["Lunch"],
        Evening => ["Evening"],
        Night => ["Night"],
    }
}

/// Situational snapshot for one estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryInput {
    pub distance_km: f64,
    pub traffic: Traffic,
    pub weather: Weather,
    pub vehicle: Vehicle,
    pub urgency: Urgency,
    /// Festival or rush-hour surcharge active.
    pub festival: bool,
    pub time_of_day: Option<TimeOfDay>,
    /// Adds the randomized extreme term.
    pub extreme_mode: bool,
    /// Selects a preparation-time offset. Unknown names use the default.
    pub restaurant: Option<String>,
}

impl DeliveryInput {
    /// Calm baseline: low traffic, clear weather, bike, normal urgency.
    pub fn new(distance_km: f64) -> Self {
        Self {
            distance_km,
            traffic: Traffic::Low,
            weather: Weather::Clear,
            vehicle: Vehicle::Bike,
            urgency: Urgency::Normal,
            festival: false,
            time_of_day: None,
            extreme_mode: false,
            restaurant: None,
        }
    }

    pub fn traffic(mut self, traffic: Traffic) -> Self {
        self.traffic = traffic;
        self
    }

    pub fn weather(mut self, weather: Weather) -> Self {
        self.weather = weather;
        self
    }

    pub fn vehicle(mut self, vehicle: Vehicle) -> Self {
        self.vehicle = vehicle;
        self
    }

    pub fn urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    pub fn festival(mut self, festival: bool) -> Self {
        self.festival = festival;
        self
    }

    pub fn time_of_day(mut self, bucket: TimeOfDay) -> Self {
        self.time_of_day = Some(bucket);
        self
    }

    pub fn extreme(mut self, enabled: bool) -> Self {
        self.extreme_mode = enabled;
        self
    }

    pub fn restaurant(mut self, name: impl Into<String>) -> Self {
        self.restaurant = Some(name.into());
        self
    }

    /// Same snapshot at another distance.
    pub fn at_distance(&self, distance_km: f64) -> Self {
        Self {
            distance_km,
            ..self.clone()
        }
    }
}
