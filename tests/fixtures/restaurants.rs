//! Restaurant roster and a custom deployment profile.

/// Restaurants known to the shipped "pro" and "ultimate" catalogs.
pub const CATALOG: &[(&str, f64)] = &[
    ("Burger Hub", 12.0),
    ("Curry House", 20.0),
    ("Pizza Palace", 15.0),
    ("Sushi Central", 25.0),
];

pub const UNKNOWN_RESTAURANT: &str = "Nowhere Diner";

pub fn roster(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// Campus deployment: short distances, bikes and drones, no festival surcharge.
pub const CAMPUS_PROFILE_JSON: &str = r#"{
    "name": "campus",
    "ceiling_minutes": 90.0,
    "max_distance_km": 10.0,
    "max_batch": 5,
    "default_prep_minutes": 8.0,
    "restaurants": { "Dining Hall": 5.0 },
    "base_per_km": 3.0,
    "traffic_per_km": { "Low": 0.0, "Medium": 0.2, "High": 0.5 },
    "weather_per_km": { "Clear": 0.0, "Rainy": 0.4 },
    "vehicle_per_km": { "Bike": 0.0, "Drone": -1.0 },
    "festival_minutes": 0.0,
    "urgency_scale": { "Normal": 1.0, "Express": 0.9, "Priority": 0.8 },
    "extreme": { "per_km": 0.0, "jitter_max_minutes": 10 }
}"#;
