//! Test fixtures for delivery-eta.
//!
//! Provides:
//! - A restaurant roster and a custom JSON profile
//! - Seeded entropy and input helpers

#![allow(dead_code)]

pub mod restaurants;

pub use restaurants::*;

use rand::SeedableRng;
use rand::rngs::StdRng;

use delivery_eta::factors::FactorModel;
use delivery_eta::profile::FactorProfile;

pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn model(name: &str) -> FactorModel {
    FactorModel::new(FactorProfile::named(name).unwrap()).unwrap()
}

pub fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
