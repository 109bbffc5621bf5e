//! delivery-eta core
//!
//! Rule-based food-delivery time estimation: per-factor contributions,
//! urgency scaling, and scenario simulation over deployment profiles.

pub mod error;
pub mod traits;
pub mod model;
pub mod profile;
pub mod factors;
pub mod scenario;
