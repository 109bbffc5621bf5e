//! Scenario engine: single estimates, random batches and distance sweeps.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::EtaError;
use crate::factors::{Evaluation, FactorBreakdown, FactorModel};
use crate::model::{DeliveryInput, TimeOfDay, Traffic, Urgency};
use crate::traits::EntropySource;

/// Upper bound on points in one sweep.
pub const MAX_SWEEP_POINTS: usize = 10_000;

/// Settings applied uniformly to every row of a random batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchFlags {
    pub urgency: Urgency,
    pub extreme_mode: bool,
    /// Fix the festival flag for every row instead of sampling it.
    pub festival: Option<bool>,
}

impl Default for BatchFlags {
    fn default() -> Self {
        Self {
            urgency: Urgency::Normal,
            extreme_mode: false,
            festival: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatchSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl BatchSummary {
    /// `None` for an empty set of rows.
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a Evaluation>) -> Option<Self> {
        let mut count = 0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for row in rows {
            count += 1;
            min = min.min(row.minutes);
            max = max.max(row.minutes);
            sum += row.minutes;
        }
        if count == 0 {
            return None;
        }
        // Summation error must not push the mean outside [min, max].
        let mean = (sum / count as f64).clamp(min, max);
        Some(Self { count, min, max, mean })
    }
}

/// Randomly sampled scenarios in generation order, with summary statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioBatch {
    pub rows: Vec<Evaluation>,
    pub summary: BatchSummary,
}

impl ScenarioBatch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Summary over the rows generated for one restaurant.
    pub fn summary_for(&self, restaurant: &str) -> Option<BatchSummary> {
        BatchSummary::from_rows(
            self.rows
                .iter()
                .filter(|row| row.input.restaurant.as_deref() == Some(restaurant)),
        )
    }
}

/// Inclusive distance range for a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceRange {
    pub start_km: f64,
    pub end_km: f64,
}

impl DistanceRange {
    pub fn new(start_km: f64, end_km: f64) -> Self {
        Self { start_km, end_km }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepPoint {
    pub distance_km: f64,
    pub breakdown: FactorBreakdown,
    pub minutes: f64,
}

/// Estimates over a distance range with every other effect frozen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepSeries {
    /// Extreme contribution carried over from the reference evaluation.
    pub frozen_extreme: f64,
    pub points: Vec<SweepPoint>,
}

impl SweepSeries {
    /// `(distance, minutes)` pairs for plotting.
    pub fn pairs(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|point| (point.distance_km, point.minutes))
            .collect()
    }
}

/// Evaluate one input, drawing the extreme jitter when extreme mode is on.
pub fn compute_estimate<E>(
    model: &FactorModel,
    input: DeliveryInput,
    entropy: &mut E,
) -> Result<Evaluation, EtaError>
where
    E: EntropySource,
{
    let jitter = if input.extreme_mode {
        entropy.jitter_minutes(model.profile().extreme.jitter_max_minutes)
    } else {
        0
    };
    model.evaluate(input, jitter)
}

/// Sample and evaluate `count` random scenarios per restaurant.
///
/// With no restaurants, `count` rows are drawn without one (default prep
/// time). Otherwise every restaurant gets its own `count` rows, in the order
/// supplied. All draws come from `entropy` sequentially before evaluation, so
/// a seeded source reproduces the batch exactly.
pub fn generate_random_batch<E>(
    model: &FactorModel,
    count: usize,
    restaurants: &[String],
    flags: BatchFlags,
    entropy: &mut E,
) -> Result<ScenarioBatch, EtaError>
where
    E: EntropySource,
{
    if count == 0 || count > model.profile().max_batch {
        return Err(EtaError::invalid("count", count));
    }
    model.urgency_scale(flags.urgency)?;

    let slots: Vec<Option<&str>> = if restaurants.is_empty() {
        vec![None]
    } else {
        restaurants.iter().map(|name| Some(name.as_str())).collect()
    };

    let mut draws = Vec::with_capacity(slots.len() * count);
    for restaurant in slots {
        for _ in 0..count {
            draws.push(sample_scenario(model, restaurant, flags, entropy));
        }
    }

    let rows = draws
        .into_par_iter()
        .map(|(input, jitter)| model.evaluate(input, jitter))
        .collect::<Result<Vec<_>, _>>()?;

    let summary = BatchSummary::from_rows(&rows).ok_or_else(|| EtaError::invalid("count", count))?;

    tracing::info!(
        profile = %model.profile().name,
        rows = summary.count,
        restaurants = restaurants.len(),
        min = summary.min,
        max = summary.max,
        mean = summary.mean,
        "generated scenario batch"
    );

    Ok(ScenarioBatch { rows, summary })
}

/// Draw one input vector from the profile's offered domains, plus its jitter.
fn sample_scenario<E>(
    model: &FactorModel,
    restaurant: Option<&str>,
    flags: BatchFlags,
    entropy: &mut E,
) -> (DeliveryInput, u32)
where
    E: EntropySource,
{
    let profile = model.profile();

    let traffic = Traffic::ALL[entropy.pick(Traffic::ALL.len())];
    let weathers = profile.weathers();
    let weather = weathers[entropy.pick(weathers.len())];
    let vehicles = profile.vehicles();
    let vehicle = vehicles[entropy.pick(vehicles.len())];
    let time_of_day = profile.time_of_day_minutes.as_ref().map(|table| {
        let buckets: Vec<TimeOfDay> = table.keys().copied().collect();
        buckets[entropy.pick(buckets.len())]
    });
    let festival = match flags.festival {
        Some(fixed) => fixed,
        None => entropy.coin(),
    };
    let distance_km = entropy.uniform(0.0, profile.max_distance_km);
    let jitter = if flags.extreme_mode {
        entropy.jitter_minutes(profile.extreme.jitter_max_minutes)
    } else {
        0
    };

    let input = DeliveryInput {
        distance_km,
        traffic,
        weather,
        vehicle,
        urgency: flags.urgency,
        festival,
        time_of_day,
        extreme_mode: flags.extreme_mode,
        restaurant: restaurant.map(str::to_string),
    };
    (input, jitter)
}

/// Re-evaluate `reference` across `range` in steps of `step_km`.
///
/// Distance-linear factors are recomputed at each point. The urgency scale
/// and the realized extreme contribution are taken from `reference` as-is,
/// so the series isolates the effect of distance alone.
pub fn compute_sweep(
    model: &FactorModel,
    reference: &Evaluation,
    range: DistanceRange,
    step_km: f64,
) -> Result<SweepSeries, EtaError> {
    if !(step_km.is_finite() && step_km > 0.0) {
        return Err(EtaError::invalid("step_km", step_km));
    }
    let DistanceRange { start_km, end_km } = range;
    model.check_distance(start_km)?;
    model.check_distance(end_km)?;
    if start_km > end_km {
        return Err(EtaError::invalid(
            "distance_range",
            format!("{start_km}..={end_km}"),
        ));
    }

    let span = ((end_km - start_km) / step_km + 1e-9).floor();
    if span >= MAX_SWEEP_POINTS as f64 {
        return Err(EtaError::invalid("step_km", step_km));
    }
    let steps = span as usize;

    let frozen_extreme = reference.breakdown.extreme;
    let points = (0..=steps)
        .map(|i| -> Result<SweepPoint, EtaError> {
            let distance_km = (start_km + i as f64 * step_km).min(end_km);
            let mut breakdown = model.contributions(&reference.input.at_distance(distance_km), 0)?;
            breakdown.extreme = frozen_extreme;
            let minutes = model.combine(&breakdown, reference.urgency_scale);
            Ok(SweepPoint {
                distance_km,
                breakdown,
                minutes,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(
        profile = %model.profile().name,
        points = points.len(),
        start_km,
        end_km,
        step_km,
        frozen_extreme,
        "computed distance sweep"
    );

    Ok(SweepSeries {
        frozen_extreme,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Weather;
    use crate::profile::FactorProfile;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn model(profile: FactorProfile) -> FactorModel {
        FactorModel::new(profile).unwrap()
    }

    #[test]
    fn test_summary_of_empty_rows() {
        assert!(BatchSummary::from_rows(&Vec::<Evaluation>::new()).is_none());
    }

    #[test]
    fn test_summary_values() {
        let model = model(FactorProfile::basic());
        let rows: Vec<Evaluation> = [0.0, 5.0, 10.0]
            .into_iter()
            .map(|d| model.evaluate(DeliveryInput::new(d), 0).unwrap())
            .collect();
        let summary = BatchSummary::from_rows(&rows).unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.min, 20.0);
        assert_eq!(summary.max, 40.0);
        assert_eq!(summary.mean, 30.0);
    }

    #[test]
    fn test_sample_draws_only_offered_categories() {
        let model = model(FactorProfile::basic());
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let (input, jitter) = sample_scenario(&model, None, BatchFlags::default(), &mut rng);
            assert_ne!(input.weather, Weather::Stormy);
            assert!(model.profile().vehicle_per_km.contains_key(&input.vehicle));
            assert!(input.time_of_day.is_none());
            assert_eq!(jitter, 0);
            assert!(input.distance_km >= 0.0 && input.distance_km <= 50.0);
        }
    }

    #[test]
    fn test_sample_respects_fixed_flags() {
        let model = model(FactorProfile::pro());
        let flags = BatchFlags {
            urgency: Urgency::Priority,
            extreme_mode: true,
            festival: Some(true),
        };
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let (input, jitter) = sample_scenario(&model, Some("Curry House"), flags, &mut rng);
            assert_eq!(input.urgency, Urgency::Priority);
            assert!(input.extreme_mode);
            assert!(input.festival);
            assert!(input.time_of_day.is_some());
            assert!(jitter < 30);
            assert_eq!(input.restaurant.as_deref(), Some("Curry House"));
        }
    }

    #[test]
    fn test_sweep_point_count_and_spacing() {
        let model = model(FactorProfile::basic());
        let reference = model.evaluate(DeliveryInput::new(5.0), 0).unwrap();
        let series = compute_sweep(&model, &reference, DistanceRange::new(0.0, 1.0), 0.1).unwrap();
        assert_eq!(series.points.len(), 11);
        assert_eq!(series.points[0].distance_km, 0.0);
        assert!((series.points[10].distance_km - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_sweep_rejects_bad_step() {
        let model = model(FactorProfile::basic());
        let reference = model.evaluate(DeliveryInput::new(5.0), 0).unwrap();
        let range = DistanceRange::new(0.0, 10.0);
        assert!(compute_sweep(&model, &reference, range, 0.0).is_err());
        assert!(compute_sweep(&model, &reference, range, -1.0).is_err());
        assert!(compute_sweep(&model, &reference, range, f64::NAN).is_err());
        assert!(compute_sweep(&model, &reference, range, 1e-6).is_err());
    }
}
