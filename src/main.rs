use std::fs;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use delivery_eta::error::EtaError;
use delivery_eta::factors::{Evaluation, FactorModel};
use delivery_eta::model::{DeliveryInput, TimeOfDay, Traffic, Urgency, Vehicle, Weather};
use delivery_eta::profile::{FactorProfile, PROFILE_NAMES};
use delivery_eta::scenario::{
    BatchFlags, DistanceRange, ScenarioBatch, SweepSeries, compute_estimate, compute_sweep,
    generate_random_batch,
};

/// Rule-based food delivery time estimates and scenario simulation
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct EtaApp {
    /// shipped deployment profile: basic, pro or ultimate
    #[arg(short, long, global = true, default_value = "basic")]
    profile: String,

    /// JSON file holding a custom profile; overrides --profile
    #[arg(long, global = true)]
    profile_file: Option<PathBuf>,

    /// seed for extreme-mode jitter and batch sampling
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    op: EtaOperation,
}

#[derive(Subcommand)]
enum EtaOperation {
    /// estimate a single delivery and show its factor breakdown
    Estimate(InputArgs),
    /// sample random scenarios and summarize them
    Batch {
        /// scenarios per restaurant
        #[arg(short, long, default_value_t = 5)]
        count: usize,
        /// restaurant to sample for; repeat to loop over several
        #[arg(short, long)]
        restaurant: Vec<String>,
        #[arg(long, default_value = "Normal")]
        urgency: Urgency,
        #[arg(long)]
        extreme: bool,
        /// fix the festival flag instead of sampling it
        #[arg(long)]
        festival: Option<bool>,
    },
    /// estimate over a range of distances, all other inputs held fixed
    Sweep {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value_t = 0.0)]
        start: f64,
        /// defaults to the profile's maximum distance
        #[arg(long)]
        end: Option<f64>,
        #[arg(long, default_value_t = 1.0)]
        step: f64,
    },
    /// list the shipped profiles
    Profiles,
}

#[derive(Args)]
struct InputArgs {
    /// distance in kilometers
    #[arg(short, long, default_value_t = 5.0)]
    distance: f64,
    #[arg(long, default_value = "Low")]
    traffic: Traffic,
    #[arg(long, default_value = "Clear")]
    weather: Weather,
    #[arg(long, default_value = "Bike")]
    vehicle: Vehicle,
    #[arg(long, default_value = "Normal")]
    urgency: Urgency,
    #[arg(long)]
    festival: bool,
    #[arg(long)]
    time_of_day: Option<TimeOfDay>,
    #[arg(long)]
    extreme: bool,
    #[arg(short, long)]
    restaurant: Option<String>,
}

impl InputArgs {
    fn to_input(&self) -> DeliveryInput {
        DeliveryInput {
            distance_km: self.distance,
            traffic: self.traffic,
            weather: self.weather,
            vehicle: self.vehicle,
            urgency: self.urgency,
            festival: self.festival,
            time_of_day: self.time_of_day,
            extreme_mode: self.extreme,
            restaurant: self.restaurant.clone(),
        }
    }
}

fn main() -> Result<(), EtaError> {
    init_tracing();
    let app = EtaApp::parse();

    let profile = match &app.profile_file {
        Some(path) => {
            let json = fs::read_to_string(path).map_err(|err| {
                EtaError::configuration(path.display().to_string(), err.to_string())
            })?;
            FactorProfile::from_json_str(&json)?
        }
        None => FactorProfile::named(&app.profile)?,
    };
    let model = FactorModel::new(profile)?;
    let mut rng = match app.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    match &app.op {
        EtaOperation::Estimate(args) => {
            let evaluation = compute_estimate(&model, args.to_input(), &mut rng)?;
            if app.json {
                print_json(&evaluation)?;
            } else {
                print_evaluation(&model, &evaluation);
            }
        }
        EtaOperation::Batch {
            count,
            restaurant,
            urgency,
            extreme,
            festival,
        } => {
            let flags = BatchFlags {
                urgency: *urgency,
                extreme_mode: *extreme,
                festival: *festival,
            };
            let batch = generate_random_batch(&model, *count, restaurant, flags, &mut rng)?;
            if app.json {
                print_json(&batch)?;
            } else {
                print_batch(&batch, restaurant);
            }
        }
        EtaOperation::Sweep {
            input,
            start,
            end,
            step,
        } => {
            let reference = compute_estimate(&model, input.to_input(), &mut rng)?;
            let end = end.unwrap_or(model.profile().max_distance_km);
            let series = compute_sweep(&model, &reference, DistanceRange::new(*start, end), *step)?;
            if app.json {
                print_json(&series)?;
            } else {
                print_sweep(&series);
            }
        }
        EtaOperation::Profiles => {
            for name in PROFILE_NAMES {
                let profile = FactorProfile::named(name)?;
                println!(
                    "{:<10} ceiling {:>6.0} min  max distance {:>6.0} km  vehicles {:?}",
                    profile.name,
                    profile.ceiling_minutes,
                    profile.max_distance_km,
                    profile.vehicles()
                );
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<(), EtaError> {
    let json = serde_json::to_string_pretty(value).map_err(EtaError::output)?;
    println!("{json}");
    Ok(())
}

fn print_evaluation(model: &FactorModel, evaluation: &Evaluation) {
    for (factor, minutes) in evaluation.breakdown.iter() {
        println!("{:<10} {:>9.2}", factor.name(), minutes);
    }
    println!("{:<10} x{:>8.2}", "Urgency", evaluation.urgency_scale);
    println!(
        "Estimated delivery time: {:.2} minutes ({:?})",
        evaluation.minutes,
        model.profile().band(evaluation.minutes)
    );
}

fn print_batch(batch: &ScenarioBatch, restaurants: &[String]) {
    println!(
        "{:<16} {:>8} {:<7} {:<7} {:<6} {:>9}",
        "restaurant", "km", "traffic", "weather", "vehicle", "minutes"
    );
    for row in &batch.rows {
        println!(
            "{:<16} {:>8.2} {:<7} {:<7} {:<6} {:>9.2}",
            row.input.restaurant.as_deref().unwrap_or("-"),
            row.input.distance_km,
            row.input.traffic,
            row.input.weather,
            row.input.vehicle,
            row.minutes
        );
    }
    for restaurant in restaurants {
        if let Some(summary) = batch.summary_for(restaurant) {
            println!(
                "{restaurant}: min {:.2}  max {:.2}  mean {:.2}",
                summary.min, summary.max, summary.mean
            );
        }
    }
    let summary = &batch.summary;
    println!(
        "{} scenarios: min {:.2}  max {:.2}  mean {:.2}",
        summary.count, summary.min, summary.max, summary.mean
    );
}

fn print_sweep(series: &SweepSeries) {
    for (distance, minutes) in series.pairs() {
        println!("{distance:>8.2} km  {minutes:>9.2} min");
    }
}
