// Climate observations written by the workload
// Values follow the ranges the seeding job uses for the ClimateData table

use chrono::NaiveDate;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::error::{AppError, AppResult};

pub const LOCATIONS: [&str; 7] = [
    "Ottawa",
    "Toronto",
    "Montreal",
    "Vancouver",
    "Calgary",
    "Halifax",
    "Winnipeg",
];

pub const TEMPERATURE_RANGE: RangeInclusive<f64> = 15.0..=35.0;
pub const PRECIPITATION_RANGE: RangeInclusive<f64> = 0.0..=15.0;
pub const HUMIDITY_RANGE: RangeInclusive<f64> = 25.0..=95.0;
pub const DAY_RANGE: RangeInclusive<u32> = 10..=28;

/// One row of the ClimateData table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateRecord {
    pub location: String,
    pub record_date: NaiveDate,
    pub temperature: f64,
    pub precipitation: f64,
    pub humidity: f64,
}

/// Produces random records for a single month
#[derive(Debug, Clone, Copy)]
pub struct RecordGenerator {
    year: i32,
    month: u32,
}

impl Default for RecordGenerator {
    fn default() -> Self {
        Self { year: 2025, month: 7 }
    }
}

impl RecordGenerator {
    /// Generator for `year`-`month`; fails when the month is not a real one.
    pub fn new(year: i32, month: u32) -> AppResult<Self> {
        if NaiveDate::from_ymd_opt(year, month, *DAY_RANGE.end()).is_none() {
            return Err(AppError::ConfigurationError(format!(
                "Invalid record month: {}-{:02}",
                year, month
            )));
        }
        Ok(Self { year, month })
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> ClimateRecord {
        let location = LOCATIONS.choose(rng).copied().unwrap_or(LOCATIONS[0]);
        let day = rng.random_range(DAY_RANGE);

        ClimateRecord {
            location: location.to_string(),
            // Every day in DAY_RANGE exists in a month accepted by `new`
            record_date: NaiveDate::from_ymd_opt(self.year, self.month, day)
                .unwrap_or(NaiveDate::MIN),
            temperature: round_to_tenth(rng.random_range(TEMPERATURE_RANGE)),
            precipitation: round_to_tenth(rng.random_range(PRECIPITATION_RANGE)),
            humidity: round_to_tenth(rng.random_range(HUMIDITY_RANGE)),
        }
    }
}

pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
