use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::booking::Booking;
use crate::fare::{self, FareShare};
use crate::user::UserSummary;
use crate::ValidationErrors;

// ============================================================================
// Status vocabulary
// ============================================================================

/// Ride lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RideStatus {
    Open,
    InProgress,
    Ended,
    Cancelled,
}

/// The one table both directions are derived from: (status, storage value, display label).
const VOCABULARY: [(RideStatus, &str, &str); 4] = [
    (RideStatus::Open, "open", "Scheduled"),
    (RideStatus::InProgress, "in_progress", "Active"),
    (RideStatus::Ended, "ended", "Completed"),
    (RideStatus::Cancelled, "cancelled", "Cancelled"),
];

/// Legacy storage values still found in old rows. Read-only: writes use the canonical value.
const STORAGE_SYNONYMS: [(&str, RideStatus); 1] = [("started", RideStatus::InProgress)];

impl RideStatus {
    pub const ALL: [RideStatus; 4] = [
        RideStatus::Open,
        RideStatus::InProgress,
        RideStatus::Ended,
        RideStatus::Cancelled,
    ];

    /// Row of `VOCABULARY` for this status.
    fn entry(self) -> (RideStatus, &'static str, &'static str) {
        let index = match self {
            RideStatus::Open => 0,
            RideStatus::InProgress => 1,
            RideStatus::Ended => 2,
            RideStatus::Cancelled => 3,
        };
        VOCABULARY[index]
    }

    /// Canonical storage value.
    pub fn storage(self) -> &'static str {
        self.entry().1
    }

    /// Label shown in the admin console.
    pub fn display(self) -> &'static str {
        self.entry().2
    }

    /// Every storage value that reads as this status, canonical first.
    pub fn storage_values(self) -> Vec<&'static str> {
        let mut values = vec![self.storage()];
        values.extend(
            STORAGE_SYNONYMS
                .iter()
                .filter(|(_, status)| *status == self)
                .map(|(raw, _)| *raw),
        );
        values
    }

    pub fn from_storage(value: &str) -> Option<Self> {
        VOCABULARY
            .iter()
            .find(|(_, storage, _)| *storage == value)
            .map(|(status, _, _)| *status)
            .or_else(|| {
                STORAGE_SYNONYMS
                    .iter()
                    .find(|(raw, _)| *raw == value)
                    .map(|(_, status)| *status)
            })
    }

    /// Display labels match case-insensitively.
    pub fn from_display(value: &str) -> Option<Self> {
        VOCABULARY
            .iter()
            .find(|(_, _, display)| display.eq_ignore_ascii_case(value))
            .map(|(status, _, _)| *status)
    }

    /// Accepts either vocabulary.
    pub fn parse_any(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::from_storage(value).or_else(|| Self::from_display(value))
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage())
    }
}

/// Storage value to display label. Unrecognized values pass through unchanged.
pub fn display_of(storage: &str) -> String {
    RideStatus::from_storage(storage)
        .map(|status| status.display().to_string())
        .unwrap_or_else(|| storage.to_string())
}

/// Display label to canonical storage value. Unrecognized labels are lower-cased.
pub fn storage_of(display: &str) -> String {
    RideStatus::from_display(display)
        .map(|status| status.storage().to_string())
        .unwrap_or_else(|| display.to_lowercase())
}

/// A status filter as received on a list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RideStatusFilter {
    Known(RideStatus),
    /// Not in either vocabulary; matched literally after lower-casing.
    Raw(String),
}

impl RideStatusFilter {
    pub fn parse(value: &str) -> Self {
        match RideStatus::parse_any(value) {
            Some(status) => RideStatusFilter::Known(status),
            None => RideStatusFilter::Raw(value.trim().to_lowercase()),
        }
    }

    /// Storage values a row may hold to match this filter.
    pub fn storage_values(&self) -> Vec<String> {
        match self {
            RideStatusFilter::Known(status) => status
                .storage_values()
                .into_iter()
                .map(str::to_string)
                .collect(),
            RideStatusFilter::Raw(raw) => vec![raw.clone()],
        }
    }

    pub fn matches(&self, stored: &str) -> bool {
        self.storage_values().iter().any(|v| v == stored)
    }
}

// ============================================================================
// Ride records
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Ride {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub pickup_address: String,
    pub pickup_latitude: Option<f64>,
    pub pickup_longitude: Option<f64>,
    pub drop_address: String,
    pub drop_latitude: Option<f64>,
    pub drop_longitude: Option<f64>,
    #[serde(serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub base_fare: Option<Decimal>,
    pub distance: Option<f64>,
    pub duration: Option<f64>,
    pub is_surge: bool,
    #[serde(serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub distance_fare: Option<Decimal>,
    #[serde(serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub duration_fare: Option<Decimal>,
    #[serde(serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub surge_multiplier: Option<Decimal>,
    #[serde(serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub total_fare: Option<Decimal>,
    #[serde(serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub price: Option<Decimal>,
    pub seats: i32,
    pub preferences: Vec<String>,
    /// Raw storage value.
    pub status: String,
    /// Display label derived from `status`.
    pub status_label: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Ride {
    pub fn total_fare_amount(&self) -> Decimal {
        fare::resolve_total_fare(self.total_fare, self.price)
    }

    pub fn summary(&self, driver: Option<UserSummary>) -> RideSummary {
        RideSummary {
            id: self.id,
            driver_id: self.driver_id,
            date: self.date,
            time: self.time,
            pickup_address: self.pickup_address.clone(),
            drop_address: self.drop_address.clone(),
            distance: self.distance,
            total_fare: self.total_fare,
            price: self.price,
            seats: self.seats,
            status: self.status.clone(),
            status_label: self.status_label.clone(),
            driver,
        }
    }
}

/// The ride columns joined into a booking read.
#[derive(Debug, Clone, Serialize)]
pub struct RideSummary {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub pickup_address: String,
    pub drop_address: String,
    pub distance: Option<f64>,
    #[serde(serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub total_fare: Option<Decimal>,
    #[serde(serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub price: Option<Decimal>,
    pub seats: i32,
    pub status: String,
    pub status_label: String,
    #[serde(rename = "users")]
    pub driver: Option<UserSummary>,
}

impl RideSummary {
    pub fn total_fare_amount(&self) -> Decimal {
        fare::resolve_total_fare(self.total_fare, self.price)
    }
}

#[derive(Debug, Clone)]
pub struct RideWithDriver {
    pub ride: Ride,
    pub driver: Option<UserSummary>,
}

/// One row of the ride list: the ride, its driver, and how many seats are actively booked.
#[derive(Debug, Clone, Serialize)]
pub struct RideListing {
    #[serde(flatten)]
    pub ride: Ride,
    #[serde(rename = "users")]
    pub driver: Option<UserSummary>,
    pub active_bookings: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub fare_per_passenger: Decimal,
}

impl RideListing {
    pub fn new(ride: Ride, driver: Option<UserSummary>, active_bookings: i64) -> Self {
        let share = fare::share_for(ride.total_fare_amount(), active_bookings.max(0) as usize);
        Self {
            ride,
            driver,
            active_bookings,
            fare_per_passenger: share,
        }
    }
}

/// A ride with its driver and every booking, as fetched from the store.
#[derive(Debug, Clone)]
pub struct RideRecord {
    pub ride: Ride,
    pub driver: Option<UserSummary>,
    pub bookings: Vec<Booking>,
}

/// `RideRecord` after fare allocation.
#[derive(Debug, Clone, Serialize)]
pub struct RideDetail {
    #[serde(flatten)]
    pub ride: Ride,
    #[serde(rename = "users")]
    pub driver: Option<UserSummary>,
    pub bookings: Vec<FareShare<Booking>>,
    #[serde(with = "rust_decimal::serde::float")]
    pub fare_per_passenger: Decimal,
}

impl From<RideRecord> for RideDetail {
    fn from(record: RideRecord) -> Self {
        let allocation = fare::allocate(record.ride.total_fare_amount(), &record.bookings);
        Self {
            fare_per_passenger: allocation.fare_per_passenger,
            bookings: allocation.bookings,
            ride: record.ride,
            driver: record.driver,
        }
    }
}

// ============================================================================
// Write requests
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewRide {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub pickup_address: String,
    pub pickup_latitude: Option<f64>,
    pub pickup_longitude: Option<f64>,
    pub drop_address: String,
    pub drop_latitude: Option<f64>,
    pub drop_longitude: Option<f64>,
    pub base_fare: Option<Decimal>,
    pub distance: Option<f64>,
    pub duration: Option<f64>,
    #[serde(default)]
    pub is_surge: bool,
    pub distance_fare: Option<Decimal>,
    pub duration_fare: Option<Decimal>,
    pub surge_multiplier: Option<Decimal>,
    pub total_fare: Option<Decimal>,
    pub price: Option<Decimal>,
    pub seats: i32,
    #[serde(default)]
    pub preferences: Vec<String>,
}

impl NewRide {
    pub fn validate(mut self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        self.pickup_address = self.pickup_address.trim().to_string();
        self.drop_address = self.drop_address.trim().to_string();
        if self.pickup_address.is_empty() {
            errors.push("pickup_address", "Pickup address is required");
        }
        if self.drop_address.is_empty() {
            errors.push("drop_address", "Drop address is required");
        }
        if self.seats < 1 {
            errors.push("seats", "Seats must be at least 1");
        }

        for (field, lat) in [("pickup_latitude", self.pickup_latitude), ("drop_latitude", self.drop_latitude)] {
            if matches!(lat, Some(v) if !(-90.0..=90.0).contains(&v)) {
                errors.push(field, "Latitude must be between -90 and 90");
            }
        }
        for (field, lon) in [("pickup_longitude", self.pickup_longitude), ("drop_longitude", self.drop_longitude)] {
            if matches!(lon, Some(v) if !(-180.0..=180.0).contains(&v)) {
                errors.push(field, "Longitude must be between -180 and 180");
            }
        }

        let amounts = [
            ("base_fare", self.base_fare),
            ("distance_fare", self.distance_fare),
            ("duration_fare", self.duration_fare),
            ("total_fare", self.total_fare),
            ("price", self.price),
        ];
        for (field, amount) in amounts {
            if matches!(amount, Some(v) if v.is_sign_negative() && !v.is_zero()) {
                errors.push(field, "Amount cannot be negative");
            }
        }
        if matches!(self.surge_multiplier, Some(m) if m <= Decimal::ZERO) {
            errors.push("surge_multiplier", "Surge multiplier must be positive");
        }
        for (field, value) in [("distance", self.distance), ("duration", self.duration)] {
            if matches!(value, Some(v) if v < 0.0) {
                errors.push(field, "Value cannot be negative");
            }
        }

        if self.surge_multiplier.is_none() {
            self.surge_multiplier = Some(Decimal::ONE);
        }

        errors.into_result(self)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateRideStatusRequest {
    pub status: String,
}

impl UpdateRideStatusRequest {
    /// Resolves either vocabulary to a known status; anything else is rejected.
    pub fn resolve(&self) -> Result<RideStatus, ValidationErrors> {
        RideStatus::parse_any(&self.status).ok_or_else(|| {
            ValidationErrors::single(
                "status",
                "Status must be one of: open, in_progress, ended, cancelled (or Scheduled, Active, Completed, Cancelled)",
            )
        })
    }
}
