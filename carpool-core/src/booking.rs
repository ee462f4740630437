use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::fare::FareParticipant;
use crate::ride::RideSummary;
use crate::user::UserSummary;

/// Booking lifecycle status as stored.
///
/// Values outside the three known ones are kept verbatim in `Other` so a
/// stray row never breaks a read; the fare engine treats them as active.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Other(String),
}

impl BookingStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Other(raw) => raw,
        }
    }

    /// Parses only the three writable values.
    pub fn parse_known(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, BookingStatus::Cancelled)
    }
}

impl From<String> for BookingStatus {
    fn from(value: String) -> Self {
        BookingStatus::parse_known(&value).unwrap_or(BookingStatus::Other(value))
    }
}

impl From<&str> for BookingStatus {
    fn from(value: &str) -> Self {
        BookingStatus::from(value.to_string())
    }
}

impl From<BookingStatus> for String {
    fn from(status: BookingStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A passenger's seat reservation on a ride.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub user_id: Uuid,
    pub seat_number: Option<i32>,
    pub status: BookingStatus,
    pub booking_time: Option<DateTime<Utc>>,
    #[serde(rename = "users", skip_serializing_if = "Option::is_none")]
    pub passenger: Option<UserSummary>,
}

impl FareParticipant for Booking {
    fn is_cancelled(&self) -> bool {
        self.status.is_cancelled()
    }
}

/// A booking read outside its ride, carrying the ride it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct BookingListing {
    #[serde(flatten)]
    pub booking: Booking,
    #[serde(rename = "rides")]
    pub ride: Option<RideSummary>,
}

/// `BookingListing` plus the passenger's share of the ride's fare.
#[derive(Debug, Clone, Serialize)]
pub struct BookingWithDistributedFare {
    #[serde(flatten)]
    pub listing: BookingListing,
    #[serde(with = "rust_decimal::serde::float")]
    pub distributed_fare: rust_decimal::Decimal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateBookingStatusRequest {
    pub status: String,
}

/// Booking plus the parties needed to address a passenger on the driver's behalf.
#[derive(Debug, Clone)]
pub struct BookingContact {
    pub booking_id: Uuid,
    pub passenger: UserSummary,
    pub driver_id: Uuid,
    pub pickup_address: Option<String>,
    pub drop_address: Option<String>,
    pub date: Option<chrono::NaiveDate>,
    pub time: Option<chrono::NaiveTime>,
}
