use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::{RoleStatus, UserRole, UserSummary};
use crate::ValidationErrors;

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

pub fn is_valid_rating(value: f64) -> bool {
    value.is_finite() && (MIN_RATING..=MAX_RATING).contains(&value)
}

/// A passenger's rating of the driver for one booking.
#[derive(Debug, Clone, Serialize)]
pub struct RideRating {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub ride_id: Uuid,
    pub user_id: Uuid,
    pub target_user_id: Uuid,
    pub rating: f64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Driver columns joined into a rating read.
#[derive(Debug, Clone)]
pub struct RatedDriver {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub role: UserRole,
    pub role_status: Option<RoleStatus>,
}

#[derive(Debug, Clone)]
pub struct RatedRide {
    pub id: Uuid,
    pub date: NaiveDate,
    pub pickup_address: String,
    pub drop_address: String,
}

#[derive(Debug, Clone)]
pub struct RatingRecord {
    pub rating: RideRating,
    pub submitter: Option<UserSummary>,
    pub driver: Option<RatedDriver>,
    pub ride: Option<RatedRide>,
}

/// Flattened shape the admin console renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingView {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub ride_id: Uuid,
    pub rating: f64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub submitted_by: String,
    pub submitted_by_email: Option<String>,
    pub submitted_by_phone: Option<String>,
    pub driver_name: String,
    pub driver_email: Option<String>,
    pub driver_phone: Option<String>,
    pub driver_id: Uuid,
    pub driver_role: Option<UserRole>,
    pub driver_role_status: Option<RoleStatus>,
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
    pub ride_date: Option<NaiveDate>,
}

impl From<RatingRecord> for RatingView {
    fn from(record: RatingRecord) -> Self {
        let RatingRecord {
            rating,
            submitter,
            driver,
            ride,
        } = record;
        Self {
            id: rating.id,
            booking_id: rating.booking_id,
            ride_id: rating.ride_id,
            rating: rating.rating,
            comment: rating.comment,
            created_at: rating.created_at,
            submitted_by: submitter
                .as_ref()
                .map(|u| u.name.clone())
                .unwrap_or_else(|| "Unknown User".to_string()),
            submitted_by_email: submitter.as_ref().map(|u| u.email.clone()),
            submitted_by_phone: submitter.and_then(|u| u.phone_number),
            driver_name: driver
                .as_ref()
                .map(|d| d.name.clone())
                .unwrap_or_else(|| "Unknown Driver".to_string()),
            driver_email: driver.as_ref().map(|d| d.email.clone()),
            driver_phone: driver.as_ref().and_then(|d| d.phone_number.clone()),
            driver_id: driver.as_ref().map(|d| d.id).unwrap_or(rating.target_user_id),
            driver_role: driver.as_ref().map(|d| d.role),
            driver_role_status: driver.and_then(|d| d.role_status),
            pickup_location: ride.as_ref().map(|r| r.pickup_address.clone()),
            dropoff_location: ride.as_ref().map(|r| r.drop_address.clone()),
            ride_date: ride.map(|r| r.date),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct NewRating {
    pub booking_id: Uuid,
    pub ride_id: Uuid,
    pub target_user_id: Uuid,
    pub rating: f64,
    #[serde(default)]
    pub comment: Option<String>,
}

impl NewRating {
    pub fn validate(mut self) -> Result<Self, ValidationErrors> {
        if !is_valid_rating(self.rating) {
            return Err(ValidationErrors::single(
                "rating",
                "Rating must be between 1.0 and 5.0",
            ));
        }
        self.comment = self
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Ok(self)
    }

    /// Only the driver of the booked ride can be rated.
    pub fn check_target(&self, ride_driver_id: Uuid) -> Result<(), ValidationErrors> {
        if self.target_user_id != ride_driver_id {
            return Err(ValidationErrors::single(
                "targetUserId",
                "You can only rate the driver of this ride",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuspendRequest {
    #[serde(default)]
    pub reason: Option<String>,
}
