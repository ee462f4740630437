use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::booking::{Booking, BookingContact, BookingListing, BookingStatus};
use crate::driver_application::{ApplicationReview, DriverApplication};
use crate::feedback::{Feedback, FeedbackRecord, NewFeedback, RatingBucket};
use crate::query::{
    ApplicationFilter, BookingFilter, Page, PageRequest, ReviewFilter, RideFilter, UserFilter,
};
use crate::rating::{NewRating, RatingRecord, RideRating};
use crate::ride::{NewRide, Ride, RideRecord, RideStatus, RideWithDriver};
use crate::user::{RoleStatus, User, UserUpdate};
use crate::StoreResult;

/// Repository trait for ride data access
#[async_trait]
pub trait RideRepository: Send + Sync {
    async fn list_rides(&self, filter: &RideFilter) -> StoreResult<Page<RideWithDriver>>;

    /// Ride with driver and every booking, passengers joined.
    async fn get_ride(&self, id: Uuid) -> StoreResult<RideRecord>;

    /// Ride row only.
    async fn find_ride(&self, id: Uuid) -> StoreResult<Ride>;

    async fn create_ride(&self, driver_id: Uuid, ride: &NewRide) -> StoreResult<Ride>;

    /// Always writes the canonical storage value.
    async fn update_ride_status(&self, id: Uuid, status: RideStatus) -> StoreResult<Ride>;
}

/// Repository trait for booking data access
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn list_bookings(&self, filter: &BookingFilter) -> StoreResult<Page<BookingListing>>;

    async fn get_booking(&self, id: Uuid) -> StoreResult<BookingListing>;

    /// Passengers joined, in booking-time order.
    async fn bookings_for_ride(&self, ride_id: Uuid) -> StoreResult<Vec<Booking>>;

    async fn update_booking_status(&self, id: Uuid, status: BookingStatus) -> StoreResult<Booking>;

    /// Non-cancelled bookings per ride, in one round trip. Rides without any are absent.
    async fn active_counts(&self, ride_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, i64>>;

    async fn booking_contact(&self, id: Uuid) -> StoreResult<BookingContact>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_drivers: i64,
    pub total_passengers: i64,
    pub pending_applications: i64,
    pub total_rides: i64,
    /// Scheduled or in progress.
    pub active_rides: i64,
    pub total_bookings: i64,
}

/// Repository trait for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn get_user(&self, id: Uuid) -> StoreResult<User>;

    async fn list_users(&self, filter: &UserFilter) -> StoreResult<Page<User>>;

    async fn update_user(&self, id: Uuid, update: &UserUpdate) -> StoreResult<User>;

    async fn set_role_status(&self, id: Uuid, status: RoleStatus) -> StoreResult<User>;

    async fn dashboard_stats(&self) -> StoreResult<DashboardStats>;
}

/// Repository trait for driver applications
#[async_trait]
pub trait DriverApplicationRepository: Send + Sync {
    async fn list_applications(&self, filter: &ApplicationFilter) -> StoreResult<Page<DriverApplication>>;

    async fn get_application(&self, id: Uuid) -> StoreResult<DriverApplication>;

    /// Updates the application and the applicant's account together.
    /// `Conflict` when the application is no longer pending.
    async fn review_application(
        &self,
        id: Uuid,
        review: &ApplicationReview,
    ) -> StoreResult<DriverApplication>;
}

/// Repository trait for ride ratings
#[async_trait]
pub trait RatingRepository: Send + Sync {
    async fn list_ratings(&self, filter: &ReviewFilter) -> StoreResult<Page<RatingRecord>>;

    async fn ratings_for_driver(&self, driver_id: Uuid, page: PageRequest) -> StoreResult<Page<RatingRecord>>;

    /// `NotFound` unless the booking is the submitter's on the given ride.
    /// `Conflict` when the submitter already rated this booking.
    async fn create_rating(&self, user_id: Uuid, rating: &NewRating) -> StoreResult<RideRating>;
}

/// Repository trait for system feedback
#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    async fn list_feedback(&self, filter: &ReviewFilter) -> StoreResult<Page<FeedbackRecord>>;

    async fn feedback_by_user(&self, user_id: Uuid, page: PageRequest) -> StoreResult<Page<FeedbackRecord>>;

    async fn create_feedback(&self, user_id: Uuid, feedback: &NewFeedback) -> StoreResult<Feedback>;

    async fn rating_buckets(&self) -> StoreResult<Vec<RatingBucket>>;
}
