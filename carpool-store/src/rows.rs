//! Row shapes shared by the Postgres repositories.
//!
//! Joined users are selected under fixed aliases: `d` for a ride's driver
//! (columns prefixed `d_`) and `p` for the other party of a record, i.e. a
//! passenger, applicant or submitter (columns prefixed `p_`).

use carpool_core::booking::{Booking, BookingStatus};
use carpool_core::ride::{self, Ride, RideSummary};
use carpool_core::user::{RoleStatus, User, UserRole, UserSummary};
use carpool_core::StoreError;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

pub(crate) const DRIVER_COLUMNS: &str = "d.id AS d_id, d.name AS d_name, d.email AS d_email, \
    d.phone_number AS d_phone_number, d.profile_picture AS d_profile_picture, \
    d.car_model AS d_car_model, d.plate_number AS d_plate_number, d.rating AS d_rating, \
    d.total_rides AS d_total_rides";

pub(crate) const PERSON_COLUMNS: &str = "p.id AS p_id, p.name AS p_name, p.email AS p_email, \
    p.phone_number AS p_phone_number, p.profile_picture AS p_profile_picture";

pub(crate) const RIDE_SUMMARY_COLUMNS: &str = "r.id AS r_id, r.driver_id AS r_driver_id, \
    r.date AS r_date, r.time AS r_time, r.pickup_address AS r_pickup_address, \
    r.drop_address AS r_drop_address, r.distance AS r_distance, r.total_fare AS r_total_fare, \
    r.price AS r_price, r.seats AS r_seats, r.status AS r_status";

/// Escapes `%`, `_` and `\` and wraps the term for a substring `ILIKE`.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[derive(sqlx::FromRow)]
pub(crate) struct RideRow {
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
    pub base_fare: Option<Decimal>,
    pub distance: Option<f64>,
    pub duration: Option<f64>,
    pub is_surge: bool,
    pub distance_fare: Option<Decimal>,
    pub duration_fare: Option<Decimal>,
    pub surge_multiplier: Option<Decimal>,
    pub total_fare: Option<Decimal>,
    pub price: Option<Decimal>,
    pub seats: i32,
    pub preferences: Vec<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<RideRow> for Ride {
    fn from(row: RideRow) -> Self {
        Ride {
            id: row.id,
            driver_id: row.driver_id,
            date: row.date,
            time: row.time,
            pickup_address: row.pickup_address,
            pickup_latitude: row.pickup_latitude,
            pickup_longitude: row.pickup_longitude,
            drop_address: row.drop_address,
            drop_latitude: row.drop_latitude,
            drop_longitude: row.drop_longitude,
            base_fare: row.base_fare,
            distance: row.distance,
            duration: row.duration,
            is_surge: row.is_surge,
            distance_fare: row.distance_fare,
            duration_fare: row.duration_fare,
            surge_multiplier: row.surge_multiplier,
            total_fare: row.total_fare,
            price: row.price,
            seats: row.seats,
            preferences: row.preferences,
            status_label: ride::display_of(&row.status),
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct DriverCols {
    pub d_id: Option<Uuid>,
    pub d_name: Option<String>,
    pub d_email: Option<String>,
    pub d_phone_number: Option<String>,
    pub d_profile_picture: Option<String>,
    pub d_car_model: Option<String>,
    pub d_plate_number: Option<String>,
    pub d_rating: Option<f64>,
    pub d_total_rides: Option<i32>,
}

impl DriverCols {
    pub fn into_summary(self) -> Option<UserSummary> {
        Some(UserSummary {
            id: self.d_id?,
            name: self.d_name.unwrap_or_default(),
            email: self.d_email.unwrap_or_default(),
            phone_number: self.d_phone_number,
            profile_picture: self.d_profile_picture,
            car_model: self.d_car_model,
            plate_number: self.d_plate_number,
            rating: self.d_rating,
            total_rides: self.d_total_rides,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PersonCols {
    pub p_id: Option<Uuid>,
    pub p_name: Option<String>,
    pub p_email: Option<String>,
    pub p_phone_number: Option<String>,
    pub p_profile_picture: Option<String>,
}

impl PersonCols {
    pub fn into_summary(self) -> Option<UserSummary> {
        Some(UserSummary {
            id: self.p_id?,
            name: self.p_name.unwrap_or_default(),
            email: self.p_email.unwrap_or_default(),
            phone_number: self.p_phone_number,
            profile_picture: self.p_profile_picture,
            car_model: None,
            plate_number: None,
            rating: None,
            total_rides: None,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct RideSummaryCols {
    pub r_id: Option<Uuid>,
    pub r_driver_id: Option<Uuid>,
    pub r_date: Option<NaiveDate>,
    pub r_time: Option<NaiveTime>,
    pub r_pickup_address: Option<String>,
    pub r_drop_address: Option<String>,
    pub r_distance: Option<f64>,
    pub r_total_fare: Option<Decimal>,
    pub r_price: Option<Decimal>,
    pub r_seats: Option<i32>,
    pub r_status: Option<String>,
}

impl RideSummaryCols {
    pub fn into_summary(self, driver: Option<UserSummary>) -> Option<RideSummary> {
        let status = self.r_status.unwrap_or_default();
        Some(RideSummary {
            id: self.r_id?,
            driver_id: self.r_driver_id?,
            date: self.r_date?,
            time: self.r_time,
            pickup_address: self.r_pickup_address.unwrap_or_default(),
            drop_address: self.r_drop_address.unwrap_or_default(),
            distance: self.r_distance,
            total_fare: self.r_total_fare,
            price: self.r_price,
            seats: self.r_seats.unwrap_or_default(),
            status_label: ride::display_of(&status),
            status,
            driver,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookingRow {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub user_id: Uuid,
    pub seat_number: Option<i32>,
    pub status: String,
    pub booking_time: Option<DateTime<Utc>>,
}

impl BookingRow {
    pub fn into_booking(self, passenger: Option<UserSummary>) -> Booking {
        Booking {
            id: self.id,
            ride_id: self.ride_id,
            user_id: self.user_id,
            seat_number: self.seat_number,
            status: BookingStatus::from(self.status),
            booking_time: self.booking_time,
            passenger,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    pub rating: Option<f64>,
    pub car_model: Option<String>,
    pub plate_number: Option<String>,
    pub role: String,
    pub role_status: Option<String>,
    pub total_rides: i32,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<UserRole>()
            .map_err(|e| StoreError::Corrupt(format!("user {}: {}", row.id, e)))?;
        let role_status = row
            .role_status
            .as_deref()
            .map(str::parse::<RoleStatus>)
            .transpose()
            .map_err(|e| StoreError::Corrupt(format!("user {}: {}", row.id, e)))?;

        Ok(User {
            id: row.id,
            created_at: row.created_at,
            name: row.name,
            email: row.email,
            phone_number: row.phone_number,
            profile_picture: row.profile_picture,
            rating: row.rating,
            car_model: row.car_model,
            plate_number: row.plate_number,
            role,
            role_status,
            total_rides: row.total_rides,
        })
    }
}
