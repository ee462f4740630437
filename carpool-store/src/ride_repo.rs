use async_trait::async_trait;
use carpool_core::query::{Page, RideFilter};
use carpool_core::repository::RideRepository;
use carpool_core::ride::{NewRide, Ride, RideRecord, RideStatus, RideWithDriver};
use carpool_core::{StoreError, StoreResult};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::SqlxResultExt;
use crate::rows::{like_pattern, BookingRow, DriverCols, PersonCols, RideRow, DRIVER_COLUMNS, PERSON_COLUMNS};

pub struct StoreRideRepository {
    pool: PgPool,
}

impl StoreRideRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RideWithDriverRow {
    #[sqlx(flatten)]
    ride: RideRow,
    #[sqlx(flatten)]
    driver: DriverCols,
}

impl From<RideWithDriverRow> for RideWithDriver {
    fn from(row: RideWithDriverRow) -> Self {
        RideWithDriver {
            ride: row.ride.into(),
            driver: row.driver.into_summary(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct BookingWithPassengerRow {
    #[sqlx(flatten)]
    booking: BookingRow,
    #[sqlx(flatten)]
    passenger: PersonCols,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &RideFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = &filter.status {
        qb.push(" AND r.status = ANY(")
            .push_bind(status.storage_values())
            .push(")");
    }
    if let Some(driver_id) = filter.driver_id {
        qb.push(" AND r.driver_id = ").push_bind(driver_id);
    }
    if let Some(date) = filter.date {
        qb.push(" AND r.date = ").push_bind(date);
    }
    if let Some(start) = filter.start_date {
        qb.push(" AND r.date >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        qb.push(" AND r.date <= ").push_bind(end);
    }
    if let Some(pickup) = &filter.pickup {
        qb.push(" AND r.pickup_address ILIKE ").push_bind(like_pattern(pickup));
    }
    if let Some(destination) = &filter.destination {
        qb.push(" AND r.drop_address ILIKE ").push_bind(like_pattern(destination));
    }
    if let Some(min_seats) = filter.min_seats {
        qb.push(" AND r.seats >= ").push_bind(min_seats);
    }
}

#[async_trait]
impl RideRepository for StoreRideRepository {
    async fn list_rides(&self, filter: &RideFilter) -> StoreResult<Page<RideWithDriver>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM rides r");
        push_filters(&mut count, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .or_store("Ride")?;

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT r.*, {} FROM rides r LEFT JOIN users d ON d.id = r.driver_id",
            DRIVER_COLUMNS
        ));
        push_filters(&mut qb, filter);
        qb.push(format!(
            " ORDER BY r.{} {} NULLS LAST, r.id",
            filter.sort.column(),
            filter.order.as_sql()
        ));
        qb.push(" LIMIT ")
            .push_bind(filter.page.limit())
            .push(" OFFSET ")
            .push_bind(filter.page.offset());

        let rows = qb
            .build_query_as::<RideWithDriverRow>()
            .fetch_all(&self.pool)
            .await
            .or_store("Ride")?;

        Ok(Page::new(
            rows.into_iter().map(RideWithDriver::from).collect(),
            total,
            filter.page,
        ))
    }

    async fn get_ride(&self, id: Uuid) -> StoreResult<RideRecord> {
        let row: RideWithDriverRow = sqlx::query_as(&format!(
            "SELECT r.*, {} FROM rides r LEFT JOIN users d ON d.id = r.driver_id WHERE r.id = $1",
            DRIVER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .or_store("Ride")?
        .ok_or_else(|| StoreError::NotFound("Ride".into()))?;

        let bookings: Vec<BookingWithPassengerRow> = sqlx::query_as(&format!(
            "SELECT b.*, {} FROM bookings b LEFT JOIN users p ON p.id = b.user_id \
             WHERE b.ride_id = $1 ORDER BY b.booking_time ASC NULLS LAST, b.id",
            PERSON_COLUMNS
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .or_store("Booking")?;

        let RideWithDriver { ride, driver } = row.into();
        Ok(RideRecord {
            ride,
            driver,
            bookings: bookings
                .into_iter()
                .map(|b| b.booking.into_booking(b.passenger.into_summary()))
                .collect(),
        })
    }

    async fn find_ride(&self, id: Uuid) -> StoreResult<Ride> {
        let row: RideRow = sqlx::query_as("SELECT * FROM rides WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .or_store("Ride")?;
        Ok(row.into())
    }

    async fn create_ride(&self, driver_id: Uuid, ride: &NewRide) -> StoreResult<Ride> {
        let row: RideRow = sqlx::query_as(
            r#"
            INSERT INTO rides (
                id, driver_id, date, time,
                pickup_address, pickup_latitude, pickup_longitude,
                drop_address, drop_latitude, drop_longitude,
                base_fare, distance, duration, is_surge,
                distance_fare, duration_fare, surge_multiplier,
                total_fare, price, seats, preferences, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(driver_id)
        .bind(ride.date)
        .bind(ride.time)
        .bind(&ride.pickup_address)
        .bind(ride.pickup_latitude)
        .bind(ride.pickup_longitude)
        .bind(&ride.drop_address)
        .bind(ride.drop_latitude)
        .bind(ride.drop_longitude)
        .bind(ride.base_fare)
        .bind(ride.distance)
        .bind(ride.duration)
        .bind(ride.is_surge)
        .bind(ride.distance_fare)
        .bind(ride.duration_fare)
        .bind(ride.surge_multiplier)
        .bind(ride.total_fare)
        .bind(ride.price)
        .bind(ride.seats)
        .bind(&ride.preferences)
        .bind(RideStatus::Open.storage())
        .fetch_one(&self.pool)
        .await
        .or_store("Ride")?;

        tracing::info!(ride_id = %row.id, %driver_id, "Ride created");
        Ok(row.into())
    }

    async fn update_ride_status(&self, id: Uuid, status: RideStatus) -> StoreResult<Ride> {
        let row: RideRow = sqlx::query_as(
            "UPDATE rides SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(status.storage())
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .or_store("Ride")?;
        Ok(row.into())
    }
}
