use async_trait::async_trait;
use carpool_core::booking::{Booking, BookingContact, BookingListing, BookingStatus};
use carpool_core::query::{BookingFilter, Page};
use carpool_core::repository::BookingRepository;
use carpool_core::{StoreError, StoreResult};
use chrono::{NaiveDate, NaiveTime};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::SqlxResultExt;
use crate::rows::{
    BookingRow, DriverCols, PersonCols, RideSummaryCols, DRIVER_COLUMNS, PERSON_COLUMNS,
    RIDE_SUMMARY_COLUMNS,
};

pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingListingRow {
    #[sqlx(flatten)]
    booking: BookingRow,
    #[sqlx(flatten)]
    passenger: PersonCols,
    #[sqlx(flatten)]
    ride: RideSummaryCols,
    #[sqlx(flatten)]
    driver: DriverCols,
}

impl From<BookingListingRow> for BookingListing {
    fn from(row: BookingListingRow) -> Self {
        let driver = row.driver.into_summary();
        BookingListing {
            booking: row.booking.into_booking(row.passenger.into_summary()),
            ride: row.ride.into_summary(driver),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ContactRow {
    id: Uuid,
    #[sqlx(flatten)]
    passenger: PersonCols,
    driver_id: Uuid,
    pickup_address: Option<String>,
    drop_address: Option<String>,
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
}

fn listing_select() -> String {
    format!(
        "SELECT b.*, {}, {}, {} FROM bookings b \
         LEFT JOIN users p ON p.id = b.user_id \
         LEFT JOIN rides r ON r.id = b.ride_id \
         LEFT JOIN users d ON d.id = r.driver_id",
        PERSON_COLUMNS, RIDE_SUMMARY_COLUMNS, DRIVER_COLUMNS
    )
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &BookingFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = &filter.status {
        qb.push(" AND b.status = ").push_bind(status.as_str().to_string());
    }
    if let Some(user_id) = filter.user_id {
        qb.push(" AND b.user_id = ").push_bind(user_id);
    }
    if let Some(ride_id) = filter.ride_id {
        qb.push(" AND b.ride_id = ").push_bind(ride_id);
    }
    if let Some(start) = filter.start_date {
        qb.push(" AND r.date >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        qb.push(" AND r.date <= ").push_bind(end);
    }
}

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn list_bookings(&self, filter: &BookingFilter) -> StoreResult<Page<BookingListing>> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM bookings b LEFT JOIN rides r ON r.id = b.ride_id",
        );
        push_filters(&mut count, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .or_store("Booking")?;

        let mut qb = QueryBuilder::<Postgres>::new(listing_select());
        push_filters(&mut qb, filter);
        qb.push(format!(
            " ORDER BY b.{} {} NULLS LAST, b.id",
            filter.sort.column(),
            filter.order.as_sql()
        ));
        qb.push(" LIMIT ")
            .push_bind(filter.page.limit())
            .push(" OFFSET ")
            .push_bind(filter.page.offset());

        let rows = qb
            .build_query_as::<BookingListingRow>()
            .fetch_all(&self.pool)
            .await
            .or_store("Booking")?;

        Ok(Page::new(
            rows.into_iter().map(BookingListing::from).collect(),
            total,
            filter.page,
        ))
    }

    async fn get_booking(&self, id: Uuid) -> StoreResult<BookingListing> {
        let row: BookingListingRow = sqlx::query_as(&format!("{} WHERE b.id = $1", listing_select()))
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .or_store("Booking")?;
        Ok(row.into())
    }

    async fn bookings_for_ride(&self, ride_id: Uuid) -> StoreResult<Vec<Booking>> {
        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(flatten)]
            booking: BookingRow,
            #[sqlx(flatten)]
            passenger: PersonCols,
        }

        let rows: Vec<Row> = sqlx::query_as(&format!(
            "SELECT b.*, {} FROM bookings b LEFT JOIN users p ON p.id = b.user_id \
             WHERE b.ride_id = $1 ORDER BY b.booking_time ASC NULLS LAST, b.id",
            PERSON_COLUMNS
        ))
        .bind(ride_id)
        .fetch_all(&self.pool)
        .await
        .or_store("Booking")?;

        Ok(rows
            .into_iter()
            .map(|r| r.booking.into_booking(r.passenger.into_summary()))
            .collect())
    }

    async fn update_booking_status(&self, id: Uuid, status: BookingStatus) -> StoreResult<Booking> {
        let row: BookingRow =
            sqlx::query_as("UPDATE bookings SET status = $1 WHERE id = $2 RETURNING *")
                .bind(status.as_str())
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .or_store("Booking")?;
        tracing::info!(booking_id = %id, status = %status, "Booking status updated");
        Ok(row.into_booking(None))
    }

    async fn active_counts(&self, ride_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, i64>> {
        if ride_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            r#"
            SELECT ride_id, COUNT(*)
            FROM bookings
            WHERE ride_id = ANY($1) AND status <> 'cancelled'
            GROUP BY ride_id
            "#,
        )
        .bind(ride_ids)
        .fetch_all(&self.pool)
        .await
        .or_store("Booking")?;

        Ok(rows.into_iter().collect())
    }

    async fn booking_contact(&self, id: Uuid) -> StoreResult<BookingContact> {
        let row: ContactRow = sqlx::query_as(&format!(
            "SELECT b.id, {}, r.driver_id, r.pickup_address, r.drop_address, r.date, r.time \
             FROM bookings b \
             JOIN rides r ON r.id = b.ride_id \
             LEFT JOIN users p ON p.id = b.user_id \
             WHERE b.id = $1",
            PERSON_COLUMNS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .or_store("Booking")?;

        let passenger = row
            .passenger
            .into_summary()
            .ok_or_else(|| StoreError::Corrupt(format!("booking {} has no passenger", row.id)))?;

        Ok(BookingContact {
            booking_id: row.id,
            passenger,
            driver_id: row.driver_id,
            pickup_address: row.pickup_address,
            drop_address: row.drop_address,
            date: row.date,
            time: row.time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Needs DATABASE_URL; mirrors the in-memory `test_active_counts_skip_cancelled_and_empty_rides`.
    #[sqlx::test(migrations = "../migrations")]
    #[ignore]
    async fn test_active_counts_group_in_postgres(pool: PgPool) -> sqlx::Result<()> {
        let driver = Uuid::new_v4();
        let rider = Uuid::new_v4();
        sqlx::query("INSERT INTO users (id, name, email, role) VALUES ($1, 'Daniel', 'daniel@example.com', 'driver'), ($2, 'Mei', 'mei@example.com', 'passenger')")
            .bind(driver)
            .bind(rider)
            .execute(&pool)
            .await?;

        let busy = Uuid::new_v4();
        let empty = Uuid::new_v4();
        for ride_id in [busy, empty] {
            sqlx::query("INSERT INTO rides (id, driver_id, date, pickup_address, drop_address, seats) VALUES ($1, $2, '2026-11-02', 'Block A', 'Library', 4)")
                .bind(ride_id)
                .bind(driver)
                .execute(&pool)
                .await?;
        }
        for (ride_id, status) in [(busy, "confirmed"), (busy, "pending"), (busy, "cancelled"), (empty, "cancelled")] {
            sqlx::query("INSERT INTO bookings (id, ride_id, user_id, status) VALUES ($1, $2, $3, $4)")
                .bind(Uuid::new_v4())
                .bind(ride_id)
                .bind(rider)
                .bind(status)
                .execute(&pool)
                .await?;
        }

        let repo = StoreBookingRepository::new(pool);
        let counts = repo.active_counts(&[busy, empty]).await.unwrap();
        assert_eq!(counts.get(&busy), Some(&2));
        assert!(!counts.contains_key(&empty));
        assert!(repo.active_counts(&[]).await.unwrap().is_empty());
        Ok(())
    }
}
