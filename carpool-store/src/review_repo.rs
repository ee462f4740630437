use async_trait::async_trait;
use carpool_core::feedback::{Feedback, FeedbackRecord, NewFeedback, RatingBucket};
use carpool_core::query::{Page, PageRequest, ReviewFilter};
use carpool_core::rating::{NewRating, RatedDriver, RatedRide, RatingRecord, RideRating};
use carpool_core::repository::{FeedbackRepository, RatingRepository};
use carpool_core::user::{RoleStatus, UserRole};
use carpool_core::{StoreError, StoreResult};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::SqlxResultExt;
use crate::rows::{PersonCols, PERSON_COLUMNS};

// ============================================================================
// Ride ratings
// ============================================================================

pub struct StoreRatingRepository {
    pool: PgPool,
}

impl StoreRatingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RatingRow {
    id: Uuid,
    booking_id: Uuid,
    ride_id: Uuid,
    user_id: Uuid,
    target_user_id: Uuid,
    rating: f64,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<RatingRow> for RideRating {
    fn from(row: RatingRow) -> Self {
        RideRating {
            id: row.id,
            booking_id: row.booking_id,
            ride_id: row.ride_id,
            user_id: row.user_id,
            target_user_id: row.target_user_id,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RatingRecordRow {
    #[sqlx(flatten)]
    rating: RatingRow,
    #[sqlx(flatten)]
    submitter: PersonCols,
    t_id: Option<Uuid>,
    t_name: Option<String>,
    t_email: Option<String>,
    t_phone_number: Option<String>,
    t_role: Option<String>,
    t_role_status: Option<String>,
    r_id: Option<Uuid>,
    r_date: Option<NaiveDate>,
    r_pickup_address: Option<String>,
    r_drop_address: Option<String>,
}

impl From<RatingRecordRow> for RatingRecord {
    fn from(row: RatingRecordRow) -> Self {
        let driver = row.t_id.map(|id| RatedDriver {
            id,
            name: row.t_name.unwrap_or_default(),
            email: row.t_email.unwrap_or_default(),
            phone_number: row.t_phone_number,
            // an unparseable role must not fail the whole page
            role: row
                .t_role
                .as_deref()
                .and_then(|r| r.parse::<UserRole>().ok())
                .unwrap_or(UserRole::Driver),
            role_status: row
                .t_role_status
                .as_deref()
                .and_then(|s| s.parse::<RoleStatus>().ok()),
        });
        let ride = match (row.r_id, row.r_date) {
            (Some(id), Some(date)) => Some(RatedRide {
                id,
                date,
                pickup_address: row.r_pickup_address.unwrap_or_default(),
                drop_address: row.r_drop_address.unwrap_or_default(),
            }),
            _ => None,
        };
        RatingRecord {
            rating: row.rating.into(),
            submitter: row.submitter.into_summary(),
            driver,
            ride,
        }
    }
}

fn rating_select() -> String {
    format!(
        "SELECT rr.*, {}, \
         t.id AS t_id, t.name AS t_name, t.email AS t_email, t.phone_number AS t_phone_number, \
         t.role AS t_role, t.role_status AS t_role_status, \
         r.id AS r_id, r.date AS r_date, r.pickup_address AS r_pickup_address, \
         r.drop_address AS r_drop_address \
         FROM ride_ratings rr \
         LEFT JOIN users p ON p.id = rr.user_id \
         LEFT JOIN users t ON t.id = rr.target_user_id \
         LEFT JOIN rides r ON r.id = rr.ride_id",
        PERSON_COLUMNS
    )
}

impl StoreRatingRepository {
    async fn page(
        &self,
        driver_id: Option<Uuid>,
        filter: &ReviewFilter,
    ) -> StoreResult<Page<RatingRecord>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM ride_ratings rr WHERE TRUE");
        let mut qb = QueryBuilder::<Postgres>::new(rating_select());
        qb.push(" WHERE TRUE");
        if let Some(driver_id) = driver_id {
            count.push(" AND rr.target_user_id = ").push_bind(driver_id);
            qb.push(" AND rr.target_user_id = ").push_bind(driver_id);
        }

        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .or_store("Rating")?;

        qb.push(format!(
            " ORDER BY rr.{} {}, rr.id",
            filter.sort.column(),
            filter.order.as_sql()
        ));
        qb.push(" LIMIT ")
            .push_bind(filter.page.limit())
            .push(" OFFSET ")
            .push_bind(filter.page.offset());

        let rows = qb
            .build_query_as::<RatingRecordRow>()
            .fetch_all(&self.pool)
            .await
            .or_store("Rating")?;

        Ok(Page::new(
            rows.into_iter().map(RatingRecord::from).collect(),
            total,
            filter.page,
        ))
    }
}

#[async_trait]
impl RatingRepository for StoreRatingRepository {
    async fn list_ratings(&self, filter: &ReviewFilter) -> StoreResult<Page<RatingRecord>> {
        self.page(None, filter).await
    }

    async fn ratings_for_driver(&self, driver_id: Uuid, page: PageRequest) -> StoreResult<Page<RatingRecord>> {
        self.page(Some(driver_id), &ReviewFilter::latest(page)).await
    }

    async fn create_rating(&self, user_id: Uuid, rating: &NewRating) -> StoreResult<RideRating> {
        let driver_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT r.driver_id
            FROM bookings b
            JOIN rides r ON r.id = b.ride_id
            WHERE b.id = $1 AND b.ride_id = $2 AND b.user_id = $3
            "#,
        )
        .bind(rating.booking_id)
        .bind(rating.ride_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .or_store("Booking")?;
        let driver_id = driver_id.ok_or_else(|| StoreError::NotFound("Booking".into()))?;
        rating.check_target(driver_id)?;

        let row: RatingRow = sqlx::query_as(
            r#"
            INSERT INTO ride_ratings (id, booking_id, ride_id, user_id, target_user_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(rating.booking_id)
        .bind(rating.ride_id)
        .bind(user_id)
        .bind(rating.target_user_id)
        .bind(rating.rating)
        .bind(&rating.comment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match crate::database::map_sqlx_error(e, "Rating") {
            StoreError::Conflict(_) => {
                StoreError::Conflict("You have already rated this booking".into())
            }
            other => other,
        })?;

        Ok(row.into())
    }
}

// ============================================================================
// System feedback
// ============================================================================

pub struct StoreFeedbackRepository {
    pool: PgPool,
}

impl StoreFeedbackRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct FeedbackRow {
    id: Uuid,
    user_id: Uuid,
    rating: f64,
    feedback: String,
    created_at: DateTime<Utc>,
}

impl From<FeedbackRow> for Feedback {
    fn from(row: FeedbackRow) -> Self {
        Feedback {
            id: row.id,
            user_id: row.user_id,
            rating: row.rating,
            feedback: row.feedback,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct FeedbackRecordRow {
    #[sqlx(flatten)]
    feedback: FeedbackRow,
    #[sqlx(flatten)]
    submitter: PersonCols,
}

impl StoreFeedbackRepository {
    async fn page(&self, user_id: Option<Uuid>, filter: &ReviewFilter) -> StoreResult<Page<FeedbackRecord>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM feedbacks f WHERE TRUE");
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT f.*, {} FROM feedbacks f LEFT JOIN users p ON p.id = f.user_id WHERE TRUE",
            PERSON_COLUMNS
        ));
        if let Some(user_id) = user_id {
            count.push(" AND f.user_id = ").push_bind(user_id);
            qb.push(" AND f.user_id = ").push_bind(user_id);
        }

        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .or_store("Feedback")?;

        qb.push(format!(
            " ORDER BY f.{} {}, f.id",
            filter.sort.column(),
            filter.order.as_sql()
        ));
        qb.push(" LIMIT ")
            .push_bind(filter.page.limit())
            .push(" OFFSET ")
            .push_bind(filter.page.offset());

        let rows = qb
            .build_query_as::<FeedbackRecordRow>()
            .fetch_all(&self.pool)
            .await
            .or_store("Feedback")?;

        let items = rows
            .into_iter()
            .map(|r| FeedbackRecord {
                feedback: r.feedback.into(),
                submitter: r.submitter.into_summary(),
            })
            .collect();
        Ok(Page::new(items, total, filter.page))
    }
}

#[async_trait]
impl FeedbackRepository for StoreFeedbackRepository {
    async fn list_feedback(&self, filter: &ReviewFilter) -> StoreResult<Page<FeedbackRecord>> {
        self.page(None, filter).await
    }

    async fn feedback_by_user(&self, user_id: Uuid, page: PageRequest) -> StoreResult<Page<FeedbackRecord>> {
        self.page(Some(user_id), &ReviewFilter::latest(page)).await
    }

    async fn create_feedback(&self, user_id: Uuid, feedback: &NewFeedback) -> StoreResult<Feedback> {
        let row: FeedbackRow = sqlx::query_as(
            "INSERT INTO feedbacks (id, user_id, rating, feedback) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(feedback.rating)
        .bind(&feedback.feedback)
        .fetch_one(&self.pool)
        .await
        .or_store("Feedback")?;
        Ok(row.into())
    }

    async fn rating_buckets(&self) -> StoreResult<Vec<RatingBucket>> {
        let rows: Vec<(i32, i64, f64)> = sqlx::query_as(
            "SELECT FLOOR(rating)::INT, COUNT(*), SUM(rating) FROM feedbacks GROUP BY 1",
        )
        .fetch_all(&self.pool)
        .await
        .or_store("Feedback")?;

        Ok(rows
            .into_iter()
            .map(|(bucket, count, sum)| RatingBucket { bucket, count, sum })
            .collect())
    }
}
