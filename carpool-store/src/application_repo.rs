use async_trait::async_trait;
use carpool_core::driver_application::{ApplicationReview, ApplicationStatus, DriverApplication};
use carpool_core::query::{ApplicationFilter, Page};
use carpool_core::repository::DriverApplicationRepository;
use carpool_core::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::SqlxResultExt;
use crate::rows::{PersonCols, PERSON_COLUMNS};

pub struct StoreDriverApplicationRepository {
    pool: PgPool,
}

impl StoreDriverApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ApplicationRow {
    id: Uuid,
    user_id: Uuid,
    status: String,
    application_date: DateTime<Utc>,
    review_date: Option<DateTime<Utc>>,
    reviewer_id: Option<Uuid>,
    review_notes: Option<String>,
    #[sqlx(flatten)]
    applicant: PersonCols,
}

impl TryFrom<ApplicationRow> for DriverApplication {
    type Error = StoreError;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<ApplicationStatus>()
            .map_err(|e| StoreError::Corrupt(format!("application {}: {}", row.id, e)))?;
        Ok(DriverApplication {
            id: row.id,
            user_id: row.user_id,
            status,
            application_date: row.application_date,
            review_date: row.review_date,
            reviewer_id: row.reviewer_id,
            review_notes: row.review_notes,
            applicant: row.applicant.into_summary(),
        })
    }
}

fn select() -> String {
    format!(
        "SELECT a.*, {} FROM driver_applications a LEFT JOIN users p ON p.id = a.user_id",
        PERSON_COLUMNS
    )
}

#[async_trait]
impl DriverApplicationRepository for StoreDriverApplicationRepository {
    async fn list_applications(&self, filter: &ApplicationFilter) -> StoreResult<Page<DriverApplication>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM driver_applications a WHERE TRUE");
        let mut qb = QueryBuilder::<Postgres>::new(select());
        qb.push(" WHERE TRUE");
        if let Some(status) = filter.status {
            count.push(" AND a.status = ").push_bind(status.as_str());
            qb.push(" AND a.status = ").push_bind(status.as_str());
        }

        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .or_store("Driver application")?;

        qb.push(format!(
            " ORDER BY a.{} {} NULLS LAST, a.id",
            filter.sort.column(),
            filter.order.as_sql()
        ));
        qb.push(" LIMIT ")
            .push_bind(filter.page.limit())
            .push(" OFFSET ")
            .push_bind(filter.page.offset());

        let rows = qb
            .build_query_as::<ApplicationRow>()
            .fetch_all(&self.pool)
            .await
            .or_store("Driver application")?;

        let items = rows
            .into_iter()
            .map(DriverApplication::try_from)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Page::new(items, total, filter.page))
    }

    async fn get_application(&self, id: Uuid) -> StoreResult<DriverApplication> {
        let row: ApplicationRow = sqlx::query_as(&format!("{} WHERE a.id = $1", select()))
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .or_store("Driver application")?;
        row.try_into()
    }

    async fn review_application(
        &self,
        id: Uuid,
        review: &ApplicationReview,
    ) -> StoreResult<DriverApplication> {
        let mut tx = self.pool.begin().await.or_store("Driver application")?;

        let (user_id, status): (Uuid, String) = sqlx::query_as(
            "SELECT user_id, status FROM driver_applications WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .or_store("Driver application")?;

        if status != ApplicationStatus::Pending.as_str() {
            return Err(StoreError::Conflict(format!(
                "Driver application has already been {}",
                status
            )));
        }

        sqlx::query(
            r#"
            UPDATE driver_applications
            SET status = $1, review_date = $2, reviewer_id = $3, review_notes = $4
            WHERE id = $5
            "#,
        )
        .bind(review.decision.application_status().as_str())
        .bind(review.reviewed_at)
        .bind(review.reviewer_id)
        .bind(&review.notes)
        .bind(id)
        .execute(&mut *tx)
        .await
        .or_store("Driver application")?;

        let updated = sqlx::query("UPDATE users SET role = $1, role_status = $2 WHERE id = $3")
            .bind(review.decision.resulting_role().as_str())
            .bind(review.decision.resulting_role_status().as_str())
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .or_store("User")?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound("User".into()));
        }

        tx.commit().await.or_store("Driver application")?;

        tracing::info!(
            application_id = %id,
            %user_id,
            reviewer_id = %review.reviewer_id,
            decision = %review.decision.application_status(),
            "Driver application reviewed"
        );

        self.get_application(id).await
    }
}
