use async_trait::async_trait;
use carpool_core::query::{Page, UserFilter};
use carpool_core::repository::{DashboardStats, UserRepository};
use carpool_core::ride::RideStatus;
use carpool_core::user::{RoleStatus, User, UserUpdate};
use carpool_core::StoreResult;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::SqlxResultExt;
use crate::rows::{like_pattern, UserRow};

pub struct StoreUserRepository {
    pool: PgPool,
}

impl StoreUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    qb.push(" WHERE TRUE");
    if let Some(role) = filter.role {
        qb.push(" AND role = ").push_bind(role.as_str());
    }
    if let Some(name) = &filter.name {
        qb.push(" AND name ILIKE ").push_bind(like_pattern(name));
    }
    if let Some(email) = &filter.email {
        qb.push(" AND email ILIKE ").push_bind(like_pattern(email));
    }
}

#[derive(sqlx::FromRow)]
struct StatsRow {
    total_users: i64,
    total_drivers: i64,
    total_passengers: i64,
    pending_applications: i64,
    total_rides: i64,
    active_rides: i64,
    total_bookings: i64,
}

#[async_trait]
impl UserRepository for StoreUserRepository {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .or_store("User")?;
        row.map(User::try_from).transpose()
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<User> {
        let row: UserRow = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .or_store("User")?;
        row.try_into()
    }

    async fn list_users(&self, filter: &UserFilter) -> StoreResult<Page<User>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_filters(&mut count, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .or_store("User")?;

        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM users");
        push_filters(&mut qb, filter);
        qb.push(format!(
            " ORDER BY {} {}, id",
            filter.sort.column(),
            filter.order.as_sql()
        ));
        qb.push(" LIMIT ")
            .push_bind(filter.page.limit())
            .push(" OFFSET ")
            .push_bind(filter.page.offset());

        let rows = qb
            .build_query_as::<UserRow>()
            .fetch_all(&self.pool)
            .await
            .or_store("User")?;

        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Page::new(users, total, filter.page))
    }

    async fn update_user(&self, id: Uuid, update: &UserUpdate) -> StoreResult<User> {
        if update.is_empty() {
            return self.get_user(id).await;
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET ");
        let mut set = qb.separated(", ");
        if let Some(name) = &update.name {
            set.push("name = ").push_bind_unseparated(name.clone());
        }
        if let Some(email) = &update.email {
            set.push("email = ").push_bind_unseparated(email.clone());
        }
        if let Some(phone) = &update.phone_number {
            set.push("phone_number = ").push_bind_unseparated(phone.clone());
        }
        if let Some(role) = update.role {
            set.push("role = ").push_bind_unseparated(role.as_str());
        }
        if let Some(status) = update.role_status {
            set.push("role_status = ").push_bind_unseparated(status.as_str());
        }
        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        let row = qb
            .build_query_as::<UserRow>()
            .fetch_one(&self.pool)
            .await
            .or_store("User")?;
        tracing::info!(user_id = %id, "User updated");
        row.try_into()
    }

    async fn set_role_status(&self, id: Uuid, status: RoleStatus) -> StoreResult<User> {
        let row: UserRow = sqlx::query_as("UPDATE users SET role_status = $1 WHERE id = $2 RETURNING *")
            .bind(status.as_str())
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .or_store("User")?;
        tracing::info!(user_id = %id, role_status = %status, "Role status changed");
        row.try_into()
    }

    async fn dashboard_stats(&self) -> StoreResult<DashboardStats> {
        let active: Vec<String> = [RideStatus::Open, RideStatus::InProgress]
            .iter()
            .flat_map(|s| s.storage_values())
            .map(str::to_string)
            .collect();

        let row: StatsRow = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM users WHERE role = 'driver') AS total_drivers,
                (SELECT COUNT(*) FROM users WHERE role = 'passenger') AS total_passengers,
                (SELECT COUNT(*) FROM driver_applications WHERE status = 'pending') AS pending_applications,
                (SELECT COUNT(*) FROM rides) AS total_rides,
                (SELECT COUNT(*) FROM rides WHERE status = ANY($1)) AS active_rides,
                (SELECT COUNT(*) FROM bookings) AS total_bookings
            "#,
        )
        .bind(active)
        .fetch_one(&self.pool)
        .await
        .or_store("Stats")?;

        Ok(DashboardStats {
            total_users: row.total_users,
            total_drivers: row.total_drivers,
            total_passengers: row.total_passengers,
            pending_applications: row.pending_applications,
            total_rides: row.total_rides,
            active_rides: row.active_rides,
            total_bookings: row.total_bookings,
        })
    }
}
