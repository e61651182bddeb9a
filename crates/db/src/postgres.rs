use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use slotbook_kernel::{settings::DatabaseSettings, Migration};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{FromRow, Row};

use crate::error::{StoreError, StoreResult};
use crate::models::{BookingDraft, BookingRecord, IdentityRecord, NewIdentity, ServiceRecord};
use crate::store::BookingStore;

/// First key of the two-key advisory lock taken per booking day.
const BOOKING_DAY_LOCK: i32 = 0x5107;

const COUNT_OVERLAPPING: &str = r#"
    SELECT COUNT(*) FROM bookings
    WHERE start_time::date = $1
      AND start_time < $3
      AND end_time > $2
"#;

const IDENTITY_COLUMNS: &str = "id, name, surname, email, password, api_key, is_admin";

/// Booking store backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect, retrying once a second up to `connect_attempts` times so the
    /// service can start alongside its database.
    pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Self> {
        let attempts = settings.connect_attempts.max(1);
        let mut attempt = 1;

        loop {
            let connected = PgPoolOptions::new()
                .max_connections(settings.max_connections)
                .connect(&settings.url)
                .await;

            match connected {
                Ok(pool) => {
                    tracing::info!(target: "slotbook-db", attempt, "database connection established");
                    return Ok(Self::new(pool));
                }
                Err(err) if attempt < attempts => {
                    tracing::warn!(
                        target: "slotbook-db",
                        attempt,
                        attempts,
                        error = %err,
                        "waiting for database connection"
                    );
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    attempt += 1;
                }
                Err(err) => {
                    return Err(err).with_context(|| {
                        format!("could not connect to database after {attempts} attempts")
                    });
                }
            }
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn day_lock_key(day: NaiveDate) -> i32 {
    day.num_days_from_ce()
}

fn owner_from_row(row: &PgRow) -> Result<Option<IdentityRecord>, sqlx::Error> {
    let Some(id) = row.try_get::<Option<i64>, _>("owner_id")? else {
        return Ok(None);
    };

    Ok(Some(IdentityRecord {
        id,
        name: row.try_get("owner_name")?,
        surname: row.try_get("owner_surname")?,
        email: row.try_get("owner_email")?,
        password_hash: row.try_get("owner_password")?,
        api_key: row.try_get("owner_api_key")?,
        is_admin: row.try_get("owner_is_admin")?,
    }))
}

#[async_trait]
impl BookingStore for PgStore {
    async fn insert_booking(&self, owner: Option<i64>, booking: &BookingDraft) -> StoreResult<i64> {
        let day = booking.day();
        let mut tx = self.pool.begin().await?;

        // Serializes inserts for the same day until commit.
        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(BOOKING_DAY_LOCK)
            .bind(day_lock_key(day))
            .execute(&mut *tx)
            .await?;

        let overlapping: i64 = sqlx::query_scalar(COUNT_OVERLAPPING)
            .bind(day)
            .bind(booking.start_time)
            .bind(booking.end_time)
            .fetch_one(&mut *tx)
            .await?;

        if overlapping > 0 {
            tx.rollback().await?;
            return Err(StoreError::Overlap { day });
        }

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO bookings (name, surname, email, phone, service, start_time, end_time, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&booking.name)
        .bind(&booking.surname)
        .bind(&booking.email)
        .bind(booking.phone.as_deref())
        .bind(booking.service)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .bind(owner)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(id)
    }

    async fn update_booking(&self, id: i64, booking: &BookingDraft) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE bookings
            SET name = $1, surname = $2, email = $3, phone = $4, service = $5,
                start_time = $6, end_time = $7
            WHERE id = $8
            "#,
        )
        .bind(&booking.name)
        .bind(&booking.surname)
        .bind(&booking.email)
        .bind(booking.phone.as_deref())
        .bind(booking.service)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_booking(&self, id: i64) -> StoreResult<()> {
        sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count_overlapping(
        &self,
        day: NaiveDate,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> StoreResult<i64> {
        let count = sqlx::query_scalar(COUNT_OVERLAPPING)
            .bind(day)
            .bind(start)
            .bind(end)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_bookings(&self) -> StoreResult<Vec<(BookingRecord, Option<IdentityRecord>)>> {
        let rows = sqlx::query(
            r#"
            SELECT b.id, b.user_id, b.name, b.surname, b.email, b.phone, b.service,
                   b.start_time, b.end_time,
                   u.id AS owner_id, u.name AS owner_name, u.surname AS owner_surname,
                   u.email AS owner_email, u.password AS owner_password,
                   u.api_key AS owner_api_key, u.is_admin AS owner_is_admin
            FROM bookings b
            LEFT JOIN users u ON b.user_id = u.id
            ORDER BY b.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut bookings = Vec::with_capacity(rows.len());
        for row in &rows {
            let booking = BookingRecord::from_row(row)?;
            bookings.push((booking, owner_from_row(row)?));
        }
        Ok(bookings)
    }

    async fn find_identity_by_token(&self, token: &str) -> StoreResult<Option<IdentityRecord>> {
        let identity = sqlx::query_as(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM users WHERE api_key = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(identity)
    }

    async fn find_identity_by_email(&self, email: &str) -> StoreResult<Option<IdentityRecord>> {
        let identity = sqlx::query_as(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(identity)
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        let exists = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn insert_identity(&self, identity: &NewIdentity) -> StoreResult<i64> {
        let inserted = sqlx::query_scalar(
            r#"
            INSERT INTO users (name, surname, email, password, api_key, is_admin)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&identity.name)
        .bind(&identity.surname)
        .bind(&identity.email)
        .bind(&identity.password_hash)
        .bind(&identity.api_key)
        .bind(identity.is_admin)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(id) => Ok(id),
            Err(err) if StoreError::is_unique_violation(&err) => Err(StoreError::DuplicateEmail {
                email: identity.email.clone(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    async fn list_services(&self) -> StoreResult<Vec<ServiceRecord>> {
        let services = sqlx::query_as("SELECT id, name, duration FROM services ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(services)
    }

    async fn migrate(&self, migrations: &[(String, Migration)]) -> StoreResult<()> {
        sqlx::raw_sql(
            r#"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                module     TEXT NOT NULL,
                id         TEXT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                PRIMARY KEY (module, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        for (module, migration) in migrations {
            let mut tx = self.pool.begin().await?;

            let applied: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE module = $1 AND id = $2)",
            )
            .bind(module)
            .bind(migration.id)
            .fetch_one(&mut *tx)
            .await?;

            if applied {
                tx.rollback().await?;
                continue;
            }

            sqlx::Executor::execute(&mut *tx, sqlx::raw_sql(migration.up)).await?;
            sqlx::query("INSERT INTO schema_migrations (module, id) VALUES ($1, $2)")
                .bind(module)
                .bind(migration.id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            tracing::info!(target: "slotbook-db", module = %module, migration = migration.id, "applied migration");
        }

        Ok(())
    }
}
