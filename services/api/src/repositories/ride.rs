//! Ride record store

use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::models::ride::{SortKey, matches_search};
use crate::models::{NewRide, Ride, RideChanges, RideQuery};

/// Ride record store
///
/// Updates and deletes are atomic per record; concurrent edits resolve
/// last-writer-wins.
pub trait RideRepository: Send + Sync {
    /// Records filtered by `query.search`, ordered by `query.sort`
    fn list(&self, query: &RideQuery) -> impl Future<Output = DatabaseResult<Vec<Ride>>> + Send;

    fn create(&self, new_ride: NewRide) -> impl Future<Output = DatabaseResult<Ride>> + Send;

    fn find_by_id(&self, id: Uuid) -> impl Future<Output = DatabaseResult<Option<Ride>>> + Send;

    /// Apply `changes`; `None` when the record does not exist
    fn update(
        &self,
        id: Uuid,
        changes: RideChanges,
    ) -> impl Future<Output = DatabaseResult<Option<Ride>>> + Send;

    /// Remove and return the record; `None` when it does not exist
    fn delete(&self, id: Uuid) -> impl Future<Output = DatabaseResult<Option<Ride>>> + Send;

    fn count(&self) -> impl Future<Output = DatabaseResult<u64>> + Send;
}

const RIDE_COLUMNS: &str = "id, customer_name, contact_number, location, amount, cost, save, \
                            date, created_at, updated_at";

/// PostgreSQL ride repository
#[derive(Clone)]
pub struct PgRideRepository {
    pool: PgPool,
}

impl PgRideRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn ride_from_row(row: &PgRow) -> Result<Ride, sqlx::Error> {
    Ok(Ride {
        id: row.try_get("id")?,
        customer_name: row.try_get("customer_name")?,
        contact_number: row.try_get("contact_number")?,
        location: row.try_get("location")?,
        amount: row.try_get("amount")?,
        cost: row.try_get("cost")?,
        save: row.try_get("save")?,
        date: row.try_get("date")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// `%term%` with LIKE wildcards in the term escaped
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

impl RideRepository for PgRideRepository {
    async fn list(&self, query: &RideQuery) -> DatabaseResult<Vec<Ride>> {
        let order = query.order();
        let direction = if order.descending { "DESC" } else { "ASC" };

        let rows = sqlx::query(&format!(
            r#"
            SELECT {RIDE_COLUMNS}
            FROM rides
            WHERE $1::TEXT IS NULL
               OR customer_name ILIKE $1
               OR contact_number ILIKE $1
               OR location ILIKE $1
            ORDER BY {} {direction}, id
            "#,
            order.key.column()
        ))
        .bind(query.search_term().map(like_pattern))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        rows.iter()
            .map(ride_from_row)
            .collect::<Result<_, _>>()
            .map_err(DatabaseError::from_query)
    }

    async fn create(&self, new_ride: NewRide) -> DatabaseResult<Ride> {
        info!("Creating ride record for {}", new_ride.customer_name);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO rides (id, customer_name, contact_number, location, amount, cost, save, date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {RIDE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new_ride.customer_name)
        .bind(&new_ride.contact_number)
        .bind(&new_ride.location)
        .bind(new_ride.amount)
        .bind(new_ride.cost)
        .bind(new_ride.save)
        .bind(new_ride.date)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        ride_from_row(&row).map_err(DatabaseError::from_query)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Ride>> {
        let row = sqlx::query(&format!("SELECT {RIDE_COLUMNS} FROM rides WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        row.as_ref()
            .map(ride_from_row)
            .transpose()
            .map_err(DatabaseError::from_query)
    }

    async fn update(&self, id: Uuid, changes: RideChanges) -> DatabaseResult<Option<Ride>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE rides SET
                customer_name = COALESCE($2, customer_name),
                contact_number = COALESCE($3, contact_number),
                location = COALESCE($4, location),
                amount = COALESCE($5, amount),
                cost = COALESCE($6, cost),
                save = COALESCE($7, save),
                date = COALESCE($8, date),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {RIDE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.customer_name)
        .bind(changes.contact_number)
        .bind(changes.location)
        .bind(changes.amount)
        .bind(changes.cost)
        .bind(changes.save)
        .bind(changes.date)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        row.as_ref()
            .map(ride_from_row)
            .transpose()
            .map_err(DatabaseError::from_query)
    }

    async fn delete(&self, id: Uuid) -> DatabaseResult<Option<Ride>> {
        let row = sqlx::query(&format!(
            "DELETE FROM rides WHERE id = $1 RETURNING {RIDE_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        row.as_ref()
            .map(ride_from_row)
            .transpose()
            .map_err(DatabaseError::from_query)
    }

    async fn count(&self) -> DatabaseResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rides")
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

/// In-process ride repository
#[derive(Clone, Default)]
pub struct MemoryRideRepository {
    rides: Arc<RwLock<HashMap<Uuid, Ride>>>,
}

impl MemoryRideRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn compare(a: &Ride, b: &Ride, key: SortKey) -> Ordering {
    match key {
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        SortKey::Date => a.occurred_at().cmp(&b.occurred_at()),
        SortKey::Amount => a.amount.total_cmp(&b.amount),
        SortKey::CustomerName => a
            .customer_name
            .to_lowercase()
            .cmp(&b.customer_name.to_lowercase()),
    }
}

impl RideRepository for MemoryRideRepository {
    async fn list(&self, query: &RideQuery) -> DatabaseResult<Vec<Ride>> {
        let mut rides: Vec<Ride> = {
            let rides = self.rides.read().await;
            match query.search_term() {
                Some(term) => rides
                    .values()
                    .filter(|r| matches_search(r, term))
                    .cloned()
                    .collect(),
                None => rides.values().cloned().collect(),
            }
        };

        let order = query.order();
        rides.sort_by(|a, b| {
            let ordering = compare(a, b, order.key);
            let ordering = if order.descending {
                ordering.reverse()
            } else {
                ordering
            };
            ordering.then_with(|| a.id.cmp(&b.id))
        });

        Ok(rides)
    }

    async fn create(&self, new_ride: NewRide) -> DatabaseResult<Ride> {
        let now = Utc::now();
        let ride = Ride {
            id: Uuid::new_v4(),
            customer_name: new_ride.customer_name,
            contact_number: new_ride.contact_number,
            location: new_ride.location,
            amount: new_ride.amount,
            cost: new_ride.cost,
            save: new_ride.save,
            date: Some(new_ride.date),
            created_at: now,
            updated_at: now,
        };

        self.rides.write().await.insert(ride.id, ride.clone());
        Ok(ride)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Ride>> {
        Ok(self.rides.read().await.get(&id).cloned())
    }

    async fn update(&self, id: Uuid, changes: RideChanges) -> DatabaseResult<Option<Ride>> {
        let mut rides = self.rides.write().await;
        let Some(ride) = rides.get_mut(&id) else {
            return Ok(None);
        };

        changes.apply(ride);
        ride.updated_at = Utc::now();
        Ok(Some(ride.clone()))
    }

    async fn delete(&self, id: Uuid) -> DatabaseResult<Option<Ride>> {
        Ok(self.rides.write().await.remove(&id))
    }

    async fn count(&self) -> DatabaseResult<u64> {
        Ok(self.rides.read().await.len() as u64)
    }
}
