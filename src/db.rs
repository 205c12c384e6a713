use crate::date::EventDate;
use crate::models::{Event, NewEvent, User};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// Handle to the event store. Built once at startup and handed to the router
/// state; clones share the same pool.
#[derive(Clone, Debug)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// A private in-memory database. One connection, so every query sees the
    /// same data.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let store = Self::from_pool(pool);
        store.init_schema().await?;
        Ok(store)
    }

    pub async fn init_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                descricao TEXT NOT NULL UNIQUE,
                data TEXT NOT NULL,
                hora TEXT NOT NULL,
                css_bg_color TEXT,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            );",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                nome TEXT NOT NULL UNIQUE,
                senha TEXT NOT NULL
            );",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn all_events(&self) -> Result<Vec<Event>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM events")
            .fetch_all(&self.pool)
            .await
    }

    #[cfg(test)]
    pub async fn find_event(&self, id: i64) -> Result<Option<Event>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM events WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Drops `table`, so every later query touching it fails.
    #[cfg(test)]
    pub async fn drop_table(&self, table: &str) -> Result<(), sqlx::Error> {
        sqlx::query(&format!("DROP TABLE {table}"))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_event(
        &self,
        event: &NewEvent,
        now: DateTime<Utc>,
    ) -> Result<Event, sqlx::Error> {
        sqlx::query_as(
            "INSERT INTO events (descricao, data, hora, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(&event.descricao)
        .bind(&event.data)
        .bind(&event.hora)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    /// Returns `false` when no event has this id.
    pub async fn delete_event(&self, id: i64) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM events WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(false);
        }
        sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Returns `false` when no event has this id.
    pub async fn update_event(
        &self,
        id: i64,
        event: &NewEvent,
        now: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM events WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(false);
        }
        sqlx::query(
            "UPDATE events SET descricao = ?, data = ?, hora = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&event.descricao)
        .bind(&event.data)
        .bind(&event.hora)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(true)
    }

    pub async fn events_on(&self, date: &EventDate) -> Result<Vec<Event>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM events WHERE data = ?")
            .bind(date.as_str())
            .fetch_all(&self.pool)
            .await
    }

    /// Tags every event on `date` with `color`. Returns how many events were
    /// touched; zero means the date is unknown.
    pub async fn set_color_on(
        &self,
        date: &EventDate,
        color: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events WHERE data = ?")
            .bind(date.as_str())
            .fetch_one(&mut *tx)
            .await?;
        if count == 0 {
            return Ok(0);
        }
        let updated =
            sqlx::query("UPDATE events SET css_bg_color = ?, updated_at = ? WHERE data = ?")
                .bind(color)
                .bind(now)
                .bind(date.as_str())
                .execute(&mut *tx)
                .await?
                .rows_affected();
        tx.commit().await?;
        Ok(updated)
    }

    /// Inserts the events whose description is not taken yet. Returns how
    /// many rows were new.
    pub async fn insert_missing_events(
        &self,
        events: &[NewEvent],
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for event in events {
            inserted += sqlx::query(
                "INSERT INTO events (descricao, data, hora, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT(descricao) DO NOTHING",
            )
            .bind(&event.descricao)
            .bind(&event.data)
            .bind(&event.hora)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }

    pub async fn find_user_by_nome(&self, nome: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT id, nome, senha FROM users WHERE nome = ?")
            .bind(nome)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn upsert_user(&self, nome: &str, senha_hash: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO users (nome, senha) VALUES (?, ?)
             ON CONFLICT(nome) DO UPDATE SET senha = excluded.senha",
        )
        .bind(nome)
        .bind(senha_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}
