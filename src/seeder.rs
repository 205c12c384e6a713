//! Demo data, inserted on demand through `GET /seeder`.

use chrono::{Days, Utc};
use thiserror::Error;

use crate::auth::{self, PasswordError};
use crate::date::EventDate;
use crate::db::Store;
use crate::models::NewEvent;

pub const ADMIN_USER: &str = "admin";

const DEMO_EVENTS: &[(&str, u64, &str)] = &[
    ("Show de abertura da temporada", 0, "20:00"),
    ("Ensaio geral com a banda", 0, "15:30"),
    ("Apresentação no teatro municipal", 3, "21:00"),
    ("Gravação do programa de rádio", 7, "10:00"),
    ("Festival de inverno", 14, "18:00"),
];

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("could not hash admin password: {0}")]
    Password(#[from] PasswordError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub events_inserted: u64,
    pub admin_seeded: bool,
}

/// Demo events dated relative to today, so the calendar always has
/// something to show.
pub fn demo_events() -> Vec<NewEvent> {
    let today = Utc::now().date_naive();
    DEMO_EVENTS
        .iter()
        .map(|(descricao, offset, hora)| {
            let day = today.checked_add_days(Days::new(*offset)).unwrap_or(today);
            NewEvent::new(descricao, EventDate::from_naive(day).as_str(), hora)
        })
        .collect()
}

/// Inserts demo events whose description is not taken and, when a password
/// is given, creates or resets the admin user. Safe to run repeatedly.
pub async fn run(store: &Store, admin_password: Option<&str>) -> Result<SeedReport, SeedError> {
    let events_inserted = store
        .insert_missing_events(&demo_events(), Utc::now())
        .await?;

    let admin_seeded = match admin_password {
        Some(password) => {
            let hash = auth::hash_password(password).await?;
            store.upsert_user(ADMIN_USER, &hash).await?;
            true
        }
        None => false,
    };

    Ok(SeedReport {
        events_inserted,
        admin_seeded,
    })
}
