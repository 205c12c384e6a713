use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: i64,
    pub descricao: String,
    pub data: String,
    pub hora: String,
    pub css_bg_color: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub nome: String,
    #[serde(skip_serializing)]
    pub senha: String,
}

/// The three fields every event write must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub descricao: String,
    pub data: String,
    pub hora: String,
}

impl NewEvent {
    pub fn new(descricao: &str, data: &str, hora: &str) -> Self {
        Self {
            descricao: descricao.to_string(),
            data: data.to_string(),
            hora: hora.to_string(),
        }
    }
}

/// Request body of `/addPost` and `/updatePost`. Every field is optional so
/// that a missing one surfaces as a validation error, not a rejection.
#[derive(Debug, Default, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub descricao: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub hora: Option<String>,
}

impl EventPayload {
    pub fn validate(self, message: &'static str) -> Result<NewEvent, AppError> {
        match (
            non_empty(self.descricao),
            non_empty(self.data),
            non_empty(self.hora),
        ) {
            (Some(descricao), Some(data), Some(hora)) => Ok(NewEvent {
                descricao,
                data,
                hora,
            }),
            _ => Err(AppError::Validation(message)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ColorPayload {
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    pub usuario: Option<String>,
    #[serde(default)]
    pub senha: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageBody<T> {
    pub message: T,
}

#[derive(Debug, Serialize)]
pub struct TokenBody {
    pub token: String,
}

pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
