use crate::{
    auth::{self, Claims},
    date::{self, EventDate},
    db,
    error::AppError,
    models::{
        ColorPayload, Event, EventPayload, LoginPayload, MessageBody, TokenBody, non_empty,
    },
    seeder,
    state::AppState,
};
use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::{error, info, warn};

const MISSING_VALUES: &str = "Valores precisam ser inseridos.";
const NO_EVENTS: &str = "Sem eventos disponíveis.";
const LIST_FAILED: &str = "Erro ao buscar os eventos.";
const INSERTED: &str = "Evento inserido com sucesso!";
const INSERT_FAILED: &str = "Erro ao inserir valores.";
const DELETED: &str = "Evento excluído com sucesso!";
const DELETE_MISSING: &str = "Evento inexistente. Falha ao excluir.";
const DELETE_FAILED: &str = "Falha ao excluir.";
const UPDATED: &str = "Evento atualizado com sucesso!";
const UPDATE_MISSING: &str = "Evento inexistente. Falha ao atualizar.";
const UPDATE_FAILED: &str = "Falha ao atualizar.";
const DATE_NOT_FOUND: &str = "Data não encontrada no sistema.";
const QUERY_FAILED: &str = "Erro ao consultar posts.";
const NO_COLOR: &str = "Nenhuma cor selecionada";
const SEEDED: &str = "Seeder atualizado com sucesso!";
const LOGIN_FAILED: &str = "Erro ao fazer login.";

/// Bodies that are missing, not JSON, or carry a field of the wrong type read
/// as empty, so the handler answers with its own "missing values" message.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> T {
    serde_json::from_slice(body).unwrap_or_default()
}

fn parse_post_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

pub async fn get_all_posts(
    State(app_state): State<AppState>,
) -> Result<Json<MessageBody<Vec<Event>>>, AppError> {
    let mut events = app_state.store.all_events().await.map_err(|err| {
        error!(error = %err, "failed to list events");
        AppError::Internal(LIST_FAILED)
    })?;

    if events.is_empty() {
        return Err(AppError::NotFound(NO_EVENTS));
    }

    date::sort_newest_first(&mut events);
    Ok(Json(MessageBody { message: events }))
}

pub async fn add_post(
    State(app_state): State<AppState>,
    body: Bytes,
) -> Result<Json<MessageBody<&'static str>>, AppError> {
    let new_event = parse_body::<EventPayload>(&body).validate(MISSING_VALUES)?;

    match app_state.store.insert_event(&new_event, Utc::now()).await {
        Ok(event) => {
            info!(event_id = event.id, "event inserted");
            Ok(Json(MessageBody { message: INSERTED }))
        }
        Err(err) if db::is_unique_violation(&err) => {
            warn!(descricao = %new_event.descricao, "duplicate event description");
            Err(AppError::DuplicateDescription)
        }
        Err(err) => {
            error!(error = %err, "failed to insert event");
            Err(AppError::Validation(INSERT_FAILED))
        }
    }
}

pub async fn delete_post(
    State(app_state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<MessageBody<&'static str>>, AppError> {
    let post_id = parse_post_id(&post_id).ok_or(AppError::Validation(MISSING_VALUES))?;

    let deleted = app_state.store.delete_event(post_id).await.map_err(|err| {
        error!(event_id = post_id, error = %err, "failed to delete event");
        AppError::NotFound(DELETE_FAILED)
    })?;

    if !deleted {
        return Err(AppError::NotFound(DELETE_MISSING));
    }
    info!(event_id = post_id, "event deleted");
    Ok(Json(MessageBody { message: DELETED }))
}

pub async fn update_post(
    State(app_state): State<AppState>,
    Path(post_id): Path<String>,
    body: Bytes,
) -> Result<Json<MessageBody<&'static str>>, AppError> {
    let new_event = parse_body::<EventPayload>(&body).validate(MISSING_VALUES)?;
    let post_id = parse_post_id(&post_id).ok_or(AppError::Validation(MISSING_VALUES))?;

    let updated = app_state
        .store
        .update_event(post_id, &new_event, Utc::now())
        .await
        .map_err(|err| {
            error!(event_id = post_id, error = %err, "failed to update event");
            AppError::NotFound(UPDATE_FAILED)
        })?;

    if !updated {
        return Err(AppError::NotFound(UPDATE_MISSING));
    }
    info!(event_id = post_id, "event updated");
    Ok(Json(MessageBody { message: UPDATED }))
}

pub async fn get_post_from_date(
    State(app_state): State<AppState>,
    Path(date_value): Path<String>,
) -> Result<Json<MessageBody<Vec<Event>>>, AppError> {
    let date = EventDate::from_path(&date_value);

    let events = app_state.store.events_on(&date).await.map_err(|err| {
        error!(date = %date, error = %err, "failed to query events by date");
        AppError::Internal(QUERY_FAILED)
    })?;

    if events.is_empty() {
        return Err(AppError::Validation(DATE_NOT_FOUND));
    }
    Ok(Json(MessageBody { message: events }))
}

pub async fn edit_color(
    State(app_state): State<AppState>,
    Path(date_value): Path<String>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let color = non_empty(parse_body::<ColorPayload>(&body).color)
        .ok_or(AppError::Validation(NO_COLOR))?;
    let date = EventDate::from_path(&date_value);

    let updated = app_state
        .store
        .set_color_on(&date, &color, Utc::now())
        .await
        .map_err(|err| {
            error!(date = %date, error = %err, "failed to update event colors");
            AppError::Internal(QUERY_FAILED)
        })?;

    if updated == 0 {
        return Err(AppError::Validation(DATE_NOT_FOUND));
    }
    info!(date = %date, updated, "event colors updated");
    Ok(StatusCode::OK)
}

pub async fn run_seeder(
    State(app_state): State<AppState>,
) -> Result<Json<MessageBody<&'static str>>, AppError> {
    let report = seeder::run(&app_state.store, app_state.admin_password.as_deref())
        .await
        .map_err(|err| {
            error!(error = %err, "seeder failed");
            AppError::SeedFailure
        })?;
    info!(
        events_inserted = report.events_inserted,
        admin_seeded = report.admin_seeded,
        "seeder finished"
    );
    Ok(Json(MessageBody { message: SEEDED }))
}

pub async fn handle_login(
    State(app_state): State<AppState>,
    body: Bytes,
) -> Result<Json<TokenBody>, AppError> {
    let payload = parse_body::<LoginPayload>(&body);
    let usuario = non_empty(payload.usuario).ok_or(AppError::Validation(MISSING_VALUES))?;
    let senha = payload.senha.unwrap_or_default();

    let keys = app_state.tokens.as_ref().ok_or_else(|| {
        error!("login attempted without a configured secret");
        AppError::Internal(LOGIN_FAILED)
    })?;

    let user = app_state
        .store
        .find_user_by_nome(&usuario)
        .await
        .map_err(|err| {
            error!(error = %err, "failed to look up user");
            AppError::Internal(LOGIN_FAILED)
        })?
        .ok_or(AppError::UserNotFound)?;

    let valid = auth::verify_password(&senha, &user.senha)
        .await
        .map_err(|err| {
            error!(error = %err, "failed to verify password");
            AppError::Internal(LOGIN_FAILED)
        })?;
    if !valid {
        warn!(usuario = %user.nome, "invalid credentials");
        return Err(AppError::InvalidCredentials);
    }

    let token = keys.issue(&user.nome).map_err(|err| {
        error!(error = %err, "failed to issue token");
        AppError::Internal(LOGIN_FAILED)
    })?;
    info!(usuario = %user.nome, "user logged in");
    Ok(Json(TokenBody { token }))
}

pub async fn verify(Extension(claims): Extension<Claims>) -> Json<MessageBody<Claims>> {
    Json(MessageBody { message: claims })
}
