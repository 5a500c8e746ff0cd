//! Admin route handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use tracing::info;

use super::auth::RequireAdmin;
use super::error::ApiError;
use super::AppState;
use crate::b2c::{Role, UserApiModel, UserRecord, UserUpdateApiModel};

pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(caller): RequireAdmin,
) -> Result<Json<Vec<UserRecord>>, ApiError> {
    info!("List users requested by {:?}", caller.name);
    Ok(Json(state.projector.list_users().await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(user_id): Path<String>,
) -> Result<Json<UserRecord>, ApiError> {
    Ok(Json(state.projector.get_user(&user_id).await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(caller): RequireAdmin,
    payload: Result<Json<UserApiModel>, JsonRejection>,
) -> Result<Json<UserRecord>, ApiError> {
    let Json(model) = payload?;
    let user = state.projector.create_user(&model).await?;
    info!(
        "User {:?} ({:?}) created by {:?}",
        user.id,
        user.email(),
        caller.subject
    );
    Ok(Json(user))
}

pub async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(user_id): Path<String>,
    payload: Result<Json<UserUpdateApiModel>, JsonRejection>,
) -> Result<Json<UserRecord>, ApiError> {
    let Json(model) = payload?;
    Ok(Json(state.projector.update_user(&user_id, &model).await?))
}

/// Role comes from the path as a name or numeric index.
pub async fn set_user_role(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path((user_id, role)): Path<(String, String)>,
) -> Result<Json<UserRecord>, ApiError> {
    let role: Role = role.parse()?;
    Ok(Json(state.projector.set_user_role(&user_id, role).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(caller): RequireAdmin,
    Path(user_id): Path<String>,
) -> Result<(), ApiError> {
    info!("Delete of '{}' requested by {:?}", user_id, caller.subject);
    state.projector.delete_user(&user_id).await?;
    Ok(())
}
