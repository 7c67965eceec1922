//! Handlers for `/users` and `/me`.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use bulletin_core::{
  store::GradeStore,
  user::{NewUser, Role},
};
use serde::Deserialize;

use crate::{
  auth::{Principal, hash_password},
  error::ApiError,
};

/// JSON body accepted by `POST /users`. The password is hashed here and
/// never stored or echoed in clear.
#[derive(Debug, Deserialize)]
pub struct NewUserBody {
  pub username:   String,
  pub password:   String,
  pub role:       Role,
  pub student_id: Option<i64>,
}

/// `POST /users`, ADMIN only.
pub async fn create<S: GradeStore>(
  principal: Principal,
  State(store): State<Arc<S>>,
  Json(body): Json<NewUserBody>,
) -> Result<impl IntoResponse, ApiError> {
  principal.require(&[Role::Admin])?;
  if body.username.is_empty() || body.username.contains(':') {
    return Err(ApiError::BadRequest(
      "username must be non-empty and contain no ':'".into(),
    ));
  }
  if body.password.is_empty() {
    return Err(ApiError::BadRequest("password must not be empty".into()));
  }

  let password_hash = hash_password(&body.password)
    .map_err(|e| ApiError::Store(format!("argon2 error: {e}").into()))?;
  let user = store
    .add_user(NewUser {
      username: body.username,
      password_hash,
      role: body.role,
      student_id: body.student_id,
    })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /me`
pub async fn me(principal: Principal) -> Json<Principal> { Json(principal) }
