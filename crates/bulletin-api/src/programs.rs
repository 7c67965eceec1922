//! Handlers for `/programs` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/programs` | Staff only |
//! | `POST` | `/programs` | Body: `{"name":"L1 Informatique","level":"L1"}` |

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use bulletin_core::{
  store::GradeStore,
  student::{NewProgram, Program},
  user::Role,
};

use crate::{auth::Principal, error::ApiError};

/// `GET /programs`
pub async fn list<S: GradeStore>(
  principal: Principal,
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Program>>, ApiError> {
  principal.require_staff()?;
  let programs = store.list_programs().await.map_err(ApiError::store)?;
  Ok(Json(programs))
}

/// `POST /programs`
pub async fn create<S: GradeStore>(
  principal: Principal,
  State(store): State<Arc<S>>,
  Json(body): Json<NewProgram>,
) -> Result<impl IntoResponse, ApiError> {
  principal.require(&[Role::Admin, Role::Responsable])?;
  let program = store.add_program(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(program)))
}
