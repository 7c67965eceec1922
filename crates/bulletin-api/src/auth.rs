//! HTTP Basic authentication against the users table, and role checks.

use std::sync::{Arc, LazyLock};

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use bulletin_core::{
  store::GradeStore,
  user::{Role, User},
};
use rand_core::OsRng;
use serde::Serialize;

use crate::error::ApiError;

/// The authenticated account behind a request.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
  pub user_id:    i64,
  pub username:   String,
  pub role:       Role,
  pub student_id: Option<i64>,
}

impl From<User> for Principal {
  fn from(user: User) -> Self {
    Self {
      user_id:    user.user_id,
      username:   user.username,
      role:       user.role,
      student_id: user.student_id,
    }
  }
}

impl Principal {
  /// Fail with 403 unless the principal holds one of `roles`.
  pub fn require(&self, roles: &[Role]) -> Result<(), ApiError> {
    if roles.contains(&self.role) {
      Ok(())
    } else {
      tracing::warn!(username = %self.username, role = %self.role, "forbidden");
      Err(ApiError::Forbidden)
    }
  }

  pub fn require_staff(&self) -> Result<(), ApiError> {
    self.require(&[Role::Admin, Role::Responsable, Role::Teacher])
  }

  /// Staff may read any student; a student account only its own records.
  pub fn can_read_student(&self, student_id: i64) -> Result<(), ApiError> {
    match self.role {
      Role::Admin | Role::Responsable | Role::Teacher => Ok(()),
      Role::Student if self.student_id == Some(student_id) => Ok(()),
      Role::Student => {
        tracing::warn!(username = %self.username, student_id, "forbidden");
        Err(ApiError::Forbidden)
      }
    }
  }
}

/// Decode `Authorization: Basic ...` into `(username, password)`.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let encoded = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Basic "))
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;
  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok((username.to_owned(), password.to_owned()))
}

/// Check `password` against an argon2 PHC string.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .map(|parsed| {
      Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
    })
    .unwrap_or(false)
}

/// Hash `password` into an argon2id PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)?
      .to_string(),
  )
}

/// Hash checked when the username is unknown, so that a miss costs the same
/// argon2 work as a wrong password.
static DUMMY_PHC: LazyLock<Option<String>> =
  LazyLock::new(|| hash_password("bulletin-unknown-user").ok());

/// Resolve the request's credentials to a [`Principal`].
pub async fn authenticate<S: GradeStore>(
  headers: &HeaderMap,
  store: &S,
) -> Result<Principal, ApiError> {
  let (username, password) = basic_credentials(headers)?;

  let user = store
    .get_user_by_username(&username)
    .await
    .map_err(ApiError::store)?;

  let verified = match &user {
    Some(user) => verify_password(&password, &user.password_hash),
    None => {
      if let Some(phc) = DUMMY_PHC.as_deref() {
        verify_password(&password, phc);
      }
      false
    }
  };

  match user {
    Some(user) if verified => Ok(user.into()),
    _ => {
      tracing::warn!(%username, "authentication failed");
      Err(ApiError::Unauthorized)
    }
  }
}

impl<S> FromRequestParts<Arc<S>> for Principal
where
  S: GradeStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    store: &Arc<S>,
  ) -> Result<Self, Self::Rejection> {
    authenticate(&parts.headers, store.as_ref()).await
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers(value: &str) -> HeaderMap {
    let mut map = HeaderMap::new();
    map.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    map
  }

  fn principal(role: Role, student_id: Option<i64>) -> Principal {
    Principal { user_id: 1, username: "u".into(), role, student_id }
  }

  #[test]
  fn decodes_basic_credentials() {
    let h = headers(&format!("Basic {}", B64.encode("prof:s3cr:et")));
    let (user, pass) = basic_credentials(&h).unwrap();
    assert_eq!(user, "prof");
    // Only the first colon separates the username.
    assert_eq!(pass, "s3cr:et");
  }

  #[test]
  fn rejects_malformed_headers() {
    assert!(matches!(basic_credentials(&HeaderMap::new()), Err(ApiError::Unauthorized)));
    assert!(matches!(
      basic_credentials(&headers("Basic !!!not-base64!!!")),
      Err(ApiError::Unauthorized)
    ));
    assert!(matches!(
      basic_credentials(&headers("Bearer abc")),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn hash_then_verify() {
    let phc = hash_password("secret").unwrap();
    assert!(verify_password("secret", &phc));
    assert!(!verify_password("wrong", &phc));
    assert!(!verify_password("secret", "not a phc string"));
  }

  #[test]
  fn unknown_user_hash_is_real_and_rejects() {
    let phc = DUMMY_PHC.as_deref().unwrap();
    assert!(PasswordHash::new(phc).is_ok());
    assert!(!verify_password("", phc));
    assert!(!verify_password("secret", phc));
  }

  #[tokio::test]
  async fn unknown_user_is_unauthorized() {
    let store = bulletin_store_sqlite::SqliteStore::open_in_memory().await.unwrap();
    let h = headers(&format!("Basic {}", B64.encode("ghost:secret")));
    assert!(matches!(
      authenticate(&h, &store).await,
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn students_read_only_themselves() {
    let me = principal(Role::Student, Some(7));
    assert!(me.can_read_student(7).is_ok());
    assert!(matches!(me.can_read_student(8), Err(ApiError::Forbidden)));
    assert!(me.require_staff().is_err());

    let teacher = principal(Role::Teacher, None);
    assert!(teacher.can_read_student(8).is_ok());
    assert!(teacher.require(&[Role::Admin]).is_err());
  }
}
