//! User accounts and roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// What an account is allowed to do. Every role has an explicit branch
/// wherever permissions are decided; there is no catch-all.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
  Admin,
  /// Program manager: maintains students, programs and subjects.
  Responsable,
  Teacher,
  Student,
}

impl Role {
  /// Roles that may read any student's records.
  pub fn is_staff(self) -> bool {
    match self {
      Role::Admin | Role::Responsable | Role::Teacher => true,
      Role::Student => false,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:       i64,
  pub username:      String,
  pub role:          Role,
  /// Set for (and only for) [`Role::Student`] accounts.
  pub student_id:    Option<i64>,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  #[serde(skip_serializing, default)]
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::GradeStore::add_user`]. The password is already
/// hashed by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub password_hash: String,
  pub role:          Role,
  pub student_id:    Option<i64>,
}
