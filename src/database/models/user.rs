use sqlx::FromRow;

use crate::auth::AuthenticatedUser;
use crate::types::{Role, UserId};

/// Row read when checking a login
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub user_id: UserId,
    pub username: String,
    pub role: i32,
    pub password_hash: String,
}

impl From<UserCredentials> for AuthenticatedUser {
    fn from(row: UserCredentials) -> Self {
        Self {
            user_id: row.user_id,
            username: row.username,
            role: Role::from(row.role),
        }
    }
}
