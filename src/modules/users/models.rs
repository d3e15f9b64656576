use bookbuddy_db::Document;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored account. `password` holds an argon2id PHC string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password: String,
}

impl Document for User {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> Uuid {
        self.id
    }
}

/// What a user may see of their own account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

/// Body of `PUT /users/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub password: Option<String>,
}
