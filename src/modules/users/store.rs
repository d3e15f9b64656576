//! Account storage shared by the `auth` and `users` modules.

use bookbuddy_db::{Collection, Database, Filter};
use bookbuddy_http::AppError;
use uuid::Uuid;

use super::models::User;

#[derive(Clone)]
pub struct UserStore {
    users: Collection<User>,
}

impl UserStore {
    pub fn new(db: &Database) -> Self {
        Self {
            users: db.collection().with_unique("username"),
        }
    }

    /// Insert a new account. A taken username surfaces as a conflict.
    pub async fn create(&self, username: &str, password_hash: String) -> Result<User, AppError> {
        let user = User {
            id: Uuid::now_v7(),
            username: username.to_string(),
            password: password_hash,
        };
        self.users.insert(&user).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .find_one(&Filter::new().eq("username", username))
            .await?)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.find_one(&Filter::by_id(id)).await?)
    }

    /// Apply a new username and/or password hash in one write.
    pub async fn update_profile(
        &self,
        id: Uuid,
        username: Option<String>,
        password_hash: Option<String>,
    ) -> Result<Option<User>, AppError> {
        self.users
            .update_one(&Filter::by_id(id), |mut user| {
                if let Some(username) = username {
                    user.username = username;
                }
                if let Some(hash) = password_hash {
                    user.password = hash;
                }
                Ok::<_, AppError>(user)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn usernames_are_unique() {
        let store = UserStore::new(&Database::in_memory().await.unwrap());

        store.create("ana", "hash-1".to_string()).await.unwrap();
        let err = store.create("ana", "hash-2".to_string()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));

        let ana = store.find_by_username("ana").await.unwrap().unwrap();
        assert_eq!(ana.password, "hash-1");
        assert!(store.find_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rename_cannot_take_another_users_name() {
        let store = UserStore::new(&Database::in_memory().await.unwrap());
        let ana = store.create("ana", "h".to_string()).await.unwrap();
        store.create("bob", "h".to_string()).await.unwrap();

        let err = store
            .update_profile(ana.id, Some("bob".to_string()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));

        // Keeping one's own name is not a clash.
        let same = store
            .update_profile(ana.id, Some("ana".to_string()), Some("h2".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(same.password, "h2");
    }

    #[tokio::test]
    async fn unknown_id_updates_nothing() {
        let store = UserStore::new(&Database::in_memory().await.unwrap());
        assert!(store
            .update_profile(Uuid::now_v7(), Some("ghost".to_string()), None)
            .await
            .unwrap()
            .is_none());
    }
}
