use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        let unique_violation = e
            .as_database_error()
            .map(|db| db.is_unique_violation())
            .unwrap_or(false);
        if unique_violation {
            StoreError::DuplicateEmail
        } else {
            StoreError::Other(e.into())
        }
    }
}

/// Durable account storage. Email uniqueness is enforced here, not by callers.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Inserts a user; `StoreError::DuplicateEmail` if the email is taken.
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// Writes name, phone number, address and password hash in one statement.
    /// Returns `None` if the row no longer exists.
    async fn update(&self, user: &User) -> Result<Option<User>, StoreError>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, phone_number, address, role,
                   created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, phone_number, address, role,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash, phone_number, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, email, password_hash, phone_number, address, role,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.phone_number)
        .bind(new_user.role.as_str())
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<Option<User>, StoreError> {
        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $2, phone_number = $3, address = $4, password_hash = $5,
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, email, password_hash, phone_number, address, role,
                      created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.phone_number)
        .bind(&user.address)
        .bind(&user.password_hash)
        .fetch_optional(&self.db)
        .await?;
        Ok(updated)
    }
}

#[cfg(test)]
pub use memory::MemoryUserRepo;

#[cfg(test)]
mod memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::{StoreError, UserRepo};
    use crate::auth::repo_types::{NewUser, User};

    /// In-process store with the same uniqueness rule as the `users` table.
    #[derive(Default)]
    pub struct MemoryUserRepo {
        users: Mutex<HashMap<Uuid, User>>,
    }

    impl MemoryUserRepo {
        pub fn len(&self) -> usize {
            self.users.lock().unwrap().len()
        }

        pub fn get(&self, id: Uuid) -> Option<User> {
            self.users.lock().unwrap().get(&id).cloned()
        }
    }

    #[async_trait]
    impl UserRepo for MemoryUserRepo {
        async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
            let users = self.users.lock().unwrap();
            Ok(users.values().find(|u| u.email == email).cloned())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
            Ok(self.get(id))
        }

        async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
            let mut users = self.users.lock().unwrap();
            if users.values().any(|u| u.email == new_user.email) {
                return Err(StoreError::DuplicateEmail);
            }
            let now = OffsetDateTime::now_utc();
            let user = User {
                id: Uuid::new_v4(),
                name: new_user.name,
                email: new_user.email,
                password_hash: new_user.password_hash,
                phone_number: new_user.phone_number,
                address: None,
                role: new_user.role,
                created_at: now,
                updated_at: now,
            };
            users.insert(user.id, user.clone());
            Ok(user)
        }

        async fn update(&self, user: &User) -> Result<Option<User>, StoreError> {
            let mut users = self.users.lock().unwrap();
            let Some(stored) = users.get_mut(&user.id) else {
                return Ok(None);
            };
            stored.name = user.name.clone();
            stored.phone_number = user.phone_number.clone();
            stored.address = user.address.clone();
            stored.password_hash = user.password_hash.clone();
            stored.updated_at = OffsetDateTime::now_utc();
            Ok(Some(stored.clone()))
        }
    }
}
