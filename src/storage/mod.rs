/// Persistence layer
///
/// Repository traits consumed by the routes and the token service, with an
/// in-process backend and a PostgreSQL backend. Lookups are single reads;
/// concurrency control belongs to the backend.

mod memory;
mod postgres;

use async_trait::async_trait;

use crate::auth::RefreshTokenError;
use crate::domain::{Article, NewArticle, NewUser, UpdateArticle, User};
use crate::error::DatabaseError;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn insert_article(&self, article: NewArticle) -> Result<Article, DatabaseError>;
    async fn find_articles(&self) -> Result<Vec<Article>, DatabaseError>;
    async fn find_article(&self, id: i64) -> Result<Option<Article>, DatabaseError>;
    /// `None` when no article has this id
    async fn update_article(
        &self,
        id: i64,
        changes: UpdateArticle,
    ) -> Result<Option<Article>, DatabaseError>;
    /// `false` when no article has this id
    async fn delete_article(&self, id: i64) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `UniqueConstraintViolation` if the email is taken
    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError>;
    async fn find_user(&self, id: i64) -> Result<Option<User>, DatabaseError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;
}

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Recover the user a refresh token was issued to.
    async fn find_owner(&self, refresh_token: &str) -> Result<i64, RefreshTokenError>;
    /// Record the user's refresh token, replacing any previous one.
    async fn save_refresh_token(&self, user_id: i64, refresh_token: &str)
        -> Result<(), DatabaseError>;
    async fn delete_refresh_token(&self, user_id: i64) -> Result<(), DatabaseError>;
}

/// Everything the service persists, behind one backend.
pub trait Store: ArticleStore + UserStore + RefreshTokenStore {}

impl<T: ArticleStore + UserStore + RefreshTokenStore> Store for T {}
