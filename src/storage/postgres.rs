use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::auth::{hash_refresh_token, RefreshTokenError};
use crate::domain::{Article, NewArticle, NewUser, UpdateArticle, User};
use crate::error::DatabaseError;
use crate::storage::{ArticleStore, RefreshTokenStore, UserStore};

type ArticleRow = (i64, String, String, DateTime<Utc>, DateTime<Utc>);

fn article_from_row((id, title, content, created_at, updated_at): ArticleRow) -> Article {
    Article {
        id,
        title,
        content,
        created_at,
        updated_at,
    }
}

/// PostgreSQL backend over a shared sqlx pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded migrations in `./migrations`
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::UnexpectedError(format!("Migration failed: {}", e)))
    }
}

#[async_trait]
impl ArticleStore for PgStore {
    async fn insert_article(&self, article: NewArticle) -> Result<Article, DatabaseError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, ArticleRow>(
            r#"
            INSERT INTO articles (title, content, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            RETURNING id, title, content, created_at, updated_at
            "#,
        )
        .bind(&article.title)
        .bind(&article.content)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(article_from_row(row))
    }

    async fn find_articles(&self) -> Result<Vec<Article>, DatabaseError> {
        let rows = sqlx::query_as::<_, ArticleRow>(
            "SELECT id, title, content, created_at, updated_at FROM articles ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(article_from_row).collect())
    }

    async fn find_article(&self, id: i64) -> Result<Option<Article>, DatabaseError> {
        let row = sqlx::query_as::<_, ArticleRow>(
            "SELECT id, title, content, created_at, updated_at FROM articles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(article_from_row))
    }

    async fn update_article(
        &self,
        id: i64,
        changes: UpdateArticle,
    ) -> Result<Option<Article>, DatabaseError> {
        let row = sqlx::query_as::<_, ArticleRow>(
            r#"
            UPDATE articles
            SET title = $1, content = $2, updated_at = $3
            WHERE id = $4
            RETURNING id, title, content, created_at, updated_at
            "#,
        )
        .bind(&changes.title)
        .bind(&changes.content)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(article_from_row))
    }

    async fn delete_article(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (email, password_hash, created_at)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(User {
            id,
            email: user.email,
            password_hash: user.password_hash,
        })
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let row = sqlx::query_as::<_, (i64, String, String)>(
            "SELECT id, email, password_hash FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, email, password_hash)| User {
            id,
            email,
            password_hash,
        }))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let row = sqlx::query_as::<_, (i64, String, String)>(
            "SELECT id, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, email, password_hash)| User {
            id,
            email,
            password_hash,
        }))
    }
}

#[async_trait]
impl RefreshTokenStore for PgStore {
    async fn find_owner(&self, refresh_token: &str) -> Result<i64, RefreshTokenError> {
        let owner = sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM refresh_tokens WHERE token_hash = $1",
        )
        .bind(hash_refresh_token(refresh_token))
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        owner.ok_or(RefreshTokenError::NotFound)
    }

    async fn save_refresh_token(
        &self,
        user_id: i64,
        refresh_token: &str,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id)
            DO UPDATE SET token_hash = EXCLUDED.token_hash, created_at = EXCLUDED.created_at
            "#,
        )
        .bind(user_id)
        .bind(hash_refresh_token(refresh_token))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_refresh_token(&self, user_id: i64) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        tracing::info!(user_id = user_id, "Refresh token deleted");
        Ok(())
    }
}
