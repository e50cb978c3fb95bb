use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::auth::{hash_refresh_token, RefreshTokenError};
use crate::domain::{Article, NewArticle, NewUser, UpdateArticle, User};
use crate::error::DatabaseError;
use crate::storage::{ArticleStore, RefreshTokenStore, UserStore};

#[derive(Default)]
struct Tables {
    articles: BTreeMap<i64, Article>,
    users: BTreeMap<i64, User>,
    // token hash -> user id
    refresh_tokens: HashMap<String, i64>,
    // user id -> token hash
    refresh_token_by_user: HashMap<i64, String>,
    article_seq: i64,
    user_seq: i64,
}

impl Tables {
    fn next_article_id(&mut self) -> i64 {
        self.article_seq += 1;
        self.article_seq
    }

    fn next_user_id(&mut self) -> i64 {
        self.user_seq += 1;
        self.user_seq
    }
}

/// Process-local store used when no database is configured, and by tests.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleStore for InMemoryStore {
    async fn insert_article(&self, article: NewArticle) -> Result<Article, DatabaseError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let article = Article {
            id: tables.next_article_id(),
            title: article.title,
            content: article.content,
            created_at: now,
            updated_at: now,
        };
        tables.articles.insert(article.id, article.clone());
        Ok(article)
    }

    async fn find_articles(&self) -> Result<Vec<Article>, DatabaseError> {
        Ok(self.tables.read().await.articles.values().cloned().collect())
    }

    async fn find_article(&self, id: i64) -> Result<Option<Article>, DatabaseError> {
        Ok(self.tables.read().await.articles.get(&id).cloned())
    }

    async fn update_article(
        &self,
        id: i64,
        changes: UpdateArticle,
    ) -> Result<Option<Article>, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(tables.articles.get_mut(&id).map(|article| {
            article.apply(changes, Utc::now());
            article.clone()
        }))
    }

    async fn delete_article(&self, id: i64) -> Result<bool, DatabaseError> {
        Ok(self.tables.write().await.articles.remove(&id).is_some())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "Email already registered".to_string(),
            ));
        }

        let user = User {
            id: tables.next_user_id(),
            email: user.email,
            password_hash: user.password_hash,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryStore {
    async fn find_owner(&self, refresh_token: &str) -> Result<i64, RefreshTokenError> {
        let token_hash = hash_refresh_token(refresh_token);
        self.tables
            .read()
            .await
            .refresh_tokens
            .get(&token_hash)
            .copied()
            .ok_or(RefreshTokenError::NotFound)
    }

    async fn save_refresh_token(
        &self,
        user_id: i64,
        refresh_token: &str,
    ) -> Result<(), DatabaseError> {
        let token_hash = hash_refresh_token(refresh_token);
        let mut tables = self.tables.write().await;
        if let Some(previous) = tables.refresh_token_by_user.insert(user_id, token_hash.clone()) {
            tables.refresh_tokens.remove(&previous);
        }
        tables.refresh_tokens.insert(token_hash, user_id);
        Ok(())
    }

    async fn delete_refresh_token(&self, user_id: i64) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if let Some(token_hash) = tables.refresh_token_by_user.remove(&user_id) {
            tables.refresh_tokens.remove(&token_hash);
        }
        Ok(())
    }
}
