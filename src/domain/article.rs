use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validators::{is_valid_content, is_valid_title};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/articles`
#[derive(Debug, Clone, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
}

/// Body of `PUT /api/articles/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateArticle {
    pub title: String,
    pub content: String,
}

impl NewArticle {
    pub fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            title: is_valid_title(&self.title)?,
            content: is_valid_content(&self.content)?,
        })
    }
}

impl UpdateArticle {
    pub fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            title: is_valid_title(&self.title)?,
            content: is_valid_content(&self.content)?,
        })
    }
}

impl Article {
    pub fn apply(&mut self, changes: UpdateArticle, at: DateTime<Utc>) {
        self.title = changes.title;
        self.content = changes.content;
        self.updated_at = at;
    }
}
