/// Article Routes
///
/// CRUD over blog articles. Every handler requires an authenticated
/// principal.

use actix_web::{web, HttpResponse};

use crate::auth::AuthenticatedPrincipal;
use crate::domain::{NewArticle, UpdateArticle};
use crate::error::{AppError, DatabaseError};
use crate::startup::AppState;

fn article_not_found(id: i64) -> AppError {
    DatabaseError::NotFound(format!("Article {} not found", id)).into()
}

/// POST /api/articles
pub async fn add_article(
    principal: AuthenticatedPrincipal,
    body: web::Json<NewArticle>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let article = body.into_inner().validate()?;
    let saved = state.articles.insert_article(article).await?;

    tracing::info!(
        user_id = principal.user_id,
        article_id = saved.id,
        "Article created"
    );
    Ok(HttpResponse::Created().json(saved))
}

/// GET /api/articles
pub async fn find_all_articles(
    _principal: AuthenticatedPrincipal,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let articles = state.articles.find_articles().await?;
    Ok(HttpResponse::Ok().json(articles))
}

/// GET /api/articles/{id}
pub async fn find_article(
    _principal: AuthenticatedPrincipal,
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let article = state
        .articles
        .find_article(id)
        .await?
        .ok_or_else(|| article_not_found(id))?;

    Ok(HttpResponse::Ok().json(article))
}

/// PUT /api/articles/{id}
pub async fn update_article(
    principal: AuthenticatedPrincipal,
    path: web::Path<i64>,
    body: web::Json<UpdateArticle>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let changes = body.into_inner().validate()?;
    let article = state
        .articles
        .update_article(id, changes)
        .await?
        .ok_or_else(|| article_not_found(id))?;

    tracing::info!(user_id = principal.user_id, article_id = id, "Article updated");
    Ok(HttpResponse::Ok().json(article))
}

/// DELETE /api/articles/{id}
pub async fn delete_article(
    principal: AuthenticatedPrincipal,
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    if !state.articles.delete_article(id).await? {
        return Err(article_not_found(id));
    }

    tracing::info!(user_id = principal.user_id, article_id = id, "Article deleted");
    Ok(HttpResponse::NoContent().finish())
}
