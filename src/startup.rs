use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{SigningKey, TokenIssuer, TokenService, TokenSigner, TokenValidator};
use crate::configuration::{DatabaseSettings, JwtSettings, Settings};
use crate::error::{AppError, ConfigError};
use crate::middleware::{JwtMiddleware, RequestLogger};
use crate::routes::{
    add_article, create_new_access_token, current_user, delete_article, find_all_articles,
    find_article, health_check, login, logout, signup, update_article,
};
use crate::storage::{
    ArticleStore, InMemoryStore, PgStore, RefreshTokenStore, Store, UserStore,
};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub articles: Arc<dyn ArticleStore>,
    pub users: Arc<dyn UserStore>,
    pub refresh_tokens: Arc<dyn RefreshTokenStore>,
    pub issuer: TokenIssuer,
    pub validator: TokenValidator,
    pub tokens: TokenService,
    pub jwt: JwtSettings,
    pub password_hash_cost: u32,
}

impl AppState {
    /// Wire the token machinery to a storage backend.
    ///
    /// Fails if the signing secret is unusable.
    pub fn new<S: Store + 'static>(settings: &Settings, store: Arc<S>) -> Result<Self, ConfigError> {
        let jwt = settings.jwt.clone();
        let signer = TokenSigner::new(Arc::new(SigningKey::new(&jwt.secret)?));
        let issuer = TokenIssuer::new(jwt.issuer.clone(), signer.clone());
        let validator = TokenValidator::new(jwt.issuer.clone(), signer, jwt.leeway);

        let articles: Arc<dyn ArticleStore> = store.clone();
        let users: Arc<dyn UserStore> = store.clone();
        let refresh_tokens: Arc<dyn RefreshTokenStore> = store;

        let tokens = TokenService::new(
            issuer.clone(),
            validator.clone(),
            refresh_tokens.clone(),
            users.clone(),
            jwt.access_token_ttl(),
        );

        Ok(Self {
            articles,
            users,
            refresh_tokens,
            issuer,
            validator,
            tokens,
            jwt,
            password_hash_cost: settings.application.password_hash_cost,
        })
    }

    pub fn in_memory(settings: &Settings) -> Result<Self, ConfigError> {
        Self::new(settings, Arc::new(InMemoryStore::new()))
    }
}

pub fn run(listener: TcpListener, state: AppState) -> Result<Server, std::io::Error> {
    let validator = state.validator.clone();
    let state = web::Data::new(state);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(JwtMiddleware::new(validator.clone()))
            .wrap(RequestLogger)
            .app_data(state.clone())
            // Public
            .route("/health_check", web::get().to(health_check))
            .route("/user", web::post().to(signup))
            .route("/login", web::post().to(login))
            .route("/api/token", web::post().to(create_new_access_token))
            // Principal required
            .route("/logout", web::post().to(logout))
            .route("/api/me", web::get().to(current_user))
            .service(
                web::scope("/api/articles")
                    .route("", web::post().to(add_article))
                    .route("", web::get().to(find_all_articles))
                    .route("/{id}", web::get().to(find_article))
                    .route("/{id}", web::put().to(update_article))
                    .route("/{id}", web::delete().to(delete_article)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}

/// A bound, not yet running server
pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    /// Pick the storage backend, bind the listener and build the server.
    ///
    /// PostgreSQL is used when `database` is configured, with migrations
    /// applied before the first request. Otherwise state lives in memory.
    pub async fn build(settings: Settings) -> Result<Self, AppError> {
        let state = match &settings.database {
            Some(database) => {
                let store = connect(database).await?;
                AppState::new(&settings, Arc::new(store))?
            }
            None => {
                tracing::warn!("No database configured, using the in-memory store");
                AppState::in_memory(&settings)?
            }
        };

        let address = format!("{}:{}", settings.application.host, settings.application.port);
        let listener = TcpListener::bind(&address)
            .map_err(|e| AppError::Internal(format!("Failed to bind {}: {}", address, e)))?;
        let port = listener
            .local_addr()
            .map_err(|e| AppError::Internal(format!("Failed to read local address: {}", e)))?
            .port();
        tracing::info!(address = %address, port = port, "Server listening");

        let server = run(listener, state)
            .map_err(|e| AppError::Internal(format!("Failed to start server: {}", e)))?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

async fn connect(database: &DatabaseSettings) -> Result<PgStore, AppError> {
    tracing::info!(
        host = %database.host,
        database = %database.database_name,
        "Connecting to database"
    );
    let pool = PgPoolOptions::new()
        .max_connections(database.max_connections)
        .connect(&database.connection_string())
        .await?;

    let store = PgStore::new(pool);
    store.migrate().await?;
    tracing::info!("Database migrations applied");
    Ok(store)
}
