use blogproject::configuration::{ApplicationSettings, JwtSettings, Settings};
use blogproject::startup::{run, AppState};
use serde_json::{json, Value};
use std::net::TcpListener;

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub access_token: String,
}

fn test_settings() -> Settings {
    Settings {
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            log_level: "warn".to_string(),
            password_hash_cost: 4,
        },
        database: None,
        jwt: JwtSettings {
            secret: "articles-test-secret-key".to_string(),
            issuer: "blog@example.com".to_string(),
            access_token_expiry: 7200,
            refresh_token_expiry: 1_209_600,
            leeway: 0,
        },
    }
}

/// Spawn a server and sign in a fresh author
async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let state = AppState::in_memory(&test_settings()).expect("Failed to build state");
    let server = run(listener, state).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    let address = format!("http://127.0.0.1:{}", port);
    let client = reqwest::Client::new();
    let credentials = json!({ "email": "author@example.com", "password": "SecurePass123" });

    client
        .post(&format!("{}/user", address))
        .json(&credentials)
        .send()
        .await
        .expect("Failed to sign up");
    let login: Value = client
        .post(&format!("{}/login", address))
        .json(&credentials)
        .send()
        .await
        .expect("Failed to log in")
        .json()
        .await
        .expect("Failed to parse login response");

    TestApp {
        address,
        client,
        access_token: login["accessToken"].as_str().unwrap().to_string(),
    }
}

impl TestApp {
    async fn post_article(&self, body: &Value) -> reqwest::Response {
        self.client
            .post(&format!("{}/api/articles", &self.address))
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(&format!("{}{}", &self.address, path))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

#[tokio::test]
async fn article_lifecycle() {
    let app = spawn_app().await;

    let created = app
        .post_article(&json!({ "title": "First post", "content": "Hello" }))
        .await;
    assert_eq!(201, created.status().as_u16());
    let created: Value = created.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["title"], "First post");

    let listed: Value = app.get("/api/articles").await.json().await.unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let updated = app
        .client
        .put(&format!("{}/api/articles/{}", &app.address, id))
        .bearer_auth(&app.access_token)
        .json(&json!({ "title": "Edited", "content": "Hello again" }))
        .send()
        .await
        .unwrap();
    assert_eq!(200, updated.status().as_u16());

    let fetched: Value = app
        .get(&format!("/api/articles/{}", id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["title"], "Edited");
    assert_eq!(fetched["content"], "Hello again");

    let deleted = app
        .client
        .delete(&format!("{}/api/articles/{}", &app.address, id))
        .bearer_auth(&app.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(204, deleted.status().as_u16());

    let missing = app.get(&format!("/api/articles/{}", id)).await;
    assert_eq!(404, missing.status().as_u16());
}

#[tokio::test]
async fn articles_require_authentication() {
    let app = spawn_app().await;

    let list = app
        .client
        .get(&format!("{}/api/articles", &app.address))
        .send()
        .await
        .unwrap();
    let create = app
        .client
        .post(&format!("{}/api/articles", &app.address))
        .bearer_auth("invalid.token.here")
        .json(&json!({ "title": "t", "content": "c" }))
        .send()
        .await
        .unwrap();

    assert_eq!(401, list.status().as_u16());
    assert_eq!(401, create.status().as_u16());
}

#[tokio::test]
async fn invalid_article_is_rejected() {
    let app = spawn_app().await;
    let cases = [
        (json!({ "title": "", "content": "body" }), "empty title"),
        (json!({ "title": "t".repeat(256), "content": "body" }), "long title"),
        (json!({ "title": "title", "content": "" }), "empty content"),
    ];

    for (body, description) in cases {
        let response = app.post_article(&body).await;
        assert_eq!(
            400,
            response.status().as_u16(),
            "API did not fail with 400 when the payload had {}",
            description
        );
    }
}

#[tokio::test]
async fn missing_article_operations_return_404() {
    let app = spawn_app().await;

    let update = app
        .client
        .put(&format!("{}/api/articles/42", &app.address))
        .bearer_auth(&app.access_token)
        .json(&json!({ "title": "Edited", "content": "body" }))
        .send()
        .await
        .unwrap();
    let delete = app
        .client
        .delete(&format!("{}/api/articles/42", &app.address))
        .bearer_auth(&app.access_token)
        .send()
        .await
        .unwrap();

    assert_eq!(404, app.get("/api/articles/42").await.status().as_u16());
    assert_eq!(404, update.status().as_u16());
    assert_eq!(404, delete.status().as_u16());
}
