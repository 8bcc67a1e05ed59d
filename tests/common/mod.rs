use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

use pfe_track::clock::Clock;
use pfe_track::create_app_with_clock;
use pfe_track::jwt::JwtConfig;
use pfe_track::models::user::Role;

const BODY_LIMIT: usize = 10_485_760;

/// All tests run against this frozen instant so date-sensitive behavior
/// (overdue views, completion stamping) is reproducible.
pub fn frozen_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
}

pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    pub jwt: JwtConfig,
    // Keeps the database file alive for the duration of the test.
    _dir: TempDir,
}

pub async fn spawn_app() -> Result<TestApp> {
    let dir = tempfile::tempdir().context("failed to create tempdir")?;
    let db_path = dir.path().join("test.db");

    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"),
    )
    .await?;
    migrator.run(&pool).await?;

    let jwt = JwtConfig {
        secret: Arc::new(b"test-secret".to_vec()),
        exp_hours: 24,
    };

    let app = create_app_with_clock(pool.clone(), jwt.clone(), Clock::fixed(frozen_now()));

    Ok(TestApp {
        app,
        pool,
        jwt,
        _dir: dir,
    })
}

impl TestApp {
    /// Inserts a user directly, bypassing the register endpoint so tests
    /// can mint professor and admin accounts.
    pub async fn insert_user(&self, name: &str, email: &str, role: Role) -> Result<Uuid> {
        let user_id = Uuid::new_v4();
        let now = frozen_now();
        let password_hash = pfe_track::utils::hash_password("password123")
            .map_err(|err| anyhow::anyhow!("hashing failed: {err}"))?;

        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(name)
        .bind(email)
        .bind(&password_hash)
        .bind(role.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(user_id)
    }

    pub fn token_for(&self, user_id: Uuid, role: Role) -> Result<String> {
        self.jwt
            .encode(user_id, role)
            .map_err(|err| anyhow::anyhow!("token minting failed: {err}"))
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.app.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), BODY_LIMIT).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .with_context(|| format!("non-JSON body: {}", String::from_utf8_lossy(&bytes)))?
        };

        Ok((status, value))
    }

    pub async fn get(&self, uri: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.request("GET", uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.request("POST", uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.request("PUT", uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.request("PATCH", uri, Some(token), None).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.request("DELETE", uri, Some(token), None).await
    }
}

/// Convenience: a student with a token, ready to call the API.
pub async fn student(app: &TestApp, name: &str, email: &str) -> Result<(Uuid, String)> {
    let id = app.insert_user(name, email, Role::Student).await?;
    let token = app.token_for(id, Role::Student)?;
    Ok((id, token))
}

pub async fn professor(app: &TestApp, name: &str, email: &str) -> Result<(Uuid, String)> {
    let id = app.insert_user(name, email, Role::Professor).await?;
    let token = app.token_for(id, Role::Professor)?;
    Ok((id, token))
}

pub async fn admin(app: &TestApp, name: &str, email: &str) -> Result<(Uuid, String)> {
    let id = app.insert_user(name, email, Role::Admin).await?;
    let token = app.token_for(id, Role::Admin)?;
    Ok((id, token))
}
