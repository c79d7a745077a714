//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::services::auth::{DeliveryContext, TokenService};
use crate::services::storage::S3Bucket;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    http: reqwest::Client,
    tokens: TokenService,
    s3: Option<S3Bucket>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: AdminConfig, pool: PgPool) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("acsess-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let tokens = TokenService::new(&config.jwt_secret);
        let s3 = config.storage.s3.as_ref().map(S3Bucket::new);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                http,
                tokens,
                s3,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Shared outbound HTTP client (Telegram).
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Product image bucket, when S3 is configured.
    #[must_use]
    pub fn s3(&self) -> Option<&S3Bucket> {
        self.inner.s3.as_ref()
    }

    /// Everything login-code delivery needs.
    #[must_use]
    pub fn delivery(&self) -> DeliveryContext<'_> {
        DeliveryContext {
            http: &self.inner.http,
            telegram: &self.inner.config.telegram,
        }
    }
}
