use crate::api::{CreateRequest, CreatedLink, ResolvedLink};
use crate::error::ServiceError;
use rand::distr::Alphanumeric;
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use typed_builder::TypedBuilder;
use zipline_codec::BijectiveCodec;
use zipline_core::{
    validate, Clock, LinkRecord, LinkStore, ShortCode, StoreError, SystemClock, TargetPolicy,
    TtlClass,
};
use zipline_idpool::IdPool;

type Result<T> = std::result::Result<T, ServiceError>;

const DELETE_TOKEN_LENGTH: usize = 24;

/// Bounded retry for transient store failures.
///
/// Applied to resolve and delete only. Create is never retried
/// internally: after an ambiguous failure a retry could double-allocate,
/// so the create path guarantees rollback instead and leaves retrying to
/// the caller.
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct RetrySettings {
    /// Total attempts, the first one included.
    #[builder(default = 3)]
    pub attempts: u32,
    /// Delay before the first retry; doubles per attempt.
    #[builder(default = Duration::from_millis(50))]
    pub backoff: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Configuration for a [`LinkService`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct ServiceSettings {
    /// Public base address; short, preview, and delete URLs are built on
    /// top of it.
    #[builder(setter(into))]
    pub base_url: String,
    #[builder(default)]
    pub policy: TargetPolicy,
    #[builder(default)]
    pub retry: RetrySettings,
}

/// Orchestrates create, resolve, and delete requests.
///
/// A create request moves through validation, id acquisition, encoding,
/// and persistence; any failure after acquisition releases the id before
/// the error surfaces, so identifiers never leak.
#[derive(Debug)]
pub struct LinkService<S, C = SystemClock> {
    store: Arc<S>,
    pool: Arc<IdPool>,
    codec: BijectiveCodec,
    clock: C,
    settings: ServiceSettings,
}

impl<S: LinkStore, C: Clock> LinkService<S, C> {
    pub fn new(
        store: Arc<S>,
        pool: Arc<IdPool>,
        codec: BijectiveCodec,
        clock: C,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            store,
            pool,
            codec,
            clock,
            settings,
        }
    }

    /// Creates a short link and returns its public-facing URLs.
    pub async fn create(&self, request: CreateRequest) -> Result<CreatedLink> {
        // Validation first, including the (possibly network-bound) target
        // policy, so nothing is allocated for a request that will be
        // rejected anyway.
        let long_url = validate::normalize_target(&request.long_url)?;
        self.settings.policy.check(&long_url).await?;
        let ttl: TtlClass = request.ttl.parse()?;
        let custom = match request.custom_code.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(ShortCode::custom(raw)?),
            _ => None,
        };

        // An id is acquired even for custom codes: the record needs a
        // stable row identity, and the id becomes reusable on expiry.
        let id = self
            .pool
            .acquire()
            .map_err(|err| ServiceError::Internal(err.to_string()))?;

        let code = match custom {
            Some(code) => code,
            None => match self.codec.encode(id) {
                Ok(encoded) => ShortCode::generated(encoded),
                Err(err) => {
                    self.rollback(id);
                    return Err(ServiceError::Internal(err.to_string()));
                }
            },
        };

        let now = self.clock.now();
        let delete_token = mint_delete_token();
        let record = LinkRecord {
            id,
            code: code.clone(),
            long_url,
            created_at: now,
            expires_at: ttl.expires_at(now),
            delete_token: delete_token.clone(),
        };
        let expires_at = record.expires_at;

        if let Err(err) = self.store.put(record).await {
            self.rollback(id);
            return Err(match err {
                StoreError::CodeCollision(collided) if code.is_custom() => {
                    ServiceError::Conflict(collided)
                }
                StoreError::CodeCollision(collided) => {
                    // A generated code can only collide if allocator and
                    // store disagree about which ids are live.
                    tracing::error!(
                        code = %collided,
                        id,
                        "generated code collided with an active record"
                    );
                    ServiceError::Internal(format!(
                        "generated code {collided} collided with an active record"
                    ))
                }
                other => ServiceError::Storage(other.to_string()),
            });
        }

        let base = &self.settings.base_url;
        Ok(CreatedLink {
            short_url: code.to_url(base),
            preview_url: format!("{}/get/{code}", base.trim_end_matches('/')),
            delete_url: format!(
                "{}/api/links/{code}?token={delete_token}",
                base.trim_end_matches('/')
            ),
            delete_token,
            code: code.as_str().to_string(),
            expires_at,
        })
    }

    /// Resolves a short code to its stored target URL.
    pub async fn resolve(&self, code: &str) -> Result<ResolvedLink> {
        let record = self
            .with_retry(|| self.store.get(code))
            .await
            .map_err(|err| match err {
                StoreError::NotFound(_) | StoreError::Expired(_) => {
                    tracing::debug!(code, kind = %err, "lookup miss");
                    ServiceError::NotAvailable
                }
                other => ServiceError::Storage(other.to_string()),
            })?;
        Ok(ResolvedLink {
            long_url: record.long_url,
            expires_at: record.expires_at,
        })
    }

    /// Deletes a short link, given its deletion token.
    pub async fn delete(&self, code: &str, token: &str) -> Result<()> {
        self.with_retry(|| self.store.delete(code, token))
            .await
            .map_err(|err| match err {
                StoreError::NotFound(_) | StoreError::Expired(_) => ServiceError::NotAvailable,
                StoreError::Unauthorized(_) => ServiceError::Unauthorized,
                other => ServiceError::Storage(other.to_string()),
            })
    }

    /// Returns an id acquired by a create that did not persist.
    fn rollback(&self, id: u64) {
        if let Err(err) = self.pool.release(id) {
            tracing::error!(id, error = %err, "id release failed after aborted create");
        }
    }

    async fn with_retry<T, F, Fut>(&self, mut operation: F) -> std::result::Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, StoreError>>,
    {
        let RetrySettings { attempts, backoff } = self.settings.retry;
        let attempts = attempts.max(1);
        let mut delay = backoff;
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < attempts => {
                    tracing::warn!(attempt, error = %err, "transient store failure, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn mint_delete_token() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(DELETE_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}
