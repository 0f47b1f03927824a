//! Request pipeline: typed dispatch plus cross-cutting behaviors.
//!
//! Every command and query flows through a fixed behavior sequence around
//! its handler:
//!
//! ```text
//! validation -> tenant stamping -> logging/timing -> cache read (queries)
//!   -> handler -> cache invalidation (commands)
//! ```
//!
//! Dispatch is resolved at compile time: [`AppState`](crate::state::AppState)
//! implements [`Handler<R>`] for each request type, so there is no runtime
//! registry and no reflection. The caller's identity travels as an explicit
//! [`RequestContext`] value, never as ambient state.

use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;
use validator::Validate;

use slotwise_core::{TenantId, UserId, UserRole};

use crate::cache::QueryCache;
use crate::error::AppError;

/// Requests slower than this are logged at WARN with their elapsed time.
const SLOW_REQUEST: Duration = Duration::from_millis(500);

// =============================================================================
// Request context
// =============================================================================

/// Identity of the authenticated caller.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated {
    pub user_id: UserId,
    pub tenant_id: TenantId,
    pub role: UserRole,
}

/// Per-request caller context, resolved once from the bearer token and
/// passed explicitly through dispatch and handlers.
#[derive(Debug, Clone)]
pub struct RequestContext {
    auth: Option<Authenticated>,
}

impl RequestContext {
    /// Context for a caller with no resolvable identity.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { auth: None }
    }

    /// Context for an authenticated dashboard user.
    #[must_use]
    pub const fn authenticated(user_id: UserId, tenant_id: TenantId, role: UserRole) -> Self {
        Self {
            auth: Some(Authenticated {
                user_id,
                tenant_id,
                role,
            }),
        }
    }

    /// The caller's tenant, or Unauthorized for anonymous callers.
    ///
    /// Tenant-scoped requests reaching the pipeline without a tenant fail
    /// here, before any handler or repository runs.
    pub fn require_tenant(&self) -> Result<TenantId, AppError> {
        self.auth.map(|a| a.tenant_id).ok_or_else(|| {
            AppError::Unauthorized("authentication required for tenant-scoped requests".to_string())
        })
    }

    /// Fails with Forbidden unless the caller holds the given role.
    pub fn require_role(&self, role: UserRole) -> Result<(), AppError> {
        match self.auth {
            Some(a) if a.role == role => Ok(()),
            Some(_) => Err(AppError::Forbidden(format!("requires {role} role"))),
            None => Err(AppError::Unauthorized("authentication required".to_string())),
        }
    }

    /// The acting user, if any, for audit stamping.
    #[must_use]
    pub fn actor(&self) -> Option<UserId> {
        self.auth.map(|a| a.user_id)
    }

    /// Full identity, if authenticated.
    #[must_use]
    pub const fn auth(&self) -> Option<Authenticated> {
        self.auth
    }
}

// =============================================================================
// Request traits
// =============================================================================

/// Common surface of commands and queries.
///
/// `stamp_tenant` is a no-op by default; tenant-scoped requests override it
/// to overwrite their tenant field with the context's value, unconditionally.
/// That overwrite is the request-level tenant-isolation enforcement point:
/// whatever the caller put in the field is discarded.
pub trait Request: Validate + Send {
    /// Stable name used in logs.
    const NAME: &'static str;

    /// Whether the request requires an authenticated tenant context.
    const TENANT_SCOPED: bool = true;

    /// Handler result type.
    type Output: Send;

    /// Overwrite the request's tenant id from the caller context.
    fn stamp_tenant(&mut self, _tenant: TenantId) {}
}

/// Cache policy declared by a cacheable query.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    /// Deterministic key built from the query's own fields.
    pub key: String,
    /// Entry lifetime; `None` uses the cache-wide default.
    pub ttl: Option<Duration>,
    /// When true, skip the cache read but still refresh the entry.
    pub bypass: bool,
}

impl CachePolicy {
    /// Policy with the default TTL and no bypass.
    #[must_use]
    pub const fn new(key: String) -> Self {
        Self {
            key,
            ttl: None,
            bypass: false,
        }
    }

    /// Declare an explicit entry lifetime.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Request a fresh read (entry still refreshed on completion).
    #[must_use]
    pub const fn bypass_if(mut self, bypass: bool) -> Self {
        self.bypass = bypass;
        self
    }
}

/// Cache entries a command purges after it succeeds.
#[derive(Debug, Clone, Default)]
pub struct Invalidation {
    /// Exact key to remove.
    pub key: Option<String>,
    /// Substring patterns; every stored key containing one is removed.
    pub patterns: Vec<String>,
}

impl Invalidation {
    /// Nothing to purge.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Purge all keys containing `pattern`.
    #[must_use]
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self {
            key: None,
            patterns: vec![pattern.into()],
        }
    }

    /// Purge all keys containing any of `patterns`.
    #[must_use]
    pub fn patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: None,
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// Additionally purge one exact key.
    #[must_use]
    pub fn and_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    fn is_empty(&self) -> bool {
        self.key.is_none() && self.patterns.is_empty()
    }
}

/// A read request. Declares an optional cache policy.
pub trait Query: Request {
    /// Cache policy, or `None` for uncached queries.
    fn cache_policy(&self) -> Option<CachePolicy> {
        None
    }
}

/// A write request. Declares the cache entries it invalidates on success.
pub trait Command: Request {
    /// Entries to purge after the handler succeeds.
    fn invalidation(&self) -> Invalidation {
        Invalidation::none()
    }
}

/// Handler for one request type. Implemented by `AppState` per request.
#[allow(async_fn_in_trait)]
pub trait Handler<R: Request> {
    async fn handle(&self, ctx: &RequestContext, request: R) -> Result<R::Output, AppError>;
}

/// State surface the dispatch functions need besides the handler itself.
pub trait PipelineState {
    fn cache(&self) -> &QueryCache;
}

// =============================================================================
// Behaviors
// =============================================================================

/// Run the request's validators, aggregating failures into one error.
fn run_validation<R: Request>(request: &R) -> Result<(), AppError> {
    request.validate().map_err(|errors| {
        let mut messages = Vec::new();
        collect_messages("", &errors, &mut messages);
        messages.sort();
        AppError::Validation(messages)
    })
}

/// Flatten a (possibly nested) validation error tree into `path: message`
/// strings.
fn collect_messages(prefix: &str, errors: &validator::ValidationErrors, out: &mut Vec<String>) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(errs) => {
                for e in errs {
                    let detail = e
                        .message
                        .as_ref()
                        .map_or_else(|| e.code.to_string(), ToString::to_string);
                    out.push(format!("{path}: {detail}"));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_messages(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_messages(&format!("{path}[{index}]"), nested, out);
                }
            }
        }
    }
}

/// Stamp the tenant from context onto a tenant-scoped request.
fn stamp<R: Request>(ctx: &RequestContext, request: &mut R) -> Result<(), AppError> {
    if R::TENANT_SCOPED {
        request.stamp_tenant(ctx.require_tenant()?);
    }
    Ok(())
}

fn log_elapsed(name: &str, started: Instant) {
    let elapsed = started.elapsed();
    if elapsed > SLOW_REQUEST {
        tracing::warn!(request = name, elapsed_ms = elapsed.as_millis(), "slow request");
    } else {
        tracing::debug!(request = name, elapsed_ms = elapsed.as_millis(), "request completed");
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Dispatch a query through the behavior chain.
///
/// On a cache hit the handler never runs; on a miss the serialized result is
/// stored with the declared TTL. Concurrent misses for the same key each run
/// the handler (no single-flight).
///
/// # Errors
///
/// Validation, authorization, handler, and repository failures propagate as
/// [`AppError`].
pub async fn dispatch_query<S, Q>(
    state: &S,
    ctx: &RequestContext,
    mut query: Q,
) -> Result<Q::Output, AppError>
where
    S: PipelineState + Handler<Q>,
    Q: Query,
    Q::Output: Serialize + DeserializeOwned,
{
    run_validation(&query)?;
    stamp(ctx, &mut query)?;

    let started = Instant::now();
    tracing::debug!(request = Q::NAME, "dispatching query");

    // Policy is computed after stamping so keys reflect the caller's tenant.
    let Some(policy) = query.cache_policy() else {
        let output = state.handle(ctx, query).await?;
        log_elapsed(Q::NAME, started);
        return Ok(output);
    };

    if !policy.bypass
        && let Some(cached) = state.cache().get(&policy.key).await
    {
        match serde_json::from_str(&cached) {
            Ok(output) => {
                tracing::debug!(request = Q::NAME, key = %policy.key, "cache hit");
                log_elapsed(Q::NAME, started);
                return Ok(output);
            }
            Err(error) => {
                // Entry written by an older shape of this query; drop and recompute.
                tracing::warn!(request = Q::NAME, key = %policy.key, %error, "evicting undecodable cache entry");
                state.cache().remove(&policy.key).await;
            }
        }
    }

    let output = state.handle(ctx, query).await?;

    match serde_json::to_string(&output) {
        Ok(payload) => state.cache().insert(policy.key, payload, policy.ttl).await,
        Err(error) => {
            tracing::warn!(request = Q::NAME, %error, "failed to serialize result for caching");
        }
    }

    log_elapsed(Q::NAME, started);
    Ok(output)
}

/// Dispatch a command through the behavior chain.
///
/// Declared cache entries are purged only after the handler succeeds.
///
/// # Errors
///
/// Validation, authorization, handler, and repository failures propagate as
/// [`AppError`].
pub async fn dispatch_command<S, C>(
    state: &S,
    ctx: &RequestContext,
    mut command: C,
) -> Result<C::Output, AppError>
where
    S: PipelineState + Handler<C>,
    C: Command,
{
    run_validation(&command)?;
    stamp(ctx, &mut command)?;

    let invalidation = command.invalidation();

    let started = Instant::now();
    tracing::debug!(request = C::NAME, "dispatching command");

    let output = state.handle(ctx, command).await?;

    if !invalidation.is_empty() {
        if let Some(key) = &invalidation.key {
            state.cache().remove(key).await;
        }
        for pattern in &invalidation.patterns {
            state.cache().remove_matching(pattern);
        }
        tracing::debug!(request = C::NAME, "cache invalidated");
    }

    log_elapsed(C::NAME, started);
    Ok(output)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use validator::Validate;

    use super::*;

    struct TestState {
        cache: QueryCache,
        calls: AtomicUsize,
        seen_tenants: Mutex<Vec<TenantId>>,
        fail: bool,
    }

    impl TestState {
        fn new() -> Self {
            Self {
                cache: QueryCache::new(Duration::from_secs(60)),
                calls: AtomicUsize::new(0),
                seen_tenants: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PipelineState for TestState {
        fn cache(&self) -> &QueryCache {
            &self.cache
        }
    }

    #[derive(Debug, Validate)]
    struct ListThings {
        tenant_id: TenantId,
        #[validate(length(min = 1, message = "must not be empty"))]
        term: String,
        bypass: bool,
    }

    impl Request for ListThings {
        const NAME: &'static str = "ListThings";
        type Output = Vec<String>;

        fn stamp_tenant(&mut self, tenant: TenantId) {
            self.tenant_id = tenant;
        }
    }

    impl Query for ListThings {
        fn cache_policy(&self) -> Option<CachePolicy> {
            Some(
                CachePolicy::new(format!("things_list_t{}_q{}", self.tenant_id, self.term))
                    .bypass_if(self.bypass),
            )
        }
    }

    impl Handler<ListThings> for TestState {
        async fn handle(
            &self,
            _ctx: &RequestContext,
            request: ListThings,
        ) -> Result<Vec<String>, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_tenants.lock().unwrap().push(request.tenant_id);
            Ok(vec![request.term])
        }
    }

    #[derive(Debug, Validate)]
    struct RenameThing {
        tenant_id: TenantId,
        #[validate(length(min = 1))]
        name: String,
    }

    impl Request for RenameThing {
        const NAME: &'static str = "RenameThing";
        type Output = ();

        fn stamp_tenant(&mut self, tenant: TenantId) {
            self.tenant_id = tenant;
        }
    }

    impl Command for RenameThing {
        fn invalidation(&self) -> Invalidation {
            Invalidation::pattern(format!("things_list_t{}", self.tenant_id))
        }
    }

    impl Handler<RenameThing> for TestState {
        async fn handle(&self, _ctx: &RequestContext, _request: RenameThing) -> Result<(), AppError> {
            if self.fail {
                return Err(AppError::BusinessRule("nope".to_string()));
            }
            Ok(())
        }
    }

    fn ctx_for(tenant: TenantId) -> RequestContext {
        RequestContext::authenticated(UserId::generate(), tenant, UserRole::Owner)
    }

    fn list(tenant: TenantId) -> ListThings {
        ListThings {
            tenant_id: tenant,
            term: "x".to_string(),
            bypass: false,
        }
    }

    #[tokio::test]
    async fn test_validation_short_circuits_before_handler() {
        let state = TestState::new();
        let ctx = ctx_for(TenantId::generate());
        let query = ListThings {
            tenant_id: TenantId::generate(),
            term: String::new(),
            bypass: false,
        };

        let err = dispatch_query(&state, &ctx, query).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msgs) if msgs[0].contains("term")));
        assert_eq!(state.calls(), 0);
    }

    #[tokio::test]
    async fn test_stamping_overwrites_caller_tenant() {
        let state = TestState::new();
        let real_tenant = TenantId::generate();
        let forged_tenant = TenantId::generate();
        let ctx = ctx_for(real_tenant);

        dispatch_query(&state, &ctx, list(forged_tenant)).await.unwrap();

        let seen = state.seen_tenants.lock().unwrap();
        assert_eq!(seen.as_slice(), &[real_tenant]);
    }

    #[tokio::test]
    async fn test_anonymous_scoped_request_is_unauthorized() {
        let state = TestState::new();
        let ctx = RequestContext::anonymous();

        let err = dispatch_query(&state, &ctx, list(TenantId::generate()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert_eq!(state.calls(), 0);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_handler() {
        let state = TestState::new();
        let tenant = TenantId::generate();
        let ctx = ctx_for(tenant);

        let first = dispatch_query(&state, &ctx, list(tenant)).await.unwrap();
        let second = dispatch_query(&state, &ctx, list(tenant)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(state.calls(), 1);
    }

    #[tokio::test]
    async fn test_bypass_reaches_handler_and_refreshes() {
        let state = TestState::new();
        let tenant = TenantId::generate();
        let ctx = ctx_for(tenant);

        dispatch_query(&state, &ctx, list(tenant)).await.unwrap();

        let mut bypassing = list(tenant);
        bypassing.bypass = true;
        dispatch_query(&state, &ctx, bypassing).await.unwrap();

        assert_eq!(state.calls(), 2);
    }

    #[tokio::test]
    async fn test_command_invalidates_matching_queries() {
        let state = TestState::new();
        let tenant = TenantId::generate();
        let ctx = ctx_for(tenant);

        dispatch_query(&state, &ctx, list(tenant)).await.unwrap();
        assert_eq!(state.calls(), 1);

        let command = RenameThing {
            tenant_id: tenant,
            name: "renamed".to_string(),
        };
        dispatch_command(&state, &ctx, command).await.unwrap();

        dispatch_query(&state, &ctx, list(tenant)).await.unwrap();
        assert_eq!(state.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_command_leaves_cache_intact() {
        let mut state = TestState::new();
        state.fail = true;
        let tenant = TenantId::generate();
        let ctx = ctx_for(tenant);

        dispatch_query(&state, &ctx, list(tenant)).await.unwrap();

        let command = RenameThing {
            tenant_id: tenant,
            name: "renamed".to_string(),
        };
        let err = dispatch_command(&state, &ctx, command).await.unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));

        dispatch_query(&state, &ctx, list(tenant)).await.unwrap();
        assert_eq!(state.calls(), 1);
    }

    #[test]
    fn test_require_role() {
        let ctx = RequestContext::authenticated(
            UserId::generate(),
            TenantId::generate(),
            UserRole::Staff,
        );
        assert!(ctx.require_role(UserRole::Staff).is_ok());
        assert!(matches!(
            ctx.require_role(UserRole::Owner),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            RequestContext::anonymous().require_role(UserRole::Owner),
            Err(AppError::Unauthorized(_))
        ));
    }
}
