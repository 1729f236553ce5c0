//! Cached reads: deliver the cached copy first, reconcile with the fresh one after.

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::future::Future;

use crate::cache::{CacheLookup, JsonCache, Reconciliation};
use crate::entry::to_document;
use crate::error::CacheError;

/// A fetch with its output and error types erased, see [`CachedFetch::boxed`].
pub type BoxedFetch<'a> = BoxFuture<'a, Result<Value, Box<dyn Error + Send + Sync>>>;

/// A fetched value that could not be turned into JSON.
#[derive(Debug, thiserror::Error)]
#[error("Serialization failed: {0}")]
struct Unserializable(serde_json::Error);

/// A pending fetch paired with the key its result is cached under.
///
/// The fetch is any future producing the fresh value or the caller's error.
/// [`cached`](CachedFetch::cached) consumes the instance, so each cached read
/// runs exactly once.
///
/// # Example
/// ```ignore
/// let outcome = cache
///     .fetch("user:123", async { client.get_user(123).await })
///     .cached(|lookup| async move {
///         if let Some(user) = lookup.document() {
///             render(user);
///         }
///     })
///     .await?;
///
/// if let Some(user) = outcome.document() {
///     render(user);
/// }
/// ```
pub struct CachedFetch<F> {
    cache: JsonCache,
    key: String,
    fetch: F,
}

impl<F> CachedFetch<F> {
    /// Pair `fetch` with `key` in `cache`.
    pub fn new(cache: &JsonCache, key: impl Into<String>, fetch: F) -> Self {
        CachedFetch {
            cache: cache.clone(),
            key: key.into(),
            fetch,
        }
    }

    /// The cache key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Group cached fetches so their cached copies are delivered together.
    ///
    /// Every member shares one fetch type. To batch different sources, erase
    /// them first with [`boxed`](CachedFetch::boxed):
    ///
    /// ```ignore
    /// let batch = CachedFetch::all(vec![
    ///     cache.fetch("user:1", get_user(1)).boxed(),
    ///     cache.fetch("article:7", get_article(7)).boxed(),
    /// ])?;
    /// ```
    ///
    /// Fails immediately when `fetches` is empty.
    pub fn all(fetches: Vec<CachedFetch<F>>) -> Result<CachedBatch<F>, CacheError> {
        if fetches.is_empty() {
            return Err(CacheError::InvalidBatchInput(
                "required a non-empty collection of cached fetches".to_string(),
            ));
        }
        Ok(CachedBatch { fetches })
    }

    /// Erase the fetch type so fetches of different sources fit one batch.
    ///
    /// The fetched value is converted to JSON when it arrives; the caller's
    /// error is boxed unchanged.
    pub fn boxed<'a, T, E>(self) -> CachedFetch<BoxedFetch<'a>>
    where
        F: Future<Output = Result<T, E>> + Send + 'a,
        T: Serialize + Send + 'a,
        E: Into<Box<dyn Error + Send + Sync>> + Send + 'a,
    {
        let CachedFetch { cache, key, fetch } = self;
        let fetch = async move {
            let value = fetch
                .await
                .map_err(Into::<Box<dyn Error + Send + Sync>>::into)?;
            let value = serde_json::to_value(&value).map_err(Unserializable)?;
            Ok::<_, Box<dyn Error + Send + Sync>>(value)
        }
        .boxed();

        CachedFetch { cache, key, fetch }
    }
}

impl<F, T, E> CachedFetch<F>
where
    F: Future<Output = Result<T, E>>,
    T: Serialize,
    E: Into<Box<dyn Error + Send + Sync>>,
{
    /// Deliver the cached copy to `on_cache`, then reconcile the fetched value.
    ///
    /// The fetch is polled alongside the lookup, but reconciliation only starts
    /// once the future returned by `on_cache` has completed. A failed fetch is
    /// returned as [`CacheError::Fetch`] wrapping the caller's error.
    pub async fn cached<C, Fut>(self, on_cache: C) -> Result<Reconciliation, CacheError>
    where
        C: FnOnce(CacheLookup) -> Fut,
        Fut: Future<Output = ()>,
    {
        let CachedFetch { cache, key, fetch } = self;

        let delivered = async {
            let lookup = cache.find(&key).await;
            tracing::debug!("Delivering cached json: key={}, hit={}", key, lookup.is_hit());
            on_cache(lookup).await;
        };

        let ((), fetched) = futures::join!(delivered, fetch);
        reconcile(&cache, &key, fetched).await
    }
}

/// A non-empty, ordered group of [`CachedFetch`]es.
///
/// Built with [`CachedFetch::all`].
pub struct CachedBatch<F> {
    fetches: Vec<CachedFetch<F>>,
}

impl<F> CachedBatch<F> {
    /// Keys in delivery order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fetches.iter().map(CachedFetch::key)
    }

    /// Number of fetches in the batch.
    pub fn len(&self) -> usize {
        self.fetches.len()
    }

    /// Whether the batch holds no fetches.
    pub fn is_empty(&self) -> bool {
        self.fetches.is_empty()
    }
}

impl<F, T, E> CachedBatch<F>
where
    F: Future<Output = Result<T, E>>,
    T: Serialize,
    E: Into<Box<dyn Error + Send + Sync>>,
{
    /// Deliver every cached copy at once, then reconcile each key on its own.
    ///
    /// `on_cache_results` receives the lookups in batch order after all of
    /// them completed. Once its future has completed, each key is reconciled
    /// as soon as its own fetch is done. The returned outcomes are in batch
    /// order; a failed fetch only fails its own slot.
    pub async fn cached<C, Fut>(
        self,
        on_cache_results: C,
    ) -> Vec<Result<Reconciliation, CacheError>>
    where
        C: FnOnce(Vec<CacheLookup>) -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut targets = Vec::with_capacity(self.fetches.len());
        let mut pending = Vec::with_capacity(self.fetches.len());
        for CachedFetch { cache, key, fetch } in self.fetches {
            targets.push((cache, key));
            pending.push(fetch);
        }

        let delivered = async {
            let lookups = join_all(targets.iter().map(|(cache, key)| cache.find(key))).await;
            tracing::debug!(
                "Delivering cached json batch: keys={}, hits={}",
                lookups.len(),
                lookups.iter().filter(|lookup| lookup.is_hit()).count()
            );
            on_cache_results(lookups).await;
        }
        .shared();

        let reconciliations = targets.iter().zip(pending).map(|((cache, key), fetch)| {
            let delivered = delivered.clone();
            async move {
                let ((), fetched) = futures::join!(delivered, fetch);
                reconcile(cache, key, fetched).await
            }
        });

        join_all(reconciliations).await
    }
}

async fn reconcile<T, E>(
    cache: &JsonCache,
    key: &str,
    fetched: Result<T, E>,
) -> Result<Reconciliation, CacheError>
where
    T: Serialize,
    E: Into<Box<dyn Error + Send + Sync>>,
{
    let value = match fetched {
        Ok(value) => value,
        Err(e) => {
            let source: Box<dyn Error + Send + Sync> = e.into();
            if let Some(Unserializable(e)) = source.downcast_ref::<Unserializable>() {
                return Err(CacheError::Serialization(format!("Serialization failed: {}", e)));
            }
            tracing::warn!("Fetch failed, cache left as is: key={}, error={}", key, source);
            return Err(CacheError::Fetch(source));
        }
    };

    let document = to_document(&value)?;
    cache.check_and_update(key, document).await
}
