//! A small async query cache.
//!
//! Each query is identified by a string key and owns one fetch function. The
//! cache keeps the latest result per key and publishes it to every handle
//! through a `watch` channel. At most one fetch per key is in flight; failed
//! fetches are not retried.

use std::{
    any::Any,
    collections::HashMap,
    fmt,
    future::Future,
    pin::Pin,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use tokio::sync::watch;

/// The error a failed fetch left behind, shared by every handle.
pub type QueryError = Arc<dyn std::error::Error + Send + Sync>;

type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, QueryError>> + Send>>;
type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<T> + Send + Sync>;

/// Client-wide defaults applied to every query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultOptions {
    /// Refetch every cached query when the window regains focus.
    pub refetch_on_window_focus: bool,

    /// Refetch a settled query when a new handle subscribes to it.
    pub refetch_on_mount: bool,
}

impl Default for DefaultOptions {
    fn default() -> Self {
        Self {
            refetch_on_window_focus: true,
            refetch_on_mount: true,
        }
    }
}

/// Three-way state of a query. A refetch keeps the previous settled state
/// until its own result arrives.
#[derive(Debug)]
pub enum QueryState<T> {
    Pending,
    Success(Arc<T>),
    Error(QueryError),
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        match self {
            QueryState::Pending => QueryState::Pending,
            QueryState::Success(data) => QueryState::Success(data.clone()),
            QueryState::Error(err) => QueryState::Error(err.clone()),
        }
    }
}

impl<T> QueryState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Pending)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QueryState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&QueryError> {
        match self {
            QueryState::Error(err) => Some(err),
            _ => None,
        }
    }
}

struct QueryEntry<T> {
    key: String,
    fetcher: Fetcher<T>,
    state: watch::Sender<QueryState<T>>,
    fetching: AtomicBool,
}

/// Type-erased view of an entry so one map can hold every query.
trait CacheEntry: Send + Sync {
    fn refetch(self: Arc<Self>);
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Send + Sync + 'static> CacheEntry for QueryEntry<T> {
    fn refetch(self: Arc<Self>) {
        spawn_fetch(self);
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

fn spawn_fetch<T: Send + Sync + 'static>(entry: Arc<QueryEntry<T>>) {
    if entry.fetching.swap(true, Ordering::AcqRel) {
        tracing::trace!(key = %entry.key, "Fetch already in flight");
        return;
    }

    tokio::spawn(async move {
        tracing::debug!(key = %entry.key, "Fetching query");
        let next = match (entry.fetcher)().await {
            Ok(data) => QueryState::Success(Arc::new(data)),
            Err(err) => {
                tracing::warn!(key = %entry.key, error = %err, "Query failed");
                QueryState::Error(err)
            }
        };

        // cleared first so a subscriber woken by the new state may refetch
        entry.fetching.store(false, Ordering::Release);
        entry.state.send_replace(next);
    });
}

#[derive(Default)]
struct Inner {
    options: DefaultOptions,
    cache: Mutex<HashMap<String, Arc<dyn CacheEntry>>>,
}

/// Shared query cache. Clones refer to the same cache.
#[derive(Clone, Default)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryClient")
            .field("options", &self.inner.options)
            .finish()
    }
}

impl QueryClient {
    pub fn new(options: DefaultOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                options,
                cache: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn options(&self) -> DefaultOptions {
        self.inner.options
    }

    /// Subscribes to the query under `key`, creating it and starting its
    /// first fetch when it is not cached yet.
    ///
    /// A cached query keeps the fetch function it was created with. Reusing a
    /// key with a different data type replaces the cached entry.
    ///
    /// Must be called inside a tokio runtime.
    pub fn use_query<T, E, F, Fut>(&self, key: &str, fetch: F) -> QueryHandle<T>
    where
        T: Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let mut cache = self
            .inner
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = cache.get(key).cloned() {
            match existing.into_any().downcast::<QueryEntry<T>>() {
                Ok(entry) => {
                    drop(cache);
                    let handle = QueryHandle::new(entry.clone());
                    if self.inner.options.refetch_on_mount && !handle.state().is_loading() {
                        spawn_fetch(entry);
                    }
                    return handle;
                }
                Err(_) => {
                    tracing::warn!(key, "Query key reused with a different type, replacing entry");
                }
            }
        }

        let fetcher: Fetcher<T> = Arc::new(move || -> BoxFuture<T> {
            let fut = fetch();
            Box::pin(async move { fut.await.map_err(|err| Arc::new(err) as QueryError) })
        });
        let (state, _) = watch::channel(QueryState::Pending);
        let entry = Arc::new(QueryEntry {
            key: key.to_string(),
            fetcher,
            state,
            fetching: AtomicBool::new(false),
        });

        cache.insert(key.to_string(), entry.clone());
        drop(cache);

        let handle = QueryHandle::new(entry.clone());
        spawn_fetch(entry);
        handle
    }

    /// Signals that the window regained focus.
    pub fn window_focused(&self) {
        if !self.inner.options.refetch_on_window_focus {
            tracing::trace!("Refetch on window focus disabled");
            return;
        }

        let entries: Vec<_> = self
            .inner
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        for entry in entries {
            entry.refetch();
        }
    }
}

/// A subscription to one cached query.
pub struct QueryHandle<T> {
    entry: Arc<QueryEntry<T>>,
    receiver: watch::Receiver<QueryState<T>>,
}

impl<T: Send + Sync + 'static> QueryHandle<T> {
    fn new(entry: Arc<QueryEntry<T>>) -> Self {
        let receiver = entry.state.subscribe();
        Self { entry, receiver }
    }

    pub fn key(&self) -> &str {
        &self.entry.key
    }

    pub fn state(&self) -> QueryState<T> {
        self.receiver.borrow().clone()
    }

    /// Waits for the next state published after the last one this handle saw.
    pub async fn changed(&mut self) -> QueryState<T> {
        // the entry owns the sender, so the channel cannot close under us
        self.receiver.changed().await.ok();
        self.receiver.borrow_and_update().clone()
    }

    /// Waits until the query is no longer pending.
    pub async fn settled(&mut self) -> QueryState<T> {
        if let Ok(state) = self.receiver.wait_for(|state| !state.is_loading()).await {
            return (*state).clone();
        }
        self.state()
    }

    /// Starts a fetch unless one is already in flight.
    pub fn refetch(&self) {
        spawn_fetch(self.entry.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{io, sync::atomic::AtomicUsize, time::Duration};

    fn counting_query(
        client: &QueryClient,
        key: &str,
        calls: &Arc<AtomicUsize>,
    ) -> QueryHandle<usize> {
        let calls = calls.clone();
        client.use_query(key, move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok::<_, io::Error>(n) }
        })
    }

    #[tokio::test]
    async fn test_new_query_starts_pending_then_succeeds() {
        let client = QueryClient::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handle = counting_query(&client, "answer", &calls);
        assert!(handle.state().is_loading());

        let state = handle.settled().await;
        assert_eq!(state.data(), Some(&1));
        assert!(state.error().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handle.key(), "answer");
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_retried() {
        let client = QueryClient::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut handle = client.use_query("broken", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(io::Error::other("connection refused")) }
        });

        let state = handle.settled().await;
        assert_eq!(state.error().unwrap().to_string(), "connection refused");
        assert!(state.data().is_none());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_handles_share_one_entry() {
        let client = QueryClient::new(DefaultOptions {
            refetch_on_mount: false,
            ..Default::default()
        });
        let calls = Arc::new(AtomicUsize::new(0));

        let mut first = counting_query(&client, "shared", &calls);
        first.settled().await;
        let mut second = counting_query(&client, "shared", &calls);

        assert_eq!(second.settled().await.data(), Some(&1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mount_refetches_settled_query() {
        let client = QueryClient::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let mut first = counting_query(&client, "remount", &calls);
        first.settled().await;

        let _second = counting_query(&client, "remount", &calls);
        assert_eq!(first.changed().await.data(), Some(&2));
    }

    #[tokio::test]
    async fn test_window_focus_ignored_when_disabled() {
        let client = QueryClient::new(DefaultOptions {
            refetch_on_window_focus: false,
            ..Default::default()
        });
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handle = counting_query(&client, "focus", &calls);
        handle.settled().await;

        client.window_focused();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handle.state().data(), Some(&1));
    }

    #[tokio::test]
    async fn test_window_focus_refetches_when_enabled() {
        let client = QueryClient::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handle = counting_query(&client, "focus", &calls);
        handle.settled().await;

        client.window_focused();
        assert_eq!(handle.changed().await.data(), Some(&2));
    }

    #[tokio::test]
    async fn test_refetch_while_in_flight_is_deduplicated() {
        let client = QueryClient::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut handle = client.use_query("slow", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, io::Error>("done")
            }
        });

        handle.refetch();
        handle.refetch();

        assert_eq!(handle.settled().await.data(), Some(&"done"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_key_reused_with_other_type_replaces_entry() {
        let client = QueryClient::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let mut numbers = counting_query(&client, "mixed", &calls);
        numbers.settled().await;

        let mut text = client.use_query("mixed", || async { Ok::<_, io::Error>("text") });
        assert_eq!(text.settled().await.data(), Some(&"text"));
    }
}
