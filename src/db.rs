//! Single-flight connection cache. One establishment attempt in flight at
//! most; the resulting handle is memoized for the process lifetime.

use crate::config::Settings;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Seam between the cache and the actual connect. The error must be `Clone`
/// so one failed attempt can be broadcast to every waiter.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Handle: Clone + Send + Sync + 'static;
    type Error: Clone + fmt::Display + fmt::Debug + Send + Sync + 'static;

    async fn connect(&self) -> Result<Self::Handle, Self::Error>;
}

/// Connects to MongoDB and returns a `Database` handle. Short selection and
/// connect timeouts plus an eager ping make establishment failures surface
/// within the request's time budget instead of queueing behind a hung write.
pub struct MongoConnector {
    uri: String,
    database_name: String,
    timeout: Duration,
}

impl MongoConnector {
    pub fn new(settings: &Settings) -> Self {
        MongoConnector {
            uri: settings.mongodb_uri.clone(),
            database_name: settings.database_name.clone(),
            timeout: settings.server_selection_timeout,
        }
    }
}

#[async_trait]
impl Connector for MongoConnector {
    type Handle = Database;
    type Error = Arc<mongodb::error::Error>;

    async fn connect(&self) -> Result<Database, Self::Error> {
        let mut options = ClientOptions::parse(&self.uri).await.map_err(Arc::new)?;
        options.server_selection_timeout = Some(self.timeout);
        options.connect_timeout = Some(self.timeout);
        let client = Client::with_options(options).map_err(Arc::new)?;
        let db = client.database(&self.database_name);
        // The driver connects lazily; ping so failures surface here.
        db.run_command(doc! { "ping": 1 }).await.map_err(Arc::new)?;
        tracing::debug!(database = %self.database_name, "mongodb connection established");
        Ok(db)
    }
}

type ConnectFuture<C> =
    Shared<BoxFuture<'static, Result<<C as Connector>::Handle, <C as Connector>::Error>>>;

struct Slot<C: Connector> {
    conn: Option<C::Handle>,
    pending: Option<ConnectFuture<C>>,
}

/// Process-wide cache slot, owned by the process entry point and passed
/// explicitly through `AppState`. A cached handle is never invalidated;
/// after a mid-life drop the driver's own pool reconnects behind it.
pub struct ConnectionCache<C: Connector> {
    connector: Arc<C>,
    slot: Mutex<Slot<C>>,
}

impl<C: Connector> ConnectionCache<C> {
    pub fn new(connector: C) -> Self {
        ConnectionCache {
            connector: Arc::new(connector),
            slot: Mutex::new(Slot {
                conn: None,
                pending: None,
            }),
        }
    }

    /// Return the cached handle, or join the one in-flight establishment
    /// attempt, starting it if absent. All concurrent callers share a single
    /// attempt and its outcome. On failure the pending marker is cleared so
    /// the next call starts a fresh attempt.
    pub async fn acquire(&self) -> Result<C::Handle, C::Error> {
        let pending = {
            let mut slot = self.slot.lock().await;
            if let Some(conn) = &slot.conn {
                return Ok(conn.clone());
            }
            match &slot.pending {
                Some(fut) => fut.clone(),
                None => {
                    let connector = Arc::clone(&self.connector);
                    let fut = async move { connector.connect().await }.boxed().shared();
                    slot.pending = Some(fut.clone());
                    fut
                }
            }
        };

        let result = pending.clone().await;
        let mut slot = self.slot.lock().await;
        match result {
            Ok(conn) => {
                slot.conn = Some(conn.clone());
                slot.pending = None;
                Ok(conn)
            }
            Err(err) => {
                // Only the attempt we joined may be cleared; a later caller
                // may already have started a fresh one.
                if slot.pending.as_ref().is_some_and(|p| p.ptr_eq(&pending)) {
                    slot.pending = None;
                }
                Err(err)
            }
        }
    }
}

/// The production cache type held in `AppState`.
pub type MongoCache = ConnectionCache<MongoConnector>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use thiserror::Error;
    use tokio::sync::watch;

    #[derive(Clone, Debug, Error)]
    #[error("connect failed on attempt {0}")]
    struct FakeError(usize);

    /// Counts attempts; each attempt blocks until released, then succeeds
    /// (handle = attempt number) or fails for the first `fail_times` tries.
    struct FakeConnector {
        attempts: Arc<AtomicUsize>,
        release: watch::Receiver<bool>,
        fail_times: usize,
    }

    #[async_trait]
    impl Connector for FakeConnector {
        type Handle = usize;
        type Error = FakeError;

        async fn connect(&self) -> Result<usize, FakeError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            let mut release = self.release.clone();
            while !*release.borrow() {
                release.changed().await.expect("release sender dropped");
            }
            if attempt <= self.fail_times {
                Err(FakeError(attempt))
            } else {
                Ok(attempt)
            }
        }
    }

    fn cache_with(
        fail_times: usize,
    ) -> (Arc<ConnectionCache<FakeConnector>>, Arc<AtomicUsize>, watch::Sender<bool>) {
        let attempts = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(false);
        let cache = Arc::new(ConnectionCache::new(FakeConnector {
            attempts: Arc::clone(&attempts),
            release: rx,
            fail_times,
        }));
        (cache, attempts, tx)
    }

    #[tokio::test]
    async fn concurrent_calls_share_one_attempt() {
        let (cache, attempts, release) = cache_with(0);
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            tasks.push(tokio::spawn(async move { cache.acquire().await }));
        }
        // Let every task reach the shared pending future before releasing.
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        release.send(true).unwrap();
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), 1);
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn second_call_returns_cached_handle_without_io() {
        let (cache, attempts, release) = cache_with(0);
        release.send(true).unwrap();
        let first = cache.acquire().await.unwrap();
        let second = cache.acquire().await.unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 1);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn waiters_observe_the_same_failure() {
        let (cache, attempts, release) = cache_with(usize::MAX);
        let mut tasks = Vec::new();
        for _ in 0..4 {
            let cache = Arc::clone(&cache);
            tasks.push(tokio::spawn(async move { cache.acquire().await }));
        }
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        release.send(true).unwrap();
        for task in tasks {
            let err = task.await.unwrap().unwrap_err();
            assert_eq!(err.0, 1);
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_attempt_is_retried_fresh_on_next_call() {
        let (cache, attempts, release) = cache_with(1);
        release.send(true).unwrap();
        let err = cache.acquire().await.unwrap_err();
        assert_eq!(err.0, 1);
        // Next call starts a brand-new attempt, not a replay.
        let handle = cache.acquire().await.unwrap();
        assert_eq!(handle, 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        // And the success is now memoized.
        assert_eq!(cache.acquire().await.unwrap(), 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn back_to_back_calls_without_await_share_one_attempt() {
        let (cache, attempts, release) = cache_with(0);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            release.send(true).unwrap();
        });
        let first = cache.acquire();
        let second = cache.acquire();
        let (r1, r2) = tokio::join!(first, second);
        assert_eq!(r1.unwrap(), 1);
        assert_eq!(r2.unwrap(), 1);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
