//! A group of fetch workers sharing one cancellation token.

use super::CancellationToken;
use futures::future::join_all;
use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::error;

/// A group of related worker tasks with structured cancellation.
///
/// If any worker errors or panics, the shared token is cancelled so the
/// remaining workers stop picking up new pages.
pub struct WorkerGroup {
    /// The cancellation token for this group.
    cancel_token: Arc<CancellationToken>,
    /// Handles to spawned workers, with their names.
    handles: RwLock<Vec<(String, JoinHandle<Result<(), String>>)>>,
    /// The first error encountered.
    first_error: RwLock<Option<String>>,
}

impl WorkerGroup {
    /// Creates a group around an existing token.
    #[must_use]
    pub fn with_token(cancel_token: Arc<CancellationToken>) -> Self {
        Self {
            cancel_token,
            handles: RwLock::new(Vec::new()),
            first_error: RwLock::new(None),
        }
    }

    /// Returns the cancellation token.
    #[must_use]
    pub fn cancel_token(&self) -> &Arc<CancellationToken> {
        &self.cancel_token
    }

    /// Spawns a worker in the group.
    pub fn spawn<F, Fut>(&self, name: impl Into<String>, task: F)
    where
        F: FnOnce(Arc<CancellationToken>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        let token = self.cancel_token.clone();
        let handle = tokio::spawn(async move { task(token).await });
        self.handles.write().push((name.into(), handle));
    }

    /// Waits for every worker to finish.
    ///
    /// Returns the first error if any worker failed.
    pub async fn wait(&self) -> Result<(), String> {
        let (names, handles): (Vec<_>, Vec<_>) = {
            let mut h = self.handles.write();
            std::mem::take(&mut *h).into_iter().unzip()
        };

        for (name, joined) in names.into_iter().zip(join_all(handles).await) {
            let failure = match joined {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => format!("worker {name} failed: {e}"),
                Err(join_error) => format!("worker {name} join error: {join_error}"),
            };
            error!(worker = %name, error = %failure, "Crawl worker failed");
            let mut first_error = self.first_error.write();
            if first_error.is_none() {
                self.cancel_token.cancel(&failure);
                *first_error = Some(failure);
            }
        }

        match self.first_error.read().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for WorkerGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerGroup")
            .field("pending", &self.handles.read().len())
            .field("cancelled", &self.cancel_token.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_group_success() {
        let group = WorkerGroup::with_token(CancellationToken::shared());
        group.spawn("worker-1", |_token| async { Ok(()) });
        group.spawn("worker-2", |_token| async { Ok(()) });

        assert!(group.wait().await.is_ok());
        assert!(!group.cancel_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_group_error_cancels_token() {
        let group = WorkerGroup::with_token(CancellationToken::shared());
        group.spawn("ok", |_token| async { Ok(()) });
        group.spawn("broken", |_token| async { Err("boom".to_string()) });

        let err = group.wait().await.unwrap_err();
        assert!(err.contains("broken"));
        assert!(group.cancel_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_group_panic_reported() {
        let group = WorkerGroup::with_token(CancellationToken::shared());
        group.spawn("panicky", |_token| async { panic!("worker blew up") });

        let err = group.wait().await.unwrap_err();
        assert!(err.contains("join error"));
    }

    #[tokio::test]
    async fn test_workers_observe_cancellation() {
        let group = WorkerGroup::with_token(CancellationToken::shared());
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = counter.clone();
        group.spawn("looping", move |token| async move {
            for _ in 0..50 {
                if token.is_cancelled() {
                    return Ok(());
                }
                counter_clone.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            Ok(())
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        group.cancel_token().cancel("enough");
        group.wait().await.unwrap();

        assert!(counter.load(Ordering::SeqCst) < 50);
    }
}
