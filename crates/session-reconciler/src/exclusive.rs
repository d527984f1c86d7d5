//! Cooperative exclusive execution.

use std::future::Future;
use tokio::sync::Mutex;

/// Runs futures one at a time, in arrival order.
///
/// Session-mutating work (reconcile, sign-in, sign-out) must never
/// interleave: a refresh racing another refresh burns the one-shot
/// refresh token. The tokio mutex queues waiters fairly, so callers are
/// admitted in the order they arrived.
///
/// Callers must not re-enter [`run`](ExclusiveRunner::run) from inside a
/// running future; that deadlocks.
#[derive(Default)]
pub struct ExclusiveRunner {
    lock: Mutex<()>,
}

impl ExclusiveRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `fut` once all previously admitted futures have finished.
    pub async fn run<F, T>(&self, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        let _guard = self.lock.lock().await;
        fut.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::{sleep, Duration};

    #[tokio::test(start_paused = true)]
    async fn runs_in_arrival_order_without_interleaving() {
        let runner = Arc::new(ExclusiveRunner::new());
        let active = Arc::new(AtomicUsize::new(0));
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..5 {
            let runner = Arc::clone(&runner);
            let active = Arc::clone(&active);
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                runner
                    .run(async {
                        let now_active = active.fetch_add(1, Ordering::SeqCst);
                        assert_eq!(now_active, 0, "two tasks ran concurrently");
                        sleep(Duration::from_millis(10)).await;
                        active.fetch_sub(1, Ordering::SeqCst);
                        order.lock().unwrap().push(i);
                    })
                    .await;
            }));
            // Give each task a chance to queue before the next spawns.
            tokio::task::yield_now().await;
        }

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn returns_the_future_output() {
        let runner = ExclusiveRunner::new();
        let out = runner.run(async { 21 * 2 }).await;
        assert_eq!(out, 42);
    }
}
