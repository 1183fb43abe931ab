//! Application lifetime shared between a host loop and the work it hosts.

use tokio_util::sync::CancellationToken;

/// Lets hosted work ask the host loop to stop.
///
/// Stopping is one-way: once requested it stays requested.
#[derive(Debug, Clone, Default)]
pub struct HostLifetime {
    stopping: CancellationToken,
}

impl HostLifetime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop_application(&self) {
        self.stopping.cancel();
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.is_cancelled()
    }

    /// Guard that stops the application when dropped, even while unwinding.
    pub fn stop_on_drop(&self) -> StopGuard {
        StopGuard {
            lifetime: self.clone(),
        }
    }

    /// Resolves once [`stop_application`](Self::stop_application) has been called.
    pub async fn stopping(&self) {
        self.stopping.cancelled().await
    }
}

/// Stops its [`HostLifetime`] when dropped.
#[derive(Debug)]
pub struct StopGuard {
    lifetime: HostLifetime,
}

impl Drop for StopGuard {
    fn drop(&mut self) {
        self.lifetime.stop_application();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_stop_wakes_waiter() {
        let lifetime = HostLifetime::new();
        let waiter = {
            let lifetime = lifetime.clone();
            tokio::spawn(async move { lifetime.stopping().await })
        };

        assert!(!lifetime.is_stopping());
        lifetime.stop_application();
        lifetime.stop_application();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
        assert!(lifetime.is_stopping());
    }

    #[tokio::test]
    async fn test_guard_stops_on_panic() {
        let lifetime = HostLifetime::new();
        let guard = lifetime.stop_on_drop();

        let task = tokio::spawn(async move {
            let _guard = guard;
            panic!("hosted work blew up");
        });

        assert!(task.await.is_err());
        assert!(lifetime.is_stopping());
    }
}
