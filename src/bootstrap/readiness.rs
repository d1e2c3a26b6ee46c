use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;

/// One-shot "service is up" signal that late subscribers can still observe.
pub struct ReadySignal<T> {
    tx: Arc<watch::Sender<Option<T>>>,
}

impl<T> Clone for ReadySignal<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Clone> Default for ReadySignal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> ReadySignal<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn publish(&self, value: T) {
        self.tx.send_replace(Some(value));
    }

    pub fn get(&self) -> Option<T> {
        self.tx.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Wait at most `limit` for the value. `None` on timeout.
    pub async fn wait(&self, limit: Duration) -> Option<T> {
        let mut rx = self.tx.subscribe();
        match timeout(limit, rx.wait_for(Option::is_some)).await {
            Ok(Ok(ready)) => (*ready).clone(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready_eq, task};

    #[tokio::test]
    async fn test_wait_stays_pending_until_published() {
        let signal = ReadySignal::<u32>::new();
        let mut waiting = task::spawn(signal.wait(Duration::from_secs(60)));

        assert_pending!(waiting.poll());
        signal.publish(7);
        assert_ready_eq!(waiting.poll(), Some(7));
    }

    #[tokio::test]
    async fn test_already_published_resolves_immediately() {
        let signal = ReadySignal::new();
        signal.publish("registry");

        assert!(signal.is_ready());
        assert_eq!(signal.wait(Duration::ZERO).await, Some("registry"));
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let signal = ReadySignal::<u32>::new();
        assert_eq!(signal.wait(Duration::from_millis(20)).await, None);
        assert_eq!(signal.get(), None);
    }
}
