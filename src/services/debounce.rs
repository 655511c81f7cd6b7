use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use tokio::{sync::Mutex, task::JoinHandle};

/// Runs only the most recent task per key, once the key has been quiet for
/// `delay`. Used for note drafts, which clients send on every keystroke.
#[derive(Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn schedule<F>(&self, key: &str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut pending = self.pending.lock().await;
        pending.retain(|_, handle| !handle.is_finished());
        if let Some(previous) = pending.remove(key) {
            previous.abort();
        }
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        pending.insert(key.to_string(), handle);
    }

    pub async fn is_pending(&self, key: &str) -> bool {
        self.pending
            .lock()
            .await
            .get(key)
            .is_some_and(|handle| !handle.is_finished())
    }
}
