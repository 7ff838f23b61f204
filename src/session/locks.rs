//! Per-conversation serialization.
//!
//! Two requests for the same conversation must not interleave their
//! history load and message appends.  Requests for different
//! conversations proceed independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
pub struct ConversationLocks {
    inner: Mutex<HashMap<i64, Weak<AsyncMutex<()>>>>,
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `conversation_id`.
    pub async fn acquire(&self, conversation_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            map.retain(|_, weak| weak.strong_count() > 0);
            let existing = map.get(&conversation_id).and_then(Weak::upgrade);
            match existing {
                Some(existing) => existing,
                None => {
                    let fresh = Arc::new(AsyncMutex::new(()));
                    map.insert(conversation_id, Arc::downgrade(&fresh));
                    fresh
                }
            }
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_conversation_is_exclusive() {
        let locks = Arc::new(ConversationLocks::new());
        let guard = locks.acquire(1).await;

        let l2 = Arc::clone(&locks);
        let waiter = tokio::spawn(async move {
            let _g = l2.acquire(1).await;
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_conversations_do_not_block() {
        let locks = ConversationLocks::new();
        let _a = locks.acquire(1).await;
        let b = tokio::time::timeout(Duration::from_millis(200), locks.acquire(2)).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn released_entries_are_pruned() {
        let locks = ConversationLocks::new();
        {
            let _g = locks.acquire(5).await;
            assert_eq!(locks.inner.lock().unwrap().len(), 1);
        }
        let _other = locks.acquire(6).await;
        let map = locks.inner.lock().unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key(&6));
    }
}
