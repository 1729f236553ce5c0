use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

type KeyMutex = Arc<tokio::sync::Mutex<()>>;
type SlotMap = Arc<Mutex<HashMap<String, Slot>>>;

/// Per-key async locks.
///
/// One reconciliation per key may hold the lock at a time; other keys are not
/// affected. Entries are dropped once no task holds or waits for them,
/// including waiters that were cancelled before acquiring.
#[derive(Clone, Default)]
pub(crate) struct KeyLocks {
    slots: SlotMap,
}

struct Slot {
    mutex: KeyMutex,
    // Tasks holding or waiting for the lock
    users: usize,
}

/// Counts one user of a key's slot until dropped.
struct Registration {
    key: String,
    slots: SlotMap,
}

/// Held for the duration of one reconciliation.
pub(crate) struct KeyGuard {
    _guard: OwnedMutexGuard<()>,
    _registration: Registration,
}

impl KeyLocks {
    /// Wait until `key` is free and take it.
    pub(crate) async fn lock(&self, key: &str) -> KeyGuard {
        let (mutex, registration) = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            let slot = slots.entry(key.to_string()).or_insert_with(|| Slot {
                mutex: KeyMutex::default(),
                users: 0,
            });
            slot.users += 1;

            let registration = Registration {
                key: key.to_string(),
                slots: Arc::clone(&self.slots),
            };
            (Arc::clone(&slot.mutex), registration)
        };

        // Dropping this future while waiting drops the registration too
        let guard = mutex.lock_owned().await;

        KeyGuard {
            _guard: guard,
            _registration: registration,
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = slots.get_mut(&self.key) {
            slot.users -= 1;
            if slot.users == 0 {
                slots.remove(&self.key);
            }
        }
    }
}
