//! Session store with explicit creation and idle eviction

use beamdesign_core::models::{ConversationState, SessionId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::MutexGuard;

/// One session: its state behind an async mutex, so turns of the same
/// session queue in arrival order, plus a generation counter bumped on
/// every reset.
#[derive(Debug)]
pub struct SessionSlot {
    generation: AtomicU64,
    last_active: Mutex<Instant>,
    state: tokio::sync::Mutex<ConversationState>,
}

impl SessionSlot {
    fn new(session_id: SessionId) -> Self {
        Self {
            generation: AtomicU64::new(0),
            last_active: Mutex::new(Instant::now()),
            state: tokio::sync::Mutex::new(ConversationState::new(session_id)),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Invalidate work started under the current generation
    pub fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn touch(&self) {
        let mut last = self.last_active.lock().unwrap_or_else(|e| e.into_inner());
        *last = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .elapsed()
    }

    /// True while a turn holds the state
    pub fn is_busy(&self) -> bool {
        self.state.try_lock().is_err()
    }

    pub async fn lock(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().await
    }
}

/// Owned map of active sessions
#[derive(Debug)]
pub struct SessionStore {
    slots: Mutex<HashMap<SessionId, Arc<SessionSlot>>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    pub fn get_or_create(&self, session_id: &SessionId) -> Arc<SessionSlot> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let slot = slots.entry(session_id.clone()).or_insert_with(|| {
            tracing::debug!(session_id = %session_id, "Creating session");
            Arc::new(SessionSlot::new(session_id.clone()))
        });
        Arc::clone(slot)
    }

    pub fn get(&self, session_id: &SessionId) -> Option<Arc<SessionSlot>> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.get(session_id).cloned()
    }

    pub fn remove(&self, session_id: &SessionId) -> Option<Arc<SessionSlot>> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.remove(session_id)
    }

    /// Drop sessions idle for longer than the timeout. A slot still
    /// referenced by a running or queued turn is kept.
    pub fn evict_idle(&self) -> usize {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let before = slots.len();
        slots.retain(|session_id, slot| {
            let evict = Arc::strong_count(slot) == 1 && slot.idle_for() >= self.idle_timeout;
            if evict {
                tracing::debug!(session_id = %session_id, "Evicting idle session");
            }
            !evict
        });
        before - slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beamdesign_core::models::Phase;

    #[test]
    fn test_get_or_create_reuses_slot() {
        let store = SessionStore::new(Duration::from_secs(60));
        let id = SessionId::from("a");
        let first = store.get_or_create(&id);
        let second = store.get_or_create(&id);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_generation_bumps() {
        let store = SessionStore::new(Duration::from_secs(60));
        let slot = store.get_or_create(&SessionId::from("a"));
        assert_eq!(slot.generation(), 0);
        assert_eq!(slot.bump_generation(), 1);
        assert_eq!(slot.generation(), 1);
    }

    #[test]
    fn test_eviction_skips_slots_in_use() {
        let store = SessionStore::new(Duration::ZERO);
        let held = store.get_or_create(&SessionId::from("busy"));
        drop(store.get_or_create(&SessionId::from("idle")));

        assert_eq!(store.evict_idle(), 1);
        assert!(store.get(&SessionId::from("busy")).is_some());
        assert!(store.get(&SessionId::from("idle")).is_none());
        drop(held);
    }

    #[tokio::test]
    async fn test_busy_while_state_is_held() {
        let store = SessionStore::new(Duration::from_secs(60));
        let slot = store.get_or_create(&SessionId::from("a"));
        assert!(!slot.is_busy());
        let guard = slot.lock().await;
        assert!(slot.is_busy());
        drop(guard);
        assert!(!slot.is_busy());
    }

    #[tokio::test]
    async fn test_new_slot_starts_gathering() {
        let store = SessionStore::new(Duration::from_secs(60));
        let slot = store.get_or_create(&SessionId::from("a"));
        let state = slot.lock().await;
        assert_eq!(state.phase, Phase::GatheringInfo);
        assert_eq!(state.session_id.as_str(), "a");
    }
}
