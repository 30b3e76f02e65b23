// Application state for HTTP handlers
use crate::application::dashboard_session::{DashboardService, DashboardSession};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

pub struct AppState {
    pub dashboard_service: DashboardService,
    pub sessions: SessionRegistry,
}

/// Live sessions by id. Removing a session drops it, which deactivates it.
#[derive(Default)]
pub struct SessionRegistry {
    next_id: AtomicU64,
    sessions: RwLock<HashMap<u64, Arc<DashboardSession>>>,
}

impl SessionRegistry {
    pub fn insert(&self, session: DashboardSession) -> (u64, Arc<DashboardSession>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let session = Arc::new(session);
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, session.clone());
        (id, session)
    }

    pub fn get(&self, id: u64) -> Option<Arc<DashboardSession>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    pub fn remove(&self, id: u64) -> Option<Arc<DashboardSession>> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
