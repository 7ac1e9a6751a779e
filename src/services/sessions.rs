use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::{sync::RwLock, task::JoinHandle};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        session::{Session, SessionSummary},
        trip::TripRecord,
    },
};

/// When sessions go away on their own.
#[derive(Debug, Clone, Copy)]
pub struct EvictionPolicy {
    pub ttl: Duration,
    pub max_sessions: usize,
}

/// In-memory registry of upload sessions. Cloning shares the registry.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<Registry>>,
    policy: EvictionPolicy,
}

#[derive(Default)]
struct Registry {
    sessions: HashMap<Uuid, Arc<Session>>,
    /// Sessions in upload order. Entries for sessions that were already
    /// removed are skipped when they reach the front.
    order: VecDeque<(DateTime<Utc>, Uuid)>,
}

impl Registry {
    /// Drops expired and over-capacity sessions from the oldest end only.
    fn trim_front(&mut self, policy: &EvictionPolicy, now: DateTime<Utc>) {
        while let Some(&(uploaded_at, id)) = self.order.front() {
            if !self.sessions.contains_key(&id) {
                self.order.pop_front();
                continue;
            }
            if is_expired(uploaded_at, policy.ttl, now) {
                debug!(session_id = %id, "dropped expired session during create");
            } else if self.sessions.len() >= policy.max_sessions {
                info!(session_id = %id, "evicted oldest session, store at capacity");
            } else {
                break;
            }
            self.order.pop_front();
            self.sessions.remove(&id);
        }
    }

    fn purge_expired(&mut self, ttl: Duration, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| !is_expired(session.uploaded_at(), ttl, now));
        let sessions = &self.sessions;
        self.order.retain(|(_, id)| sessions.contains_key(id));
        before - self.sessions.len()
    }
}

impl SessionStore {
    pub fn new(policy: EvictionPolicy) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Registry::default())),
            policy: EvictionPolicy {
                max_sessions: policy.max_sessions.max(1),
                ..policy
            },
        }
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    pub async fn create(&self, filename: String, records: Vec<TripRecord>) -> Arc<Session> {
        self.create_at(filename, records, Utc::now()).await
    }

    /// Only the oldest sessions are examined here; expired sessions further
    /// back are left to [`SessionStore::sweep_expired`].
    pub async fn create_at(
        &self,
        filename: String,
        records: Vec<TripRecord>,
        now: DateTime<Utc>,
    ) -> Arc<Session> {
        let mut registry = self.inner.write().await;
        registry.trim_front(&self.policy, now);

        let mut id = Uuid::new_v4();
        while registry.sessions.contains_key(&id) {
            id = Uuid::new_v4();
        }

        let session = Arc::new(Session::new(id, filename, now, records));
        registry.sessions.insert(id, Arc::clone(&session));
        registry.order.push_back((now, id));
        info!(
            session_id = %id,
            filename = session.source_filename(),
            records = session.total_records(),
            "session created"
        );
        session
    }

    pub async fn get(&self, session_id: Uuid) -> Result<Arc<Session>, AppError> {
        self.get_at(session_id, Utc::now()).await
    }

    /// Expired sessions are reported as missing even before the sweeper runs.
    pub async fn get_at(&self, session_id: Uuid, now: DateTime<Utc>) -> Result<Arc<Session>, AppError> {
        let registry = self.inner.read().await;
        registry
            .sessions
            .get(&session_id)
            .filter(|session| !is_expired(session.uploaded_at(), self.policy.ttl, now))
            .cloned()
            .ok_or(AppError::NotFound)
    }

    pub async fn evict(&self, session_id: Uuid) -> Result<(), AppError> {
        let removed = self.inner.write().await.sessions.remove(&session_id);
        match removed {
            Some(_) => {
                info!(session_id = %session_id, "session evicted");
                Ok(())
            }
            None => Err(AppError::NotFound),
        }
    }

    pub async fn list(&self) -> Vec<SessionSummary> {
        let now = Utc::now();
        let registry = self.inner.read().await;
        let mut summaries: Vec<_> = registry
            .sessions
            .values()
            .filter(|session| !is_expired(session.uploaded_at(), self.policy.ttl, now))
            .map(|session| session.summary())
            .collect();
        summaries.sort_by_key(|summary| summary.uploaded_at);
        summaries
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Utc::now()).await
    }

    pub async fn sweep_expired_at(&self, now: DateTime<Utc>) -> usize {
        self.inner.write().await.purge_expired(self.policy.ttl, now)
    }
}

/// Runs [`SessionStore::sweep_expired`] every `interval` until the task is aborted.
pub fn spawn_sweeper(store: SessionStore, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let removed = store.sweep_expired().await;
            if removed > 0 {
                info!(removed, "swept expired sessions");
            }
        }
    })
}

fn is_expired(uploaded_at: DateTime<Utc>, ttl: Duration, now: DateTime<Utc>) -> bool {
    match chrono::Duration::from_std(ttl) {
        Ok(ttl) => now.signed_duration_since(uploaded_at) > ttl,
        // A TTL too large for chrono never elapses.
        Err(_) => false,
    }
}
