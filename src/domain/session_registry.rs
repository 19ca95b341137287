//! Concurrent session storage with per-session locking.
//!
//! [`SessionRegistry`] stores all open upload sessions in a `HashMap` where
//! each entry is individually protected by a [`tokio::sync::RwLock`].
//! Uploads to different sessions proceed concurrently; report generation
//! only needs a read lock long enough to clone the file list.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::SessionId;
use super::session::{SessionSummary, UploadSession};
use crate::error::ReportError;

/// Central store for all open upload sessions.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<RwLock<UploadSession>>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts a new session.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidRequest`] if a session with the same
    /// ID already exists (should never happen with UUID v4).
    pub async fn insert(&self, session: UploadSession) -> Result<SessionId, ReportError> {
        let session_id = session.session_id;
        let mut map = self.sessions.write().await;
        if map.contains_key(&session_id) {
            return Err(ReportError::InvalidRequest(format!(
                "session {session_id} already exists"
            )));
        }
        map.insert(session_id, Arc::new(RwLock::new(session)));
        Ok(session_id)
    }

    /// Returns the session behind its per-session lock.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::SessionNotFound`] if no session with the
    /// given ID exists.
    pub async fn get(
        &self,
        session_id: SessionId,
    ) -> Result<Arc<RwLock<UploadSession>>, ReportError> {
        let map = self.sessions.read().await;
        map.get(&session_id)
            .cloned()
            .ok_or(ReportError::SessionNotFound(*session_id.as_uuid()))
    }

    /// Removes a session, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::SessionNotFound`] if no session with the
    /// given ID exists.
    pub async fn remove(&self, session_id: SessionId) -> Result<UploadSession, ReportError> {
        let mut map = self.sessions.write().await;
        let arc = map
            .remove(&session_id)
            .ok_or(ReportError::SessionNotFound(*session_id.as_uuid()))?;
        // A handler may still hold a clone of the Arc; fall back to a copy.
        let session = match Arc::try_unwrap(arc) {
            Ok(lock) => lock.into_inner(),
            Err(shared) => shared.read().await.clone(),
        };
        Ok(session)
    }

    /// Returns summaries of all sessions, oldest first.
    pub async fn list(&self) -> Vec<SessionSummary> {
        let map = self.sessions.read().await;
        let mut summaries = Vec::with_capacity(map.len());
        for lock in map.values() {
            let session = lock.read().await;
            summaries.push(SessionSummary::from(&*session));
        }
        summaries.sort_by_key(|s| s.created_at);
        summaries
    }

    /// Returns the number of open sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if no session is open.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
