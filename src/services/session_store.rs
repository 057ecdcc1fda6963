use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Message, Session, SessionConfig};

/// Thread-safe map of live sessions keyed by id.
///
/// Entry guards are only held inside the closures passed to `read` and
/// `update`, which are synchronous, so no lock ever spans an `.await`.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<Uuid, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }

    pub fn create(&self, api_key: Option<String>, config: SessionConfig) -> Uuid {
        let session = Session::new(api_key, config);
        let id = session.id;
        self.sessions.insert(id, session);
        info!("Created session {} ({} active)", id, self.sessions.len());
        id
    }

    pub fn read<R>(&self, id: Uuid, f: impl FnOnce(&Session) -> R) -> Result<R, AppError> {
        let entry = self.sessions.get(&id).ok_or(AppError::SessionNotFound(id))?;
        Ok(f(entry.value()))
    }

    pub fn update<R>(&self, id: Uuid, f: impl FnOnce(&mut Session) -> R) -> Result<R, AppError> {
        let mut entry = self.sessions.get_mut(&id).ok_or(AppError::SessionNotFound(id))?;
        Ok(f(entry.value_mut()))
    }

    pub fn append(&self, id: Uuid, messages: impl IntoIterator<Item = Message>) -> Result<(), AppError> {
        self.update(id, |session| {
            for message in messages {
                session.push(message);
            }
        })
    }

    /// Ends a session; everything it held is dropped.
    pub fn remove(&self, id: Uuid) -> Result<(), AppError> {
        self.sessions
            .remove(&id)
            .map(|_| info!("Ended session {}", id))
            .ok_or(AppError::SessionNotFound(id))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
