//! Session persistence
//!
//! Stores the restart-surviving session subset (queue, cursor, policies,
//! power, volume, rate, mounted cassette) as one JSON document.

use crate::error::StorageError;
use cassette_core::{PersistedSession, PersistenceGateway, Result, SessionStore};
use std::sync::Arc;
use tracing::{debug, warn};

/// Gateway key of the session document
pub const SESSION_KEY: &str = "cassette-session";

pub struct SessionRepository {
    gateway: Arc<dyn PersistenceGateway>,
}

impl SessionRepository {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }

    /// Forget the saved session
    pub fn clear(&self) -> Result<()> {
        self.gateway.remove(SESSION_KEY)
    }
}

impl SessionStore for SessionRepository {
    fn load_session(&self) -> Result<Option<PersistedSession>> {
        let Some(bytes) = self.gateway.get(SESSION_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_slice::<PersistedSession>(&bytes) {
            Ok(mut session) => {
                // Cursor may point past a queue edited by hand
                if session.current_index >= session.queue.len() {
                    session.current_index = 0;
                }
                debug!(tracks = session.queue.len(), "session loaded");
                Ok(Some(session))
            }
            Err(e) => {
                let err = StorageError::Corrupt {
                    key: SESSION_KEY.to_string(),
                    reason: e.to_string(),
                };
                warn!(error = %err, "discarding saved session");
                Ok(None)
            }
        }
    }

    fn save_session(&mut self, session: &PersistedSession) -> Result<()> {
        let bytes = serde_json::to_vec(session)?;
        self.gateway.set(SESSION_KEY, &bytes)
    }
}
