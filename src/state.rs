use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::gateway::{IdentityGateway, TicketingGateway};

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub identity: Box<dyn IdentityGateway>,
    pub ticketing: Box<dyn TicketingGateway>,
    session_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl AppState {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        config: AppConfig,
        identity: Box<dyn IdentityGateway>,
        ticketing: Box<dyn TicketingGateway>,
    ) -> Self {
        Self {
            db,
            config,
            identity,
            ticketing,
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    /// One in-flight operation per session: handlers hold this lock for
    /// the whole transition, including gateway awaits.
    pub fn session_lock(&self, session_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.session_locks.lock().unwrap();
        if locks.len() > 1024 {
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}
