//! Redb intent store

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use entrypay::database::{self, decode_intent, encode_intent, IntentStore};
use entrypay::RegistrationIntent;
use redb::{Database, ReadableTable, TableDefinition};

use crate::error::Error;

// <session, serialized intent>
const PENDING_REGISTRATION_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("pending_registration");
// <session, transaction_id>
const CURRENT_TRANSACTION_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("current_transaction");

/// Redb backed [`IntentStore`]
///
/// One database file can hold many sessions; every entry is keyed by the
/// session name given at construction.
#[derive(Debug, Clone)]
pub struct IntentRedbStore {
    db: Arc<Database>,
    session: String,
}

impl IntentRedbStore {
    /// Open or create the database at `path` for `session`
    pub fn new<P: AsRef<Path>>(path: P, session: &str) -> Result<Self, Error> {
        let db = Database::create(path)?;
        Self::with_database(db, session)
    }

    /// Database that lives only as long as the store
    pub fn in_memory(session: &str) -> Result<Self, Error> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::with_database(db, session)
    }

    fn with_database(db: Database, session: &str) -> Result<Self, Error> {
        if session.trim().is_empty() {
            return Err(Error::EmptySession);
        }

        let write_txn = db.begin_write()?;
        {
            // Create the tables so reads never hit a missing table
            let _ = write_txn.open_table(PENDING_REGISTRATION_TABLE)?;
            let _ = write_txn.open_table(CURRENT_TRANSACTION_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(db),
            session: session.to_string(),
        })
    }

    /// Session the store is scoped to
    pub fn session(&self) -> &str {
        &self.session
    }

    /// Share the database with another session
    pub fn for_session(&self, session: &str) -> Result<Self, Error> {
        if session.trim().is_empty() {
            return Err(Error::EmptySession);
        }

        Ok(Self {
            db: self.db.clone(),
            session: session.to_string(),
        })
    }

    fn insert(&self, table: TableDefinition<&str, &str>, value: &str) -> Result<(), Error> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(table)?;
            table.insert(self.session.as_str(), value)?;
        }
        write_txn.commit()?;

        Ok(())
    }

    fn get(&self, table: TableDefinition<&str, &str>) -> Result<Option<String>, Error> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        let value = table
            .get(self.session.as_str())?
            .map(|v| v.value().to_string());

        Ok(value)
    }

    fn remove(&self, table: TableDefinition<&str, &str>) -> Result<(), Error> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(table)?;
            table.remove(self.session.as_str())?;
        }
        write_txn.commit()?;

        Ok(())
    }

    /// Overwrite the stored pending registration with raw data
    pub fn insert_raw(&self, raw: &str) -> Result<(), Error> {
        self.insert(PENDING_REGISTRATION_TABLE, raw)
    }
}

#[async_trait]
impl IntentStore for IntentRedbStore {
    async fn save_intent(&self, intent: RegistrationIntent) -> Result<(), database::Error> {
        let raw = encode_intent(&intent)?;
        self.insert(PENDING_REGISTRATION_TABLE, &raw)?;
        tracing::debug!("Saved pending registration for session {}", self.session);
        Ok(())
    }

    async fn load_intent(&self) -> Result<Option<RegistrationIntent>, database::Error> {
        Ok(self
            .get(PENDING_REGISTRATION_TABLE)?
            .as_deref()
            .and_then(decode_intent))
    }

    async fn clear_intent(&self) -> Result<(), database::Error> {
        self.remove(PENDING_REGISTRATION_TABLE)?;
        Ok(())
    }

    async fn set_current_transaction(&self, transaction_id: &str) -> Result<(), database::Error> {
        self.insert(CURRENT_TRANSACTION_TABLE, transaction_id)?;
        Ok(())
    }

    async fn current_transaction(&self) -> Result<Option<String>, database::Error> {
        Ok(self.get(CURRENT_TRANSACTION_TABLE)?)
    }

    async fn clear_current_transaction(&self) -> Result<(), database::Error> {
        self.remove(CURRENT_TRANSACTION_TABLE)?;
        Ok(())
    }
}
